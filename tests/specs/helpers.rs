// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the end-to-end specs.

use jobsuite_core::{Event, EventKind, JobId};
use jobsuite_engine::{StatusUpdater, SuiteContext, SuiteListener, WorkError};
use std::sync::{Arc, Mutex};

/// Listener recording every event and error through the public API.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    errors: Arc<Mutex<Vec<(String, JobId)>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn kinds_for(&self, job_id: &str) -> Vec<EventKind> {
        self.events().iter().filter(|e| e.job_id == job_id).map(|e| e.kind).collect()
    }

    pub fn contains(&self, kind: EventKind, job_id: &str) -> bool {
        self.events().iter().any(|e| e.kind == kind && e.job_id == job_id)
    }

    pub fn last_kind(&self) -> Option<EventKind> {
        self.events().last().map(|e| e.kind)
    }

    pub fn errors(&self) -> Vec<(String, JobId)> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, event: &Event) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event.clone());
    }
}

impl SuiteListener for Recorder {
    fn suite_started(&self, event: &Event) {
        self.push(event);
    }
    fn suite_completed(&self, event: &Event) {
        self.push(event);
    }
    fn suite_terminated_prematurely(&self, event: &Event) {
        self.push(event);
    }
    fn suite_aborted(&self, event: &Event) {
        self.push(event);
    }
    fn suite_stopping(&self, event: &Event) {
        self.push(event);
    }
    fn suite_stopped(&self, event: &Event) {
        self.push(event);
    }
    fn job_started(&self, event: &Event) {
        self.push(event);
    }
    fn job_resumed(&self, event: &Event) {
        self.push(event);
    }
    fn job_skipped(&self, event: &Event) {
        self.push(event);
    }
    fn job_progressed(&self, event: &Event) {
        self.push(event);
    }
    fn job_completed(&self, event: &Event) {
        self.push(event);
    }
    fn job_terminated_prematurely(&self, event: &Event) {
        self.push(event);
    }
    fn job_stopping(&self, event: &Event) {
        self.push(event);
    }
    fn job_stopped(&self, event: &Event) {
        self.push(event);
    }
    fn job_errored(&self, error: &WorkError, event: &Event) {
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((error.to_string(), event.job_id.clone()));
    }
}

/// Work that steps progress to completion over a simulated duration.
pub fn timed_work(
    steps: u32,
    step_delay_ms: u64,
) -> impl Fn(&mut StatusUpdater, &SuiteContext) -> Result<(), WorkError> + Send + Sync {
    move |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        for step in 1..=steps {
            std::thread::sleep(std::time::Duration::from_millis(step_delay_ms));
            status.set_progress(f64::from(step) / f64::from(steps))?;
        }
        Ok(())
    }
}

/// Work that completes immediately.
pub fn instant_work(
) -> impl Fn(&mut StatusUpdater, &SuiteContext) -> Result<(), WorkError> + Send + Sync {
    |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        status.set_progress(1.0)?;
        Ok(())
    }
}

/// Work that fails with the given message.
pub fn exploding_work(
    message: &'static str,
) -> impl Fn(&mut StatusUpdater, &SuiteContext) -> Result<(), WorkError> + Send + Sync {
    move |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        status.set_note("about to fail")?;
        Err(message.into())
    }
}
