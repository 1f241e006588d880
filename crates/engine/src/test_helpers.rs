// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::job::{SuiteContext, WorkError};
use crate::listener::SuiteListener;
use crate::updater::{StatusUpdater, WriteCtx};
use jobsuite_core::{Event, EventKind, FakeClock, JobId};
use jobsuite_storage::FileStatusStore;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Shared log a [`RecordingListener`] writes into.
#[derive(Clone, Default)]
pub(crate) struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
    errors: Arc<Mutex<Vec<(String, JobId)>>>,
}

impl EventLog {
    pub(crate) fn listener(&self) -> RecordingListener {
        RecordingListener { log: self.clone() }
    }

    fn push(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    /// Event kinds observed for one job, in firing order.
    pub(crate) fn kinds_for(&self, job_id: &str) -> Vec<EventKind> {
        self.events.lock().iter().filter(|e| e.job_id == job_id).map(|e| e.kind).collect()
    }

    pub(crate) fn contains(&self, kind: EventKind, job_id: &str) -> bool {
        self.events.lock().iter().any(|e| e.kind == kind && e.job_id == job_id)
    }

    pub(crate) fn errors(&self) -> Vec<(String, JobId)> {
        self.errors.lock().clone()
    }
}

pub(crate) struct RecordingListener {
    log: EventLog,
}

impl SuiteListener for RecordingListener {
    fn suite_started(&self, event: &Event) {
        self.log.push(event);
    }
    fn suite_completed(&self, event: &Event) {
        self.log.push(event);
    }
    fn suite_terminated_prematurely(&self, event: &Event) {
        self.log.push(event);
    }
    fn suite_aborted(&self, event: &Event) {
        self.log.push(event);
    }
    fn suite_stopping(&self, event: &Event) {
        self.log.push(event);
    }
    fn suite_stopped(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_started(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_resumed(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_skipped(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_progressed(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_completed(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_terminated_prematurely(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_stopping(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_stopped(&self, event: &Event) {
        self.log.push(event);
    }
    fn job_errored(&self, error: &WorkError, event: &Event) {
        self.log.errors.lock().push((error.to_string(), event.job_id.clone()));
    }
}

/// A write context over a file store in `dir`, with a fake clock and a
/// recording listener already attached.
pub(crate) fn write_ctx(dir: &Path, suite_id: &str) -> (Arc<WriteCtx>, FakeClock, EventLog) {
    let clock = FakeClock::new();
    let log = EventLog::default();
    let mut listeners = crate::listener::Listeners::default();
    listeners.push(Box::new(log.listener()));
    let ctx = Arc::new(WriteCtx {
        suite_id: JobId::new(suite_id),
        store: Arc::new(FileStatusStore::new(dir, Arc::new(clock.clone()))),
        listeners: Arc::new(listeners),
        clock: Arc::new(clock.clone()),
    });
    (ctx, clock, log)
}

/// Work that walks progress up to 1.0 in a few steps.
pub(crate) fn complete_work() -> impl Fn(&mut StatusUpdater, &SuiteContext) -> Result<(), WorkError> + Send + Sync
{
    |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        status.set_progress(0.5)?;
        status.set_progress(1.0)?;
        Ok(())
    }
}

/// Work that fails with the given message after making some progress.
pub(crate) fn failing_work(
    message: &'static str,
) -> impl Fn(&mut StatusUpdater, &SuiteContext) -> Result<(), WorkError> + Send + Sync {
    move |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        status.set_progress(0.25)?;
        Err(message.into())
    }
}
