// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed life-cycle listeners.
//!
//! The closed [`EventKind`] enum is dispatched to one trait method per kind
//! via ordinary virtual calls. Dispatch is synchronous on the thread that
//! produced the event, immediately after the status write it reflects, so
//! listeners always observe monotonically consistent progress.

use crate::job::WorkError;
use jobsuite_core::{Event, EventKind};

/// Receiver of suite and job life-cycle events.
///
/// Every method defaults to a no-op; implement the ones you need.
pub trait SuiteListener: Send + Sync {
    fn suite_started(&self, _event: &Event) {}
    fn suite_completed(&self, _event: &Event) {}
    fn suite_terminated_prematurely(&self, _event: &Event) {}
    fn suite_aborted(&self, _event: &Event) {}
    fn suite_stopping(&self, _event: &Event) {}
    fn suite_stopped(&self, _event: &Event) {}

    fn job_started(&self, _event: &Event) {}
    fn job_resumed(&self, _event: &Event) {}
    fn job_skipped(&self, _event: &Event) {}
    fn job_progressed(&self, _event: &Event) {}
    fn job_completed(&self, _event: &Event) {}
    fn job_terminated_prematurely(&self, _event: &Event) {}
    fn job_stopping(&self, _event: &Event) {}
    fn job_stopped(&self, _event: &Event) {}

    /// Error listener: a work function or status write failed. The event
    /// carries the record snapshot annotated with the error message.
    fn job_errored(&self, _error: &WorkError, _event: &Event) {}
}

/// Registered listeners, fanned out in registration order.
#[derive(Default)]
pub struct Listeners {
    inner: Vec<Box<dyn SuiteListener>>,
}

impl Listeners {
    pub fn push(&mut self, listener: Box<dyn SuiteListener>) {
        self.inner.push(listener);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Dispatch an event to the matching method of every listener.
    pub fn fire(&self, event: &Event) {
        tracing::debug!(kind = %event.kind, job_id = %event.job_id, "firing event");
        for listener in &self.inner {
            match event.kind {
                EventKind::SuiteStarted => listener.suite_started(event),
                EventKind::SuiteCompleted => listener.suite_completed(event),
                EventKind::SuiteTerminatedPrematurely => {
                    listener.suite_terminated_prematurely(event)
                }
                EventKind::SuiteAborted => listener.suite_aborted(event),
                EventKind::SuiteStopping => listener.suite_stopping(event),
                EventKind::SuiteStopped => listener.suite_stopped(event),
                EventKind::JobStarted => listener.job_started(event),
                EventKind::JobResumed => listener.job_resumed(event),
                EventKind::JobSkipped => listener.job_skipped(event),
                EventKind::JobProgressed => listener.job_progressed(event),
                EventKind::JobCompleted => listener.job_completed(event),
                EventKind::JobTerminatedPrematurely => listener.job_terminated_prematurely(event),
                EventKind::JobStopping => listener.job_stopping(event),
                EventKind::JobStopped => listener.job_stopped(event),
                // Errors travel through fire_error with the error attached.
                EventKind::JobErrored => {}
            }
        }
    }

    /// Dispatch an error to every listener.
    pub fn fire_error(&self, error: &WorkError, event: &Event) {
        tracing::debug!(job_id = %event.job_id, error = %error, "firing error event");
        for listener in &self.inner {
            listener.job_errored(error, event);
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
