// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat: periodic liveness refresh for every running job.
//!
//! Jobs register their shared record when execution starts and unregister
//! on every exit path. Each tick touches every registered record through
//! the store and refreshes the in-memory `last_activity_ms`, so liveness is
//! observable even when progress hasn't changed. The suite lock marker is
//! re-touched on the same tick so its freshness window tracks the
//! heartbeat. A record unregistered mid-iteration may receive one extra
//! harmless touch.

use jobsuite_core::{JobId, StatusRecord};
use jobsuite_storage::{StatusStore, SuiteLock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Registry of currently executing jobs' shared records.
///
/// Register/unregister come from job-runner threads while the heartbeat
/// thread iterates; iteration works on a snapshot so it never locks out
/// progress updates.
#[derive(Clone, Default)]
pub(crate) struct ActiveJobs {
    inner: Arc<Mutex<HashMap<JobId, Arc<Mutex<StatusRecord>>>>>,
}

impl ActiveJobs {
    pub(crate) fn register(&self, id: JobId, record: Arc<Mutex<StatusRecord>>) {
        self.inner.lock().insert(id, record);
    }

    pub(crate) fn unregister(&self, id: &JobId) {
        self.inner.lock().remove(id);
    }

    pub(crate) fn get(&self, id: &JobId) -> Option<Arc<Mutex<StatusRecord>>> {
        self.inner.lock().get(id).cloned()
    }

    /// Snapshot of the registry for lock-free iteration.
    pub(crate) fn snapshot(&self) -> Vec<(JobId, Arc<Mutex<StatusRecord>>)> {
        self.inner.lock().iter().map(|(id, r)| (id.clone(), Arc::clone(r))).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

/// The background ticker. `run` blocks until a shutdown message arrives (or
/// the sender is dropped); the receive timeout doubles as the tick.
pub(crate) struct HeartbeatLoop<'a> {
    pub(crate) interval: Duration,
    pub(crate) active: ActiveJobs,
    pub(crate) store: &'a dyn StatusStore,
    pub(crate) suite_id: &'a JobId,
    pub(crate) lock: &'a SuiteLock,
}

impl HeartbeatLoop<'_> {
    pub(crate) fn run(self, shutdown: Receiver<()>) {
        tracing::debug!(suite_id = %self.suite_id, "heartbeat started");
        loop {
            match shutdown.recv_timeout(self.interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!(suite_id = %self.suite_id, "heartbeat stopped");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.tick();
        }
    }

    fn tick(&self) {
        for (job_id, record) in self.active.snapshot() {
            match self.store.touch(self.suite_id, &job_id) {
                Ok(ts) => record.lock().touch(ts),
                Err(e) => {
                    // The job's own writes surface store failures; a missed
                    // touch only narrows the liveness window.
                    tracing::warn!(job_id = %job_id, error = %e, "heartbeat touch failed");
                }
            }
        }
        if let Err(e) = self.lock.refresh() {
            tracing::warn!(suite_id = %self.suite_id, error = %e, "suite lock refresh failed");
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
