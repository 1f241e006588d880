// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative stop protocol.
//!
//! A stop is requested by creating a sentinel file under the suite's
//! directory — from this process or any other. The monitor thread polls for
//! it; on detection it fires `suite:stopping`, then walks the job tree in
//! two passes: first set every record's stop flag (live records through the
//! shared in-memory handle, others through the store), fire `job:stopping`,
//! and invoke each leaf's stop hook; then wait for each job's derived state
//! to reach stopped, children before parents, firing `job:stopped` as each
//! one lands and `suite:stopped` when the root does.
//!
//! The flag pass runs to completion before any waiting so a leaf deep in
//! the tree is never left running while the monitor waits on an ancestor
//! that is blocked on it.

use crate::heartbeat::ActiveJobs;
use crate::job::{Job, SuiteContext};
use crate::updater::WriteCtx;
use jobsuite_core::{Event, EventKind, JobId, RunState, StatusRecord};
use jobsuite_storage::StorageError;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Interval at which the monitor polls for the stop sentinel and for jobs
/// draining to stopped.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_secs(3);

pub(crate) struct StopMonitor<'a> {
    pub(crate) ctx: &'a Arc<WriteCtx>,
    pub(crate) active: &'a ActiveJobs,
    pub(crate) root: &'a Job,
    pub(crate) suite_ctx: &'a SuiteContext,
    pub(crate) sentinel: PathBuf,
    pub(crate) poll: Duration,
}

impl StopMonitor<'_> {
    /// Poll until shutdown or until the sentinel appears; in the latter
    /// case run the stop walk to completion before returning.
    pub(crate) fn run(self, shutdown: Receiver<()>) {
        tracing::debug!(suite_id = %self.ctx.suite_id, "stop monitor started");
        loop {
            match shutdown.recv_timeout(self.poll) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!(suite_id = %self.ctx.suite_id, "stop monitor stopped");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
            if self.sentinel.exists() {
                tracing::info!(suite_id = %self.ctx.suite_id, "stop sentinel detected");
                self.execute_stop();
                return;
            }
        }
    }

    fn execute_stop(&self) {
        let suite_id = &self.ctx.suite_id;
        match self.current_record(suite_id) {
            Ok(root_record) => {
                self.fire(EventKind::SuiteStopping, suite_id, root_record);
            }
            Err(e) => tracing::warn!(error = %e, "failed to read root record for suite:stopping"),
        }

        // Children before parents, so no leaf keeps running while an
        // ancestor blocked on it is waited upon.
        let jobs = self.root.flatten_post_order();

        // Pass 1: flag everything, fire job:stopping, run stop hooks.
        for job in &jobs {
            match self.request_stop(job) {
                Ok(Some(record)) => {
                    self.fire(EventKind::JobStopping, job.id(), record.clone());
                    if let Job::Leaf { work, .. } = job {
                        work.stop(&record, self.suite_ctx);
                    }
                }
                // Never-started jobs have nothing to stop.
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(job_id = %job.id(), error = %e, "failed to set stop flag");
                }
            }
        }

        // Pass 2: wait for each to drain to stopped.
        for job in &jobs {
            self.await_stopped(job.id());
        }
    }

    /// Set the stop flag on the live record when the job is active, else
    /// through the store. Returns `None` for records that never started.
    fn request_stop(&self, job: &Job) -> Result<Option<StatusRecord>, StorageError> {
        let suite_id = &self.ctx.suite_id;
        if let Some(shared) = self.active.get(job.id()) {
            // Hold the record lock across the persist: the job thread only
            // observes the flag once the flagged snapshot is durable, so
            // its follow-up writes always land after this one.
            let mut record = shared.lock();
            record.stop_requested = true;
            let snapshot = record.clone();
            self.ctx.store.write(suite_id, job.id(), &snapshot)?;
            return Ok(Some(snapshot));
        }
        let mut record = self.ctx.store.read(suite_id, job.id())?;
        if !record.is_started() {
            return Ok(None);
        }
        record.stop_requested = true;
        self.ctx.store.write(suite_id, job.id(), &record)?;
        Ok(Some(record))
    }

    /// Spin until the derived state reaches stopped, then fire the terminal
    /// stop events. Bails out for jobs that cannot reach stopped (never
    /// started, or already terminal without the flag).
    fn await_stopped(&self, job_id: &JobId) {
        let suite_id = &self.ctx.suite_id;
        loop {
            let record = match self.active.get(job_id) {
                Some(shared) => shared.lock().clone(),
                None => match self.ctx.store.read(suite_id, job_id) {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(job_id = %job_id, error = %e, "failed to read record while stopping");
                        return;
                    }
                },
            };
            match record.state_at(self.ctx.clock.epoch_ms()) {
                RunState::Stopped => {
                    tracing::info!(job_id = %job_id, "job stopped");
                    self.fire(EventKind::JobStopped, job_id, record.clone());
                    if job_id == suite_id {
                        self.fire(EventKind::SuiteStopped, suite_id, record);
                    }
                    return;
                }
                RunState::Stopping | RunState::Running => {
                    std::thread::sleep(self.poll);
                }
                state => {
                    tracing::debug!(job_id = %job_id, %state, "not waiting for stop");
                    return;
                }
            }
        }
    }

    fn current_record(&self, job_id: &JobId) -> Result<StatusRecord, StorageError> {
        match self.active.get(job_id) {
            Some(shared) => Ok(shared.lock().clone()),
            None => self.ctx.store.read(&self.ctx.suite_id, job_id),
        }
    }

    fn fire(&self, kind: EventKind, job_id: &JobId, record: StatusRecord) {
        self.ctx.listeners.fire(&Event::new(
            kind,
            self.ctx.suite_id.clone(),
            job_id.clone(),
            record,
        ));
    }
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
