// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-through status updates.
//!
//! Every status mutation follows the same ordered, synchronous path:
//! mutate the shared in-memory record, persist the snapshot through the
//! store, fire `job:progressed`, then notify the parent group so it can
//! recompute its aggregate. The aggregate path is serialized by a single
//! mutex per group, so concurrent child completions never corrupt it.

use crate::listener::Listeners;
use jobsuite_core::{Clock, Event, EventKind, JobId, StatusRecord};
use jobsuite_storage::{StatusStore, StorageError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Context shared by every writer in one suite run.
pub(crate) struct WriteCtx {
    pub(crate) suite_id: JobId,
    pub(crate) store: Arc<dyn StatusStore>,
    pub(crate) listeners: Arc<Listeners>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl WriteCtx {
    /// Persist a snapshot and fire `job:progressed` for it, in that order.
    fn publish(&self, snapshot: &StatusRecord) -> Result<(), StorageError> {
        self.store.write(&self.suite_id, &snapshot.job_id, snapshot)?;
        self.listeners.fire(&Event::new(
            EventKind::JobProgressed,
            self.suite_id.clone(),
            snapshot.job_id.clone(),
            snapshot.clone(),
        ));
        Ok(())
    }
}

/// Handle bound to one job's status record, passed to its work function.
///
/// The updater is the record's single writer; the only other mutation path
/// is the stop monitor flipping `stop_requested` on the same shared record.
pub struct StatusUpdater {
    ctx: Arc<WriteCtx>,
    record: Arc<Mutex<StatusRecord>>,
    parent: Option<Arc<GroupAggregator>>,
    job_id: JobId,
}

impl StatusUpdater {
    pub(crate) fn new(
        ctx: Arc<WriteCtx>,
        job_id: JobId,
        record: Arc<Mutex<StatusRecord>>,
        parent: Option<Arc<GroupAggregator>>,
    ) -> Self {
        Self { ctx, record, parent, job_id }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn progress(&self) -> f64 {
        self.record.lock().progress
    }

    /// True once a stop has been requested for this job. Long-running work
    /// functions should poll this and return early.
    pub fn stop_requested(&self) -> bool {
        self.record.lock().stop_requested
    }

    /// A snapshot of the current record.
    pub fn record(&self) -> StatusRecord {
        self.record.lock().clone()
    }

    /// First value of a property, if any.
    pub fn property(&self, key: &str) -> Option<String> {
        self.record.lock().property(key).map(str::to_string)
    }

    /// Set progress (clamped to `[0, 1]`).
    pub fn set_progress(&mut self, progress: f64) -> Result<(), StorageError> {
        self.write_through(|r| r.set_progress(progress))
    }

    /// Set the activity note.
    pub fn set_note(&mut self, note: impl Into<String>) -> Result<(), StorageError> {
        let note = note.into();
        self.write_through(|r| r.note = Some(note))
    }

    /// Replace a property with a single value.
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), StorageError> {
        let (key, value) = (key.into(), value.into());
        self.write_through(|r| r.set_property(key, value))
    }

    /// Append a value to a property.
    pub fn add_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), StorageError> {
        let (key, value) = (key.into(), value.into());
        self.write_through(|r| r.add_property(key, value))
    }

    /// Mutate, persist, fire, and notify the parent group — synchronously
    /// and in that order.
    fn write_through(
        &mut self,
        mutate: impl FnOnce(&mut StatusRecord),
    ) -> Result<(), StorageError> {
        let snapshot = {
            let mut record = self.record.lock();
            mutate(&mut record);
            record.touch(self.ctx.clock.epoch_ms());
            record.clone()
        };
        self.ctx.publish(&snapshot)?;
        if let Some(parent) = &self.parent {
            parent.child_progressed(&snapshot)?;
        }
        Ok(())
    }
}

/// Reactive aggregate writer for one group.
///
/// Invoked on every child status change; recomputes the group's progress as
/// the mean over all children — unstarted children contribute zero, which
/// is the load-bearing historical formula — and persists it through the
/// same publish path, then notifies the group's own parent.
pub(crate) struct GroupAggregator {
    ctx: Arc<WriteCtx>,
    /// The group's own shared record (its job id identifies the group).
    record: Arc<Mutex<StatusRecord>>,
    parent: Option<Arc<GroupAggregator>>,
    /// Guards the aggregate recompute end-to-end.
    child_progress: Mutex<HashMap<JobId, f64>>,
}

impl GroupAggregator {
    /// Seed with every child's current progress so completed or unstarted
    /// children weigh in from the first recompute.
    pub(crate) fn new(
        ctx: Arc<WriteCtx>,
        record: Arc<Mutex<StatusRecord>>,
        parent: Option<Arc<GroupAggregator>>,
        seeds: Vec<(JobId, f64)>,
    ) -> Self {
        Self { ctx, record, parent, child_progress: Mutex::new(seeds.into_iter().collect()) }
    }

    /// Recompute and persist the aggregate after a child status change.
    pub(crate) fn child_progressed(&self, child: &StatusRecord) -> Result<(), StorageError> {
        // Held across the store write: concurrent child completions are
        // serialized so the aggregate record is never interleaved.
        let mut progress = self.child_progress.lock();
        progress.insert(child.job_id.clone(), child.progress);

        let total = progress.len();
        let sum: f64 = progress.values().sum();
        let mean = if total == 0 { 0.0 } else { (sum / total as f64).min(1.0) };
        let done = progress.values().filter(|p| **p >= 1.0).count();

        let snapshot = {
            let mut record = self.record.lock();
            record.set_progress(mean);
            record.note = Some(format!("{done} of {total} jobs completed"));
            record.touch(self.ctx.clock.epoch_ms());
            record.clone()
        };
        self.ctx.publish(&snapshot)?;
        if let Some(parent) = &self.parent {
            parent.child_progressed(&snapshot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "updater_tests.rs"]
mod tests;
