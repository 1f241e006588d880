// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job runner protocol.
//!
//! Every job execution, leaf or group, follows the same bracket: read the
//! record, skip if already completed, mark started or resumed, register
//! with the heartbeat, run the work (or the children, per the group's
//! policy), capture any error at this boundary, then always unregister,
//! stamp the end time, persist, and fire the terminal event — unless a stop
//! is in progress, in which case the stop monitor owns the terminal events.
//!
//! Group fan-out reports child outcomes over an mpsc channel that the group
//! owner drains; the bounded policy starts the next queued child as each
//! running child's outcome arrives, so no slot ever sits idle on a poll.

use crate::heartbeat::ActiveJobs;
use crate::job::{GroupMode, Job, SuiteContext, WorkError};
use crate::updater::{GroupAggregator, StatusUpdater, WriteCtx};
use jobsuite_core::{Event, EventKind, JobId, RunState, StatusRecord};
use jobsuite_storage::StorageError;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;

pub(crate) struct Runner {
    pub(crate) ctx: Arc<WriteCtx>,
    pub(crate) active: ActiveJobs,
    pub(crate) suite_ctx: SuiteContext,
    /// Whether this run reuses prior records (resume) or started fresh.
    pub(crate) resume: bool,
}

impl Runner {
    /// Execute one job. Returns true when the work function (or every
    /// required child) returned normally.
    pub(crate) fn run(&self, job: &Job, parent: Option<&Arc<GroupAggregator>>) -> bool {
        match self.run_inner(job, parent) {
            Ok(success) => success,
            Err(e) => {
                // A status that cannot be persisted makes resume unsafe:
                // the store failure is fatal to this job.
                tracing::warn!(job_id = %job.id(), error = %e, "status store failure aborted job");
                let mut record = StatusRecord::new(job.id().clone());
                record.note = Some(e.to_string());
                let error: WorkError = Box::new(e);
                self.ctx.listeners.fire_error(
                    &error,
                    &Event::new(
                        EventKind::JobErrored,
                        self.ctx.suite_id.clone(),
                        job.id().clone(),
                        record,
                    ),
                );
                false
            }
        }
    }

    fn run_inner(
        &self,
        job: &Job,
        parent: Option<&Arc<GroupAggregator>>,
    ) -> Result<bool, StorageError> {
        let id = job.id().clone();
        let mut record = self.ctx.store.read(&self.ctx.suite_id, &id)?;
        let now = self.ctx.clock.epoch_ms();

        // Skip-on-complete: never re-invoke finished work.
        if record.state_at(now) == RunState::Completed {
            tracing::debug!(job_id = %id, "already completed, skipping");
            self.fire(EventKind::JobSkipped, &id, record);
            return Ok(true);
        }

        if self.resume && record.is_started() {
            record.mark_resumed(now);
            self.ctx.store.write(&self.ctx.suite_id, &id, &record)?;
            tracing::info!(job_id = %id, attempt = record.resumes.len(), progress = record.progress, "job resumed");
            self.fire(EventKind::JobResumed, &id, record.clone());
        } else {
            record.started_at_ms = Some(now);
            record.touch(now);
            self.ctx.store.write(&self.ctx.suite_id, &id, &record)?;
            tracing::info!(job_id = %id, "job started");
            self.fire(EventKind::JobStarted, &id, record.clone());
        }

        let shared = Arc::new(Mutex::new(record));
        self.active.register(id.clone(), Arc::clone(&shared));

        let outcome: Result<(), WorkError> = match job {
            Job::Leaf { work, .. } => {
                let mut updater = StatusUpdater::new(
                    Arc::clone(&self.ctx),
                    id.clone(),
                    Arc::clone(&shared),
                    parent.cloned(),
                );
                work.execute(&mut updater, &self.suite_ctx)
            }
            Job::Group { mode, children, .. } => {
                self.run_group(*mode, children, &shared, parent)
            }
        };

        if let Err(error) = &outcome {
            tracing::warn!(job_id = %id, error = %error, "job failed");
            let snapshot = {
                let mut r = shared.lock();
                r.note = Some(error.to_string());
                r.clone()
            };
            self.ctx.listeners.fire_error(
                error,
                &Event::new(EventKind::JobErrored, self.ctx.suite_id.clone(), id.clone(), snapshot),
            );
        }

        // Finally: always unregister, stamp the end, and persist.
        self.active.unregister(&id);
        let end_ms = self.ctx.clock.epoch_ms();
        let final_record = {
            let mut r = shared.lock();
            r.ended_at_ms = Some(end_ms);
            r.touch(end_ms);
            r.clone()
        };
        self.ctx.store.write(&self.ctx.suite_id, &id, &final_record)?;

        let state = final_record.state_at(end_ms);
        if !matches!(state, RunState::Stopping | RunState::Stopped) {
            let kind = if outcome.is_ok() && final_record.is_completed() {
                EventKind::JobCompleted
            } else {
                EventKind::JobTerminatedPrematurely
            };
            self.fire(kind, &id, final_record);
        }
        Ok(outcome.is_ok())
    }

    fn run_group(
        &self,
        mode: GroupMode,
        children: &[Job],
        shared: &Arc<Mutex<StatusRecord>>,
        parent: Option<&Arc<GroupAggregator>>,
    ) -> Result<(), WorkError> {
        // Seed the aggregate with every child's current progress so
        // completed and unstarted children weigh in from the start.
        let mut seeds = Vec::with_capacity(children.len());
        for child in children {
            let record = self.ctx.store.read(&self.ctx.suite_id, child.id())?;
            seeds.push((child.id().clone(), record.progress));
        }
        let agg = Arc::new(GroupAggregator::new(
            Arc::clone(&self.ctx),
            Arc::clone(shared),
            parent.cloned(),
            seeds,
        ));

        match mode {
            GroupMode::Sequence => {
                for (i, child) in children.iter().enumerate() {
                    if !self.run(child, Some(&agg)) {
                        let remaining = children.len() - i - 1;
                        return Err(format!(
                            "job {} failed; skipping {remaining} remaining job(s)",
                            child.id()
                        )
                        .into());
                    }
                }
                Ok(())
            }
            GroupMode::Parallel => self.fan_out(children, &agg, children.len().max(1)),
            GroupMode::Bounded(limit) => self.fan_out(children, &agg, limit.max(1)),
        }
    }

    /// Run children on their own threads, at most `limit` at a time. All
    /// children run to completion; failures are collected, never raced.
    fn fan_out(
        &self,
        children: &[Job],
        agg: &Arc<GroupAggregator>,
        limit: usize,
    ) -> Result<(), WorkError> {
        let total = children.len();
        if total == 0 {
            return Ok(());
        }
        let mut failed: Vec<JobId> = Vec::new();
        std::thread::scope(|scope| {
            let (tx, rx) = mpsc::channel::<(usize, bool)>();
            let spawn_child = |index: usize| {
                let tx = tx.clone();
                let agg = Arc::clone(agg);
                let child = &children[index];
                scope.spawn(move || {
                    let ok = self.run(child, Some(&agg));
                    // The owner drains until all outcomes arrive; a send
                    // can only fail if the whole scope is unwinding.
                    let _ = tx.send((index, ok));
                });
            };

            let mut next = 0;
            while next < total.min(limit) {
                spawn_child(next);
                next += 1;
            }
            let mut finished = 0;
            while finished < total {
                let Ok((index, ok)) = rx.recv() else {
                    break;
                };
                finished += 1;
                if !ok {
                    failed.push(children[index].id().clone());
                }
                if next < total {
                    spawn_child(next);
                    next += 1;
                }
            }
        });

        if failed.is_empty() {
            Ok(())
        } else {
            let names = failed.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ");
            Err(format!("{} of {total} jobs failed: {names}", failed.len()).into())
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
#[path = "runner_tests.rs"]
mod tests;
