// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job suite orchestrator.
//!
//! A suite owns one root job, a work directory, a status store, and the
//! listeners. `execute()` locks the work directory, resolves prior run
//! state (fresh, resume, or backup-then-fresh), runs the root job under the
//! runner protocol with the heartbeat and stop monitor alive, fires the
//! suite life-cycle events, and tears everything down.

use crate::heartbeat::{ActiveJobs, HeartbeatLoop};
use crate::job::{Job, SuiteContext};
use crate::listener::{Listeners, SuiteListener};
use crate::runner::Runner;
use crate::stop::{StopMonitor, STOP_POLL_INTERVAL};
use crate::updater::WriteCtx;
use jobsuite_core::{
    Clock, Event, EventKind, JobId, RunState, StatusRecord, SystemClock, TreeError,
    HEARTBEAT_INTERVAL,
};
use jobsuite_storage::{
    paths, FileStatusStore, IndexError, LockError, StatusStore, StorageError, StoreConfig,
    SuiteIndex, SuiteLock,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use thiserror::Error;

/// Fatal initialization/teardown errors. Per-job failures never surface
/// here; they are reported through error listeners and the return boolean.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("failed to lock suite: {0}")]
    Lock(#[from] LockError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid job tree: {0}")]
    Tree(#[from] TreeError),
    #[error("suite index error: {0}")]
    Index(#[from] IndexError),
    #[error("suite {0} is already {1}")]
    AlreadyActive(JobId, RunState),
    #[error("persisted index does not match the constructed job tree for suite {0}")]
    IndexMismatch(JobId),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How to treat a prior incomplete run of the same suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumePolicy {
    /// Back up any prior state and start clean.
    #[default]
    Fresh,
    /// Reuse prior records whenever the prior root state is not terminal —
    /// including an aborted run (process died silently).
    Resume,
    /// Like `Resume`, but an aborted prior run is backed up and restarted
    /// fresh instead of being reused.
    ResumeExceptAborted,
}

pub struct JobSuite {
    root: Job,
    workdir: PathBuf,
    store: Arc<dyn StatusStore>,
    store_config: StoreConfig,
    clock: Arc<dyn Clock>,
    listeners: Arc<Listeners>,
    resume: ResumePolicy,
    heartbeat_interval: Duration,
    stop_poll_interval: Duration,
}

impl JobSuite {
    pub fn builder(root: Job, workdir: impl Into<PathBuf>) -> JobSuiteBuilder {
        JobSuiteBuilder {
            root,
            workdir: workdir.into(),
            clock: None,
            store: None,
            listeners: Listeners::default(),
            resume: ResumePolicy::default(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            stop_poll_interval: STOP_POLL_INTERVAL,
        }
    }

    /// The suite id is always the root job's id.
    pub fn suite_id(&self) -> &JobId {
        self.root.id()
    }

    /// Path of the stop sentinel for a suite.
    pub fn stop_sentinel(workdir: &Path, suite_id: &JobId) -> PathBuf {
        paths::stop_sentinel(workdir, suite_id)
    }

    /// Request a graceful stop of a running suite — from this process or
    /// any other — by creating its stop sentinel.
    pub fn request_stop(workdir: &Path, suite_id: &JobId) -> std::io::Result<()> {
        let sentinel = paths::stop_sentinel(workdir, suite_id);
        if let Some(parent) = sentinel.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&sentinel, b"")
    }

    /// Run the suite to completion. `Ok(true)` when the root finished
    /// completed; `Ok(false)` on per-job failure, incomplete progress, or a
    /// stop. Initialization failures return `Err` after firing
    /// `suite:aborted`.
    pub fn execute(&self) -> Result<bool, SuiteError> {
        match self.execute_inner() {
            Ok(success) => Ok(success),
            Err(e) => {
                tracing::warn!(suite_id = %self.suite_id(), error = %e, "suite aborted");
                let record = self
                    .store
                    .read(self.suite_id(), self.suite_id())
                    .unwrap_or_else(|_| StatusRecord::new(self.suite_id().clone()));
                self.listeners.fire(&Event::new(
                    EventKind::SuiteAborted,
                    self.suite_id().clone(),
                    self.suite_id().clone(),
                    record,
                ));
                Err(e)
            }
        }
    }

    fn execute_inner(&self) -> Result<bool, SuiteError> {
        let suite_id = self.suite_id().clone();
        // Duplicate-id validation happens before anything touches disk.
        let tree = self.root.to_tree()?;

        let status_dir = paths::status_dir(&self.workdir, &suite_id);
        fs::create_dir_all(&status_dir)?;
        let lock = SuiteLock::acquire(paths::lock_path(&self.workdir, &suite_id))?;

        // A sentinel left over from a prior run must not kill this one.
        let sentinel = paths::stop_sentinel(&self.workdir, &suite_id);
        match fs::remove_file(&sentinel) {
            Ok(()) => tracing::debug!(suite_id = %suite_id, "removed stale stop sentinel"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let index_path = paths::index_path(&self.workdir, &suite_id);
        let prior_index = SuiteIndex::load(&index_path)?;
        let prior_root = self.store.read(&suite_id, &suite_id)?;
        let prior_state = prior_root.state_at(self.clock.epoch_ms());
        if prior_state.is_active() {
            return Err(SuiteError::AlreadyActive(suite_id, prior_state));
        }

        let resume = self.resolve_resume(prior_state, prior_index.is_some());
        if resume {
            if let Some(prior) = &prior_index {
                if prior.to_tree()? != tree {
                    return Err(SuiteError::IndexMismatch(suite_id));
                }
            }
            tracing::info!(suite_id = %suite_id, prior_state = %prior_state, "resuming prior run");
        } else if let Some(prior) = &prior_index {
            self.backup_prior(&suite_id, prior, &index_path)?;
        }
        SuiteIndex::from_tree(&tree, self.store_config.clone()).save(&index_path)?;

        let ctx = Arc::new(WriteCtx {
            suite_id: suite_id.clone(),
            store: Arc::clone(&self.store),
            listeners: Arc::clone(&self.listeners),
            clock: Arc::clone(&self.clock),
        });
        let active = ActiveJobs::default();
        let suite_ctx = SuiteContext { suite_id: suite_id.clone(), workdir: self.workdir.clone() };
        let runner = Runner {
            ctx: Arc::clone(&ctx),
            active: active.clone(),
            suite_ctx: suite_ctx.clone(),
            resume,
        };

        self.listeners.fire(&Event::new(
            EventKind::SuiteStarted,
            suite_id.clone(),
            suite_id.clone(),
            self.store.read(&suite_id, &suite_id)?,
        ));

        std::thread::scope(|scope| {
            let (heartbeat_tx, heartbeat_rx) = mpsc::channel();
            let (stop_tx, stop_rx) = mpsc::channel();
            scope.spawn(|| {
                HeartbeatLoop {
                    interval: self.heartbeat_interval,
                    active: active.clone(),
                    store: self.store.as_ref(),
                    suite_id: &suite_id,
                    lock: &lock,
                }
                .run(heartbeat_rx)
            });
            scope.spawn(|| {
                StopMonitor {
                    ctx: &ctx,
                    active: &active,
                    root: &self.root,
                    suite_ctx: &suite_ctx,
                    sentinel: sentinel.clone(),
                    poll: self.stop_poll_interval,
                }
                .run(stop_rx)
            });

            runner.run(&self.root, None);

            // Joining the scope waits for the monitor to finish an
            // in-flight stop walk before teardown.
            let _ = heartbeat_tx.send(());
            let _ = stop_tx.send(());
        });

        let final_root = self.store.read(&suite_id, &suite_id)?;
        let final_state = final_root.state_at(self.clock.epoch_ms());
        if !matches!(final_state, RunState::Stopping | RunState::Stopped) {
            let kind = if final_state == RunState::Completed {
                EventKind::SuiteCompleted
            } else {
                EventKind::SuiteTerminatedPrematurely
            };
            self.listeners.fire(&Event::new(kind, suite_id.clone(), suite_id, final_root.clone()));
        }
        drop(lock);
        Ok(final_state == RunState::Completed)
    }

    fn resolve_resume(&self, prior_state: RunState, has_prior_index: bool) -> bool {
        if !has_prior_index {
            return false;
        }
        match self.resume {
            ResumePolicy::Fresh => false,
            ResumePolicy::Resume => {
                !prior_state.is_terminal() && prior_state != RunState::Unknown
            }
            ResumePolicy::ResumeExceptAborted => {
                !prior_state.is_terminal()
                    && prior_state != RunState::Unknown
                    && prior_state != RunState::Aborted
            }
        }
    }

    /// Relocate every prior record and the index into a timestamped backup
    /// partition before starting clean.
    fn backup_prior(
        &self,
        suite_id: &JobId,
        prior: &SuiteIndex,
        index_path: &Path,
    ) -> Result<(), SuiteError> {
        let stamp = paths::backup_stamp();
        for job_id in prior.ids() {
            self.store.backup(suite_id, &job_id, &stamp)?;
        }
        let backup_dir = paths::backup_dir(&self.workdir, suite_id, &stamp);
        fs::create_dir_all(&backup_dir)?;
        fs::rename(index_path, backup_dir.join(jobsuite_storage::INDEX_FILE))?;
        tracing::info!(suite_id = %suite_id, stamp, "backed up prior run");
        Ok(())
    }
}

pub struct JobSuiteBuilder {
    root: Job,
    workdir: PathBuf,
    clock: Option<Arc<dyn Clock>>,
    store: Option<(Arc<dyn StatusStore>, StoreConfig)>,
    listeners: Listeners,
    resume: ResumePolicy,
    heartbeat_interval: Duration,
    stop_poll_interval: Duration,
}

impl JobSuiteBuilder {
    /// Inject a clock (tests use `FakeClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a store other than the default file store over the work
    /// directory. The config is what gets written into the suite index.
    pub fn store(mut self, store: Arc<dyn StatusStore>, config: StoreConfig) -> Self {
        self.store = Some((store, config));
        self
    }

    pub fn resume(mut self, policy: ResumePolicy) -> Self {
        self.resume = policy;
        self
    }

    pub fn listener(mut self, listener: impl SuiteListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Override the heartbeat tick. Defaults to [`HEARTBEAT_INTERVAL`];
    /// shorten it in tests only.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Override the stop monitor poll. Defaults to [`STOP_POLL_INTERVAL`];
    /// shorten it in tests only.
    pub fn stop_poll_interval(mut self, interval: Duration) -> Self {
        self.stop_poll_interval = interval;
        self
    }

    pub fn build(self) -> JobSuite {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let (store, store_config) = self.store.unwrap_or_else(|| {
            (
                Arc::new(FileStatusStore::new(self.workdir.clone(), Arc::clone(&clock))),
                StoreConfig::File { dir: self.workdir.clone() },
            )
        });
        JobSuite {
            root: self.root,
            workdir: self.workdir,
            store,
            store_config,
            clock,
            listeners: Arc::new(self.listeners),
            resume: self.resume,
            heartbeat_interval: self.heartbeat_interval,
            stop_poll_interval: self.stop_poll_interval,
        }
    }
}

#[cfg(test)]
#[path = "suite_tests.rs"]
mod tests;
