// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job composition model.
//!
//! A job is either a leaf unit of work or a group of child jobs run under a
//! composition policy. The variants are explicit so tree-walking code
//! matches on them instead of inspecting runtime types, and the tree cannot
//! cycle because children are owned.

use crate::updater::StatusUpdater;
use jobsuite_core::{JobId, StatusRecord, StatusTree, TreeError};
use std::path::PathBuf;
use std::sync::Arc;

/// Error type surfaced by job work functions.
pub type WorkError = Box<dyn std::error::Error + Send + Sync>;

/// Per-run context passed to work functions.
///
/// Carries the suite identity and work directory explicitly so work
/// functions never depend on ambient thread state.
#[derive(Debug, Clone)]
pub struct SuiteContext {
    pub suite_id: JobId,
    pub workdir: PathBuf,
}

impl SuiteContext {
    /// The suite's own directory under the work directory.
    pub fn suite_dir(&self) -> PathBuf {
        self.workdir.join(self.suite_id.as_str())
    }
}

/// A unit of work executed by a leaf job.
pub trait Work: Send + Sync {
    /// Run the job. Progress, notes, and resume bookmarks go through the
    /// updater; a returned error fails the job without crashing the suite.
    /// Long-running loops should observe [`StatusUpdater::stop_requested`]
    /// and return early when asked to stop.
    fn execute(&self, status: &mut StatusUpdater, ctx: &SuiteContext) -> Result<(), WorkError>;

    /// Cooperative stop hook, called by the stop monitor after the stop flag
    /// is set. Implementors kill resources they own (e.g. a spawned
    /// process); the framework itself never terminates a job's thread.
    fn stop(&self, _status: &StatusRecord, _ctx: &SuiteContext) {}
}

impl<F> Work for F
where
    F: Fn(&mut StatusUpdater, &SuiteContext) -> Result<(), WorkError> + Send + Sync,
{
    fn execute(&self, status: &mut StatusUpdater, ctx: &SuiteContext) -> Result<(), WorkError> {
        self(status, ctx)
    }
}

/// Composition policy for a job group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Children run strictly in order; the first failure skips the rest.
    Sequence,
    /// One thread per child; all children run to completion regardless of
    /// individual failures.
    Parallel,
    /// Parallel with at most this many children running at once.
    Bounded(usize),
}

/// A node in the job composition tree.
pub enum Job {
    Leaf { id: JobId, work: Arc<dyn Work> },
    Group { id: JobId, mode: GroupMode, children: Vec<Job> },
}

impl Job {
    pub fn leaf(id: impl Into<JobId>, work: impl Work + 'static) -> Self {
        Job::Leaf { id: id.into(), work: Arc::new(work) }
    }

    pub fn sequence(id: impl Into<JobId>, children: Vec<Job>) -> Self {
        Job::Group { id: id.into(), mode: GroupMode::Sequence, children }
    }

    pub fn parallel(id: impl Into<JobId>, children: Vec<Job>) -> Self {
        Job::Group { id: id.into(), mode: GroupMode::Parallel, children }
    }

    /// Parallel with a concurrency ceiling. A limit of zero is treated as
    /// one: a group that can never start a child would deadlock.
    pub fn bounded(id: impl Into<JobId>, limit: usize, children: Vec<Job>) -> Self {
        Job::Group { id: id.into(), mode: GroupMode::Bounded(limit.max(1)), children }
    }

    pub fn id(&self) -> &JobId {
        match self {
            Job::Leaf { id, .. } | Job::Group { id, .. } => id,
        }
    }

    /// Children of a group; `None` for a leaf.
    pub fn children(&self) -> Option<&[Job]> {
        match self {
            Job::Leaf { .. } => None,
            Job::Group { children, .. } => Some(children),
        }
    }

    /// Flatten the composition into a validated status tree.
    pub fn to_tree(&self) -> Result<StatusTree, TreeError> {
        fn walk(
            builder: &mut jobsuite_core::StatusTreeBuilder,
            job: &Job,
        ) -> Result<(), TreeError> {
            if let Some(children) = job.children() {
                for child in children {
                    builder.add_child(job.id(), child.id().clone())?;
                    walk(builder, child)?;
                }
            }
            Ok(())
        }
        let mut builder = StatusTree::builder(self.id().clone())?;
        walk(&mut builder, self)?;
        Ok(builder.build())
    }

    /// Self and all descendants, children before parents. The stop walk
    /// uses this order so leaves get their stop flag before the groups
    /// blocked on them.
    pub(crate) fn flatten_post_order(&self) -> Vec<&Job> {
        fn walk<'a>(job: &'a Job, out: &mut Vec<&'a Job>) {
            if let Some(children) = job.children() {
                for child in children {
                    walk(child, out);
                }
            }
            out.push(job);
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::Leaf { id, .. } => f.debug_struct("Leaf").field("id", id).finish(),
            Job::Group { id, mode, children } => f
                .debug_struct("Group")
                .field("id", id)
                .field("mode", mode)
                .field("children", &children.len())
                .finish(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
