// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status record and derived execution state.
//!
//! A [`StatusRecord`] is the durable representation of one job's execution:
//! progress, note, timestamps, stop flag, and job-defined properties. The
//! execution state is never stored — it is derived from those fields by
//! [`StatusRecord::state_at`] with a fixed precedence, which is how crash
//! detection works: a record that was started, never ended, and has gone
//! quiet past the activity window reads as [`RunState::Aborted`].

use crate::id::JobId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Window after which a silent `last_activity_ms` implies the owning
/// process is no longer alive.
pub const ACTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between liveness touches. Must stay strictly below
/// [`ACTIVITY_TIMEOUT`], or live jobs would read as aborted between ticks.
/// The suite lock's freshness window uses the same constant.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Ordered, multi-valued job metadata (resume bookmarks and the like).
pub type Properties = IndexMap<String, Vec<String>>;

/// Snapshot taken when a run resumes a previously started record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeMark {
    pub resumed_at_ms: u64,
    /// Progress at the moment the resume began.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Execution state derived from a record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Never started.
    Unknown,
    /// Started, recently active, not asked to stop.
    Running,
    /// Asked to stop and still active.
    Stopping,
    /// Asked to stop and gone quiet.
    Stopped,
    /// Progress reached 1.0.
    Completed,
    /// Ended without reaching 1.0.
    Uncompleted,
    /// Started, never ended, and gone quiet — the process died silently.
    Aborted,
}

crate::simple_display! {
    RunState {
        Unknown => "unknown",
        Running => "running",
        Stopping => "stopping",
        Stopped => "stopped",
        Completed => "completed",
        Uncompleted => "uncompleted",
        Aborted => "aborted",
    }
}

impl RunState {
    /// Terminal states: the run finished on its own terms and resuming it
    /// has nothing left to do.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Uncompleted)
    }

    /// States that indicate a live owner elsewhere.
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running | RunState::Stopping)
    }
}

/// Durable execution state of one job.
///
/// One record per job id. Mutation goes through the single status updater
/// owned by the job's runner thread; the stop monitor's flag write shares
/// the same in-memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub job_id: JobId,
    /// Completion ratio in `[0, 1]`; `1.0` means complete.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
    /// Refreshed by the heartbeat and by every status write.
    #[serde(default)]
    pub last_activity_ms: u64,
    #[serde(default)]
    pub stop_requested: bool,
    /// Historical resume-attempt snapshots, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resumes: Vec<ResumeMark>,
}

impl StatusRecord {
    /// A fresh zero-value record: no progress, no timestamps.
    pub fn new(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            progress: 0.0,
            note: None,
            properties: Properties::default(),
            started_at_ms: None,
            ended_at_ms: None,
            last_activity_ms: 0,
            stop_requested: false,
            resumes: Vec::new(),
        }
    }

    /// Set progress, clamped to `[0, 1]`.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn is_completed(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn is_started(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Refresh the liveness timestamp.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    /// True when the last activity is older than [`ACTIVITY_TIMEOUT`].
    pub fn activity_stale(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity_ms) > ACTIVITY_TIMEOUT.as_millis() as u64
    }

    /// Record a resume attempt: snapshot the pre-resume progress/note, then
    /// clear the end marker, note, and stop flag, and refresh activity so
    /// the resumed record derives running again.
    pub fn mark_resumed(&mut self, now_ms: u64) {
        self.resumes.push(ResumeMark {
            resumed_at_ms: now_ms,
            progress: self.progress,
            note: self.note.take(),
        });
        self.ended_at_ms = None;
        self.stop_requested = false;
        self.last_activity_ms = now_ms;
    }

    /// Replace a property with a single value.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), vec![value.into()]);
    }

    /// Append a value to a property.
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.entry(key.into()).or_default().push(value.into());
    }

    /// First value of a property, if any.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values of a property.
    pub fn property_values(&self, key: &str) -> &[String] {
        self.properties.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Derive the execution state at `now_ms`.
    ///
    /// Precedence is fixed and checked in order, first match wins:
    /// aborted, stopped, stopping, completed, uncompleted, running, unknown.
    /// A record can therefore never read as both completed and stopped.
    pub fn state_at(&self, now_ms: u64) -> RunState {
        let stale = self.activity_stale(now_ms);
        if self.is_started()
            && !self.stop_requested
            && self.ended_at_ms.is_none()
            && !self.is_completed()
            && stale
        {
            return RunState::Aborted;
        }
        if self.stop_requested && self.is_started() {
            return if stale { RunState::Stopped } else { RunState::Stopping };
        }
        if self.is_completed() {
            return RunState::Completed;
        }
        if self.ended_at_ms.is_some() {
            return RunState::Uncompleted;
        }
        if self.is_started() {
            return RunState::Running;
        }
        RunState::Unknown
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
