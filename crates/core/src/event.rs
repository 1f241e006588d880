// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Life-cycle event types for the jobsuite system.
//!
//! Events are a closed set of kinds paired with a snapshot of the record
//! they concern. They fire synchronously, immediately after the status
//! write that caused them, so listeners always observe monotonically
//! consistent progress.

use crate::id::JobId;
use crate::status::StatusRecord;
use serde::{Deserialize, Serialize};

/// Closed set of life-cycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "suite:started")]
    SuiteStarted,
    #[serde(rename = "suite:completed")]
    SuiteCompleted,
    #[serde(rename = "suite:terminated-prematurely")]
    SuiteTerminatedPrematurely,
    #[serde(rename = "suite:aborted")]
    SuiteAborted,
    #[serde(rename = "suite:stopping")]
    SuiteStopping,
    #[serde(rename = "suite:stopped")]
    SuiteStopped,
    #[serde(rename = "job:started")]
    JobStarted,
    #[serde(rename = "job:resumed")]
    JobResumed,
    #[serde(rename = "job:skipped")]
    JobSkipped,
    #[serde(rename = "job:progressed")]
    JobProgressed,
    #[serde(rename = "job:completed")]
    JobCompleted,
    #[serde(rename = "job:terminated-prematurely")]
    JobTerminatedPrematurely,
    #[serde(rename = "job:stopping")]
    JobStopping,
    #[serde(rename = "job:stopped")]
    JobStopped,
    /// Carrier for error-listener dispatch; the error itself travels
    /// alongside the event, not inside it.
    #[serde(rename = "job:errored")]
    JobErrored,
}

crate::simple_display! {
    EventKind {
        SuiteStarted => "suite:started",
        SuiteCompleted => "suite:completed",
        SuiteTerminatedPrematurely => "suite:terminated-prematurely",
        SuiteAborted => "suite:aborted",
        SuiteStopping => "suite:stopping",
        SuiteStopped => "suite:stopped",
        JobStarted => "job:started",
        JobResumed => "job:resumed",
        JobSkipped => "job:skipped",
        JobProgressed => "job:progressed",
        JobCompleted => "job:completed",
        JobTerminatedPrematurely => "job:terminated-prematurely",
        JobStopping => "job:stopping",
        JobStopped => "job:stopped",
        JobErrored => "job:errored",
    }
}

impl EventKind {
    pub fn is_suite_kind(&self) -> bool {
        matches!(
            self,
            EventKind::SuiteStarted
                | EventKind::SuiteCompleted
                | EventKind::SuiteTerminatedPrematurely
                | EventKind::SuiteAborted
                | EventKind::SuiteStopping
                | EventKind::SuiteStopped
        )
    }
}

/// A life-cycle event with the record snapshot that produced it.
///
/// For suite-level kinds, `job_id` equals `suite_id` and the record is the
/// root job's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub suite_id: JobId,
    pub job_id: JobId,
    /// Snapshot taken synchronously after the status write.
    pub record: StatusRecord,
}

impl Event {
    pub fn new(kind: EventKind, suite_id: JobId, job_id: JobId, record: StatusRecord) -> Self {
        Self { kind, suite_id, job_id, record }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
