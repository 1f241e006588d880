// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers shared with other crates' tests.

use crate::status::StatusRecord;

/// A fresh record with the given id.
pub fn record(id: &str) -> StatusRecord {
    StatusRecord::new(id)
}

/// A record that looks like a live run: started and recently active.
pub fn running_record(id: &str, now_ms: u64) -> StatusRecord {
    let mut r = StatusRecord::new(id);
    r.started_at_ms = Some(now_ms);
    r.last_activity_ms = now_ms;
    r
}

/// A record that finished successfully.
pub fn completed_record(id: &str, now_ms: u64) -> StatusRecord {
    let mut r = running_record(id, now_ms);
    r.set_progress(1.0);
    r.ended_at_ms = Some(now_ms);
    r
}
