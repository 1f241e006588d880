// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work directory layout.
//!
//! Everything a suite persists lives under `<workdir>/<suite-id>/`:
//!
//! ```text
//! <workdir>/<suite-id>/status/<job-id>.json       current records
//! <workdir>/<suite-id>/status/suite.index.json    suite index
//! <workdir>/<suite-id>/status/suite.index.json.lck  lock marker
//! <workdir>/<suite-id>/backups/status/<stamp>/    prior-run backups
//! <workdir>/<suite-id>/stop                       stop sentinel
//! ```

use jobsuite_core::JobId;
use std::path::{Path, PathBuf};

use crate::index::INDEX_FILE;

pub fn suite_dir(workdir: &Path, suite_id: &JobId) -> PathBuf {
    workdir.join(suite_id.as_str())
}

pub fn status_dir(workdir: &Path, suite_id: &JobId) -> PathBuf {
    suite_dir(workdir, suite_id).join("status")
}

pub fn record_path(workdir: &Path, suite_id: &JobId, job_id: &JobId) -> PathBuf {
    status_dir(workdir, suite_id).join(format!("{job_id}.json"))
}

pub fn index_path(workdir: &Path, suite_id: &JobId) -> PathBuf {
    status_dir(workdir, suite_id).join(INDEX_FILE)
}

pub fn lock_path(workdir: &Path, suite_id: &JobId) -> PathBuf {
    status_dir(workdir, suite_id).join(format!("{INDEX_FILE}.lck"))
}

pub fn backup_dir(workdir: &Path, suite_id: &JobId, stamp: &str) -> PathBuf {
    suite_dir(workdir, suite_id).join("backups").join("status").join(stamp)
}

pub fn stop_sentinel(workdir: &Path, suite_id: &JobId) -> PathBuf {
    suite_dir(workdir, suite_id).join("stop")
}

/// Timestamp partition label for backups, millisecond precision.
pub fn backup_stamp() -> String {
    chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f").to_string()
}
