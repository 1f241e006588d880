// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-based status store.
//!
//! One JSON document per record under `<workdir>/<suite>/status/`. Writes go
//! through a temp file plus rename so concurrent readers never observe a
//! half-written record; a per-store mutex serializes whole read-modify-write
//! cycles so a heartbeat `touch` cannot resurrect a progress value that a
//! concurrent status write just replaced.

use crate::paths;
use crate::store::{StatusStore, StorageError};
use jobsuite_core::{Clock, JobId, StatusRecord};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

pub struct FileStatusStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    /// Serializes write and read-modify-write cycles. Plain reads stay
    /// lock-free; rename atomicity keeps them consistent.
    write_lock: Mutex<()>,
}

impl FileStatusStore {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self { dir: dir.into(), clock, write_lock: Mutex::new(()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, suite_id: &JobId, job_id: &JobId) -> PathBuf {
        paths::record_path(&self.dir, suite_id, job_id)
    }

    fn read_record(&self, suite_id: &JobId, job_id: &JobId) -> Result<StatusRecord, StorageError> {
        let path = self.record_path(suite_id, job_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StatusRecord::new(job_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            // Zero-length file: fresh record, liveness seeded from mtime.
            let mut record = StatusRecord::new(job_id.clone());
            if let Ok(modified) = path.metadata().and_then(|m| m.modified()) {
                record.last_activity_ms = modified
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
            }
            return Ok(record);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Temp-then-rename write. Callers hold `write_lock`.
    fn write_unlocked(
        &self,
        suite_id: &JobId,
        job_id: &JobId,
        record: &StatusRecord,
    ) -> Result<(), StorageError> {
        let path = self.record_path(suite_id, job_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl StatusStore for FileStatusStore {
    fn write(
        &self,
        suite_id: &JobId,
        job_id: &JobId,
        record: &StatusRecord,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.write_unlocked(suite_id, job_id, record)
    }

    fn read(&self, suite_id: &JobId, job_id: &JobId) -> Result<StatusRecord, StorageError> {
        self.read_record(suite_id, job_id)
    }

    fn remove(&self, suite_id: &JobId, job_id: &JobId) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        match fs::remove_file(self.record_path(suite_id, job_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backup(&self, suite_id: &JobId, job_id: &JobId, stamp: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let src = self.record_path(suite_id, job_id);
        if !src.exists() {
            return Ok(());
        }
        let backup_dir = paths::backup_dir(&self.dir, suite_id, stamp);
        fs::create_dir_all(&backup_dir)?;
        let dest = backup_dir.join(format!("{job_id}.json"));
        if dest.exists() {
            return Err(StorageError::BackupExists {
                job_id: job_id.clone(),
                stamp: stamp.to_string(),
            });
        }
        fs::rename(&src, &dest)?;
        tracing::debug!(suite_id = %suite_id, job_id = %job_id, stamp, "backed up status record");
        Ok(())
    }

    fn touch(&self, suite_id: &JobId, job_id: &JobId) -> Result<u64, StorageError> {
        let _guard = self.write_lock.lock();
        let mut record = self.read_record(suite_id, job_id)?;
        let now_ms = self.clock.epoch_ms();
        record.touch(now_ms);
        self.write_unlocked(suite_id, job_id, &record)?;
        Ok(now_ms)
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
