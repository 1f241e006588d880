// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive suite lock marker with a freshness check.
//!
//! A marker younger than the heartbeat interval means another process owns
//! the suite; an older one was abandoned (its owner stopped heartbeating)
//! and is removed. The held file additionally carries an OS advisory lock so
//! two racing processes on the same host cannot both pass the freshness
//! check. The owner re-touches the marker every heartbeat tick via
//! [`SuiteLock::refresh`].

use fs2::FileExt;
use jobsuite_core::HEARTBEAT_INTERVAL;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("suite already running: lock {path} is fresh ({age_ms}ms old)")]
    Contended { path: PathBuf, age_ms: u64 },
    #[error("failed to lock {path}: {source}")]
    LockFailed { path: PathBuf, source: std::io::Error },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SuiteLock {
    path: PathBuf,
    file: File,
}

impl SuiteLock {
    /// Acquire the lock at `path`, removing a stale marker first.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<SuiteLock, LockError> {
        let path = path.into();
        if let Ok(meta) = path.metadata() {
            let age = meta.modified()?.elapsed().unwrap_or_default();
            if age <= HEARTBEAT_INTERVAL {
                return Err(LockError::Contended { path, age_ms: age.as_millis() as u64 });
            }
            tracing::warn!(path = %path.display(), age_ms = age.as_millis() as u64, "removing abandoned suite lock");
            fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Don't truncate before the advisory lock is held: the marker may
        // belong to a daemon that just created it.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|source| LockError::LockFailed { path: path.clone(), source })?;
        let lock = SuiteLock { path, file };
        lock.refresh()?;
        tracing::debug!(path = %lock.path.display(), "acquired suite lock");
        Ok(lock)
    }

    /// Rewrite the pid so the marker's mtime tracks the heartbeat.
    pub fn refresh(&self) -> std::io::Result<()> {
        let mut file = &self.file;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SuiteLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
