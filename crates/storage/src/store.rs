// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable status store contract.

use crate::file::FileStatusStore;
use jobsuite_core::{Clock, JobId, StatusRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the durable status store.
///
/// Any store failure is fatal to the job being tracked: an un-persisted
/// status makes resume unsafe, so these are never swallowed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backup for job {job_id} already exists at stamp {stamp}")]
    BackupExists { job_id: JobId, stamp: String },
}

/// Persistence contract for status records, keyed by (suite id, job id).
///
/// Implementations must make `write` atomic with respect to concurrent
/// readers (a reader never observes a half-written record) and must
/// serialize their own read-modify-write cycles (`touch`), since both job
/// threads and the heartbeat thread call in concurrently.
pub trait StatusStore: Send + Sync {
    /// Durably persist the record.
    fn write(
        &self,
        suite_id: &JobId,
        job_id: &JobId,
        record: &StatusRecord,
    ) -> Result<(), StorageError>;

    /// Read the current record. A missing record is not an error: a fresh
    /// zero-value record is returned instead.
    fn read(&self, suite_id: &JobId, job_id: &JobId) -> Result<StatusRecord, StorageError>;

    /// Delete persisted state; subsequent reads behave as fresh.
    fn remove(&self, suite_id: &JobId, job_id: &JobId) -> Result<(), StorageError>;

    /// Atomically relocate the current record into the backup partition for
    /// `stamp`. Never overwrites an existing backup for the same
    /// stamp/id pair. Relocating a record that does not exist is a no-op.
    fn backup(&self, suite_id: &JobId, job_id: &JobId, stamp: &str) -> Result<(), StorageError>;

    /// Update only the liveness timestamp, creating the record if absent.
    /// Returns the new timestamp.
    fn touch(&self, suite_id: &JobId, job_id: &JobId) -> Result<u64, StorageError>;
}

/// Serializable description of a store, embedded in the suite index so a
/// later process can reconstruct the same store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    File { dir: PathBuf },
}

impl StoreConfig {
    /// Reconstruct the store this configuration describes.
    pub fn open(&self, clock: Arc<dyn Clock>) -> Arc<dyn StatusStore> {
        match self {
            StoreConfig::File { dir } => Arc::new(FileStatusStore::new(dir.clone(), clock)),
        }
    }
}
