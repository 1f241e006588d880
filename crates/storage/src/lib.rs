// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobsuite-storage: durable status records, suite index, and suite lock.

pub mod file;
pub mod index;
pub mod lock;
pub mod paths;
pub mod store;

pub use file::FileStatusStore;
pub use index::{IndexError, IndexNode, SuiteIndex, CURRENT_INDEX_VERSION, INDEX_FILE};
pub use lock::{LockError, SuiteLock};
pub use store::{StatusStore, StorageError, StoreConfig};
