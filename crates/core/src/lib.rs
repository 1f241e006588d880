// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobsuite-core: pure types for the jobsuite execution framework

pub mod macros;

pub mod clock;
pub mod event;
pub mod id;
pub mod status;
pub mod tree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{Event, EventKind};
pub use id::JobId;
pub use status::{
    Properties, ResumeMark, RunState, StatusRecord, ACTIVITY_TIMEOUT, HEARTBEAT_INTERVAL,
};
pub use tree::{StatusTree, StatusTreeBuilder, TreeError, TreeNode};
