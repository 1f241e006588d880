// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative stop, end to end: sentinel file in, drained suite out.

use super::helpers::Recorder;
use jobsuite_core::{EventKind, FakeClock, ACTIVITY_TIMEOUT};
use jobsuite_engine::{Job, JobSuite, StatusUpdater, SuiteContext, WorkError};
use jobsuite_storage::{FileStatusStore, StatusStore};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn stop_sentinel_drains_a_running_suite() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let recorder = Recorder::default();

    // A worker that runs until asked to stop.
    let worker = |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        status.set_progress(0.1)?;
        while !status.stop_requested() {
            std::thread::sleep(Duration::from_millis(5));
        }
        status.set_note("stopped on request")?;
        Ok(())
    };
    let root = Job::sequence("suite", vec![Job::leaf("worker", worker)]);
    let suite = JobSuite::builder(root, dir.path())
        .clock(Arc::new(clock.clone()))
        .heartbeat_interval(Duration::from_millis(20))
        .stop_poll_interval(Duration::from_millis(10))
        .listener(recorder.clone())
        .build();

    let result = std::thread::scope(|scope| {
        let execution = scope.spawn(|| suite.execute());
        // Let the worker spin up, then request the stop externally.
        std::thread::sleep(Duration::from_millis(100));
        JobSuite::request_stop(dir.path(), &"suite".into()).unwrap();
        // Give the monitor time to flag and the worker time to exit, then
        // let the activity window lapse so the records derive stopped.
        std::thread::sleep(Duration::from_millis(150));
        clock.advance(ACTIVITY_TIMEOUT + Duration::from_secs(1));
        execution.join().unwrap()
    });

    // A stopped suite is not a successful one.
    assert!(!result.unwrap());

    assert!(recorder.contains(EventKind::SuiteStopping, "suite"));
    assert!(recorder.contains(EventKind::JobStopping, "worker"));
    assert!(recorder.contains(EventKind::JobStopped, "worker"));
    assert_eq!(recorder.last_kind(), Some(EventKind::SuiteStopped));
    // The stop path owns the terminal events: no completed/terminated.
    assert!(!recorder.contains(EventKind::JobCompleted, "worker"));
    assert!(!recorder.contains(EventKind::SuiteCompleted, "suite"));
    assert!(!recorder.contains(EventKind::SuiteTerminatedPrematurely, "suite"));

    // Worker observed the request and noted its exit; the flag persisted.
    let store = FileStatusStore::new(dir.path(), Arc::new(clock.clone()));
    let worker_record = store.read(&"suite".into(), &"worker".into()).unwrap();
    assert!(worker_record.stop_requested);
    assert_eq!(worker_record.note.as_deref(), Some("stopped on request"));
}
