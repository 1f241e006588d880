// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three reference scenarios, with simulated work shortened from
//! seconds to milliseconds.

use super::helpers::{exploding_work, instant_work, timed_work, Recorder};
use jobsuite_core::{
    Clock, EventKind, FakeClock, JobId, RunState, SystemClock, ACTIVITY_TIMEOUT,
};
use jobsuite_engine::{Job, JobSuite, ResumePolicy, StatusUpdater, SuiteContext, WorkError};
use jobsuite_storage::{paths, FileStatusStore, StatusStore, StoreConfig, SuiteIndex};
use std::sync::{Arc, Mutex};

/// Scenario A: three jobs of staggered duration under a concurrency limit
/// of two; everything completes and the suite reports success.
#[test]
fn scenario_a_bounded_parallel_completes() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let root = Job::bounded(
        "batch",
        2,
        vec![
            Job::leaf("short", timed_work(3, 10)),
            Job::leaf("medium", timed_work(3, 20)),
            Job::leaf("long", timed_work(3, 30)),
        ],
    );
    let suite = JobSuite::builder(root, dir.path()).listener(recorder.clone()).build();

    let success = suite.execute().unwrap();

    assert!(success);
    let store = FileStatusStore::new(dir.path(), Arc::new(SystemClock));
    let now = SystemClock.epoch_ms();
    for id in ["short", "medium", "long", "batch"] {
        let record = store.read(&"batch".into(), &id.into()).unwrap();
        assert_eq!(record.state_at(now), RunState::Completed, "job {id}");
        assert_eq!(record.progress, 1.0, "job {id}");
    }
    assert_eq!(recorder.last_kind(), Some(EventKind::SuiteCompleted));
}

/// Scenario B: the first job of a synchronous group of two fails; the
/// second never starts, the error event carries the original message, and
/// the group reports failure.
#[test]
fn scenario_b_sync_failure_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let root = Job::sequence(
        "pipeline",
        vec![
            Job::leaf("job-1", exploding_work("runtime failure at second 2")),
            Job::leaf("job-2", instant_work()),
        ],
    );
    let suite = JobSuite::builder(root, dir.path()).listener(recorder.clone()).build();

    let success = suite.execute().unwrap();

    assert!(!success);
    // job-2 never started: no events at all for it.
    assert!(recorder.kinds_for("job-2").is_empty());
    // The original error surfaced through the error listener.
    let errors = recorder.errors();
    assert!(errors.iter().any(|(msg, id)| msg == "runtime failure at second 2" && *id == "job-1"));
    // job-1 ended without completing.
    let store = FileStatusStore::new(dir.path(), Arc::new(SystemClock));
    let record = store.read(&"pipeline".into(), &"job-1".into()).unwrap();
    let now = SystemClock.epoch_ms();
    assert_eq!(record.state_at(now), RunState::Uncompleted);
    assert_eq!(record.note.as_deref(), Some("runtime failure at second 2"));
    assert_eq!(recorder.last_kind(), Some(EventKind::SuiteTerminatedPrematurely));
}

/// Scenario C: a suite killed mid-run leaves a started-but-stale record.
/// A new instance with resume enabled reads it as aborted and re-enters
/// through the resume path, seeing the prior progress.
#[test]
fn scenario_c_crashed_suite_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = FileStatusStore::new(dir.path(), Arc::new(clock.clone()));
    let suite_id = JobId::new("nightly");

    // What the crashed run left behind: an index and a running-looking
    // record that has gone quiet.
    let seen_progress = Arc::new(Mutex::new(None::<f64>));
    let seen = Arc::clone(&seen_progress);
    let work = move |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        *seen.lock().unwrap_or_else(|e| e.into_inner()) = Some(status.progress());
        status.set_progress(1.0)?;
        Ok(())
    };
    let root = Job::leaf("nightly", work);
    SuiteIndex::from_tree(
        &root.to_tree().unwrap(),
        StoreConfig::File { dir: dir.path().to_path_buf() },
    )
    .save(&paths::index_path(dir.path(), &suite_id))
    .unwrap();
    let mut record = jobsuite_core::test_support::running_record("nightly", clock.epoch_ms());
    record.set_progress(0.4);
    store.write(&suite_id, &suite_id, &record).unwrap();
    clock.advance(ACTIVITY_TIMEOUT * 2);

    // The stale record derives aborted, not running.
    let stale = store.read(&suite_id, &suite_id).unwrap();
    assert_eq!(stale.state_at(clock.epoch_ms()), RunState::Aborted);

    let recorder = Recorder::default();
    let suite = JobSuite::builder(root, dir.path())
        .clock(Arc::new(clock.clone()))
        .resume(ResumePolicy::Resume)
        .listener(recorder.clone())
        .build();

    let success = suite.execute().unwrap();

    assert!(success);
    // Resume path, not fresh start.
    assert!(recorder.contains(EventKind::JobResumed, "nightly"));
    assert!(!recorder.contains(EventKind::JobStarted, "nightly"));
    // The work function saw the prior progress when it re-entered.
    assert_eq!(*seen_progress.lock().unwrap_or_else(|e| e.into_inner()), Some(0.4));
    // The resume attempt is on the record, and the record round-trips with
    // the documented wire fields.
    let raw = std::fs::read(paths::record_path(dir.path(), &suite_id, &suite_id)).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["job_id"], "nightly");
    assert_eq!(json["progress"], 1.0);
    assert_eq!(json["resumes"][0]["progress"], 0.4);
}
