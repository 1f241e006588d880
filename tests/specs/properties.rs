// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end renditions of the framework's testable properties.

use super::helpers::{instant_work, Recorder};
use jobsuite_core::{Clock, EventKind, FakeClock, JobId, RunState, SystemClock, ACTIVITY_TIMEOUT};
use jobsuite_engine::{Job, JobSuite, ResumePolicy, StatusUpdater, SuiteContext, WorkError};
use jobsuite_storage::{paths, FileStatusStore, StatusStore, StoreConfig, SuiteIndex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Completed children of a resumed run are skipped: their work never
/// re-runs and only `job:skipped` fires for them.
#[test]
fn resume_skips_completed_children() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let store = FileStatusStore::new(dir.path(), Arc::new(clock.clone()));
    let suite_id = JobId::new("batch");

    let done_runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done_runs);
    let done_work = move |status: &mut StatusUpdater,
                          _ctx: &SuiteContext|
          -> Result<(), WorkError> {
        counter.fetch_add(1, Ordering::SeqCst);
        status.set_progress(1.0)?;
        Ok(())
    };
    let root = Job::sequence(
        "batch",
        vec![Job::leaf("done", done_work), Job::leaf("pending", instant_work())],
    );

    // Prior run: group aborted mid-way, first child already completed.
    SuiteIndex::from_tree(
        &root.to_tree().unwrap(),
        StoreConfig::File { dir: dir.path().to_path_buf() },
    )
    .save(&paths::index_path(dir.path(), &suite_id))
    .unwrap();
    let now = clock.epoch_ms();
    let mut group = jobsuite_core::test_support::running_record("batch", now);
    group.set_progress(0.5);
    store.write(&suite_id, &suite_id, &group).unwrap();
    let done = jobsuite_core::test_support::completed_record("done", now);
    store.write(&suite_id, &"done".into(), &done).unwrap();
    clock.advance(ACTIVITY_TIMEOUT * 2);

    let recorder = Recorder::default();
    let suite = JobSuite::builder(root, dir.path())
        .clock(Arc::new(clock.clone()))
        .resume(ResumePolicy::Resume)
        .listener(recorder.clone())
        .build();
    let success = suite.execute().unwrap();

    assert!(success);
    assert_eq!(done_runs.load(Ordering::SeqCst), 0, "completed work must not re-run");
    assert_eq!(recorder.kinds_for("done"), [EventKind::JobSkipped]);
    assert!(recorder.contains(EventKind::JobResumed, "batch"));
    assert!(recorder.contains(EventKind::JobStarted, "pending"));
}

/// The aggregate equals the mean of the children and hits exactly 1.0 when
/// every child does.
#[test]
fn aggregate_progress_is_exact_at_completion() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let children: Vec<Job> =
        (0..7).map(|i| Job::leaf(format!("c{i}"), instant_work())).collect();
    let suite = JobSuite::builder(Job::parallel("batch", children), dir.path())
        .listener(recorder.clone())
        .build();

    assert!(suite.execute().unwrap());

    let store = FileStatusStore::new(dir.path(), Arc::new(SystemClock));
    let record = store.read(&"batch".into(), &"batch".into()).unwrap();
    assert_eq!(record.progress, 1.0);
    assert_eq!(record.note.as_deref(), Some("7 of 7 jobs completed"));
}

/// Progress events observed by listeners never regress for a single job
/// and never exceed 1.0 — writes are ordered and synchronous.
#[test]
fn progress_events_are_monotonic_per_job() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let stepper = |status: &mut StatusUpdater, _ctx: &SuiteContext| -> Result<(), WorkError> {
        for step in 1..=10 {
            status.set_progress(f64::from(step) / 10.0)?;
        }
        Ok(())
    };
    let suite = JobSuite::builder(Job::leaf("stepper", stepper), dir.path())
        .listener(recorder.clone())
        .build();

    assert!(suite.execute().unwrap());

    let progressions: Vec<f64> = recorder
        .events()
        .iter()
        .filter(|e| e.kind == EventKind::JobProgressed && e.job_id == "stepper")
        .map(|e| e.record.progress)
        .collect();
    assert_eq!(progressions.len(), 10);
    for pair in progressions.windows(2) {
        assert!(pair[0] <= pair[1], "progress regressed: {pair:?}");
    }
    assert!(progressions.iter().all(|p| (0.0..=1.0).contains(p)));
}

/// A parallel group preserves each sibling's individual outcome in its own
/// record even when one of them fails.
#[test]
fn parallel_outcomes_are_preserved_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let root = Job::parallel(
        "fanout",
        vec![
            Job::leaf("ok-1", instant_work()),
            Job::leaf("bad", super::helpers::exploding_work("no such table")),
            Job::leaf("ok-2", instant_work()),
        ],
    );
    let suite = JobSuite::builder(root, dir.path()).listener(recorder.clone()).build();

    assert!(!suite.execute().unwrap());

    let store = FileStatusStore::new(dir.path(), Arc::new(SystemClock));
    let now = SystemClock.epoch_ms();
    let state = |id: &str| store.read(&"fanout".into(), &id.into()).unwrap().state_at(now);
    assert_eq!(state("ok-1"), RunState::Completed);
    assert_eq!(state("ok-2"), RunState::Completed);
    assert_eq!(state("bad"), RunState::Uncompleted);
    // Group note names the failure.
    let group = store.read(&"fanout".into(), &"fanout".into()).unwrap();
    assert!(group.note.unwrap_or_default().contains("bad"));
}
