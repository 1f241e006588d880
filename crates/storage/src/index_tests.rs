// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobsuite_core::StatusTree;
use std::path::PathBuf;

fn sample_tree() -> StatusTree {
    let mut b = StatusTree::builder("nightly").unwrap();
    let root = JobId::new("nightly");
    b.add_child(&root, "extract").unwrap();
    b.add_child(&root, "load").unwrap();
    let load = JobId::new("load");
    b.add_child(&load, "load-users").unwrap();
    b.add_child(&load, "load-orders").unwrap();
    b.build()
}

fn sample_config() -> StoreConfig {
    StoreConfig::File { dir: PathBuf::from("/var/jobs") }
}

#[test]
fn index_mirrors_tree_shape() {
    let index = SuiteIndex::from_tree(&sample_tree(), sample_config());

    assert_eq!(index.version, CURRENT_INDEX_VERSION);
    assert_eq!(index.job.id, "nightly");
    let child_ids: Vec<&str> = index.job.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(child_ids, ["extract", "load"]);
    assert_eq!(index.job.children[1].children.len(), 2);
}

#[test]
fn tree_round_trips_through_index() {
    let tree = sample_tree();
    let index = SuiteIndex::from_tree(&tree, sample_config());
    let back = index.to_tree().unwrap();
    assert_eq!(back, tree);
}

#[test]
fn ids_are_depth_first_root_first() {
    let index = SuiteIndex::from_tree(&sample_tree(), sample_config());
    let ids = index.ids();
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, ["nightly", "extract", "load", "load-users", "load-orders"]);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(INDEX_FILE);
    let index = SuiteIndex::from_tree(&sample_tree(), sample_config());

    index.save(&path).unwrap();
    let back = SuiteIndex::load(&path).unwrap().unwrap();
    assert_eq!(back, index);
}

#[test]
fn load_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SuiteIndex::load(&dir.path().join(INDEX_FILE)).unwrap().is_none());
}

#[test]
fn load_corrupt_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(INDEX_FILE);
    std::fs::write(&path, b"<!xml?>").unwrap();
    assert!(matches!(SuiteIndex::load(&path), Err(IndexError::Json(_))));
}

#[test]
fn duplicate_ids_in_index_fail_tree_rebuild() {
    let index = SuiteIndex {
        version: CURRENT_INDEX_VERSION,
        store: sample_config(),
        job: IndexNode {
            id: JobId::new("root"),
            children: vec![
                IndexNode { id: JobId::new("a"), children: Vec::new() },
                IndexNode { id: JobId::new("a"), children: Vec::new() },
            ],
        },
    };
    assert!(matches!(index.to_tree(), Err(TreeError::DuplicateId(_))));
}
