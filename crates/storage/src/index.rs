// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Suite index: the durable description a later process reattaches to.
//!
//! The index carries the store configuration (so the right store
//! implementation can be reconstructed) and the job tree shape exactly as
//! built at suite construction time.

use crate::store::StoreConfig;
use jobsuite_core::{JobId, StatusTree, TreeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const INDEX_FILE: &str = "suite.index.json";

/// Current index schema version
pub const CURRENT_INDEX_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt suite index: {0}")]
    Json(#[from] serde_json::Error),
    #[error("index tree is invalid: {0}")]
    Tree(#[from] TreeError),
}

/// One job node: id plus nested children, mirroring the composition graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexNode {
    pub id: JobId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IndexNode>,
}

/// Durable suite description: store configuration + job tree shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteIndex {
    /// Schema version for migrations
    #[serde(rename = "v")]
    pub version: u32,
    pub store: StoreConfig,
    pub job: IndexNode,
}

impl SuiteIndex {
    /// Build the index from a flattened status tree.
    pub fn from_tree(tree: &StatusTree, store: StoreConfig) -> Self {
        fn node(tree: &StatusTree, id: &JobId) -> IndexNode {
            IndexNode {
                id: id.clone(),
                children: tree.children_of(id).iter().map(|c| node(tree, c)).collect(),
            }
        }
        Self {
            version: CURRENT_INDEX_VERSION,
            store,
            job: node(tree, tree.root()),
        }
    }

    /// Rebuild (and revalidate) the flattened status tree.
    pub fn to_tree(&self) -> Result<StatusTree, TreeError> {
        fn walk(
            builder: &mut jobsuite_core::StatusTreeBuilder,
            parent: &JobId,
            children: &[IndexNode],
        ) -> Result<(), TreeError> {
            for child in children {
                builder.add_child(parent, child.id.clone())?;
                walk(builder, &child.id, &child.children)?;
            }
            Ok(())
        }
        let mut builder = StatusTree::builder(self.job.id.clone())?;
        walk(&mut builder, &self.job.id, &self.job.children)?;
        Ok(builder.build())
    }

    /// All job ids, depth-first, root first.
    pub fn ids(&self) -> Vec<JobId> {
        fn collect(node: &IndexNode, out: &mut Vec<JobId>) {
            out.push(node.id.clone());
            for child in &node.children {
                collect(child, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.job, &mut out);
        out
    }

    /// Load the index if present. Corruption is an error, absence is not.
    pub fn load(path: &Path) -> Result<Option<SuiteIndex>, IndexError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Persist via temp-then-rename so a crashed writer never leaves a
    /// half-written index behind.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
