// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status tree: the flattened shape of a suite's job composition graph.
//!
//! The shape (parent/child links) is derived once from the job tree and is
//! read-only afterwards, so concurrent lookup needs no locking. Records are
//! always read live from the status store, never cached here.

use crate::id::JobId;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("duplicate job id in suite tree: {0}")]
    DuplicateId(JobId),
    #[error("invalid job id {0:?}: ids must be non-empty, contain no path separators or control characters, and not be `.` or `..`")]
    InvalidId(String),
    #[error("unknown parent id {parent} for job {child}")]
    UnknownParent { parent: JobId, child: JobId },
}

/// One node of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Absent only for the root.
    pub parent: Option<JobId>,
    /// In composition order.
    pub children: Vec<JobId>,
}

/// Immutable id → node map mirroring the job composition graph.
///
/// Iteration order is depth-first insertion order; the root is first.
/// The root node id is the suite id.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTree {
    root: JobId,
    nodes: IndexMap<JobId, TreeNode>,
}

impl StatusTree {
    pub fn builder(root: impl Into<JobId>) -> Result<StatusTreeBuilder, TreeError> {
        let root = root.into();
        validate(&root)?;
        let mut nodes = IndexMap::new();
        nodes.insert(root.clone(), TreeNode { parent: None, children: Vec::new() });
        Ok(StatusTreeBuilder { root, nodes })
    }

    pub fn root(&self) -> &JobId {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Ids in depth-first insertion order, root first.
    pub fn ids(&self) -> impl Iterator<Item = &JobId> {
        self.nodes.keys()
    }

    pub fn parent_of(&self, id: &str) -> Option<&JobId> {
        self.nodes.get(id).and_then(|n| n.parent.as_ref())
    }

    pub fn children_of(&self, id: &str) -> &[JobId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builder validating ids as the shape is assembled.
#[derive(Debug)]
pub struct StatusTreeBuilder {
    root: JobId,
    nodes: IndexMap<JobId, TreeNode>,
}

impl StatusTreeBuilder {
    /// Add `id` as the next child of `parent`.
    pub fn add_child(
        &mut self,
        parent: &JobId,
        id: impl Into<JobId>,
    ) -> Result<(), TreeError> {
        let id = id.into();
        validate(&id)?;
        if self.nodes.contains_key(id.as_str()) {
            return Err(TreeError::DuplicateId(id));
        }
        let Some(node) = self.nodes.get_mut(parent.as_str()) else {
            return Err(TreeError::UnknownParent { parent: parent.clone(), child: id });
        };
        node.children.push(id.clone());
        self.nodes.insert(id, TreeNode { parent: Some(parent.clone()), children: Vec::new() });
        Ok(())
    }

    pub fn build(self) -> StatusTree {
        StatusTree { root: self.root, nodes: self.nodes }
    }
}

fn validate(id: &JobId) -> Result<(), TreeError> {
    if id.is_well_formed() {
        Ok(())
    } else {
        Err(TreeError::InvalidId(id.to_string()))
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
