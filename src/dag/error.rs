// src/dag/error.rs

//! Structured errors raised by the dependency graph.

use thiserror::Error;

use crate::dag::graph::TaskId;
use crate::dag::status::TaskStatus;

/// Errors produced while building, validating or mutating a [`DependencyGraph`].
///
/// The first four variants are *structural*: they are raised before any task
/// runs and abort scheduling. The rest are *transition* errors surfaced to the
/// caller during execution without corrupting the graph.
///
/// [`DependencyGraph`]: crate::dag::DependencyGraph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DagError {
    #[error("duplicate task '{0}'")]
    DuplicateTask(TaskId),

    #[error("task '{task}' depends on non-existent task '{dependency}'")]
    MissingDependency { task: TaskId, dependency: TaskId },

    #[error("cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<TaskId> },

    /// Non-empty graph without a single root. Only reachable when cycle
    /// detection was bypassed.
    #[error("graph has {0} tasks but no root task")]
    NoRoots(usize),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("illegal transition for task '{task}': {from} -> {to}")]
    IllegalTransition {
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("task '{task}' cannot start; unfinished dependencies: {}", .blocking.join(", "))]
    DependenciesNotMet { task: TaskId, blocking: Vec<TaskId> },
}

impl DagError {
    /// Whether this error makes the whole graph unusable for scheduling.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DagError::DuplicateTask(_)
                | DagError::MissingDependency { .. }
                | DagError::Cycle { .. }
                | DagError::NoRoots(_)
        )
    }
}
