// src/dag/status.rs

//! Per-task execution status and the transition rules between states.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::dag::error::DagError;
use crate::dag::graph::{DependencyGraph, TaskId};
use crate::dag::propagate::skip_dependents;

/// Execution state of a task.
///
/// ```text
/// Pending -> Running -> Completed
///                    -> Failed
/// Pending -> Skipped            (failure propagation only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Can never run because an upstream task failed or was skipped.
    Skipped,
}

impl TaskStatus {
    /// Completed, Failed and Skipped are final.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Skipped)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single applied status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub task: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

impl StatusChange {
    pub(crate) fn new(task: impl Into<TaskId>, from: TaskStatus, to: TaskStatus) -> Self {
        Self {
            task: task.into(),
            from,
            to,
        }
    }
}

/// Number of tasks in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed + self.skipped
    }

    /// Tasks not yet in a terminal state.
    pub fn unresolved(&self) -> usize {
        self.pending + self.running
    }
}

/// Status map guarded by a single mutex.
///
/// Wave sizes are small, so one coarse lock is enough; every read returns a
/// copy and the guard never escapes the graph.
#[derive(Debug)]
pub(crate) struct StatusTracker {
    statuses: Mutex<BTreeMap<TaskId, TaskStatus>>,
}

impl StatusTracker {
    pub(crate) fn new(ids: impl IntoIterator<Item = TaskId>) -> Self {
        let statuses = ids
            .into_iter()
            .map(|id| (id, TaskStatus::Pending))
            .collect();
        Self {
            statuses: Mutex::new(statuses),
        }
    }

    /// A panicking worker cannot leave the map half-written (every update is
    /// a single insert), so a poisoned lock is still usable.
    pub(crate) fn lock(&self) -> MutexGuard<'_, BTreeMap<TaskId, TaskStatus>> {
        self.statuses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P> DependencyGraph<P> {
    /// Current status of a task, or `None` if unknown.
    pub fn status(&self, id: &str) -> Option<TaskStatus> {
        self.tracker.lock().get(id).copied()
    }

    /// Snapshot of every task's status, sorted by ID.
    pub fn statuses(&self) -> Vec<(TaskId, TaskStatus)> {
        self.tracker
            .lock()
            .iter()
            .map(|(id, status)| (id.clone(), *status))
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        let statuses = self.tracker.lock();
        let mut counts = StatusCounts::default();
        for status in statuses.values() {
            match status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
                TaskStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    /// IDs of tasks currently in `status`, sorted.
    pub fn tasks_with_status(&self, status: TaskStatus) -> Vec<TaskId> {
        self.tracker
            .lock()
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether every dependency of `id` has completed. `None` if unknown.
    pub fn dependencies_completed(&self, id: &str) -> Option<bool> {
        let node = self.node(id)?;
        let statuses = self.tracker.lock();
        Some(
            node.dependencies()
                .iter()
                .all(|dep| statuses.get(dep) == Some(&TaskStatus::Completed)),
        )
    }

    /// True once no task is `Pending` or `Running`.
    pub fn is_resolved(&self) -> bool {
        self.tracker
            .lock()
            .values()
            .all(|status| status.is_terminal())
    }

    /// Apply a transition requested by the caller.
    ///
    /// Returns every change applied, starting with the requested one. A
    /// transition to `Failed` also skips the failed task's pending
    /// descendants; those skips follow in the returned list.
    ///
    /// Errors:
    /// - [`DagError::TaskNotFound`] for an unknown ID
    /// - [`DagError::IllegalTransition`] for any edge outside the state
    ///   machine, including every transition out of a terminal state and any
    ///   direct request for `Skipped` (reserved for propagation)
    /// - [`DagError::DependenciesNotMet`] when starting a task whose
    ///   dependencies are not all `Completed`
    pub fn set_status(&self, id: &str, next: TaskStatus) -> Result<Vec<StatusChange>, DagError> {
        let mut statuses = self.tracker.lock();

        let current = statuses
            .get(id)
            .copied()
            .ok_or_else(|| DagError::TaskNotFound(id.to_string()))?;

        if next == TaskStatus::Skipped || !current.can_transition_to(next) {
            return Err(DagError::IllegalTransition {
                task: id.to_string(),
                from: current,
                to: next,
            });
        }

        if next == TaskStatus::Running {
            let blocking: Vec<TaskId> = self
                .dependencies_of(id)
                .iter()
                .filter(|dep| statuses.get(dep.as_str()) != Some(&TaskStatus::Completed))
                .cloned()
                .collect();
            if !blocking.is_empty() {
                return Err(DagError::DependenciesNotMet {
                    task: id.to_string(),
                    blocking,
                });
            }
        }

        statuses.insert(id.to_string(), next);
        debug!(task = %id, from = %current, to = %next, "task status changed");

        let mut changes = vec![StatusChange::new(id, current, next)];
        if next == TaskStatus::Failed {
            changes.extend(skip_dependents(self, &mut statuses, id));
        }

        Ok(changes)
    }

    /// `Pending -> Running`.
    pub fn start(&self, id: &str) -> Result<Vec<StatusChange>, DagError> {
        self.set_status(id, TaskStatus::Running)
    }

    /// `Running -> Completed`.
    pub fn complete(&self, id: &str) -> Result<Vec<StatusChange>, DagError> {
        self.set_status(id, TaskStatus::Completed)
    }

    /// `Running -> Failed`, followed by failure propagation.
    pub fn fail(&self, id: &str) -> Result<Vec<StatusChange>, DagError> {
        self.set_status(id, TaskStatus::Failed)
    }
}
