// src/dag/propagate.rs

//! Failure propagation: skipping tasks that can no longer run.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, warn};

use crate::dag::error::DagError;
use crate::dag::graph::{DependencyGraph, TaskId};
use crate::dag::status::{StatusChange, TaskStatus};

/// Walk outward from `origin` along dependent edges and mark every reachable
/// `Pending` task as `Skipped`.
///
/// The walk continues through newly skipped tasks and stops at anything
/// else: `Running` tasks are left to finish, terminal tasks are never
/// re-entered. Must be called with the status lock held.
pub(crate) fn skip_dependents<P>(
    graph: &DependencyGraph<P>,
    statuses: &mut BTreeMap<TaskId, TaskStatus>,
    origin: &str,
) -> Vec<StatusChange> {
    let mut queue: VecDeque<&str> = graph
        .dependents_of(origin)
        .iter()
        .map(String::as_str)
        .collect();
    let mut changes = Vec::new();

    while let Some(name) = queue.pop_front() {
        let Some(status) = statuses.get_mut(name) else {
            warn!(task = %name, "dependent missing from status map");
            continue;
        };

        match *status {
            TaskStatus::Pending => {
                *status = TaskStatus::Skipped;
                debug!(task = %name, origin = %origin, "skipping dependent of failed task");
                changes.push(StatusChange::new(name, TaskStatus::Pending, TaskStatus::Skipped));
                queue.extend(graph.dependents_of(name).iter().map(String::as_str));
            }
            TaskStatus::Running => {
                warn!(
                    task = %name,
                    origin = %origin,
                    "dependent already running when upstream failed; leaving it to finish"
                );
            }
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped => {}
        }
    }

    changes
}

impl<P> DependencyGraph<P> {
    /// Re-run propagation from a task that is already `Failed` or `Skipped`.
    ///
    /// Returns no changes for tasks in any other state.
    pub fn propagate_failure(&self, id: &str) -> Result<Vec<StatusChange>, DagError> {
        let mut statuses = self.tracker.lock();
        let status = statuses
            .get(id)
            .copied()
            .ok_or_else(|| DagError::TaskNotFound(id.to_string()))?;

        if !matches!(status, TaskStatus::Failed | TaskStatus::Skipped) {
            return Ok(Vec::new());
        }

        Ok(skip_dependents(self, &mut statuses, id))
    }

    /// Skip a `Pending` task whose dependency chain can no longer complete.
    ///
    /// If any direct dependency is `Failed` or `Skipped`, the task becomes
    /// `Skipped` and its own pending descendants follow. Otherwise nothing
    /// changes.
    pub fn skip_blocked(&self, id: &str) -> Result<Vec<StatusChange>, DagError> {
        let mut statuses = self.tracker.lock();
        let status = statuses
            .get(id)
            .copied()
            .ok_or_else(|| DagError::TaskNotFound(id.to_string()))?;

        if status != TaskStatus::Pending {
            return Ok(Vec::new());
        }

        let blocker = self
            .dependencies_of(id)
            .iter()
            .find(|dep| {
                matches!(
                    statuses.get(dep.as_str()),
                    Some(TaskStatus::Failed) | Some(TaskStatus::Skipped)
                )
            })
            .cloned();

        let Some(blocker) = blocker else {
            return Ok(Vec::new());
        };

        statuses.insert(id.to_string(), TaskStatus::Skipped);
        debug!(task = %id, blocked_by = %blocker, "skipping task with unreachable dependency");

        let mut changes = vec![StatusChange::new(id, TaskStatus::Pending, TaskStatus::Skipped)];
        changes.extend(skip_dependents(self, &mut statuses, id));
        Ok(changes)
    }

    /// Skip every task still `Pending`. Used when the caller aborts a run.
    pub fn abort_pending(&self) -> Vec<StatusChange> {
        let mut statuses = self.tracker.lock();
        let mut changes = Vec::new();

        for (id, status) in statuses.iter_mut() {
            if *status == TaskStatus::Pending {
                *status = TaskStatus::Skipped;
                changes.push(StatusChange::new(id.clone(), TaskStatus::Pending, TaskStatus::Skipped));
            }
        }

        if !changes.is_empty() {
            warn!(skipped = changes.len(), "run aborted; skipping all pending tasks");
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::{DependencyGraph, TaskSpec, TaskStatus};

    fn chain() -> DependencyGraph<()> {
        DependencyGraph::build(vec![
            TaskSpec::new("A", ()),
            TaskSpec::new("B", ()).after("A"),
            TaskSpec::new("C", ()).after("B"),
            TaskSpec::new("D", ()).after("C"),
        ])
        .unwrap()
    }

    #[test]
    fn failure_skips_whole_downstream_chain() {
        let g = chain();
        g.start("A").unwrap();
        let changes = g.fail("A").unwrap();

        let skipped: Vec<&str> = changes
            .iter()
            .filter(|c| c.to == TaskStatus::Skipped)
            .map(|c| c.task.as_str())
            .collect();
        assert_eq!(skipped, ["B", "C", "D"]);
        assert!(g.is_resolved());
    }

    #[test]
    fn propagate_failure_is_a_noop_for_healthy_tasks() {
        let g = chain();
        assert!(g.propagate_failure("A").unwrap().is_empty());
        assert_eq!(g.status("B"), Some(TaskStatus::Pending));
    }

    #[test]
    fn skip_blocked_leaves_unblocked_tasks_alone() {
        let g = chain();
        assert!(g.skip_blocked("B").unwrap().is_empty());
        assert_eq!(g.status("B"), Some(TaskStatus::Pending));
        assert!(g.skip_blocked("missing").is_err());
    }

    #[test]
    fn abort_pending_only_touches_pending() {
        let g = chain();
        g.start("A").unwrap();
        let changes = g.abort_pending();
        assert_eq!(changes.len(), 3);
        assert_eq!(g.status("A"), Some(TaskStatus::Running));
        assert_eq!(g.tasks_with_status(TaskStatus::Skipped), ["B", "C", "D"]);
    }
}
