// src/dag/graph.rs

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::dag::error::DagError;
use crate::dag::status::StatusTracker;
use crate::dag::waves::ExecutionWave;

/// Canonical task identifier type (e.g. `"T001"`).
pub type TaskId = String;

/// One entry of the flat task list handed to [`DependencyGraph::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec<P> {
    pub id: TaskId,
    /// Tasks that must complete before this one may start.
    pub dependencies: Vec<TaskId>,
    /// Caller-owned task data; never inspected by the scheduler.
    pub payload: P,
}

impl<P> TaskSpec<P> {
    pub fn new(id: impl Into<TaskId>, payload: P) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            payload,
        }
    }

    /// Add a single dependency.
    pub fn after(mut self, dep: impl Into<TaskId>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Add several dependencies at once.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }
}

/// Node of the dependency graph: immediate deps, dependents and the payload.
#[derive(Debug, Clone)]
pub struct TaskNode<P> {
    pub(crate) id: TaskId,
    /// Direct dependencies, in declared order.
    pub(crate) dependencies: Vec<TaskId>,
    /// Direct dependents, ordered by ID.
    pub(crate) dependents: Vec<TaskId>,
    /// Longest dependency chain ending here; set by `compute_waves`.
    pub(crate) depth: Option<usize>,
    pub(crate) payload: P,
}

impl<P> TaskNode<P> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    pub fn dependents(&self) -> &[TaskId] {
        &self.dependents
    }

    /// `None` until [`DependencyGraph::compute_waves`] has run.
    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// In-memory task dependency graph keyed by task ID.
///
/// The graph exclusively owns its nodes. Structure is fixed after
/// [`build`](Self::build); the only mutation afterwards goes through the
/// status transition methods, which are safe to call from concurrent workers.
#[derive(Debug)]
pub struct DependencyGraph<P> {
    pub(crate) nodes: BTreeMap<TaskId, TaskNode<P>>,
    roots: Vec<TaskId>,
    pub(crate) waves: Option<Vec<ExecutionWave>>,
    pub(crate) tracker: StatusTracker,
}

impl<P> DependencyGraph<P> {
    /// Build a graph from a flat task list.
    ///
    /// Fails on a duplicate ID (before any edge is wired) or on a dependency
    /// that names a task not present in the list. Cycles are *not* detected
    /// here; see [`detect_cycle`](Self::detect_cycle).
    pub fn build<I>(tasks: I) -> Result<Self, DagError>
    where
        I: IntoIterator<Item = TaskSpec<P>>,
    {
        let mut nodes: BTreeMap<TaskId, TaskNode<P>> = BTreeMap::new();

        // First pass: create nodes with their dependency lists.
        for spec in tasks {
            let TaskSpec {
                id,
                dependencies,
                payload,
            } = spec;

            match nodes.entry(id) {
                Entry::Occupied(existing) => {
                    return Err(DagError::DuplicateTask(existing.key().clone()));
                }
                Entry::Vacant(slot) => {
                    let id = slot.key().clone();
                    slot.insert(TaskNode {
                        id,
                        dependencies: dedup_preserving_order(dependencies),
                        dependents: Vec::new(),
                        depth: None,
                        payload,
                    });
                }
            }
        }

        // Second pass: populate dependents based on deps.
        let edges: Vec<(TaskId, TaskId)> = nodes
            .values()
            .flat_map(|node| {
                node.dependencies
                    .iter()
                    .map(move |dep| (node.id.clone(), dep.clone()))
            })
            .collect();

        for (task, dependency) in edges {
            match nodes.get_mut(&dependency) {
                Some(dep_node) => dep_node.dependents.push(task),
                None => return Err(DagError::MissingDependency { task, dependency }),
            }
        }

        let roots: Vec<TaskId> = nodes
            .values()
            .filter(|node| node.is_root())
            .map(|node| node.id.clone())
            .collect();

        let tracker = StatusTracker::new(nodes.keys().cloned());

        debug!(tasks = nodes.len(), ?roots, "dependency graph built");

        Ok(Self {
            nodes,
            roots,
            waves: None,
            tracker,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Tasks without dependencies, sorted by ID.
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn node(&self, id: &str) -> Option<&TaskNode<P>> {
        self.nodes.get(id)
    }

    /// All nodes, ordered by ID.
    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode<P>> {
        self.nodes.values()
    }

    /// All task IDs, sorted.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn payload(&self, id: &str) -> Option<&P> {
        self.nodes.get(id).map(|n| &n.payload)
    }

    /// Immediate dependencies of a task; empty for unknown IDs.
    pub fn dependencies_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task; empty for unknown IDs.
    pub fn dependents_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Depth of a task, once waves have been computed.
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.nodes.get(id).and_then(|n| n.depth)
    }
}

fn dedup_preserving_order(deps: Vec<TaskId>) -> Vec<TaskId> {
    let mut seen = HashSet::new();
    deps.into_iter().filter(|d| seen.insert(d.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, deps: &[&str]) -> TaskSpec<()> {
        TaskSpec::new(id, ()).with_dependencies(deps.iter().copied())
    }

    #[test]
    fn wires_dependents_in_id_order() {
        let graph = DependencyGraph::build(vec![
            spec("T3", &["T1"]),
            spec("T1", &[]),
            spec("T2", &["T1"]),
        ])
        .unwrap();

        assert_eq!(graph.dependents_of("T1"), ["T2", "T3"]);
        assert_eq!(graph.dependencies_of("T3"), ["T1"]);
        assert_eq!(graph.roots(), ["T1"]);
    }

    #[test]
    fn duplicate_dependency_entries_collapse() {
        let graph =
            DependencyGraph::build(vec![spec("A", &[]), spec("B", &["A", "A"])]).unwrap();

        assert_eq!(graph.dependencies_of("B"), ["A"]);
        assert_eq!(graph.dependents_of("A"), ["B"]);
    }

    #[test]
    fn duplicate_id_fails_before_wiring() {
        // The dangling "X" would fail pass two; the duplicate must win.
        let err = DependencyGraph::build(vec![spec("A", &["X"]), spec("A", &[])]).unwrap_err();
        assert_eq!(err, DagError::DuplicateTask("A".to_string()));
    }

    #[test]
    fn unknown_ids_have_no_edges() {
        let graph = DependencyGraph::build(vec![spec("A", &[])]).unwrap();
        assert!(graph.dependencies_of("nope").is_empty());
        assert!(graph.dependents_of("nope").is_empty());
        assert!(graph.payload("nope").is_none());
    }
}
