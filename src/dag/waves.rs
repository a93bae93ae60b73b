// src/dag/waves.rs

//! Depth assignment and grouping of tasks into execution waves.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::debug;

use crate::dag::error::DagError;
use crate::dag::graph::{DependencyGraph, TaskId};

/// Tasks sharing one depth value.
///
/// No task in a wave can reach another task of the same wave, so the whole
/// wave may run concurrently once every earlier wave has resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionWave {
    /// Wave position; equal to the depth of every task in it.
    pub index: usize,
    /// Task IDs, sorted.
    pub tasks: Vec<TaskId>,
}

impl ExecutionWave {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t == id)
    }
}

/// Compute the depth of every task: 0 for roots, otherwise one more than the
/// deepest dependency.
///
/// Processes nodes in topological (Kahn) order, so no recursion is involved.
/// Nodes left unprocessed mean the graph is cyclic; the cycle detector is
/// then consulted for a precise error.
pub fn compute_depths<P>(graph: &DependencyGraph<P>) -> Result<BTreeMap<TaskId, usize>, DagError> {
    let mut remaining: HashMap<&str, usize> = graph
        .nodes()
        .map(|node| (node.id(), node.dependencies().len()))
        .collect();

    let mut depths: BTreeMap<TaskId, usize> = BTreeMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for root in graph.roots() {
        depths.insert(root.clone(), 0);
        queue.push_back(root.as_str());
    }

    while let Some(id) = queue.pop_front() {
        let depth = depths.get(id).copied().unwrap_or(0);

        for dependent in graph.dependents_of(id) {
            let entry = depths.entry(dependent.clone()).or_insert(0);
            *entry = (*entry).max(depth + 1);

            if let Some(count) = remaining.get_mut(dependent.as_str()) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    queue.push_back(dependent.as_str());
                }
            }
        }
    }

    let resolved = remaining.values().filter(|count| **count == 0).count();
    if resolved < graph.len() {
        graph.detect_cycle()?;
        return Err(DagError::NoRoots(graph.len()));
    }

    Ok(depths)
}

impl<P> DependencyGraph<P> {
    /// Validate the graph and group its tasks into waves by depth.
    ///
    /// Runs cycle detection first. Writes each node's depth and caches the
    /// waves so later calls to [`waves`](Self::waves) are free. Waves are
    /// ordered by index and tasks within a wave by ID.
    pub fn compute_waves(&mut self) -> Result<Vec<ExecutionWave>, DagError> {
        self.detect_cycle()?;
        let depths = compute_depths(self)?;

        let mut grouped: BTreeMap<usize, Vec<TaskId>> = BTreeMap::new();
        for (id, depth) in depths {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.depth = Some(depth);
            }
            grouped.entry(depth).or_default().push(id);
        }

        let waves: Vec<ExecutionWave> = grouped
            .into_iter()
            .map(|(index, tasks)| ExecutionWave { index, tasks })
            .collect();

        for wave in &waves {
            debug!(wave = wave.index, tasks = ?wave.tasks, "computed execution wave");
        }

        self.waves = Some(waves.clone());
        Ok(waves)
    }

    /// Waves computed by the last successful [`compute_waves`](Self::compute_waves).
    pub fn waves(&self) -> Option<&[ExecutionWave]> {
        self.waves.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::TaskSpec;

    fn graph(tasks: &[(&str, &[&str])]) -> DependencyGraph<()> {
        DependencyGraph::build(
            tasks
                .iter()
                .map(|(id, deps)| TaskSpec::new(*id, ()).with_dependencies(deps.iter().copied())),
        )
        .unwrap()
    }

    #[test]
    fn depth_is_longest_chain_not_shortest() {
        // D depends on A directly and via B -> C.
        let g = graph(&[("A", &[]), ("B", &["A"]), ("C", &["B"]), ("D", &["A", "C"])]);
        let depths = compute_depths(&g).unwrap();
        assert_eq!(depths["A"], 0);
        assert_eq!(depths["C"], 2);
        assert_eq!(depths["D"], 3);
    }

    #[test]
    fn wave_index_matches_node_depth() {
        let mut g = graph(&[("A", &[]), ("B", &["A"]), ("C", &[]), ("D", &["B", "C"])]);
        let waves = g.compute_waves().unwrap();

        for wave in &waves {
            for id in &wave.tasks {
                assert_eq!(g.depth_of(id), Some(wave.index));
            }
        }
        assert_eq!(g.waves().map(<[_]>::len), Some(3));
    }

    #[test]
    fn empty_graph_has_no_waves() {
        let mut g = graph(&[]);
        assert_eq!(g.compute_waves().unwrap(), Vec::new());
    }

    #[test]
    fn cyclic_graph_yields_cycle_error_not_no_roots() {
        let mut g = graph(&[("A", &["B"]), ("B", &["A"])]);
        assert!(matches!(g.compute_waves(), Err(DagError::Cycle { .. })));
        assert!(matches!(compute_depths(&g), Err(DagError::Cycle { .. })));
        assert!(g.waves().is_none());
    }
}
