// src/dag/cycle.rs

//! Cycle detection over the dependency graph using DFS.

use std::collections::HashMap;

use tracing::warn;

use crate::dag::error::DagError;
use crate::dag::graph::{DependencyGraph, TaskId};

/// DFS colour; nodes absent from the map are unvisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current recursion stack.
    InProgress,
    Done,
}

impl<P> DependencyGraph<P> {
    /// Prove the graph acyclic, or report the first cycle found.
    ///
    /// Traversal starts from unvisited nodes in ID order and follows
    /// dependency edges, so the reported path reads "A depends on B depends
    /// on ... A". The check never mutates the graph and returns the same
    /// result on every call.
    pub fn detect_cycle(&self) -> Result<(), DagError> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();

        for id in self.task_ids() {
            if marks.contains_key(id) {
                continue;
            }
            if let Some(path) = visit(self, id, &mut marks, &mut stack) {
                warn!(cycle = %path.join(" -> "), "dependency cycle detected");
                return Err(DagError::Cycle { path });
            }
        }

        Ok(())
    }
}

fn visit<'g, P>(
    graph: &'g DependencyGraph<P>,
    id: &'g str,
    marks: &mut HashMap<&'g str, Mark>,
    stack: &mut Vec<&'g str>,
) -> Option<Vec<TaskId>> {
    marks.insert(id, Mark::InProgress);
    stack.push(id);

    for dep in graph.dependencies_of(id) {
        match marks.get(dep.as_str()) {
            Some(Mark::Done) => {}
            Some(Mark::InProgress) => {
                let start = stack
                    .iter()
                    .position(|entry| *entry == dep.as_str())
                    .unwrap_or(0);
                let mut path: Vec<TaskId> = stack
                    .iter()
                    .skip(start)
                    .map(|entry| entry.to_string())
                    .collect();
                path.push(dep.clone());
                return Some(path);
            }
            None => {
                if let Some(path) = visit(graph, dep, marks, stack) {
                    return Some(path);
                }
            }
        }
    }

    stack.pop();
    marks.insert(id, Mark::Done);
    None
}
