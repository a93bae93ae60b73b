// src/dag/export.rs

//! Graphviz export of the dependency graph.

use petgraph::dot::{Config, Dot};
use petgraph::graphmap::DiGraphMap;

use crate::dag::graph::DependencyGraph;

impl<P> DependencyGraph<P> {
    /// Render the graph in DOT format.
    ///
    /// Edge direction: dependency -> dependent. For `T2` depending on `T1`
    /// the output contains an edge from `T1` to `T2`.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraphMap<&str, &str> = DiGraphMap::new();

        for id in self.task_ids() {
            graph.add_node(id);
        }

        for node in self.nodes() {
            for dep in node.dependencies() {
                graph.add_edge(dep.as_str(), node.id(), "");
            }
        }

        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::{DependencyGraph, TaskSpec};

    #[test]
    fn dot_output_lists_nodes_and_edges() {
        let g = DependencyGraph::build(vec![
            TaskSpec::new("T1", ()),
            TaskSpec::new("T2", ()).after("T1"),
        ])
        .unwrap();

        let dot = g.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("T1"));
        assert!(dot.contains("T2"));
        assert!(dot.contains("->"));
    }
}
