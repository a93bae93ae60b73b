// tests/graph_scenarios.rs

use taskwave::dag::{DagError, DependencyGraph, TaskSpec};
use taskwave_test_utils::{init_tracing, TaskListBuilder};

fn wave_ids(graph: &DependencyGraph<()>) -> Vec<Vec<String>> {
    graph
        .waves()
        .unwrap_or_default()
        .iter()
        .map(|w| w.tasks.clone())
        .collect()
}

#[test]
fn linear_chain_yields_one_task_per_wave() {
    init_tracing();
    let graph = TaskListBuilder::new().chain(&["T1", "T2", "T3"]).waved_graph();

    assert_eq!(wave_ids(&graph), vec![vec!["T1"], vec!["T2"], vec!["T3"]]);
    assert_eq!(graph.depth_of("T3"), Some(2));
    assert_eq!(graph.roots(), ["T1"]);
}

#[test]
fn diamond_groups_the_middle_tasks() {
    init_tracing();
    let graph = TaskListBuilder::new()
        .task("T1", &[])
        .task("T2", &["T1"])
        .task("T3", &["T1"])
        .task("T4", &["T2", "T3"])
        .waved_graph();

    assert_eq!(
        wave_ids(&graph),
        vec![vec!["T1"], vec!["T2", "T3"], vec!["T4"]]
    );
    assert_eq!(graph.dependents_of("T1"), ["T2", "T3"]);
}

#[test]
fn depth_follows_the_longest_chain() {
    // T4 hangs off both a short and a long branch.
    let graph = TaskListBuilder::new()
        .task("T1", &[])
        .task("T2", &["T1"])
        .task("T3", &["T2"])
        .task("T4", &["T1", "T3"])
        .waved_graph();

    assert_eq!(graph.depth_of("T4"), Some(3));
}

#[test]
fn disjoint_roots_share_the_first_wave() {
    let graph = TaskListBuilder::new()
        .task("B", &[])
        .task("A", &[])
        .task("C", &["B"])
        .waved_graph();

    assert_eq!(graph.roots(), ["A", "B"]);
    assert_eq!(wave_ids(&graph), vec![vec!["A", "B"], vec!["C"]]);
}

#[test]
fn two_node_cycle_is_reported_with_its_path() {
    init_tracing();
    let mut graph = TaskListBuilder::new()
        .task("T1", &["T2"])
        .task("T2", &["T1"])
        .graph();

    let err = graph.compute_waves().unwrap_err();
    assert_eq!(
        err,
        DagError::Cycle {
            path: vec!["T1".into(), "T2".into(), "T1".into()]
        }
    );
    assert_eq!(err.to_string(), "cycle detected: T1 -> T2 -> T1");
    assert!(graph.waves().is_none());
}

#[test]
fn detect_cycle_is_repeatable() {
    let graph = TaskListBuilder::new()
        .task("A", &["C"])
        .task("B", &["A"])
        .task("C", &["B"])
        .graph();

    let first = graph.detect_cycle().unwrap_err();
    let second = graph.detect_cycle().unwrap_err();
    assert_eq!(first, second);
    assert!(first.is_structural());
}

#[test]
fn dangling_dependency_names_both_tasks() {
    let err = DependencyGraph::build(vec![TaskSpec::new("T1", ()).after("T999")]).unwrap_err();

    assert_eq!(
        err,
        DagError::MissingDependency {
            task: "T1".into(),
            dependency: "T999".into()
        }
    );
    assert!(err.to_string().contains("T1"));
    assert!(err.to_string().contains("T999"));
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = DependencyGraph::build(vec![TaskSpec::new("T1", ()), TaskSpec::new("T1", ())])
        .unwrap_err();
    assert_eq!(err, DagError::DuplicateTask("T1".into()));
}

#[test]
fn empty_task_list_has_no_waves() {
    let mut graph = DependencyGraph::<()>::build(Vec::new()).unwrap();
    assert!(graph.is_empty());
    assert!(graph.compute_waves().unwrap().is_empty());
    assert!(graph.is_resolved());
}

#[test]
fn repeated_dependency_counts_once() {
    let graph = DependencyGraph::build(vec![
        TaskSpec::new("T1", ()),
        TaskSpec::new("T2", ()).after("T1").after("T1"),
    ])
    .unwrap();

    assert_eq!(graph.dependencies_of("T2"), ["T1"]);
    assert_eq!(graph.dependents_of("T1"), ["T2"]);
}

#[test]
fn dot_export_contains_every_edge() {
    let graph = TaskListBuilder::new()
        .task("T1", &[])
        .task("T2", &["T1"])
        .task("T3", &["T1"])
        .graph();

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph"));
    assert_eq!(dot.matches("->").count(), 2);
}
