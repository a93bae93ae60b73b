// src/dag/mod.rs

//! Task dependency graph and wave computation.
//!
//! - [`graph`] builds the validated node set with forward and backward edges.
//! - [`cycle`] proves acyclicity (or reports the offending cycle).
//! - [`waves`] assigns depths and groups tasks into execution waves.
//! - [`status`] tracks per-task state and enforces legal transitions.
//! - [`propagate`] skips tasks whose dependency chain can no longer complete.
//! - [`export`] renders the graph as Graphviz DOT.

pub mod cycle;
pub mod error;
pub mod export;
pub mod graph;
pub mod propagate;
pub mod status;
pub mod waves;

pub use error::DagError;
pub use graph::{DependencyGraph, TaskId, TaskNode, TaskSpec};
pub use status::{StatusChange, StatusCounts, TaskStatus};
pub use waves::{compute_depths, ExecutionWave};
