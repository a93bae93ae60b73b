// src/engine/mod.rs

//! Wave execution engine.
//!
//! This module ties together:
//! - the validated [`DependencyGraph`](crate::dag::DependencyGraph)
//! - a [`TaskExecutor`](crate::exec::TaskExecutor) that does the actual work
//! - the event stream consumed by progress reporting
//!
//! [`driver`] runs waves strictly in order with a barrier between them,
//! [`summary`] aggregates the final state, [`reporter`] logs events.

use std::time::Duration;

use crate::dag::{StatusChange, TaskId};

/// Outcome of a single execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
    /// The attempt exceeded the configured timeout.
    TimedOut,
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Knobs for the wave driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Maximum tasks running at once within a wave.
    pub max_parallel: usize,
    /// Extra attempts after a failed one.
    pub retries: u32,
    /// Per-attempt limit; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Skip everything left once a wave ends with a failure.
    pub fail_fast: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            retries: 0,
            timeout: None,
            fail_fast: false,
        }
    }
}

/// Events emitted by the driver for progress reporting and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    RunStarted {
        waves: usize,
        tasks: usize,
    },
    /// A wave is about to dispatch `tasks` (the eligible members only).
    WaveStarted {
        index: usize,
        tasks: Vec<TaskId>,
    },
    /// Every member of the wave was skipped; nothing was dispatched.
    WaveSkipped {
        index: usize,
    },
    TaskStatusChanged(StatusChange),
    TaskRetrying {
        task: TaskId,
        attempt: u32,
    },
    WaveFinished {
        index: usize,
    },
    RunFinished(RunSummary),
}

pub mod driver;
pub mod reporter;
pub mod summary;

pub use driver::{ShutdownHandle, WaveDriver};
pub use reporter::spawn_reporter;
pub use summary::RunSummary;
