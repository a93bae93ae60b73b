// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The wave driver talks to a `TaskExecutor` instead of spawning processes
//! itself. Production code uses [`CommandExecutor`](super::CommandExecutor);
//! tests provide fakes that script outcomes without touching the OS.

use std::future::Future;
use std::pin::Pin;

use crate::engine::TaskOutcome;
use crate::errors::Result;

/// Executes one unit of work for a task.
///
/// The driver calls this once per attempt. `Ok(TaskOutcome::Success)` marks
/// the attempt successful; any other outcome, or an `Err`, counts as a failed
/// attempt. The implementation decides what "work" means (spawning an agent,
/// writing a file, ...); it only has to return eventually.
pub trait TaskExecutor<P>: Send + Sync {
    fn execute<'a>(
        &'a self,
        task: &'a str,
        payload: &'a P,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'a>>;
}
