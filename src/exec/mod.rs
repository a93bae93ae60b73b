// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] defines the `TaskExecutor` trait the wave driver calls.
//! - [`command`] provides `CommandExecutor`, which runs each task's agent
//!   command with `tokio::process::Command`.

pub mod backend;
pub mod command;

pub use backend::TaskExecutor;
pub use command::CommandExecutor;
