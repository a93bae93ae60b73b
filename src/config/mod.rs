// src/config/mod.rs

//! Task file loading and validation for taskwave.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a task file from disk (`loader.rs`).
//! - Validate settings and commands (`validate.rs`); graph structure is
//!   validated by [`crate::dag`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_config_path};
pub use model::{AgentSection, ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
