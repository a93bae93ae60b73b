// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{load_and_validate, resolve_config_path};
use crate::config::model::ConfigFile;
use crate::dag::DependencyGraph;
use crate::engine::{spawn_reporter, DriverOptions, RunSummary, SchedulerEvent, WaveDriver};
use crate::errors::TaskwaveError;
use crate::exec::CommandExecutor;
use crate::types::AgentTask;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task file loading and validation
/// - graph construction and wave computation
/// - the command executor and wave driver
/// - the log reporter and Ctrl-C handling
///
/// Returns `None` when nothing was executed (`--dry-run`, `--dot`).
pub async fn run(args: CliArgs) -> Result<Option<RunSummary>> {
    let config_path = resolve_config_path(args.config.as_deref());
    let cfg = load_and_validate(&config_path)?;
    let options = apply_overrides(cfg.driver_options(), &args)?;

    let mut graph = DependencyGraph::build(cfg.task_specs()).map_err(TaskwaveError::from)?;
    graph.compute_waves().map_err(TaskwaveError::from)?;

    if args.dot {
        print!("{}", graph.to_dot());
        return Ok(None);
    }

    if args.dry_run {
        print_dry_run(&cfg, &graph, &options);
        return Ok(None);
    }

    let root_dir = config_root_dir(&config_path);
    let executor = CommandExecutor::new(root_dir);

    let (tx, rx) = mpsc::channel::<SchedulerEvent>(64);
    let reporter = spawn_reporter(rx);

    let driver = WaveDriver::new(graph, executor, options)
        .map_err(TaskwaveError::from)?
        .with_events(tx);

    // Ctrl-C → stop between waves.
    {
        let shutdown = driver.shutdown_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; finishing the current wave");
            shutdown.request();
        });
    }

    let summary = driver.run().await;

    // Dropping the driver closes the event channel so the reporter drains.
    drop(driver);
    if let Err(e) = reporter.await {
        warn!(error = %e, "reporter task ended abnormally");
    }

    Ok(Some(summary))
}

/// Fold CLI flags over the file's `[config]` values.
fn apply_overrides(mut options: DriverOptions, args: &CliArgs) -> Result<DriverOptions> {
    if let Some(n) = args.max_parallel {
        if n == 0 {
            bail!("--max-parallel must be >= 1");
        }
        options.max_parallel = n;
    }
    if let Some(retries) = args.retries {
        options.retries = retries;
    }
    if args.fail_fast {
        options.fail_fast = true;
    }
    debug!(?options, "effective driver options");
    Ok(options)
}

/// Directory commands run in.
///
/// - If the config path has a non-empty parent (e.g. "plan/Taskwave.toml"),
///   we use that directory.
/// - A bare filename falls back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_dry_run(cfg: &ConfigFile, graph: &DependencyGraph<AgentTask>, options: &DriverOptions) {
    println!("taskwave dry-run");
    println!("  max_parallel = {}", options.max_parallel);
    println!("  retries = {}", options.retries);
    if let Some(timeout) = options.timeout {
        println!("  timeout = {:?}", timeout);
    }
    println!("  fail_fast = {}", options.fail_fast);
    println!();

    let waves = graph.waves().unwrap_or_default();
    println!("tasks ({}), waves ({}):", cfg.tasks().len(), waves.len());
    for wave in waves {
        println!("  wave {}:", wave.index);
        for id in &wave.tasks {
            let title = graph.payload(id).map(|t| t.title.as_str()).unwrap_or_default();
            println!("    - {id}: {title}");
            let deps = graph.dependencies_of(id);
            if !deps.is_empty() {
                println!("        after: {}", deps.join(", "));
            }
        }
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn zero_max_parallel_override_is_rejected() {
        let args = CliArgs::try_parse_from(["taskwave", "--max-parallel", "0"]).unwrap();
        assert!(apply_overrides(DriverOptions::default(), &args).is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let args =
            CliArgs::try_parse_from(["taskwave", "--retries", "3", "--fail-fast"]).unwrap();
        let options = apply_overrides(DriverOptions::default(), &args).unwrap();
        assert_eq!(options.retries, 3);
        assert!(options.fail_fast);
        assert_eq!(options.max_parallel, 4);
    }

    #[test]
    fn root_dir_is_config_parent() {
        assert_eq!(
            config_root_dir(Path::new("plan/Taskwave.toml")),
            PathBuf::from("plan")
        );
    }
}
