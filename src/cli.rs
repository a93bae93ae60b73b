// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskwave`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskwave",
    version,
    about = "Run interdependent agent tasks in parallel waves.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (TOML).
    ///
    /// Default: `TASKWAVE_CONFIG`, else `Taskwave.toml` in the current
    /// working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKWAVE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the task file and print the waves, but run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the dependency graph in Graphviz DOT format and exit.
    #[arg(long)]
    pub dot: bool,

    /// Override `[config].max_parallel`.
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Override `[config].retries`.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Skip all remaining waves after the first wave with a failure.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_parse() {
        let args = CliArgs::try_parse_from([
            "taskwave",
            "--config",
            "plan/Taskwave.toml",
            "--max-parallel",
            "2",
            "--retries",
            "1",
            "--fail-fast",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.config.as_deref(), Some("plan/Taskwave.toml"));
        assert_eq!(args.max_parallel, Some(2));
        assert_eq!(args.retries, Some(1));
        assert!(args.fail_fast);
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(!args.dry_run);
    }

    #[test]
    fn defaults_leave_file_values_alone() {
        let args = CliArgs::try_parse_from(["taskwave"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.max_parallel.is_none());
        assert!(args.retries.is_none());
        assert!(!args.fail_fast);
    }
}
