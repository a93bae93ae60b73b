// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskwaveError};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskwaveError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let timeout = parse_timeout(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.agent, raw.task, timeout))
    }
}

/// Checks the parts of the file the scheduler does not own.
///
/// Dependency references and cycles are deliberately left to
/// `DependencyGraph`, whose errors name the offending tasks and the full
/// cycle path.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_ids(cfg)?;
    validate_task_commands(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskwaveError::ConfigError(
            "config must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.max_parallel == 0 {
        return Err(TaskwaveError::ConfigError(
            "[config].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_ids(cfg: &RawConfigFile) -> Result<()> {
    for id in cfg.task.keys() {
        if id.trim().is_empty() || id.chars().any(char::is_whitespace) {
            return Err(TaskwaveError::ConfigError(format!(
                "invalid task id '{}': ids must be non-empty and contain no whitespace",
                id
            )));
        }
    }
    Ok(())
}

fn validate_task_commands(cfg: &RawConfigFile) -> Result<()> {
    for (id, task) in cfg.task.iter() {
        if task.effective_cmd(&cfg.agent).is_none() {
            return Err(TaskwaveError::ConfigError(format!(
                "task '{}' has no `cmd` and [agent].cmd is not set",
                id
            )));
        }
    }
    Ok(())
}

fn parse_timeout(cfg: &RawConfigFile) -> Result<Option<std::time::Duration>> {
    cfg.config
        .timeout
        .as_deref()
        .map(|raw| {
            let limit = parse_duration(raw).map_err(|e| {
                TaskwaveError::ConfigError(format!("invalid [config].timeout '{}': {}", raw, e))
            })?;
            if limit.is_zero() {
                return Err(TaskwaveError::ConfigError(format!(
                    "[config].timeout must be greater than zero (got '{}')",
                    raw
                )));
            }
            Ok(limit)
        })
        .transpose()
}
