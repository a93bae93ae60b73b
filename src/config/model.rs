// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::TaskSpec;
use crate::engine::DriverOptions;
use crate::types::AgentTask;

/// Top-level task file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// max_parallel = 4
/// retries = 1
/// timeout = "30m"
///
/// [agent]
/// cmd = "claude -p \"$TASKWAVE_TASK_PROMPT\""
///
/// [task.T001]
/// title = "Create the data model"
/// file = "src/model.rs"
///
/// [task.T002]
/// title = "Wire the parser"
/// after = ["T001"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub agent: AgentSection,

    /// All tasks from `[task.<id>]`, keyed by task ID.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    agent: AgentSection,
    task: BTreeMap<String, TaskConfig>,
    timeout: Option<Duration>,
}

impl ConfigFile {
    /// Assemble a config whose sections were already validated.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        agent: AgentSection,
        task: BTreeMap<String, TaskConfig>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            config,
            agent,
            task,
            timeout,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn agent(&self) -> &AgentSection {
        &self.agent
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    /// Parsed `[config].timeout`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            max_parallel: self.config.max_parallel,
            retries: self.config.retries,
            timeout: self.timeout,
            fail_fast: self.config.fail_fast,
        }
    }

    /// Flatten the task table into scheduler input, ordered by task ID.
    pub fn task_specs(&self) -> Vec<TaskSpec<AgentTask>> {
        self.task
            .iter()
            .map(|(id, tc)| {
                let payload = AgentTask {
                    title: tc.title.clone().unwrap_or_else(|| id.clone()),
                    description: tc.description.clone(),
                    file: tc.file.clone(),
                    acceptance: tc.acceptance.clone(),
                    cmd: tc.effective_cmd(&self.agent).unwrap_or_default().to_string(),
                };
                TaskSpec::new(id.clone(), payload).with_dependencies(tc.after.iter().cloned())
            })
            .collect()
    }
}

/// `[config]` section: how the driver runs waves.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum tasks running at once inside a wave.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Extra attempts for a failing task.
    #[serde(default)]
    pub retries: u32,

    /// Per-attempt timeout such as `"90s"` or `"30m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Stop scheduling new waves after the first wave with a failure.
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_max_parallel() -> usize {
    4
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            retries: 0,
            timeout: None,
            fail_fast: false,
        }
    }
}

/// `[agent]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentSection {
    /// Default command for tasks that don't set their own `cmd`.
    #[serde(default)]
    pub cmd: Option<String>,
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// File the task is expected to produce or change.
    #[serde(default)]
    pub file: Option<String>,

    /// Acceptance criteria appended to the agent prompt.
    #[serde(default)]
    pub acceptance: Vec<String>,

    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Per-task override of `[agent].cmd`.
    #[serde(default)]
    pub cmd: Option<String>,
}

impl TaskConfig {
    /// The task's own command, falling back to the agent default.
    pub fn effective_cmd<'a>(&'a self, agent: &'a AgentSection) -> Option<&'a str> {
        self.cmd
            .as_deref()
            .or(agent.cmd.as_deref())
            .filter(|c| !c.trim().is_empty())
    }
}
