#![allow(dead_code)]

use std::collections::BTreeMap;

use taskwave::config::{AgentSection, ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use taskwave::dag::{DependencyGraph, TaskSpec};

/// Builder for payload-free task lists, the usual input of graph tests.
///
/// ```ignore
/// let graph = TaskListBuilder::new()
///     .task("T1", &[])
///     .task("T2", &["T1"])
///     .graph();
/// ```
#[derive(Debug, Default)]
pub struct TaskListBuilder {
    specs: Vec<TaskSpec<()>>,
}

impl TaskListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, id: &str, after: &[&str]) -> Self {
        self.specs
            .push(TaskSpec::new(id, ()).with_dependencies(after.iter().copied()));
        self
    }

    /// A chain `ids[0] <- ids[1] <- ...`.
    pub fn chain(mut self, ids: &[&str]) -> Self {
        let mut prev: Option<&str> = None;
        for &id in ids {
            let deps: Vec<&str> = prev.into_iter().collect();
            self = self.task(id, &deps);
            prev = Some(id);
        }
        self
    }

    pub fn specs(self) -> Vec<TaskSpec<()>> {
        self.specs
    }

    /// Build the graph, panicking on structural errors.
    pub fn graph(self) -> DependencyGraph<()> {
        DependencyGraph::build(self.specs).expect("task list should form a valid graph")
    }

    /// Build the graph and compute its waves.
    pub fn waved_graph(self) -> DependencyGraph<()> {
        let mut graph = self.graph();
        graph.compute_waves().expect("task list should be acyclic");
        graph
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                agent: AgentSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, id: &str, task: TaskConfig) -> Self {
        self.config.task.insert(id.to_string(), task);
        self
    }

    pub fn with_agent_cmd(mut self, cmd: &str) -> Self {
        self.config.agent.cmd = Some(cmd.to_string());
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.config.max_parallel = n;
        self
    }

    pub fn retries(mut self, n: u32) -> Self {
        self.config.config.retries = n;
        self
    }

    pub fn timeout(mut self, value: &str) -> Self {
        self.config.config.timeout = Some(value.to_string());
        self
    }

    pub fn fail_fast(mut self, val: bool) -> Self {
        self.config.config.fail_fast = val;
        self
    }

    /// The unvalidated form, for tests that expect validation to fail.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A task with its own command.
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A task relying on `[agent].cmd`.
    pub fn agent() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = Some(title.to_string());
        self
    }

    pub fn file(mut self, file: &str) -> Self {
        self.task.file = Some(file.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    pub fn acceptance(mut self, criterion: &str) -> Self {
        self.task.acceptance.push(criterion.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
