// tests/config_loading.rs

use std::fs;
use std::time::Duration;

use tempfile::TempDir;

use taskwave::config::{load_and_validate, load_from_path, resolve_config_path};
use taskwave::dag::{DagError, DependencyGraph};
use taskwave::errors::TaskwaveError;
use taskwave_test_utils::{init_tracing, ConfigFileBuilder, TaskConfigBuilder};

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("Taskwave.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn full_task_file_loads() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[config]
max_parallel = 2
retries = 1
timeout = "15m"
fail_fast = true

[agent]
cmd = "agent --prompt \"$TASKWAVE_TASK_PROMPT\""

[task.T001]
title = "Create the data model"
file = "src/model.rs"
acceptance = ["compiles", "has tests"]

[task.T002]
title = "Wire the parser"
after = ["T001"]
cmd = "make parser"
"#,
    );

    let cfg = load_and_validate(&path).unwrap();
    let options = cfg.driver_options();
    assert_eq!(options.max_parallel, 2);
    assert_eq!(options.retries, 1);
    assert_eq!(options.timeout, Some(Duration::from_secs(15 * 60)));
    assert!(options.fail_fast);

    let specs = cfg.task_specs();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].id, "T001");
    assert!(specs[0].payload.cmd.starts_with("agent"));
    assert_eq!(specs[0].payload.acceptance.len(), 2);
    assert_eq!(specs[1].payload.cmd, "make parser");
    assert_eq!(specs[1].dependencies, ["T001"]);

    let mut graph = DependencyGraph::build(specs).unwrap();
    assert_eq!(graph.compute_waves().unwrap().len(), 2);
}

#[test]
fn defaults_apply_when_config_section_is_absent() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[task.A]
cmd = "true"
"#,
    );

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.config().max_parallel, 4);
    assert_eq!(cfg.config().retries, 0);
    assert!(cfg.timeout().is_none());
    assert_eq!(cfg.task_specs()[0].payload.title, "A");
}

#[test]
fn zero_max_parallel_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[config]
max_parallel = 0

[task.A]
cmd = "true"
"#,
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, TaskwaveError::ConfigError(_)));
}

#[test]
fn file_without_tasks_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[config]\nretries = 1\n");

    assert!(load_from_path(&path).unwrap().task.is_empty());
    assert!(matches!(
        load_and_validate(&path).unwrap_err(),
        TaskwaveError::ConfigError(_)
    ));
}

#[test]
fn malformed_toml_surfaces_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[task.A\ncmd = ");

    assert!(matches!(
        load_from_path(&path).unwrap_err(),
        TaskwaveError::TomlError(_)
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, TaskwaveError::IoError(_)));
}

#[test]
fn dangling_dependency_passes_config_but_fails_graph() {
    let cfg = ConfigFileBuilder::new()
        .with_task("T1", TaskConfigBuilder::new("true").after("T999").build())
        .build();

    let err = DependencyGraph::build(cfg.task_specs()).unwrap_err();
    assert_eq!(
        err,
        DagError::MissingDependency {
            task: "T1".into(),
            dependency: "T999".into()
        }
    );
    let wrapped = TaskwaveError::from(err);
    assert!(wrapped.to_string().starts_with("Task graph error:"));
}

#[test]
fn agent_command_is_the_fallback() {
    let cfg = ConfigFileBuilder::new()
        .with_agent_cmd("agent run")
        .with_task(
            "T1",
            TaskConfigBuilder::agent()
                .title("Model")
                .file("src/model.rs")
                .description("Add the model.")
                .acceptance("unit tests pass")
                .build(),
        )
        .build();

    let spec = &cfg.task_specs()[0];
    assert_eq!(spec.payload.cmd, "agent run");

    let prompt = spec.payload.prompt("T1");
    assert!(prompt.starts_with("Task T1: Model"));
    assert!(prompt.contains("File: src/model.rs"));
    assert!(prompt.contains("- unit tests pass"));
}

#[test]
fn task_without_any_command_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task("T1", TaskConfigBuilder::agent().build())
        .raw();
    assert!(taskwave::config::ConfigFile::try_from(raw).is_err());
}

#[test]
fn explicit_config_path_wins() {
    assert_eq!(
        resolve_config_path(Some("plan/tasks.toml")),
        std::path::PathBuf::from("plan/tasks.toml")
    );
}
