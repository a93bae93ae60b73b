// src/exec/command.rs

//! Shell command executor used to drive coding agents.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::TaskOutcome;
use crate::errors::TaskwaveError;
use crate::exec::TaskExecutor;
use crate::types::AgentTask;

/// Runs each task's command through the platform shell.
///
/// The task is described to the command through environment variables:
/// `TASKWAVE_TASK_ID`, `TASKWAVE_TASK_TITLE`, `TASKWAVE_TASK_FILE` and
/// `TASKWAVE_TASK_PROMPT`. Output is logged at debug level. Exit code 0 is a
/// success, anything else a failure.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    working_dir: PathBuf,
}

impl CommandExecutor {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

impl TaskExecutor<AgentTask> for CommandExecutor {
    fn execute<'a>(
        &'a self,
        task: &'a str,
        payload: &'a AgentTask,
    ) -> Pin<Box<dyn Future<Output = crate::errors::Result<TaskOutcome>> + Send + 'a>> {
        Box::pin(async move {
            run_command(task, payload, &self.working_dir)
                .await
                .map_err(TaskwaveError::from)
        })
    }
}

async fn run_command(task: &str, payload: &AgentTask, working_dir: &Path) -> Result<TaskOutcome> {
    info!(task = %task, cmd = %payload.cmd, "starting agent process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&payload.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&payload.cmd);
        c
    };

    cmd.current_dir(working_dir)
        .env("TASKWAVE_TASK_ID", task)
        .env("TASKWAVE_TASK_TITLE", &payload.title)
        .env("TASKWAVE_TASK_FILE", payload.file.as_deref().unwrap_or(""))
        .env("TASKWAVE_TASK_PROMPT", payload.prompt(task))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // A timed-out attempt drops this future; the process must die with it.
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;

    // Always consume output so pipe buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        forward_lines(task.to_string(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(task.to_string(), "stderr", stderr);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task}'"))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task,
        exit_code = code,
        success = status.success(),
        "agent process exited"
    );

    Ok(if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(code)
    })
}

fn forward_lines<R>(task: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, stream, "{}", line);
        }
    });
}
