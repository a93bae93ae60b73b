// src/engine/reporter.rs

//! Log-based progress reporting.
//!
//! Consumes [`SchedulerEvent`]s and turns them into `tracing` records. A
//! richer terminal UI can replace this by reading the same channel.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::TaskStatus;
use crate::engine::SchedulerEvent;

/// Spawn a task that logs every event until the sending side is dropped.
pub fn spawn_reporter(mut rx: mpsc::Receiver<SchedulerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            report(&event);
        }
        debug!("reporter finished (channel closed)");
    })
}

fn report(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::RunStarted { waves, tasks } => {
            info!(waves, tasks, "run started");
        }
        SchedulerEvent::WaveStarted { index, tasks } => {
            info!(wave = index, count = tasks.len(), "wave {} started: {}", index, tasks.join(", "));
        }
        SchedulerEvent::WaveSkipped { index } => {
            info!(wave = index, "wave {} skipped (nothing eligible)", index);
        }
        SchedulerEvent::WaveFinished { index } => {
            debug!(wave = index, "wave finished");
        }
        SchedulerEvent::TaskRetrying { task, attempt } => {
            warn!(task = %task, attempt, "retrying");
        }
        SchedulerEvent::TaskStatusChanged(change) => match change.to {
            TaskStatus::Running => info!(task = %change.task, "running"),
            TaskStatus::Completed => info!(task = %change.task, "completed"),
            TaskStatus::Failed => warn!(task = %change.task, "failed"),
            TaskStatus::Skipped => warn!(task = %change.task, from = %change.from, "skipped"),
            TaskStatus::Pending => debug!(task = %change.task, "pending"),
        },
        SchedulerEvent::RunFinished(summary) => {
            info!(%summary, "run finished");
        }
    }
}
