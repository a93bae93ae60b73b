// src/engine/driver.rs

//! Wave-synchronous execution driver.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dag::{DagError, DependencyGraph, ExecutionWave, StatusChange, TaskId, TaskStatus};
use crate::engine::{DriverOptions, RunSummary, SchedulerEvent, TaskOutcome};
use crate::errors::Result;
use crate::exec::TaskExecutor;

/// Cloneable flag used to stop a run between waves (e.g. on Ctrl-C).
///
/// Tasks already dispatched are left to finish; everything still pending is
/// skipped once the current wave resolves.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Runs a validated graph wave by wave against a [`TaskExecutor`].
///
/// - Waves are processed in ascending order; wave `k + 1` starts only after
///   every dispatched member of wave `k` reached a terminal state.
/// - Members of a wave whose dependency chain can no longer complete are
///   skipped before dispatch; a wave left with nothing to run is skipped.
/// - Eligible members are dispatched in ID order, at most
///   `max_parallel` at a time.
///
/// A driver runs its graph once.
pub struct WaveDriver<P, E> {
    graph: Arc<DependencyGraph<P>>,
    executor: Arc<E>,
    options: DriverOptions,
    events: Option<mpsc::Sender<SchedulerEvent>>,
    shutdown: ShutdownHandle,
}

impl<P, E> fmt::Debug for WaveDriver<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveDriver")
            .field("tasks", &self.graph.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<P, E> WaveDriver<P, E>
where
    P: Send + Sync + 'static,
    E: TaskExecutor<P> + 'static,
{
    /// Take ownership of the graph, computing its waves if that has not
    /// happened yet. Structural errors surface here, before anything runs.
    pub fn new(
        mut graph: DependencyGraph<P>,
        executor: E,
        options: DriverOptions,
    ) -> std::result::Result<Self, DagError> {
        if graph.waves().is_none() {
            graph.compute_waves()?;
        }

        Ok(Self {
            graph: Arc::new(graph),
            executor: Arc::new(executor),
            options,
            events: None,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Send [`SchedulerEvent`]s to `events`. A dropped receiver is ignored.
    pub fn with_events(mut self, events: mpsc::Sender<SchedulerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Read-only access to the graph and its statuses.
    pub fn graph(&self) -> &DependencyGraph<P> {
        &self.graph
    }

    pub fn options(&self) -> DriverOptions {
        self.options
    }

    /// Execute every wave and return the final totals.
    ///
    /// Task failures are reported through the summary, never as errors.
    pub async fn run(&self) -> RunSummary {
        let waves: Vec<ExecutionWave> = self.graph.waves().map(<[_]>::to_vec).unwrap_or_default();

        info!(
            waves = waves.len(),
            tasks = self.graph.len(),
            max_parallel = self.options.max_parallel,
            "starting wave execution"
        );
        emit(
            &self.events,
            SchedulerEvent::RunStarted {
                waves: waves.len(),
                tasks: self.graph.len(),
            },
        )
        .await;

        let semaphore = Arc::new(Semaphore::new(self.options.max_parallel.max(1)));
        let mut aborted = false;

        for wave in &waves {
            if self.shutdown.is_requested() {
                warn!(wave = wave.index, "shutdown requested; not starting further waves");
                self.abort().await;
                aborted = true;
                break;
            }

            let eligible = self.prepare_wave(wave).await;
            if eligible.is_empty() {
                info!(wave = wave.index, "no eligible tasks; skipping wave");
                emit(&self.events, SchedulerEvent::WaveSkipped { index: wave.index }).await;
                continue;
            }

            info!(wave = wave.index, tasks = ?eligible, "dispatching wave");
            emit(
                &self.events,
                SchedulerEvent::WaveStarted {
                    index: wave.index,
                    tasks: eligible.clone(),
                },
            )
            .await;

            let failed = self.dispatch_wave(wave.index, eligible, &semaphore).await;

            debug!(wave = wave.index, failed, "wave resolved");
            emit(&self.events, SchedulerEvent::WaveFinished { index: wave.index }).await;

            if failed > 0 && self.options.fail_fast {
                warn!(wave = wave.index, failed, "fail-fast enabled; aborting run");
                self.abort().await;
                aborted = true;
                break;
            }
        }

        let mut summary = RunSummary::from_graph(&self.graph);
        summary.aborted = aborted;

        if summary.is_success() {
            info!(%summary, "run finished");
        } else {
            warn!(%summary, failed = ?summary.failed_tasks, "run finished with failures");
        }
        emit(&self.events, SchedulerEvent::RunFinished(summary.clone())).await;

        summary
    }

    /// Skip members blocked by an upstream failure and return the rest.
    async fn prepare_wave(&self, wave: &ExecutionWave) -> Vec<TaskId> {
        let mut eligible = Vec::new();

        for id in &wave.tasks {
            match self.graph.skip_blocked(id) {
                Ok(changes) => emit_changes(&self.events, changes).await,
                Err(err) => {
                    warn!(task = %id, error = %err, "cannot check task eligibility");
                    continue;
                }
            }

            if self.graph.status(id) == Some(TaskStatus::Pending)
                && self.graph.dependencies_completed(id) == Some(true)
            {
                eligible.push(id.clone());
            }
        }

        eligible
    }

    /// Dispatch `tasks` and block until all of them are terminal.
    ///
    /// Returns how many ended `Failed`.
    async fn dispatch_wave(
        &self,
        wave: usize,
        tasks: Vec<TaskId>,
        semaphore: &Arc<Semaphore>,
    ) -> usize {
        let mut set = JoinSet::new();
        let mut spawned: HashMap<tokio::task::Id, TaskId> = HashMap::new();

        for id in tasks {
            // Acquire before spawning so dispatch order follows wave order.
            let permit = Arc::clone(semaphore).acquire_owned().await.ok();

            let worker = Worker {
                graph: Arc::clone(&self.graph),
                executor: Arc::clone(&self.executor),
                events: self.events.clone(),
                options: self.options,
            };
            let task_id = id.clone();
            let handle = set.spawn(async move { worker.run(wave, task_id, permit).await });
            spawned.insert(handle.id(), id);
        }

        let mut failed = 0;
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((_, TaskStatus::Failed)) => failed += 1,
                Ok(_) => {}
                Err(err) => {
                    let Some(id) = spawned.get(&err.id()) else {
                        error!(wave, error = %err, "unknown task worker died");
                        continue;
                    };
                    error!(task = %id, wave, error = %err, "task worker died; marking task failed");
                    match self.graph.fail(id) {
                        Ok(changes) => emit_changes(&self.events, changes).await,
                        Err(err) => error!(task = %id, error = %err, "cannot mark task failed"),
                    }
                    failed += 1;
                }
            }
        }

        failed
    }

    async fn abort(&self) {
        let changes = self.graph.abort_pending();
        emit_changes(&self.events, changes).await;
    }
}

/// Everything a spawned task needs, detached from the driver's lifetime.
struct Worker<P, E> {
    graph: Arc<DependencyGraph<P>>,
    executor: Arc<E>,
    events: Option<mpsc::Sender<SchedulerEvent>>,
    options: DriverOptions,
}

impl<P, E> Worker<P, E>
where
    P: Send + Sync + 'static,
    E: TaskExecutor<P> + 'static,
{
    /// Start, execute (with retries) and settle a single task.
    async fn run(self, wave: usize, id: TaskId, _permit: Option<OwnedSemaphorePermit>) -> TaskStatus {
        match self.graph.start(&id) {
            Ok(changes) => emit_changes(&self.events, changes).await,
            Err(err) => {
                warn!(task = %id, wave, error = %err, "refusing to start task");
                return self.graph.status(&id).unwrap_or(TaskStatus::Skipped);
            }
        }

        let succeeded = match self.graph.payload(&id) {
            Some(payload) => self.execute_with_retries(&id, payload).await,
            None => {
                error!(task = %id, "task payload missing");
                false
            }
        };

        let settled = if succeeded {
            self.graph.complete(&id)
        } else {
            self.graph.fail(&id)
        };

        match settled {
            Ok(changes) => emit_changes(&self.events, changes).await,
            Err(err) => error!(task = %id, error = %err, "cannot record task outcome"),
        }

        self.graph.status(&id).unwrap_or(TaskStatus::Failed)
    }

    async fn execute_with_retries(&self, id: &str, payload: &P) -> bool {
        let attempts = self.options.retries.saturating_add(1);

        for attempt in 1..=attempts {
            match attempt_once(self.executor.as_ref(), id, payload, self.options.timeout).await {
                Ok(TaskOutcome::Success) => {
                    debug!(task = %id, attempt, "task attempt succeeded");
                    return true;
                }
                Ok(outcome) => {
                    warn!(task = %id, attempt, attempts, ?outcome, "task attempt failed");
                }
                Err(err) => {
                    warn!(task = %id, attempt, attempts, error = %err, "task attempt errored");
                }
            }

            if attempt < attempts {
                info!(task = %id, next_attempt = attempt + 1, "retrying task");
                emit(
                    &self.events,
                    SchedulerEvent::TaskRetrying {
                        task: id.to_string(),
                        attempt: attempt + 1,
                    },
                )
                .await;
            }
        }

        false
    }
}

async fn attempt_once<P, E>(
    executor: &E,
    id: &str,
    payload: &P,
    timeout: Option<Duration>,
) -> Result<TaskOutcome>
where
    E: TaskExecutor<P> + ?Sized,
{
    let attempt = executor.execute(id, payload);

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, attempt).await {
            Ok(result) => result,
            Err(_) => {
                warn!(task = %id, ?limit, "task attempt timed out");
                Ok(TaskOutcome::TimedOut)
            }
        },
        None => attempt.await,
    }
}

async fn emit(events: &Option<mpsc::Sender<SchedulerEvent>>, event: SchedulerEvent) {
    if let Some(tx) = events {
        // Reporting is best-effort; a closed channel must not stop the run.
        let _ = tx.send(event).await;
    }
}

async fn emit_changes(events: &Option<mpsc::Sender<SchedulerEvent>>, changes: Vec<StatusChange>) {
    for change in changes {
        emit(events, SchedulerEvent::TaskStatusChanged(change)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use super::*;
    use crate::dag::TaskSpec;

    /// Fails every task whose payload is `true`.
    struct PayloadExecutor;

    impl TaskExecutor<bool> for PayloadExecutor {
        fn execute<'a>(
            &'a self,
            _task: &'a str,
            payload: &'a bool,
        ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'a>> {
            let outcome = if *payload {
                TaskOutcome::Failed(1)
            } else {
                TaskOutcome::Success
            };
            Box::pin(async move { Ok(outcome) })
        }
    }

    #[tokio::test]
    async fn diamond_with_failing_branch() {
        let graph = DependencyGraph::build(vec![
            TaskSpec::new("T1", false),
            TaskSpec::new("T2", true).after("T1"),
            TaskSpec::new("T3", false).after("T1"),
            TaskSpec::new("T4", false).after("T2").after("T3"),
        ])
        .unwrap();

        let driver = WaveDriver::new(graph, PayloadExecutor, DriverOptions::default()).unwrap();
        let summary = driver.run().await;

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed_tasks, ["T2"]);
        assert_eq!(summary.skipped_tasks, ["T4"]);
        assert_eq!(driver.graph().status("T3"), Some(TaskStatus::Completed));
        assert!(!summary.aborted);
    }

    #[tokio::test]
    async fn shutdown_before_run_skips_everything() {
        let graph =
            DependencyGraph::build(vec![TaskSpec::new("A", false), TaskSpec::new("B", false)])
                .unwrap();
        let driver = WaveDriver::new(graph, PayloadExecutor, DriverOptions::default()).unwrap();

        driver.shutdown_handle().request();
        let summary = driver.run().await;

        assert!(summary.aborted);
        assert!(!summary.is_clean());
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.completed, 0);
    }

    #[test]
    fn new_rejects_cyclic_graph() {
        let graph = DependencyGraph::build(vec![
            TaskSpec::new("A", false).after("B"),
            TaskSpec::new("B", false).after("A"),
        ])
        .unwrap();

        let err = WaveDriver::new(graph, PayloadExecutor, DriverOptions::default()).unwrap_err();
        assert!(err.is_structural());
    }
}
