use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskwave::engine::TaskOutcome;
use taskwave::errors::Result;
use taskwave::exec::TaskExecutor;

/// A fake executor that:
/// - records every attempt, in start order
/// - answers from a per-task script (default `Success`); the last scripted
///   outcome repeats once the script runs out
/// - optionally sleeps before answering, so tests can observe concurrency
///   and trigger timeouts
///
/// Clones share state, so a test can keep one handle while the driver owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    scripts: Mutex<HashMap<String, VecDeque<TaskOutcome>>>,
    delays: Mutex<HashMap<String, Duration>>,
    default_delay: Mutex<Duration>,
    executed: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer attempts of `task` with `outcomes`, in order.
    pub fn script(self, task: &str, outcomes: &[TaskOutcome]) -> Self {
        self.inner
            .scripts
            .lock()
            .unwrap()
            .insert(task.to_string(), outcomes.iter().copied().collect());
        self
    }

    /// Make every attempt of `task` fail with exit code 1.
    pub fn failing(self, task: &str) -> Self {
        self.script(task, &[TaskOutcome::Failed(1)])
    }

    /// Sleep this long in every attempt without a task-specific delay.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.default_delay.lock().unwrap() = delay;
        self
    }

    pub fn with_task_delay(self, task: &str, delay: Duration) -> Self {
        self.inner
            .delays
            .lock()
            .unwrap()
            .insert(task.to_string(), delay);
        self
    }

    /// Task IDs in the order their attempts started (retries repeat).
    pub fn executed(&self) -> Vec<String> {
        self.inner.executed.lock().unwrap().clone()
    }

    /// Task IDs in the order their attempts returned.
    pub fn finished(&self) -> Vec<String> {
        self.inner.finished.lock().unwrap().clone()
    }

    pub fn attempts_of(&self, task: &str) -> usize {
        self.inner
            .executed
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.as_str() == task)
            .count()
    }

    /// Highest number of attempts in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, task: &str) -> TaskOutcome {
        let mut scripts = self.inner.scripts.lock().unwrap();
        match scripts.get_mut(task) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(TaskOutcome::Success),
            Some(queue) => queue.front().copied().unwrap_or(TaskOutcome::Success),
            None => TaskOutcome::Success,
        }
    }

    fn delay_for(&self, task: &str) -> Duration {
        self.inner
            .delays
            .lock()
            .unwrap()
            .get(task)
            .copied()
            .unwrap_or_else(|| *self.inner.default_delay.lock().unwrap())
    }
}

/// Decrements the in-flight counter even when a timed-out attempt is dropped.
struct RunningGuard(Arc<Inner>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<P> TaskExecutor<P> for FakeExecutor {
    fn execute<'a>(
        &'a self,
        task: &'a str,
        _payload: &'a P,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'a>> {
        Box::pin(async move {
            self.inner.executed.lock().unwrap().push(task.to_string());

            let now = self.inner.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner.peak.fetch_max(now, Ordering::SeqCst);
            let _guard = RunningGuard(Arc::clone(&self.inner));

            let delay = self.delay_for(task);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let outcome = self.next_outcome(task);
            self.inner.finished.lock().unwrap().push(task.to_string());
            Ok(outcome)
        })
    }
}
