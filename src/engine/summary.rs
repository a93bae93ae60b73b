// src/engine/summary.rs

use std::fmt;

use crate::dag::{DependencyGraph, TaskId, TaskStatus};

/// End-of-run totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Tasks still `Pending`/`Running`; non-zero only if the run was cut short.
    pub unresolved: usize,
    pub failed_tasks: Vec<TaskId>,
    pub skipped_tasks: Vec<TaskId>,
    /// The run stopped early (fail-fast or shutdown request).
    pub aborted: bool,
}

impl RunSummary {
    pub fn from_graph<P>(graph: &DependencyGraph<P>) -> Self {
        let counts = graph.counts();
        Self {
            completed: counts.completed,
            failed: counts.failed,
            skipped: counts.skipped,
            unresolved: counts.unresolved(),
            failed_tasks: graph.tasks_with_status(TaskStatus::Failed),
            skipped_tasks: graph.tasks_with_status(TaskStatus::Skipped),
            aborted: false,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.failed + self.skipped + self.unresolved
    }

    /// A run succeeds when nothing failed and nothing was left behind.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.unresolved == 0
    }

    /// Success that also ran to the end. An interrupted run is not clean
    /// even if nothing failed before the interruption.
    pub fn is_clean(&self) -> bool {
        self.is_success() && !self.aborted
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} failed, {} skipped",
            self.completed, self.failed, self.skipped
        )?;
        if self.unresolved > 0 {
            write!(f, ", {} unresolved", self.unresolved)?;
        }
        if self.aborted {
            f.write_str(" (aborted)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_unresolved_and_abort_only_when_relevant() {
        let mut summary = RunSummary {
            completed: 3,
            failed: 1,
            skipped: 2,
            ..Default::default()
        };
        assert_eq!(summary.to_string(), "3 completed, 1 failed, 2 skipped");
        assert!(!summary.is_success());

        summary.unresolved = 1;
        summary.aborted = true;
        assert_eq!(
            summary.to_string(),
            "3 completed, 1 failed, 2 skipped, 1 unresolved (aborted)"
        );
        assert_eq!(summary.total(), 7);
    }

    #[test]
    fn empty_run_is_a_success() {
        assert!(RunSummary::default().is_success());
        assert!(RunSummary::default().is_clean());
    }

    #[test]
    fn interrupted_run_is_not_clean() {
        let summary = RunSummary {
            completed: 1,
            skipped: 2,
            aborted: true,
            ..Default::default()
        };
        assert!(summary.is_success());
        assert!(!summary.is_clean());
    }
}
