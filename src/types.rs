// src/types.rs

use std::fmt::Write as _;
use std::time::Duration;

/// Payload carried by each task node when driving coding agents.
///
/// The scheduler never looks inside; only the command executor does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTask {
    pub title: String,
    pub description: Option<String>,
    /// File the task is expected to create or modify.
    pub file: Option<String>,
    pub acceptance: Vec<String>,
    /// Resolved shell command (task override or `[agent].cmd`).
    pub cmd: String,
}

impl AgentTask {
    /// Render the prompt handed to the agent through `TASKWAVE_TASK_PROMPT`.
    pub fn prompt(&self, id: &str) -> String {
        let mut out = format!("Task {id}: {}\n", self.title);

        if let Some(file) = &self.file {
            let _ = writeln!(out, "File: {file}");
        }
        if let Some(description) = &self.description {
            let _ = writeln!(out, "\n{}", description.trim_end());
        }
        if !self.acceptance.is_empty() {
            out.push_str("\nAcceptance criteria:\n");
            for criterion in &self.acceptance {
                let _ = writeln!(out, "- {criterion}");
            }
        }

        out
    }
}

/// Parse a duration like `"500ms"`, `"30s"`, `"5m"` or `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| "duration too large".to_string()),
        "h" => value
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| "duration too large".to_string()),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
