//! Per-task scan results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ScanTask;

/// How an attempt to run a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanOutcome {
    /// Tool exited with status zero.
    Success,
    /// Tool exited with a non-zero status.
    ToolError,
    /// Tool exceeded its time limit and was terminated.
    Timeout,
    /// Tool could not be launched or its pipes failed.
    ProcessError,
    /// Cancellation was observed before the tool was spawned.
    Skipped,
    /// Tool was terminated because the session was cancelled.
    Cancelled,
}

impl ScanOutcome {
    /// True only for [`ScanOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Success)
    }

    /// True when the tool never ran to completion because of cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ScanOutcome::Skipped | ScanOutcome::Cancelled)
    }
}

/// Outcome record for one task. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub task: ScanTask,
    pub outcome: ScanOutcome,
    /// Captured standard output (empty unless the tool succeeded).
    pub output: String,
    /// Standard error for tool errors, or a description of the failure.
    pub error_detail: Option<String>,
    /// Wall time spent on the attempt.
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

impl ScanResult {
    fn build(
        task: ScanTask,
        outcome: ScanOutcome,
        output: String,
        error_detail: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            task,
            outcome,
            output,
            error_detail,
            elapsed,
            finished_at: Utc::now(),
        }
    }

    pub fn success(task: ScanTask, stdout: impl Into<String>, elapsed: Duration) -> Self {
        Self::build(task, ScanOutcome::Success, stdout.into(), None, elapsed)
    }

    pub fn tool_error(task: ScanTask, stderr: impl Into<String>, elapsed: Duration) -> Self {
        Self::build(
            task,
            ScanOutcome::ToolError,
            String::new(),
            Some(stderr.into()),
            elapsed,
        )
    }

    /// Timeout result; the detail names the limit that was exceeded.
    pub fn timeout(task: ScanTask, limit: Duration, elapsed: Duration) -> Self {
        let detail = format!(
            "{} scan for {} timed out after {}",
            task.kind.tool_label(),
            task.target,
            human_duration(limit)
        );
        Self::build(task, ScanOutcome::Timeout, String::new(), Some(detail), elapsed)
    }

    pub fn process_error(task: ScanTask, message: impl Into<String>, elapsed: Duration) -> Self {
        Self::build(
            task,
            ScanOutcome::ProcessError,
            String::new(),
            Some(message.into()),
            elapsed,
        )
    }

    pub fn skipped(task: ScanTask) -> Self {
        Self::build(
            task,
            ScanOutcome::Skipped,
            String::new(),
            Some("cancelled before start".to_string()),
            Duration::ZERO,
        )
    }

    pub fn cancelled(task: ScanTask, elapsed: Duration) -> Self {
        Self::build(
            task,
            ScanOutcome::Cancelled,
            String::new(),
            Some("terminated by cancellation".to_string()),
            elapsed,
        )
    }

    /// Render the text notification shown to users.
    pub fn render(&self) -> String {
        let tool = self.task.kind.tool_label();
        let target = &self.task.target;
        let detail = self.error_detail.as_deref().unwrap_or_default();

        let mut text = format!("Scanning {} with {}...\n", target, self.task.kind);
        let body = match self.outcome {
            ScanOutcome::Success => {
                format!("{} scan results for {}:\n{}\n", tool, target, self.output)
            }
            ScanOutcome::ToolError => format!(
                "Error {} {} with {}: {}\n",
                self.task.kind.verb(),
                target,
                self.task.kind,
                detail
            ),
            ScanOutcome::Timeout => format!("{}.\n", detail),
            ScanOutcome::ProcessError => format!(
                "An error occurred while {} {} with {}: {}\n",
                self.task.kind.verb(),
                target,
                self.task.kind,
                detail
            ),
            ScanOutcome::Skipped => format!("{} scan for {} skipped.\n", tool, target),
            ScanOutcome::Cancelled => format!("{} scan for {} cancelled.\n", tool, target),
        };
        text.push_str(&body);
        text
    }
}

impl std::fmt::Display for ScanResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// "5 minutes", "1 minute", "90 seconds".
pub fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let mins = secs / 60;
        format!("{} minute{}", mins, if mins == 1 { "" } else { "s" })
    } else if secs >= 1 {
        format!("{} second{}", secs, if secs == 1 { "" } else { "s" })
    } else {
        format!("{} ms", d.as_millis())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
