//! Progress reporting for long-running steps.
//!
//! The engine and the report builder push human-readable milestones through a
//! [`ProgressSink`] handed in by the caller, so a CLI, a test or an embedding
//! application can each decide where the messages go.

use chrono::Local;
use tracing::info;

/// Receiver of status updates and log lines.
pub trait ProgressSink {
    /// Short status of the current step, replacing the previous one.
    fn status(&mut self, status: &str);

    /// Appends a log line.
    fn message(&mut self, text: &str);

    /// Appends a log line prefixed with the local wall-clock time.
    fn timestamped(&mut self, text: &str) {
        let stamped = format!("{} -> {text}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        self.message(&stamped);
    }
}

/// Forwards every update to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn status(&mut self, status: &str) {
        info!(target: "audit_transform::progress", status, "status");
    }

    fn message(&mut self, text: &str) {
        info!(target: "audit_transform::progress", "{text}");
    }
}

/// Collects updates in memory and forwards them to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct ProgressLog {
    status: Option<String>,
    lines: Vec<String>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True if any collected line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl ProgressSink for ProgressLog {
    fn status(&mut self, status: &str) {
        TracingProgress.status(status);
        self.status = Some(status.to_string());
    }

    fn message(&mut self, text: &str) {
        TracingProgress.message(text);
        self.lines.push(text.to_string());
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for &mut T {
    fn status(&mut self, status: &str) {
        (**self).status(status);
    }

    fn message(&mut self, text: &str) {
        (**self).message(text);
    }
}
