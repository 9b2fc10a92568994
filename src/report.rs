// src/report.rs

//! User-visible result records and the pluggable event sink
//!
//! Every worker result produces exactly one record with outcome DONE, FAIL
//! or WARN; a few orchestration events (source conflicts, core demotions,
//! terminal cycle reports) produce WARN/FAIL records of their own. Where the
//! records go is the embedder's choice: tracing, memory, or nowhere.

use crate::job::JobType;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Mutex;

/// Result class of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Fail,
    Warn,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "DONE"),
            Self::Fail => write!(f, "FAIL"),
            Self::Warn => write!(f, "WARN"),
        }
    }
}

/// One log record
#[derive(Debug, Clone)]
pub struct ReportRecord {
    pub outcome: Outcome,
    pub kind: Option<JobType>,
    pub elapsed: Option<f64>,
    pub pid: Option<u32>,
    /// Display context, usually a distvname
    pub context: Option<String>,
    pub message: String,
    /// Trailing note such as `using cache` or `using prebuilt`
    pub annotation: Option<String>,
    pub at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn new(outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            outcome,
            kind: None,
            elapsed: None,
            pid: None,
            context: None,
            message: message.into(),
            annotation: None,
            at: Utc::now(),
        }
    }

    pub fn with_kind(mut self, kind: JobType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Option<f64>) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Render the record as a single log line
    pub fn render(&self) -> String {
        let mut line = String::new();
        if let Some(pid) = self.pid {
            line.push_str(&format!("[{}] ", pid));
        }
        line.push_str(&self.outcome.to_string());
        if let Some(elapsed) = self.elapsed {
            line.push_str(&format!(" ({:.3}sec)", elapsed));
        }
        if let Some(kind) = self.kind {
            line.push_str(&format!(" {}", kind));
        }
        if let Some(context) = &self.context {
            line.push_str(&format!(" {}:", context));
        }
        line.push_str(&format!(" {}", self.message));
        if let Some(annotation) = &self.annotation {
            line.push_str(&format!(" ({})", annotation));
        }
        line
    }
}

impl fmt::Display for ReportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Where result records go
///
/// Implementations must be thread-safe; the parallel driver reports from
/// the Master under its own lock.
pub trait EventSink: Send + Sync {
    fn log(&self, record: ReportRecord);

    fn log_fail(&self, record: ReportRecord) {
        self.log(record);
    }
}

/// Default sink: forwards to `tracing`
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log(&self, record: ReportRecord) {
        match record.outcome {
            Outcome::Done => tracing::info!("{}", record.render()),
            Outcome::Warn => tracing::warn!("{}", record.render()),
            Outcome::Fail => tracing::error!("{}", record.render()),
        }
    }
}

/// No-op sink for quiet embedding
#[derive(Debug, Default)]
pub struct SilentSink;

impl EventSink for SilentSink {
    fn log(&self, _record: ReportRecord) {}
}

/// Capturing sink for tests and programmatic inspection
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ReportRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().expect("sink poisoned").clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(|r| r.render()).collect()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.records()
            .iter()
            .filter(|r| r.outcome == outcome)
            .count()
    }
}

impl EventSink for MemorySink {
    fn log(&self, record: ReportRecord) {
        self.records.lock().expect("sink poisoned").push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full_record() {
        let record = ReportRecord::new(Outcome::Done, "Some-Module-1.0")
            .with_kind(JobType::Install)
            .with_pid(Some(4242))
            .with_elapsed(Some(0.5))
            .with_annotation("using prebuilt");
        assert_eq!(
            record.render(),
            "[4242] DONE (0.500sec) install Some-Module-1.0 (using prebuilt)"
        );
    }

    #[test]
    fn test_render_minimal_record() {
        let record = ReportRecord::new(Outcome::Warn, "A used to be core");
        assert_eq!(record.render(), "WARN A used to be core");
    }

    #[test]
    fn test_memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.log(ReportRecord::new(Outcome::Done, "first"));
        sink.log_fail(ReportRecord::new(Outcome::Fail, "second"));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(sink.count(Outcome::Fail), 1);
    }
}
