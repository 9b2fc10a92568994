// src/progress.rs

//! Install-count progress reporting
//!
//! The Master bumps a tracker after every successful install. The trait
//! keeps rendering out of the core: the CLI gets an `n/total` bar on
//! stderr, non-interactive embedders get log lines or nothing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Thread-safe install-count tracker
pub trait ProgressTracker: Send + Sync {
    /// Set (or grow) the expected total
    fn set_length(&self, length: u64);

    /// Record completed installs
    fn increment(&self, amount: u64);

    /// Update the current status text
    fn set_message(&self, message: &str);

    fn position(&self) -> u64;

    fn length(&self) -> u64;

    fn finish(&self);

    fn is_finished(&self) -> bool;
}

/// No-op tracker that still counts
#[derive(Debug, Default)]
pub struct SilentProgress {
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressTracker for SilentProgress {
    fn set_length(&self, length: u64) {
        self.length.store(length, Ordering::Relaxed);
    }

    fn increment(&self, amount: u64) {
        self.position.fetch_add(amount, Ordering::Relaxed);
    }

    fn set_message(&self, _message: &str) {}

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Logs `n/total` through tracing after every increment
#[derive(Debug, Default)]
pub struct LogProgress {
    inner: SilentProgress,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressTracker for LogProgress {
    fn set_length(&self, length: u64) {
        self.inner.set_length(length);
    }

    fn increment(&self, amount: u64) {
        self.inner.increment(amount);
        tracing::info!("{}/{} installed", self.inner.position(), self.inner.length());
    }

    fn set_message(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn length(&self) -> u64 {
        self.inner.length()
    }

    fn finish(&self) {
        self.inner.finish();
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

/// Interactive `n/total` bar on stderr
pub struct CliProgress {
    bar: indicatif::ProgressBar,
}

impl CliProgress {
    pub fn new(length: u64) -> Self {
        let bar = indicatif::ProgressBar::with_draw_target(
            Some(length),
            indicatif::ProgressDrawTarget::stderr(),
        );
        bar.set_style(
            indicatif::ProgressStyle::with_template("{pos}/{len} {msg}")
                .expect("static progress template"),
        );
        Self { bar }
    }
}

impl ProgressTracker for CliProgress {
    fn set_length(&self, length: u64) {
        self.bar.set_length(length);
    }

    fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn finish(&self) {
        self.bar.finish();
    }

    fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_progress_counts() {
        let progress = SilentProgress::new();
        progress.set_length(3);
        progress.increment(1);
        progress.increment(1);

        assert_eq!(progress.position(), 2);
        assert_eq!(progress.length(), 3);
        assert!(!progress.is_finished());

        progress.finish();
        assert!(progress.is_finished());
    }

    #[test]
    fn test_log_progress_delegates_counting() {
        let progress = LogProgress::new();
        progress.set_length(10);
        progress.increment(4);
        assert_eq!(progress.position(), 4);
        assert_eq!(progress.length(), 10);
    }
}
