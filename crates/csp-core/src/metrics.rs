//! Global atomic counters for orchestrator observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single `tracing::info!`
//! event, e.g. at the end of a command.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    tool_calls: AtomicU64,
    tool_call_failures: AtomicU64,
    iterations_run: AtomicU64,
    runs_completed: AtomicU64,
    runs_errored: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            tool_calls: AtomicU64::new(0),
            tool_call_failures: AtomicU64::new(0),
            iterations_run: AtomicU64::new(0),
            runs_completed: AtomicU64::new(0),
            runs_errored: AtomicU64::new(0),
        }
    }

    pub fn inc_tool_calls(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_call_failures(&self) {
        self.tool_call_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_iterations_run(&self) {
        self.iterations_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_runs_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_runs_errored(&self) {
        self.runs_errored.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            tool_calls = self.tool_calls(),
            tool_call_failures = self.tool_call_failures(),
            iterations_run = self.iterations_run(),
            runs_completed = self.runs_completed(),
            runs_errored = self.runs_errored(),
        );
    }

    pub fn tool_calls(&self) -> u64 {
        self.tool_calls.load(Ordering::Relaxed)
    }

    pub fn tool_call_failures(&self) -> u64 {
        self.tool_call_failures.load(Ordering::Relaxed)
    }

    pub fn iterations_run(&self) -> u64 {
        self.iterations_run.load(Ordering::Relaxed)
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    pub fn runs_errored(&self) -> u64 {
        self.runs_errored.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.tool_calls.store(0, Ordering::Relaxed);
        self.tool_call_failures.store(0, Ordering::Relaxed);
        self.iterations_run.store(0, Ordering::Relaxed);
        self.runs_completed.store(0, Ordering::Relaxed);
        self.runs_errored.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_tool_calls();
        m.inc_tool_calls();
        assert_eq!(m.tool_calls(), 2);

        m.inc_tool_call_failures();
        assert_eq!(m.tool_call_failures(), 1);

        m.inc_iterations_run();
        assert_eq!(m.iterations_run(), 1);

        m.inc_runs_completed();
        assert_eq!(m.runs_completed(), 1);

        m.inc_runs_errored();
        assert_eq!(m.runs_errored(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_tool_calls();
        m.inc_tool_call_failures();
        m.inc_iterations_run();
        m.inc_runs_completed();
        m.inc_runs_errored();
        m.reset();
        assert_eq!(m.tool_calls(), 0);
        assert_eq!(m.tool_call_failures(), 0);
        assert_eq!(m.iterations_run(), 0);
        assert_eq!(m.runs_completed(), 0);
        assert_eq!(m.runs_errored(), 0);
    }
}
