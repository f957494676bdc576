//! Structured observability hooks for the orchestrator's run lifecycle.
//!
//! Distinct from `artifacts::RunDir::append_event`, which writes the audited
//! `events.jsonl`: this module is ambient `tracing` output, not part of the
//! on-disk artifact contract. Events are emitted at `info!` (set `RUST_LOG`
//! to adjust, `CSP_LOG_FORMAT=json` via [`crate::telemetry::init_tracing`]
//! for machine-readable output).

use tracing::info;

/// RAII guard that enters a run-scoped tracing span for the duration of a
/// command.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("csp.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_run_started(run_id: &str, objective: &str, seed: u64) {
    info!(event = "run.started", run_id = %run_id, objective = %objective, seed = seed);
}

pub fn emit_run_finished(run_id: &str, status: &str, iteration: u32) {
    info!(event = "run.finished", run_id = %run_id, status = %status, iteration = iteration);
}

pub fn emit_tool_call_started(run_id: &str, tool_name: &str) {
    info!(event = "tool.call_started", run_id = %run_id, tool_name = %tool_name);
}

pub fn emit_tool_call_succeeded(run_id: &str, tool_name: &str) {
    info!(event = "tool.call_succeeded", run_id = %run_id, tool_name = %tool_name);
}

pub fn emit_tool_call_failed(run_id: &str, tool_name: &str, message: &str) {
    tracing::warn!(event = "tool.call_failed", run_id = %run_id, tool_name = %tool_name, message = %message);
}

pub fn emit_iteration_decided(run_id: &str, iteration: u32, mode: &str, action: &str) {
    info!(event = "iteration.decided", run_id = %run_id, iteration = iteration, mode = %mode, action = %action);
}
