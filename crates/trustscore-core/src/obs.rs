//! Structured observability hooks for scoring lifecycle events.
//!
//! Each scoring request runs inside a span carrying a generated request id and
//! the artifact name; the `emit_*` functions log the lifecycle events at
//! `info!` (timeouts at `warn!`).

use tracing::{info, warn, Span};
use uuid::Uuid;

use crate::probe::{ProbeId, ProbeStatus};

/// Request-scoped span for one artifact.
///
/// Attach it to futures with `tracing::Instrument::instrument` rather than
/// entering it, since scoring awaits.
#[derive(Debug, Clone)]
pub struct ScoreSpan {
    request_id: String,
    span: Span,
}

impl ScoreSpan {
    pub fn new(artifact: &str) -> Self {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("trustscore.score", request_id = %request_id, artifact = %artifact);
        Self { request_id, span }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

pub fn emit_scoring_started(artifact: &str, category: &str, probes: usize) {
    info!(event = "scoring.started", artifact = %artifact, category = %category, probes = probes);
}

pub fn emit_probe_finished(probe: ProbeId, status: ProbeStatus, latency_ms: u64) {
    info!(
        event = "probe.finished",
        probe = %probe,
        status = ?status,
        latency_ms = latency_ms,
    );
}

pub fn emit_probe_timed_out(probe: ProbeId, timeout_ms: u64) {
    warn!(event = "probe.timed_out", probe = %probe, timeout_ms = timeout_ms);
}

/// Probe task ended without a result (panic or abort).
pub fn emit_probe_crashed(probe: ProbeId, error: &dyn std::fmt::Display) {
    warn!(event = "probe.crashed", probe = %probe, error = %error);
}

pub fn emit_scoring_finished(artifact: &str, net_score: f64, duration_ms: u64, failed: usize) {
    info!(
        event = "scoring.finished",
        artifact = %artifact,
        net_score = net_score,
        duration_ms = duration_ms,
        failed_probes = failed,
    );
}
