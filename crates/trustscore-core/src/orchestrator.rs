//! Fan-out of every registered probe against one artifact, and the join that
//! turns their results into a [`CompositeScoreRecord`].
//!
//! Per request: `Dispatched → AwaitingProbes → Aggregating → Complete`.
//! Each applicable probe runs in its own task under a shared semaphore. All
//! probes share one deadline measured from dispatch; a probe still running at
//! the deadline is cancelled and recorded as failed with the timeout as its
//! latency. A panicking probe is recorded as failed. Scoring never errors.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use hub_client::MetadataSource;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::artifact::ArtifactReference;
use crate::config::{OrchestratorConfig, ScoringConfig};
use crate::metrics::ProbeMetrics;
use crate::obs::{self, ScoreSpan};
use crate::probe::{elapsed_ms, ProbeContext, ProbeId, ProbeResult, ProbeStatus};
use crate::record::CompositeScoreRecord;
use crate::registry::ProbeRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dispatched,
    AwaitingProbes,
    Aggregating,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Dispatched => "dispatched",
            Phase::AwaitingProbes => "awaiting_probes",
            Phase::Aggregating => "aggregating",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Record plus the raw per-probe results it was built from.
#[derive(Debug, Clone)]
pub struct ScoringReport {
    pub request_id: String,
    pub record: CompositeScoreRecord,
    pub results: BTreeMap<ProbeId, ProbeResult>,
}

impl ScoringReport {
    /// Outcome of probe `id`; `None` when it was not registered.
    pub fn status(&self, id: ProbeId) -> Option<ProbeStatus> {
        self.results.get(&id).map(|r| r.status)
    }
}

struct PendingProbe {
    id: ProbeId,
    cancel: CancellationToken,
    handle: JoinHandle<Option<ProbeResult>>,
}

pub struct Orchestrator {
    registry: ProbeRegistry,
    source: Arc<dyn MetadataSource>,
    config: OrchestratorConfig,
    extended: bool,
    metrics: Arc<ProbeMetrics>,
}

impl Orchestrator {
    /// Orchestrator over an explicit probe set. Only the `orchestrator` and
    /// `extended` sections of `config` are read here.
    pub fn new(
        registry: ProbeRegistry,
        source: Arc<dyn MetadataSource>,
        config: &ScoringConfig,
        metrics: Arc<ProbeMetrics>,
    ) -> Self {
        Self {
            registry,
            source,
            config: config.orchestrator.clone(),
            extended: config.extended,
            metrics,
        }
    }

    /// Orchestrator over [`ProbeRegistry::standard`].
    pub fn standard(
        config: &ScoringConfig,
        source: Arc<dyn MetadataSource>,
        metrics: Arc<ProbeMetrics>,
    ) -> Self {
        Self::new(ProbeRegistry::standard(config), source, config, metrics)
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Counters shared with the caller.
    pub fn metrics(&self) -> &Arc<ProbeMetrics> {
        &self.metrics
    }

    /// Score one artifact. Never fails; probe failures show up as zeros.
    pub async fn score(&self, artifact: &ArtifactReference) -> CompositeScoreRecord {
        self.score_detailed(artifact).await.record
    }

    /// Like [`score`](Self::score), also returning the request id and every
    /// per-probe result.
    pub async fn score_detailed(&self, artifact: &ArtifactReference) -> ScoringReport {
        let name = artifact.name();
        let span = ScoreSpan::new(&name);
        let request_id = span.request_id().to_string();
        let (record, results) = self
            .run(artifact, &name)
            .instrument(span.span().clone())
            .await;
        ScoringReport {
            request_id,
            record,
            results,
        }
    }

    fn pool_size(&self) -> usize {
        match self.config.max_concurrent {
            0 => self.registry.len().max(1),
            n => n,
        }
    }

    async fn run(
        &self,
        artifact: &ArtifactReference,
        name: &str,
    ) -> (CompositeScoreRecord, BTreeMap<ProbeId, ProbeResult>) {
        let started = Instant::now();
        let timeout = self.config.probe_timeout();
        let deadline = tokio::time::Instant::now() + timeout;

        transition(Phase::Dispatched);
        obs::emit_scoring_started(name, artifact.category(), self.registry.len());

        let mut results = BTreeMap::new();
        let pending = self.dispatch(artifact, started + timeout, &mut results);

        transition(Phase::AwaitingProbes);
        for PendingProbe {
            id,
            cancel,
            mut handle,
        } in pending
        {
            let result = match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(Some(result))) => result,
                Ok(Ok(None)) => ProbeResult::failed(elapsed_ms(started)),
                Ok(Err(join_error)) => {
                    obs::emit_probe_crashed(id, &join_error);
                    ProbeResult::failed(elapsed_ms(started))
                }
                Err(_) => {
                    cancel.cancel();
                    handle.abort();
                    self.metrics.inc_timed_out();
                    obs::emit_probe_timed_out(id, self.config.probe_timeout_ms);
                    ProbeResult::failed(self.config.probe_timeout_ms)
                }
            };
            self.count(&result);
            obs::emit_probe_finished(id, result.status, result.latency_ms);
            results.insert(id, result);
        }

        transition(Phase::Aggregating);
        let record =
            CompositeScoreRecord::assemble(artifact, &results, elapsed_ms(started), self.extended);

        transition(Phase::Complete);
        self.metrics.inc_records();
        let failed = results
            .values()
            .filter(|r| r.status == ProbeStatus::Failed)
            .count();
        obs::emit_scoring_finished(name, record.net_score, record.net_score_latency, failed);
        (record, results)
    }

    /// Spawn one task per applicable probe; inapplicable ones resolve
    /// immediately into `results`.
    fn dispatch(
        &self,
        artifact: &ArtifactReference,
        probe_deadline: Instant,
        results: &mut BTreeMap<ProbeId, ProbeResult>,
    ) -> Vec<PendingProbe> {
        let semaphore = Arc::new(Semaphore::new(self.pool_size()));
        let mut pending = Vec::new();

        for probe in self.registry.iter() {
            let id = probe.id();
            if !probe.is_applicable(artifact) {
                let result = ProbeResult::not_applicable();
                self.count(&result);
                obs::emit_probe_finished(id, result.status, result.latency_ms);
                results.insert(id, result);
                continue;
            }

            self.metrics.inc_started();
            let cancel = CancellationToken::new();
            let ctx = ProbeContext::new(Arc::clone(&self.source))
                .with_cancellation(cancel.clone())
                .with_deadline(probe_deadline);
            let probe = Arc::clone(probe);
            let artifact = artifact.clone();
            let semaphore = Arc::clone(&semaphore);
            let task_cancel = cancel.clone();

            let handle = tokio::spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    tokio::select! {
                        _ = task_cancel.cancelled() => None,
                        result = probe.compute(&artifact, &ctx) => Some(result),
                    }
                }
                .in_current_span(),
            );
            pending.push(PendingProbe { id, cancel, handle });
        }
        pending
    }

    fn count(&self, result: &ProbeResult) {
        match result.status {
            ProbeStatus::Ok => self.metrics.inc_succeeded(),
            ProbeStatus::NotApplicable => self.metrics.inc_not_applicable(),
            ProbeStatus::Failed => self.metrics.inc_failed(),
        }
    }
}

fn transition(phase: Phase) {
    debug!(phase = %phase, "orchestrator phase");
}
