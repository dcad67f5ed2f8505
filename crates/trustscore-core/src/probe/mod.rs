//! Probe contract and the probe implementations.
//!
//! Every probe implements [`Probe`]. Implementors write the fallible
//! [`Probe::evaluate`]; the provided [`Probe::compute`] turns it into a
//! [`ProbeResult`] that never carries an error:
//!
//! - required input absent: `NotApplicable`, latency 0, no fetch attempted
//! - `evaluate` error: `Failed`, value 0.0, elapsed latency
//! - otherwise: `Ok`, value clamped into `[0, 1]`

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hub_client::{HubResult, MetadataSource};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::artifact::ArtifactReference;
use crate::error::{EvalResult, ProbeError};
use crate::normalize::clamp01;
use crate::telemetry::redact_secrets;

pub mod bus_factor;
pub mod code_quality;
pub mod dataset_and_code;
pub mod dataset_quality;
pub mod license;
pub mod license_compat;
pub mod performance;
pub mod ramp_up;
pub mod reproducibility;
pub mod reviewedness;
pub mod size;

pub use bus_factor::BusFactorProbe;
pub use code_quality::CodeQualityProbe;
pub use dataset_and_code::DatasetAndCodeProbe;
pub use dataset_quality::DatasetQualityProbe;
pub use license::LicenseProbe;
pub use license_compat::LicenseCompatibilityProbe;
pub use performance::{PerformanceClaimProbe, PerformanceWeights};
pub use ramp_up::RampUpProbe;
pub use reproducibility::ReproducibilityProbe;
pub use reviewedness::ReviewednessProbe;
pub use size::{DeviceProfile, SizeCompatibilityProbe};

/// Identity of a probe; also the record field it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeId {
    RampUpTime,
    BusFactor,
    PerformanceClaims,
    License,
    SizeScore,
    DatasetAndCodeScore,
    DatasetQuality,
    CodeQuality,
    Reproducibility,
    Reviewedness,
    LicenseCompat,
}

impl ProbeId {
    /// Probes behind the stable record fields, in record order.
    pub const STABLE: [ProbeId; 8] = [
        ProbeId::RampUpTime,
        ProbeId::BusFactor,
        ProbeId::PerformanceClaims,
        ProbeId::License,
        ProbeId::SizeScore,
        ProbeId::DatasetAndCodeScore,
        ProbeId::DatasetQuality,
        ProbeId::CodeQuality,
    ];

    /// Probes reported only in the extended block.
    pub const EXTENDED: [ProbeId; 3] = [
        ProbeId::Reproducibility,
        ProbeId::Reviewedness,
        ProbeId::LicenseCompat,
    ];

    /// Record field this probe fills.
    pub fn field_name(&self) -> &'static str {
        match self {
            ProbeId::RampUpTime => "ramp_up_time",
            ProbeId::BusFactor => "bus_factor",
            ProbeId::PerformanceClaims => "performance_claims",
            ProbeId::License => "license",
            ProbeId::SizeScore => "size_score",
            ProbeId::DatasetAndCodeScore => "dataset_and_code_score",
            ProbeId::DatasetQuality => "dataset_quality",
            ProbeId::CodeQuality => "code_quality",
            ProbeId::Reproducibility => "reproducibility",
            ProbeId::Reviewedness => "reviewedness",
            ProbeId::LicenseCompat => "license_compat",
        }
    }

    pub fn is_extended(&self) -> bool {
        Self::EXTENDED.contains(self)
    }
}

impl std::fmt::Display for ProbeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    NotApplicable,
    Failed,
}

/// A probe value: one scalar, or one scalar per device profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Scalar(f64),
    Devices(BTreeMap<String, f64>),
}

impl Score {
    /// The value when it is a single scalar.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Score::Scalar(v) => Some(*v),
            Score::Devices(_) => None,
        }
    }

    /// The per-profile map when the value is one.
    pub fn as_devices(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            Score::Scalar(_) => None,
            Score::Devices(map) => Some(map),
        }
    }

    /// Same shape with every component clamped into `[0, 1]`.
    pub fn clamped(self) -> Self {
        match self {
            Score::Scalar(v) => Score::Scalar(clamp01(v)),
            Score::Devices(map) => {
                Score::Devices(map.into_iter().map(|(k, v)| (k, clamp01(v))).collect())
            }
        }
    }
}

/// Output of one probe invocation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub value: Score,
    pub latency_ms: u64,
    pub status: ProbeStatus,
}

impl ProbeResult {
    /// Successful result; `value` is clamped into `[0, 1]`.
    pub fn ok(value: Score, latency_ms: u64) -> Self {
        Self {
            value: value.clamped(),
            latency_ms,
            status: ProbeStatus::Ok,
        }
    }

    pub fn not_applicable() -> Self {
        Self {
            value: Score::Scalar(0.0),
            latency_ms: 0,
            status: ProbeStatus::NotApplicable,
        }
    }

    /// Failed result: value 0.0 with the time spent before failing.
    pub fn failed(latency_ms: u64) -> Self {
        Self {
            value: Score::Scalar(0.0),
            latency_ms,
            status: ProbeStatus::Failed,
        }
    }
}

/// What `evaluate` found.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Scored(Score),
    /// Inputs exist but the signal does not apply (e.g. no linked repository).
    NotApplicable,
}

impl Outcome {
    pub fn scalar(value: f64) -> Self {
        Outcome::Scored(Score::Scalar(value))
    }
}

/// Everything a probe may use besides the artifact itself.
#[derive(Clone)]
pub struct ProbeContext {
    source: Arc<dyn MetadataSource>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ProbeContext {
    /// Context with a fresh cancellation token and no deadline.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Where all metadata is fetched from.
    pub fn source(&self) -> &dyn MetadataSource {
        self.source.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the orchestrator gives up on this probe.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Await a metadata fetch, abandoning it as soon as the probe is cancelled.
    pub async fn fetch<T, F>(&self, request: F) -> EvalResult<T>
    where
        F: Future<Output = HubResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProbeError::Cancelled),
            result = request => Ok(result?),
        }
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
pub trait Probe: Send + Sync {
    fn id(&self) -> ProbeId;

    /// Whether the artifact carries the inputs this probe needs. Checked
    /// without any network access.
    fn is_applicable(&self, artifact: &ArtifactReference) -> bool;

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome>;

    async fn compute(&self, artifact: &ArtifactReference, ctx: &ProbeContext) -> ProbeResult {
        if !self.is_applicable(artifact) {
            return ProbeResult::not_applicable();
        }

        let start = Instant::now();
        let outcome = self.evaluate(artifact, ctx).await;
        let latency_ms = elapsed_ms(start);

        match outcome {
            Ok(Outcome::Scored(value)) => {
                debug!(probe = %self.id(), latency_ms, "probe scored");
                ProbeResult::ok(value, latency_ms)
            }
            Ok(Outcome::NotApplicable) => ProbeResult {
                latency_ms,
                ..ProbeResult::not_applicable()
            },
            Err(e) => {
                warn!(
                    probe = %self.id(),
                    error = %redact_secrets(&e.to_string()),
                    "probe failed"
                );
                ProbeResult::failed(latency_ms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_client::fakes::StaticSource;
    use hub_client::{HubError, RepoId};

    struct Fixed(EvalResult<Outcome>);

    #[async_trait]
    impl Probe for Fixed {
        fn id(&self) -> ProbeId {
            ProbeId::BusFactor
        }

        fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
            artifact.model_url.is_some()
        }

        async fn evaluate(&self, _: &ArtifactReference, _: &ProbeContext) -> EvalResult<Outcome> {
            match &self.0 {
                Ok(outcome) => Ok(outcome.clone()),
                Err(e) => Err(ProbeError::MissingData(e.to_string())),
            }
        }
    }

    fn ctx() -> ProbeContext {
        ProbeContext::new(Arc::new(StaticSource::new()))
    }

    fn model() -> ArtifactReference {
        ArtifactReference::new().with_model("https://huggingface.co/a/b")
    }

    #[tokio::test]
    async fn test_missing_input_is_not_applicable_without_latency() {
        let probe = Fixed(Ok(Outcome::scalar(1.0)));
        let result = probe.compute(&ArtifactReference::new(), &ctx()).await;
        assert_eq!(result, ProbeResult::not_applicable());
    }

    #[tokio::test]
    async fn test_error_becomes_failed_zero() {
        let probe = Fixed(Err(ProbeError::Parse("bad".to_string())));
        let result = probe.compute(&model(), &ctx()).await;
        assert_eq!(result.status, ProbeStatus::Failed);
        assert_eq!(result.value, Score::Scalar(0.0));
    }

    #[tokio::test]
    async fn test_scores_are_clamped() {
        let probe = Fixed(Ok(Outcome::scalar(3.5)));
        let result = probe.compute(&model(), &ctx()).await;
        assert_eq!(result.status, ProbeStatus::Ok);
        assert_eq!(result.value, Score::Scalar(1.0));

        let devices = BTreeMap::from([("a".to_string(), -1.0), ("b".to_string(), 0.5)]);
        let probe = Fixed(Ok(Outcome::Scored(Score::Devices(devices))));
        let result = probe.compute(&model(), &ctx()).await;
        let map = result.value.as_devices().unwrap();
        assert_eq!(map["a"], 0.0);
        assert_eq!(map["b"], 0.5);
    }

    #[tokio::test]
    async fn test_fetch_observes_cancellation() {
        let ctx = ctx();
        ctx.cancellation().cancel();
        let result = ctx
            .fetch(ctx.source().model_info(&RepoId::model("a/b")))
            .await;
        assert!(matches!(result, Err(ProbeError::Cancelled)));
    }

    #[tokio::test]
    async fn test_fetch_maps_hub_errors() {
        let ctx = ctx();
        let result = ctx
            .fetch(ctx.source().model_info(&RepoId::model("a/b")))
            .await;
        assert!(matches!(result, Err(ProbeError::Fetch(HubError::NotFound(_)))));
    }

    #[test]
    fn test_probe_id_field_names_are_unique() {
        let mut names: Vec<_> = ProbeId::STABLE
            .iter()
            .chain(ProbeId::EXTENDED.iter())
            .map(|id| id.field_name())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 11);
        assert!(ProbeId::Reviewedness.is_extended());
        assert!(!ProbeId::License.is_extended());
    }
}
