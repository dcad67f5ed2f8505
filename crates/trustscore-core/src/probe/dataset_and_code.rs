//! Blend of the dataset and code rubrics, weighted over the inputs that exist.

use async_trait::async_trait;
use tracing::warn;

use crate::artifact::ArtifactReference;
use crate::error::{EvalResult, ProbeError};
use crate::normalize::clamp01;
use crate::probe::code_quality::code_score;
use crate::probe::dataset_quality::dataset_score;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};
use crate::telemetry::redact_secrets;

const DATASET_WEIGHT: f64 = 0.6;
const CODE_WEIGHT: f64 = 0.4;

/// Weighted mean of the available parts, renormalized over their weights.
/// `None` when no part is available.
pub fn blend(dataset: Option<f64>, code: Option<f64>) -> Option<f64> {
    let parts = [(DATASET_WEIGHT, dataset), (CODE_WEIGHT, code)];
    let total_weight: f64 = parts.iter().filter(|(_, s)| s.is_some()).map(|(w, _)| w).sum();
    if total_weight == 0.0 {
        return None;
    }
    let weighted: f64 = parts
        .iter()
        .filter_map(|(w, s)| s.map(|s| w * s))
        .sum();
    Some(clamp01(weighted / total_weight))
}

#[derive(Debug, Clone, Default)]
pub struct DatasetAndCodeProbe;

impl DatasetAndCodeProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for DatasetAndCodeProbe {
    fn id(&self) -> ProbeId {
        ProbeId::DatasetAndCodeScore
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.dataset_url.is_some() || artifact.code_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        let dataset = async {
            match artifact.dataset_url.as_deref() {
                Some(url) => Some(dataset_score(url, ctx).await),
                None => None,
            }
        };
        let code = async {
            match artifact.code_url.as_deref() {
                Some(url) => Some(code_score(url, ctx).await),
                None => None,
            }
        };
        let (dataset, code) = tokio::join!(dataset, code);

        // A failing half is dropped from the blend; the probe fails only when
        // nothing usable is left.
        let mut first_error: Option<ProbeError> = None;
        let mut keep = |part: Option<EvalResult<f64>>, label: &str| match part {
            Some(Ok(score)) => Some(score),
            Some(Err(ProbeError::Cancelled)) => {
                first_error.get_or_insert(ProbeError::Cancelled);
                None
            }
            Some(Err(e)) => {
                warn!(part = label, error = %redact_secrets(&e.to_string()), "blend input dropped");
                first_error.get_or_insert(e);
                None
            }
            None => None,
        };
        let dataset = keep(dataset, "dataset");
        let code = keep(code, "code");

        match (blend(dataset, code), first_error) {
            (Some(score), _) => Ok(Outcome::scalar(score)),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(Outcome::NotApplicable),
        }
    }
}
