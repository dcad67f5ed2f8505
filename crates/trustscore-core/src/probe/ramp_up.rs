//! Adoption proxy: log-scaled download count.

use async_trait::async_trait;
use hub_client::RepoId;

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::normalize::clamp01;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

#[derive(Debug, Clone)]
pub struct RampUpProbe {
    offset: f64,
    scale: f64,
}

impl Default for RampUpProbe {
    fn default() -> Self {
        Self::new(5.0, 10.0)
    }
}

impl RampUpProbe {
    /// `offset` is `k` and `scale` is `c` in `clamp01((ln d - k) / c)`.
    pub fn new(offset: f64, scale: f64) -> Self {
        Self { offset, scale }
    }

    /// `None` when downloads are not positive.
    pub fn score(&self, downloads: u64) -> Option<f64> {
        if downloads == 0 {
            return None;
        }
        Some(clamp01(((downloads as f64).ln() - self.offset) / self.scale))
    }
}

#[async_trait]
impl Probe for RampUpProbe {
    fn id(&self) -> ProbeId {
        ProbeId::RampUpTime
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.model_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        let Some(url) = artifact.model_url.as_deref() else {
            return Ok(Outcome::NotApplicable);
        };
        let repo = RepoId::from_url(url)?;
        let info = ctx.fetch(ctx.source().model_info(&repo)).await?;

        Ok(info
            .downloads
            .and_then(|d| self.score(d))
            .map(Outcome::scalar)
            .unwrap_or(Outcome::NotApplicable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hub_client::fakes::StaticSource;
    use hub_client::ModelInfo;

    use crate::probe::ProbeStatus;

    #[test]
    fn test_monotonic_in_downloads() {
        let probe = RampUpProbe::default();
        let mut previous = 0.0;
        for downloads in [1u64, 10, 100, 148, 149, 1_000, 50_000, 3_000_000, 100_000_000, u64::MAX] {
            let score = probe.score(downloads).unwrap();
            assert!(score >= previous, "{downloads} -> {score} < {previous}");
            assert!((0.0..=1.0).contains(&score));
            previous = score;
        }
    }

    #[test]
    fn test_formula_and_saturation() {
        let probe = RampUpProbe::default();
        let expected = (1000f64.ln() - 5.0) / 10.0;
        assert!((probe.score(1000).unwrap() - expected).abs() < 1e-12);
        assert_eq!(probe.score(100).unwrap(), 0.0);
        assert_eq!(probe.score(10_000_000_000).unwrap(), 1.0);
        assert_eq!(probe.score(0), None);
    }

    #[tokio::test]
    async fn test_missing_or_zero_downloads_not_applicable() {
        for downloads in [None, Some(0)] {
            let source = StaticSource::new().with_model(
                "acme/m",
                ModelInfo {
                    downloads,
                    ..ModelInfo::default()
                },
            );
            let ctx = ProbeContext::new(Arc::new(source));
            let artifact = ArtifactReference::new().with_model("https://huggingface.co/acme/m");
            let result = RampUpProbe::default().compute(&artifact, &ctx).await;
            assert_eq!(result.status, ProbeStatus::NotApplicable);
            assert_eq!(result.value.as_scalar(), Some(0.0));
        }
    }
}
