//! Binary license gate against a caller-supplied allow-set.

use std::collections::BTreeSet;

use async_trait::async_trait;
use hub_client::{ModelInfo, RepoId};
use tracing::debug;

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::normalize::{find_license_in_text, normalize_license};
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

/// Licenses accepted when no allow-set is configured.
pub const DEFAULT_ALLOWED_LICENSES: &[&str] =
    &["mit", "apache-2.0", "bsd-2-clause", "bsd-3-clause", "mpl-2.0"];

#[derive(Debug, Clone)]
pub struct LicenseProbe {
    allowed: BTreeSet<String>,
}

impl Default for LicenseProbe {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_LICENSES.iter().copied())
    }
}

impl LicenseProbe {
    /// Entries are normalized; unrecognized entries are kept lower-cased.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                normalize_license(raw)
                    .map(str::to_string)
                    .unwrap_or_else(|| raw.trim().to_lowercase())
            })
            .filter(|key| !key.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    pub fn permits(&self, canonical: &str) -> bool {
        self.allowed.contains(canonical)
    }
}

/// License declared in hub metadata: the card `license` field, then `license:<id>` tags.
pub fn license_from_metadata(info: &ModelInfo) -> Option<&'static str> {
    if let Some(found) = info.card_str("license").and_then(normalize_license) {
        return Some(found);
    }
    info.tags.iter().find_map(|tag| {
        let lower = tag.to_lowercase();
        lower.strip_prefix("license:").and_then(normalize_license)
    })
}

/// Canonical license of a model repository: metadata first, README scan second.
pub async fn detect_model_license(
    repo: &RepoId,
    ctx: &ProbeContext,
) -> EvalResult<Option<&'static str>> {
    let info = ctx.fetch(ctx.source().model_info(repo)).await?;
    if let Some(found) = license_from_metadata(&info) {
        return Ok(Some(found));
    }
    let card = ctx.fetch(ctx.source().model_card(repo)).await?;
    Ok(card.as_deref().and_then(find_license_in_text))
}

#[async_trait]
impl Probe for LicenseProbe {
    fn id(&self) -> ProbeId {
        ProbeId::License
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

        // Undeterminable licenses are treated as not permitted.
        let score = match detect_model_license(&repo, ctx).await? {
            Some(license) => {
                debug!(repo = %repo, license, "license detected");
                if self.permits(license) {
                    1.0
                } else {
                    0.0
                }
            }
            None => {
                debug!(repo = %repo, "no license detected");
                0.0
            }
        };
        Ok(Outcome::scalar(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hub_client::fakes::StaticSource;
    use serde_json::json;

    use crate::probe::{ProbeStatus, Score};

    const URL: &str = "https://huggingface.co/acme/m";

    fn model_with_card(card: serde_json::Value) -> ModelInfo {
        ModelInfo {
            id: "acme/m".to_string(),
            card_data: Some(card),
            ..ModelInfo::default()
        }
    }

    async fn score(probe: &LicenseProbe, source: StaticSource) -> (ProbeStatus, Score) {
        let ctx = ProbeContext::new(Arc::new(source));
        let result = probe
            .compute(&ArtifactReference::new().with_model(URL), &ctx)
            .await;
        (result.status, result.value)
    }

    #[tokio::test]
    async fn test_allowed_license_scores_one() {
        let probe = LicenseProbe::new(["mit"]);
        let source = StaticSource::new().with_model("acme/m", model_with_card(json!({"license": "MIT"})));
        assert_eq!(score(&probe, source).await, (ProbeStatus::Ok, Score::Scalar(1.0)));
    }

    #[tokio::test]
    async fn test_disallowed_license_scores_zero() {
        let probe = LicenseProbe::new(["mit"]);
        let source =
            StaticSource::new().with_model("acme/m", model_with_card(json!({"license": "GPL-3.0"})));
        assert_eq!(score(&probe, source).await, (ProbeStatus::Ok, Score::Scalar(0.0)));
    }

    #[tokio::test]
    async fn test_undetectable_license_scores_zero() {
        let probe = LicenseProbe::new(["mit"]);
        let source = StaticSource::new()
            .with_model("acme/m", ModelInfo::default())
            .with_card("acme/m", "# A model\n\nNo terms are given here.");
        assert_eq!(score(&probe, source).await, (ProbeStatus::Ok, Score::Scalar(0.0)));
    }

    #[tokio::test]
    async fn test_tag_and_readme_fallbacks() {
        let probe = LicenseProbe::new(["Apache 2.0"]);
        let tagged = StaticSource::new().with_model(
            "acme/m",
            ModelInfo {
                tags: vec!["pytorch".to_string(), "license:apache-2.0".to_string()],
                ..ModelInfo::default()
            },
        );
        assert_eq!(score(&probe, tagged).await.1, Score::Scalar(1.0));

        let readme = StaticSource::new()
            .with_model("acme/m", ModelInfo::default())
            .with_card("acme/m", "## License\nThis model is released under Apache-2.0.");
        assert_eq!(score(&probe, readme).await.1, Score::Scalar(1.0));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_failed() {
        let probe = LicenseProbe::default();
        assert_eq!(
            score(&probe, StaticSource::offline()).await,
            (ProbeStatus::Failed, Score::Scalar(0.0))
        );
    }

    #[test]
    fn test_allow_set_is_normalized() {
        let probe = LicenseProbe::new(["Apache License 2.0", "MIT", "  "]);
        assert!(probe.permits("apache-2.0"));
        assert!(probe.permits("mit"));
        assert_eq!(probe.allowed().len(), 2);
    }
}
