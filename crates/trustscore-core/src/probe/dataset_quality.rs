//! Documentation rubric for a linked dataset.

use async_trait::async_trait;
use hub_client::{DatasetInfo, RepoId};
use serde_json::Value;

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::normalize::clamp01;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

const W_REQUIRED: f64 = 0.25;
const W_DETAIL: f64 = 0.35;
const W_LINKS: f64 = 0.15;
const W_FILES: f64 = 0.25;

/// Detail markers plus declared features needed for full detail credit.
const FULL_DETAIL: f64 = 6.0;

/// Dataset-card sections that indicate a documented dataset.
const DETAIL_MARKERS: &[&str] = &[
    "dataset structure",
    "data fields",
    "data splits",
    "data instances",
    "source data",
    "annotation",
    "curation",
    "personal and sensitive",
    "bias",
    "limitations",
    "citation",
];

/// Hosts whose links point at primary sources for a dataset.
pub(crate) const AUTHORITATIVE_HOSTS: &[&str] = &[
    "arxiv.org",
    "doi.org",
    "aclanthology.org",
    "paperswithcode.com",
    "zenodo.org",
    "openreview.net",
];

/// Sub-signals of the dataset rubric, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSignals {
    pub required: f64,
    pub detail: f64,
    pub links: f64,
    pub files: f64,
}

impl DatasetSignals {
    pub fn collect(info: &DatasetInfo, readme: Option<&str>) -> Self {
        let text = readme.unwrap_or_default().to_lowercase();

        let has_description = info
            .description
            .as_deref()
            .or_else(|| info.card_str("description"))
            .is_some_and(|d| !d.trim().is_empty())
            || !text.trim().is_empty();
        let has_license = info.card_str("license").is_some()
            || info
                .tags
                .iter()
                .any(|t| t.to_lowercase().starts_with("license:"));

        let markers = DETAIL_MARKERS.iter().filter(|m| text.contains(*m)).count();
        let detail_count = markers + declared_features(info);

        let files = match info.siblings.len() {
            0 => 0.0,
            1 => 0.5,
            _ => 1.0,
        };

        Self {
            required: if has_description && has_license { 1.0 } else { 0.0 },
            detail: clamp01(detail_count as f64 / FULL_DETAIL),
            links: if AUTHORITATIVE_HOSTS.iter().any(|h| text.contains(h)) {
                1.0
            } else {
                0.0
            },
            files,
        }
    }

    pub fn score(&self) -> f64 {
        clamp01(
            W_REQUIRED * self.required
                + W_DETAIL * self.detail
                + W_LINKS * self.links
                + W_FILES * self.files,
        )
    }
}

/// Features declared in the card front matter (`dataset_info.features` or `features`).
fn declared_features(info: &DatasetInfo) -> usize {
    let features = info
        .card_value("dataset_info")
        .and_then(|di| match di {
            Value::Array(configs) => configs.first().and_then(|c| c.get("features")),
            other => other.get("features"),
        })
        .or_else(|| info.card_value("features"));
    match features {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
        _ => 0,
    }
}

/// Fetch dataset metadata and README and score them.
pub async fn dataset_score(url: &str, ctx: &ProbeContext) -> EvalResult<f64> {
    let repo = RepoId::from_url(url)?;
    let source = ctx.source();
    let (info, readme) = tokio::join!(
        ctx.fetch(source.dataset_info(&repo)),
        ctx.fetch(source.model_card(&repo)),
    );
    let (info, readme) = (info?, readme?);
    Ok(DatasetSignals::collect(&info, readme.as_deref()).score())
}

#[derive(Debug, Clone, Default)]
pub struct DatasetQualityProbe;

impl DatasetQualityProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for DatasetQualityProbe {
    fn id(&self) -> ProbeId {
        ProbeId::DatasetQuality
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.dataset_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        match artifact.dataset_url.as_deref() {
            Some(url) => Ok(Outcome::scalar(dataset_score(url, ctx).await?)),
            None => Ok(Outcome::NotApplicable),
        }
    }
}
