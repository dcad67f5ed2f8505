//! Repository health rubric for the linked code repository.

use async_trait::async_trait;
use hub_client::GitHubRepo;

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::normalize::clamp01;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

const W_README: f64 = 0.15;
const W_DETAIL: f64 = 0.20;
const W_DOC_LINKS: f64 = 0.10;
const W_SCAN: f64 = 0.30;
const W_CONTRIBUTORS: f64 = 0.25;

/// README markers needed for full detail credit.
const FULL_DETAIL: f64 = 5.0;
/// Open code-scanning alerts at which the scan signal reaches zero.
const ALERT_CEILING: f64 = 50.0;
/// Contributors at which the contributor signal saturates.
const CONTRIBUTOR_CEILING: f64 = 25.0;

const DETAIL_MARKERS: &[&str] = &[
    "install",
    "usage",
    "example",
    "requirements",
    "quickstart",
    "contributing",
    "test",
    "api",
    "configuration",
];

const DOC_LINK_HINTS: &[&str] = &["readthedocs.io", "/docs", "docs.", "/wiki", "documentation"];

/// Raw inputs of the code rubric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeSignals {
    pub readme: Option<String>,
    pub contributors: u64,
    /// `None` when code scanning is disabled or not visible.
    pub open_alerts: Option<u64>,
}

impl CodeSignals {
    pub async fn fetch(repo: &GitHubRepo, ctx: &ProbeContext) -> EvalResult<Self> {
        let source = ctx.source();
        let (readme, contributors, open_alerts) = tokio::join!(
            ctx.fetch(source.github_readme(repo)),
            ctx.fetch(source.github_contributor_count(repo)),
            ctx.fetch(source.github_code_scanning_alerts(repo)),
        );
        Ok(Self {
            readme: readme?,
            contributors: contributors?,
            open_alerts: open_alerts?,
        })
    }

    pub fn score(&self) -> f64 {
        let text = self.readme.as_deref().unwrap_or_default().to_lowercase();
        let has_readme = !text.trim().is_empty();

        let markers = DETAIL_MARKERS.iter().filter(|m| text.contains(*m)).count();
        let detail = clamp01(markers as f64 / FULL_DETAIL);
        let doc_links = if DOC_LINK_HINTS.iter().any(|h| text.contains(h)) {
            1.0
        } else {
            0.0
        };
        let scan = self
            .open_alerts
            .map(|alerts| clamp01(1.0 - alerts as f64 / ALERT_CEILING))
            .unwrap_or(1.0);
        let contributors = clamp01(self.contributors as f64 / CONTRIBUTOR_CEILING);

        clamp01(
            W_README * if has_readme { 1.0 } else { 0.0 }
                + W_DETAIL * detail
                + W_DOC_LINKS * doc_links
                + W_SCAN * scan
                + W_CONTRIBUTORS * contributors,
        )
    }
}

/// Fetch and score the repository behind `url`.
pub async fn code_score(url: &str, ctx: &ProbeContext) -> EvalResult<f64> {
    let repo = GitHubRepo::from_url(url)?;
    Ok(CodeSignals::fetch(&repo, ctx).await?.score())
}

#[derive(Debug, Clone, Default)]
pub struct CodeQualityProbe;

impl CodeQualityProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for CodeQualityProbe {
    fn id(&self) -> ProbeId {
        ProbeId::CodeQuality
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.code_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        match artifact.code_url.as_deref() {
            Some(url) => Ok(Outcome::scalar(code_score(url, ctx).await?)),
            None => Ok(Outcome::NotApplicable),
        }
    }
}
