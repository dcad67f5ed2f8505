//! Share of recently merged code that went through review.

use std::sync::OnceLock;

use async_trait::async_trait;
use hub_client::{GitHubRepo, PullRequestSummary, RepoId};
use regex::Regex;
use tracing::debug;

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

/// Merged pull requests inspected per repository.
const PULL_SAMPLE: usize = 50;

fn github_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://(?:www\.)?github\.com/([\w.\-]+)/([\w.\-]+)").expect("valid regex")
    })
}

/// First `github.com/<owner>/<repo>` link in free text.
pub fn github_repo_in_text(text: &str) -> Option<GitHubRepo> {
    let caps = github_link_regex().captures(text)?;
    let name = caps[2].trim_end_matches('.');
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return None;
    }
    Some(GitHubRepo::new(&caps[1], name))
}

/// `reviewed_lines / total_lines`; 0.0 when nothing changed.
pub fn review_coverage(pulls: &[PullRequestSummary]) -> f64 {
    let total: u64 = pulls.iter().map(PullRequestSummary::changed_lines).sum();
    if total == 0 {
        return 0.0;
    }
    let reviewed: u64 = pulls
        .iter()
        .filter(|pr| pr.is_reviewed())
        .map(PullRequestSummary::changed_lines)
        .sum();
    reviewed as f64 / total as f64
}

#[derive(Debug, Clone, Default)]
pub struct ReviewednessProbe;

impl ReviewednessProbe {
    pub fn new() -> Self {
        Self
    }

    async fn locate_repository(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Option<GitHubRepo>> {
        if let Some(repo) = artifact
            .code_url
            .as_deref()
            .and_then(|url| GitHubRepo::from_url(url).ok())
        {
            return Ok(Some(repo));
        }
        let Some(url) = artifact.model_url.as_deref() else {
            return Ok(None);
        };
        let model = RepoId::from_url(url)?;
        let card = ctx.fetch(ctx.source().model_card(&model)).await?;
        Ok(card.as_deref().and_then(github_repo_in_text))
    }
}

#[async_trait]
impl Probe for ReviewednessProbe {
    fn id(&self) -> ProbeId {
        ProbeId::Reviewedness
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.code_url.is_some() || artifact.model_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        let Some(repo) = self.locate_repository(artifact, ctx).await? else {
            return Ok(Outcome::NotApplicable);
        };
        let pulls = ctx
            .fetch(ctx.source().github_merged_pulls(&repo, PULL_SAMPLE))
            .await?;
        debug!(repo = %repo, pulls = pulls.len(), "merged pull requests fetched");
        Ok(Outcome::scalar(review_coverage(&pulls)))
    }
}
