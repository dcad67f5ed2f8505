//! Contribution-concentration probe: normalized Shannon entropy of commits per author.

use std::collections::HashMap;

use async_trait::async_trait;
use hub_client::{CommitEntry, GitHubRepo, RepoId};

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

#[derive(Debug, Clone, Default)]
pub struct BusFactorProbe;

impl BusFactorProbe {
    pub fn new() -> Self {
        Self
    }
}

/// `H / log2(N)` over the per-contributor histogram; 0.0 when `N <= 1` or
/// there are no contributions.
pub fn bus_factor(counts: &[u64]) -> f64 {
    let contributors = counts.iter().filter(|c| **c > 0).count();
    let total: u64 = counts.iter().sum();
    if contributors <= 1 || total == 0 {
        return 0.0;
    }

    let total = total as f64;
    let entropy: f64 = counts
        .iter()
        .filter(|c| **c > 0)
        .map(|c| {
            let p = *c as f64 / total;
            -p * p.log2()
        })
        .sum();
    entropy / (contributors as f64).log2()
}

/// Contributions per author. A commit with several authors credits each of them.
pub fn contribution_histogram(commits: &[CommitEntry]) -> HashMap<&str, u64> {
    let mut histogram = HashMap::new();
    for author in commits.iter().flat_map(|c| c.authors.iter()) {
        *histogram.entry(author.user.as_str()).or_insert(0) += 1;
    }
    histogram
}

#[async_trait]
impl Probe for BusFactorProbe {
    fn id(&self) -> ProbeId {
        ProbeId::BusFactor
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.model_url.is_some() || artifact.code_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        let commits = match (&artifact.model_url, &artifact.code_url) {
            (Some(model), _) => {
                let repo = RepoId::from_url(model)?;
                ctx.fetch(ctx.source().list_commits(&repo)).await?
            }
            (None, Some(code)) => {
                let repo = GitHubRepo::from_url(code)?;
                ctx.fetch(ctx.source().github_commits(&repo)).await?
            }
            (None, None) => return Ok(Outcome::NotApplicable),
        };

        let counts: Vec<u64> = contribution_histogram(&commits).into_values().collect();
        Ok(Outcome::scalar(bus_factor(&counts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hub_client::fakes::StaticSource;

    use crate::probe::{ProbeResult, ProbeStatus, Score};

    fn commits(authors: &[(&str, usize)]) -> Vec<CommitEntry> {
        authors
            .iter()
            .flat_map(|(name, n)| std::iter::repeat_with(|| CommitEntry::by(&[*name])).take(*n))
            .collect()
    }

    #[test]
    fn test_even_split_is_max_entropy() {
        assert_eq!(bus_factor(&[5, 5]), 1.0);
        assert!((bus_factor(&[3, 3, 3]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_or_zero_contributors_score_zero() {
        assert_eq!(bus_factor(&[10]), 0.0);
        assert_eq!(bus_factor(&[]), 0.0);
        assert_eq!(bus_factor(&[0, 0]), 0.0);
    }

    #[test]
    fn test_dominant_contributor_approaches_zero() {
        let mut counts: Vec<u64> = vec![10_000];
        counts.extend(std::iter::repeat(1).take(20));
        let score = bus_factor(&counts);
        assert!(score > 0.0 && score < 0.05, "score = {score}");
    }

    #[test]
    fn test_co_authored_commits_credit_everyone() {
        let history = vec![CommitEntry::by(&["alice", "bob"]), CommitEntry::by(&["alice"])];
        let histogram = contribution_histogram(&history);
        assert_eq!(histogram["alice"], 2);
        assert_eq!(histogram["bob"], 1);
    }

    #[tokio::test]
    async fn test_probe_reads_model_commits() {
        let source = StaticSource::new().with_commits("acme/m", commits(&[("alice", 5), ("bob", 5)]));
        let ctx = ProbeContext::new(Arc::new(source));
        let artifact = ArtifactReference::new().with_model("https://huggingface.co/acme/m");
        let result = BusFactorProbe::new().compute(&artifact, &ctx).await;
        assert_eq!(result.status, ProbeStatus::Ok);
        assert_eq!(result.value, Score::Scalar(1.0));
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_code_repository() {
        let source = StaticSource::new().with_github_commits("acme/tool", commits(&[("carol", 4)]));
        let ctx = ProbeContext::new(Arc::new(source));
        let artifact = ArtifactReference::new().with_code("https://github.com/acme/tool");
        let result = BusFactorProbe::new().compute(&artifact, &ctx).await;
        assert_eq!(result.status, ProbeStatus::Ok);
        assert_eq!(result.value, Score::Scalar(0.0));
    }

    #[tokio::test]
    async fn test_probe_without_urls_is_not_applicable() {
        let ctx = ProbeContext::new(Arc::new(StaticSource::offline()));
        let result = BusFactorProbe::new()
            .compute(&ArtifactReference::new().with_dataset("https://huggingface.co/datasets/x"), &ctx)
            .await;
        assert_eq!(result, ProbeResult::not_applicable());
    }
}
