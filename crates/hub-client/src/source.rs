//! The external-data-fetch interface every probe reads through.
//!
//! Backends:
//! - [`HubClient`](crate::HubClient): live Hugging Face Hub + GitHub REST APIs
//! - [`StaticSource`](crate::fakes::StaticSource): in-memory fixtures for tests
//!
//! Dropping a returned future aborts the underlying request; callers rely on
//! this for cancellation.

use async_trait::async_trait;

use crate::repo::{GitHubRepo, RepoId};
use crate::types::{CommitEntry, DatasetInfo, GitHubRepoInfo, ModelInfo, PullRequestSummary};
use crate::HubResult;

#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Model metadata (downloads, tags, card front matter, safetensors totals).
    async fn model_info(&self, repo: &RepoId) -> HubResult<ModelInfo>;

    /// Dataset metadata.
    async fn dataset_info(&self, repo: &RepoId) -> HubResult<DatasetInfo>;

    /// Raw README of a hub repository. `Ok(None)` when the repository has none.
    async fn model_card(&self, repo: &RepoId) -> HubResult<Option<String>>;

    /// Commit history of a hub repository, newest first.
    async fn list_commits(&self, repo: &RepoId) -> HubResult<Vec<CommitEntry>>;

    /// Repository summary including the detected license.
    async fn github_repo(&self, repo: &GitHubRepo) -> HubResult<GitHubRepoInfo>;

    /// Raw README of a GitHub repository. `Ok(None)` when the repository has none.
    async fn github_readme(&self, repo: &GitHubRepo) -> HubResult<Option<String>>;

    /// Commit history of a GitHub repository, newest first.
    async fn github_commits(&self, repo: &GitHubRepo) -> HubResult<Vec<CommitEntry>>;

    /// Number of contributors (first page only; callers cap the value anyway).
    async fn github_contributor_count(&self, repo: &GitHubRepo) -> HubResult<u64>;

    /// Open code-scanning alerts. `Ok(None)` when scanning is disabled or not visible.
    async fn github_code_scanning_alerts(&self, repo: &GitHubRepo) -> HubResult<Option<u64>>;

    /// Recently closed pull requests that were merged, at most `limit` of them.
    async fn github_merged_pulls(
        &self,
        repo: &GitHubRepo,
        limit: usize,
    ) -> HubResult<Vec<PullRequestSummary>>;
}
