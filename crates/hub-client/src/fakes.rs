//! In-memory fake for [`MetadataSource`] (testing only)
//!
//! `StaticSource` answers from fixtures registered through its builder
//! methods. Missing models, datasets and repositories are `NotFound`; missing
//! READMEs are `Ok(None)`. `offline()` turns every call into a transport error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::HubError;
use crate::repo::{GitHubRepo, RepoId};
use crate::source::MetadataSource;
use crate::types::{CommitEntry, DatasetInfo, GitHubRepoInfo, ModelInfo, PullRequestSummary};
use crate::HubResult;

#[derive(Debug, Default)]
pub struct StaticSource {
    models: HashMap<String, ModelInfo>,
    datasets: HashMap<String, DatasetInfo>,
    cards: HashMap<String, String>,
    commits: HashMap<String, Vec<CommitEntry>>,
    github_repos: HashMap<String, GitHubRepoInfo>,
    github_readmes: HashMap<String, String>,
    github_commits: HashMap<String, Vec<CommitEntry>>,
    contributors: HashMap<String, u64>,
    scan_alerts: HashMap<String, u64>,
    pulls: HashMap<String, Vec<PullRequestSummary>>,
    offline: bool,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every call fails with a transport error.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, id: &str, info: ModelInfo) -> Self {
        self.models.insert(id.to_string(), info);
        self
    }

    pub fn with_dataset(mut self, id: &str, info: DatasetInfo) -> Self {
        self.datasets.insert(id.to_string(), info);
        self
    }

    /// README of a hub repository (model or dataset), keyed by repo id.
    pub fn with_card(mut self, id: &str, text: &str) -> Self {
        self.cards.insert(id.to_string(), text.to_string());
        self
    }

    pub fn with_commits(mut self, id: &str, commits: Vec<CommitEntry>) -> Self {
        self.commits.insert(id.to_string(), commits);
        self
    }

    /// Keyed by `owner/name`.
    pub fn with_github_repo(mut self, full_name: &str, info: GitHubRepoInfo) -> Self {
        self.github_repos.insert(full_name.to_string(), info);
        self
    }

    pub fn with_github_readme(mut self, full_name: &str, text: &str) -> Self {
        self.github_readmes
            .insert(full_name.to_string(), text.to_string());
        self
    }

    pub fn with_github_commits(mut self, full_name: &str, commits: Vec<CommitEntry>) -> Self {
        self.github_commits.insert(full_name.to_string(), commits);
        self
    }

    pub fn with_contributors(mut self, full_name: &str, count: u64) -> Self {
        self.contributors.insert(full_name.to_string(), count);
        self
    }

    pub fn with_scan_alerts(mut self, full_name: &str, open_alerts: u64) -> Self {
        self.scan_alerts.insert(full_name.to_string(), open_alerts);
        self
    }

    pub fn with_merged_pulls(mut self, full_name: &str, pulls: Vec<PullRequestSummary>) -> Self {
        self.pulls.insert(full_name.to_string(), pulls);
        self
    }

    /// Number of trait calls served so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn enter(&self) -> HubResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.offline {
            return Err(HubError::Http("connection refused (offline fixture)".to_string()));
        }
        Ok(())
    }
}

fn lookup<T: Clone>(map: &HashMap<String, T>, key: &str) -> HubResult<T> {
    map.get(key)
        .cloned()
        .ok_or_else(|| HubError::NotFound(key.to_string()))
}

#[async_trait]
impl MetadataSource for StaticSource {
    async fn model_info(&self, repo: &RepoId) -> HubResult<ModelInfo> {
        self.enter()?;
        lookup(&self.models, &repo.id)
    }

    async fn dataset_info(&self, repo: &RepoId) -> HubResult<DatasetInfo> {
        self.enter()?;
        lookup(&self.datasets, &repo.id)
    }

    async fn model_card(&self, repo: &RepoId) -> HubResult<Option<String>> {
        self.enter()?;
        Ok(self.cards.get(&repo.id).cloned())
    }

    async fn list_commits(&self, repo: &RepoId) -> HubResult<Vec<CommitEntry>> {
        self.enter()?;
        lookup(&self.commits, &repo.id)
    }

    async fn github_repo(&self, repo: &GitHubRepo) -> HubResult<GitHubRepoInfo> {
        self.enter()?;
        lookup(&self.github_repos, &repo.full_name())
    }

    async fn github_readme(&self, repo: &GitHubRepo) -> HubResult<Option<String>> {
        self.enter()?;
        Ok(self.github_readmes.get(&repo.full_name()).cloned())
    }

    async fn github_commits(&self, repo: &GitHubRepo) -> HubResult<Vec<CommitEntry>> {
        self.enter()?;
        lookup(&self.github_commits, &repo.full_name())
    }

    async fn github_contributor_count(&self, repo: &GitHubRepo) -> HubResult<u64> {
        self.enter()?;
        Ok(self
            .contributors
            .get(&repo.full_name())
            .copied()
            .unwrap_or(0))
    }

    async fn github_code_scanning_alerts(&self, repo: &GitHubRepo) -> HubResult<Option<u64>> {
        self.enter()?;
        Ok(self.scan_alerts.get(&repo.full_name()).copied())
    }

    async fn github_merged_pulls(
        &self,
        repo: &GitHubRepo,
        limit: usize,
    ) -> HubResult<Vec<PullRequestSummary>> {
        self.enter()?;
        let mut pulls = self
            .pulls
            .get(&repo.full_name())
            .cloned()
            .unwrap_or_default();
        pulls.truncate(limit);
        Ok(pulls)
    }
}
