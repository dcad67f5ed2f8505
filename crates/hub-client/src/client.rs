//! Live HTTP client for the Hugging Face Hub and GitHub REST APIs.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::HubError;
use crate::repo::{GitHubRepo, RepoId};
use crate::source::MetadataSource;
use crate::types::{
    CommitAuthor, CommitEntry, DatasetInfo, GitHubRepoInfo, ModelInfo, PullRequestSummary,
};
use crate::HubResult;

const GITHUB_JSON: &str = "application/vnd.github+json";
const GITHUB_RAW: &str = "application/vnd.github.raw";

const DEFAULT_HUB_URL: &str = "https://huggingface.co";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Closed PRs listed per request when sampling review coverage.
const PULLS_PAGE_SIZE: usize = 50;
/// PR detail requests in flight at once.
const PULL_DETAIL_CONCURRENCY: usize = 8;

/// Endpoints and credentials for the metadata client.
#[derive(Clone)]
pub struct HubConfig {
    /// Hub root, e.g. `https://huggingface.co`
    pub hub_url: String,
    /// GitHub REST root, e.g. `https://api.github.com`
    pub github_api_url: String,
    /// Bearer token for the hub (optional for public repositories)
    pub hf_token: Option<String>,
    /// Bearer token for GitHub (raises the anonymous rate limit)
    pub github_token: Option<String>,
    /// Client-side request timeout
    pub request_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_URL, DEFAULT_GITHUB_API_URL)
    }
}

impl HubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `HF_ENDPOINT`, `GITHUB_API_URL`, `HF_TOKEN` and
    /// `GITHUB_TOKEN` as read through `lookup`. Blank values are ignored.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::new(
            &var("HF_ENDPOINT").unwrap_or_else(|| DEFAULT_HUB_URL.to_string()),
            &var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
        );
        config.hf_token = var("HF_TOKEN");
        config.github_token = var("GITHUB_TOKEN");
        config
    }

    /// Config pointing at explicit endpoints, without credentials
    pub fn new(hub_url: &str, github_api_url: &str) -> Self {
        HubConfig {
            hub_url: hub_url.trim_end_matches('/').to_string(),
            github_api_url: github_api_url.trim_end_matches('/').to_string(),
            hf_token: None,
            github_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_hf_token(mut self, token: &str) -> Self {
        self.hf_token = Some(token.to_string());
        self
    }

    pub fn with_github_token(mut self, token: &str) -> Self {
        self.github_token = Some(token.to_string());
        self
    }
}

impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("hub_url", &self.hub_url)
            .field("github_api_url", &self.github_api_url)
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<redacted>"))
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Which credential a request carries.
#[derive(Debug, Clone, Copy)]
enum Auth {
    Hub,
    GitHub,
}

/// `reqwest`-backed [`MetadataSource`].
pub struct HubClient {
    config: HubConfig,
    http: reqwest::Client,
}

impl HubClient {
    pub fn new(config: HubConfig) -> HubResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("trustscore/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;
        Ok(HubClient { config, http })
    }

    /// Create client from environment variables
    pub fn from_env() -> HubResult<Self> {
        Self::new(HubConfig::from_env())
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn hub(&self, path: &str) -> String {
        format!("{}/{}", self.config.hub_url.trim_end_matches('/'), path)
    }

    fn github(&self, repo: &GitHubRepo, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.config.github_api_url.trim_end_matches('/'),
            repo.owner,
            repo.name,
            suffix
        )
    }

    /// Send a GET and map non-success statuses to errors.
    async fn fetch(
        &self,
        url: &str,
        auth: Auth,
        accept: Option<&str>,
    ) -> HubResult<reqwest::Response> {
        debug!(url = %url, "GET");
        let mut request = self.http.get(url);
        let token = match auth {
            Auth::Hub => self.config.hf_token.as_deref(),
            Auth::GitHub => self.config.github_token.as_deref(),
        };
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(HubError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(HubError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        auth: Auth,
        accept: Option<&str>,
    ) -> HubResult<T> {
        let body = self.fetch(url, auth, accept).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Text body, or `None` when the resource does not exist.
    async fn get_text(&self, url: &str, auth: Auth, accept: Option<&str>) -> HubResult<Option<String>> {
        match self.fetch(url, auth, accept).await {
            Ok(response) => Ok(Some(response.text().await?)),
            Err(HubError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Deserialize)]
struct GhCommit {
    #[serde(default)]
    sha: String,
    #[serde(default)]
    commit: Option<GhCommitBody>,
    #[serde(default)]
    author: Option<GhUser>,
}

#[derive(Deserialize)]
struct GhCommitBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    author: Option<GhGitAuthor>,
}

#[derive(Deserialize)]
struct GhGitAuthor {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhPullListing {
    number: u64,
    #[serde(default)]
    merged_at: Option<String>,
}

impl From<GhCommit> for CommitEntry {
    fn from(raw: GhCommit) -> Self {
        let body = raw.commit;
        // Prefer the GitHub account; fall back to the git author identity.
        let user = raw.author.map(|u| u.login).or_else(|| {
            body.as_ref()
                .and_then(|b| b.author.as_ref())
                .and_then(|a| a.email.clone().or_else(|| a.name.clone()))
        });
        CommitEntry {
            id: raw.sha,
            title: body
                .map(|b| b.message.lines().next().unwrap_or_default().to_string())
                .unwrap_or_default(),
            authors: user.map(|user| CommitAuthor { user }).into_iter().collect(),
        }
    }
}

#[async_trait]
impl MetadataSource for HubClient {
    async fn model_info(&self, repo: &RepoId) -> HubResult<ModelInfo> {
        let url = self.hub(&format!("api/{}", repo.api_path()));
        self.get_json(&url, Auth::Hub, None).await
    }

    async fn dataset_info(&self, repo: &RepoId) -> HubResult<DatasetInfo> {
        let url = self.hub(&format!("api/{}", repo.api_path()));
        self.get_json(&url, Auth::Hub, None).await
    }

    async fn model_card(&self, repo: &RepoId) -> HubResult<Option<String>> {
        let url = self.hub(&format!("{}/raw/main/README.md", repo.page_path()));
        self.get_text(&url, Auth::Hub, None).await
    }

    async fn list_commits(&self, repo: &RepoId) -> HubResult<Vec<CommitEntry>> {
        let url = self.hub(&format!("api/{}/commits/main", repo.api_path()));
        self.get_json(&url, Auth::Hub, None).await
    }

    async fn github_repo(&self, repo: &GitHubRepo) -> HubResult<GitHubRepoInfo> {
        let url = self.github(repo, "");
        self.get_json(&url, Auth::GitHub, Some(GITHUB_JSON)).await
    }

    async fn github_readme(&self, repo: &GitHubRepo) -> HubResult<Option<String>> {
        let url = self.github(repo, "/readme");
        self.get_text(&url, Auth::GitHub, Some(GITHUB_RAW)).await
    }

    async fn github_commits(&self, repo: &GitHubRepo) -> HubResult<Vec<CommitEntry>> {
        let url = self.github(repo, "/commits?per_page=100");
        let raw: Vec<GhCommit> = self.get_json(&url, Auth::GitHub, Some(GITHUB_JSON)).await?;
        Ok(raw.into_iter().map(CommitEntry::from).collect())
    }

    async fn github_contributor_count(&self, repo: &GitHubRepo) -> HubResult<u64> {
        let url = self.github(repo, "/contributors?per_page=100&anon=1");
        let body = self
            .fetch(&url, Auth::GitHub, Some(GITHUB_JSON))
            .await?
            .bytes()
            .await?;
        // Empty repositories answer 204 with no body.
        if body.is_empty() {
            return Ok(0);
        }
        let contributors: Vec<serde_json::Value> = serde_json::from_slice(&body)?;
        Ok(contributors.len() as u64)
    }

    async fn github_code_scanning_alerts(&self, repo: &GitHubRepo) -> HubResult<Option<u64>> {
        let url = self.github(repo, "/code-scanning/alerts?state=open&per_page=100");
        match self
            .get_json::<Vec<serde_json::Value>>(&url, Auth::GitHub, Some(GITHUB_JSON))
            .await
        {
            Ok(alerts) => Ok(Some(alerts.len() as u64)),
            Err(HubError::NotFound(_)) | Err(HubError::Status { status: 403, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn github_merged_pulls(
        &self,
        repo: &GitHubRepo,
        limit: usize,
    ) -> HubResult<Vec<PullRequestSummary>> {
        let url = self.github(
            repo,
            &format!("/pulls?state=closed&per_page={PULLS_PAGE_SIZE}"),
        );
        let listing: Vec<GhPullListing> =
            self.get_json(&url, Auth::GitHub, Some(GITHUB_JSON)).await?;

        // The listing omits line counts and review comments; the detail view has both.
        let detail_urls: Vec<String> = listing
            .into_iter()
            .filter(|pr| pr.merged_at.is_some())
            .take(limit)
            .map(|pr| self.github(repo, &format!("/pulls/{}", pr.number)))
            .collect();
        stream::iter(detail_urls)
            .map(|url| async move {
                self.get_json::<PullRequestSummary>(&url, Auth::GitHub, Some(GITHUB_JSON))
                    .await
            })
            .buffered(PULL_DETAIL_CONCURRENCY)
            .try_collect()
            .await
    }
}
