//! Repository addressing: turn artifact URLs into hub / GitHub repository ids.

use serde::{Deserialize, Serialize};

use crate::error::HubError;
use crate::HubResult;

/// Path segments the hub web UI appends after the repository id.
const UI_SUFFIXES: &[&str] = &["tree", "blob", "resolve", "raw", "commits", "discussions"];

/// Kind of Hugging Face repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoKind {
    Model,
    Dataset,
    Space,
}

/// A Hugging Face repository (`owner/name`, or a legacy bare `name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub kind: RepoKind,
    pub id: String,
}

impl RepoId {
    pub fn new(kind: RepoKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn model(id: impl Into<String>) -> Self {
        Self::new(RepoKind::Model, id)
    }

    pub fn dataset(id: impl Into<String>) -> Self {
        Self::new(RepoKind::Dataset, id)
    }

    /// Parse a `huggingface.co` URL.
    ///
    /// `https://huggingface.co/google-bert/bert-base-uncased/tree/main` resolves to
    /// the model `google-bert/bert-base-uncased`; a `/datasets/` prefix selects a
    /// dataset repository.
    pub fn from_url(url: &str) -> HubResult<Self> {
        let (host, segments) =
            split_url(url).ok_or_else(|| HubError::InvalidUrl(url.to_string()))?;
        if !host.ends_with("huggingface.co") {
            return Err(HubError::InvalidUrl(url.to_string()));
        }

        let (kind, rest) = match segments.first().map(String::as_str) {
            Some("datasets") | Some("dataset") => (RepoKind::Dataset, &segments[1..]),
            Some("spaces") | Some("space") => (RepoKind::Space, &segments[1..]),
            _ => (RepoKind::Model, &segments[..]),
        };

        let id = match rest {
            [] => return Err(HubError::InvalidUrl(url.to_string())),
            [name] => name.clone(),
            [first, second, ..] if UI_SUFFIXES.contains(&second.as_str()) => first.clone(),
            [owner, name, ..] => format!("{owner}/{name}"),
        };

        Ok(Self { kind, id })
    }

    /// Path under `/api/` for this repository.
    pub fn api_path(&self) -> String {
        match self.kind {
            RepoKind::Model => format!("models/{}", self.id),
            RepoKind::Dataset => format!("datasets/{}", self.id),
            RepoKind::Space => format!("spaces/{}", self.id),
        }
    }

    /// Path of the repository's web page, relative to the hub root.
    pub fn page_path(&self) -> String {
        match self.kind {
            RepoKind::Model => self.id.clone(),
            RepoKind::Dataset => format!("datasets/{}", self.id),
            RepoKind::Space => format!("spaces/{}", self.id),
        }
    }

    /// Last path component, used as the artifact display name.
    pub fn short_name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A GitHub repository (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub owner: String,
    pub name: String,
}

impl GitHubRepo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a `github.com/<owner>/<repo>` URL. Trailing `.git` is dropped.
    pub fn from_url(url: &str) -> HubResult<Self> {
        let (host, segments) =
            split_url(url).ok_or_else(|| HubError::InvalidUrl(url.to_string()))?;
        if host != "github.com" && host != "www.github.com" {
            return Err(HubError::InvalidUrl(url.to_string()));
        }
        match segments.as_slice() {
            [owner, name, ..] => Ok(Self::new(
                owner.as_str(),
                name.strip_suffix(".git").unwrap_or(name.as_str()),
            )),
            _ => Err(HubError::InvalidUrl(url.to_string())),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Split `scheme://host/a/b?q#f` into a lower-cased host and non-empty path segments.
fn split_url(url: &str) -> Option<(String, Vec<String>)> {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let without_query = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);

    let mut parts = without_query.split('/');
    let host = parts.next()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let segments = parts
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some((host, segments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_url_with_owner() {
        let repo = RepoId::from_url("https://huggingface.co/google-bert/bert-base-uncased").unwrap();
        assert_eq!(repo.kind, RepoKind::Model);
        assert_eq!(repo.id, "google-bert/bert-base-uncased");
        assert_eq!(repo.api_path(), "models/google-bert/bert-base-uncased");
        assert_eq!(repo.short_name(), "bert-base-uncased");
    }

    #[test]
    fn test_model_url_ignores_ui_suffix() {
        let repo = RepoId::from_url("https://huggingface.co/openai/whisper-tiny/tree/main").unwrap();
        assert_eq!(repo.id, "openai/whisper-tiny");

        let legacy = RepoId::from_url("https://huggingface.co/gpt2/tree/main").unwrap();
        assert_eq!(legacy.id, "gpt2");
    }

    #[test]
    fn test_dataset_url() {
        let repo = RepoId::from_url("https://huggingface.co/datasets/bookcorpus/bookcorpus").unwrap();
        assert_eq!(repo.kind, RepoKind::Dataset);
        assert_eq!(repo.id, "bookcorpus/bookcorpus");
        assert_eq!(repo.page_path(), "datasets/bookcorpus/bookcorpus");
    }

    #[test]
    fn test_rejects_non_hub_host() {
        assert!(RepoId::from_url("https://github.com/a/b").is_err());
        assert!(RepoId::from_url("https://huggingface.co/").is_err());
        assert!(RepoId::from_url("").is_err());
    }

    #[test]
    fn test_github_url() {
        let repo = GitHubRepo::from_url("https://github.com/google-research/bert.git").unwrap();
        assert_eq!(repo.owner, "google-research");
        assert_eq!(repo.name, "bert");
        assert_eq!(repo.full_name(), "google-research/bert");

        let deep = GitHubRepo::from_url("https://github.com/huggingface/transformers/tree/main/src?x=1").unwrap();
        assert_eq!(deep.full_name(), "huggingface/transformers");
    }

    #[test]
    fn test_github_url_requires_owner_and_name() {
        assert!(GitHubRepo::from_url("https://github.com/huggingface").is_err());
        assert!(GitHubRepo::from_url("https://gitlab.com/a/b").is_err());
    }
}
