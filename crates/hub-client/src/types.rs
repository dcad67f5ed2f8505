//! Wire types for the subset of the hub and GitHub APIs the probes read.
//!
//! Every field is optional or defaulted: repositories omit most metadata and a
//! missing field must never fail decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A file published in a hub repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sibling {
    pub rfilename: String,
}

/// Parameter totals the hub derives from safetensors headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetensorsInfo {
    #[serde(default)]
    pub total: Option<u64>,
}

/// `GET /api/models/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "cardData")]
    pub card_data: Option<Value>,
    #[serde(default)]
    pub siblings: Vec<Sibling>,
    #[serde(default)]
    pub safetensors: Option<SafetensorsInfo>,
    #[serde(default, rename = "model-index")]
    pub model_index: Option<Value>,
}

impl ModelInfo {
    /// Value of a model-card front-matter key.
    pub fn card_value(&self, key: &str) -> Option<&Value> {
        self.card_data.as_ref().and_then(|card| card.get(key))
    }

    /// String value of a model-card front-matter key. Lists yield their first string.
    pub fn card_str(&self, key: &str) -> Option<&str> {
        first_str(self.card_value(key)?)
    }

    /// Structured evaluation results, from the top level or the card front matter.
    pub fn model_index(&self) -> Option<&Value> {
        self.model_index
            .as_ref()
            .or_else(|| self.card_value("model-index"))
    }

    /// Parameter count derived from the published weights.
    pub fn structural_param_count(&self) -> Option<u64> {
        self.safetensors.as_ref().and_then(|s| s.total)
    }
}

/// `GET /api/datasets/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "cardData")]
    pub card_data: Option<Value>,
    #[serde(default)]
    pub siblings: Vec<Sibling>,
}

impl DatasetInfo {
    pub fn card_value(&self, key: &str) -> Option<&Value> {
        self.card_data.as_ref().and_then(|card| card.get(key))
    }

    pub fn card_str(&self, key: &str) -> Option<&str> {
        first_str(self.card_value(key)?)
    }
}

/// Author attached to a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub user: String,
}

/// One commit from a repository history. A commit may carry several authors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<CommitAuthor>,
}

impl CommitEntry {
    pub fn by(authors: &[&str]) -> Self {
        Self {
            authors: authors
                .iter()
                .map(|a| CommitAuthor {
                    user: (*a).to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }
}

/// License block of `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubLicense {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub spdx_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubRepoInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub license: Option<GitHubLicense>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl GitHubRepoInfo {
    /// Best license identifier GitHub detected (`spdx_id`, then `key`, then `name`).
    /// GitHub reports undetectable licenses as `NOASSERTION`.
    pub fn license_id(&self) -> Option<&str> {
        let license = self.license.as_ref()?;
        license
            .spdx_id
            .as_deref()
            .filter(|id| *id != "NOASSERTION")
            .or(license.key.as_deref())
            .or(license.name.as_deref())
    }
}

/// Merged pull request with its size and review activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    #[serde(default)]
    pub merged_at: Option<String>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub review_comments: u64,
}

impl PullRequestSummary {
    pub fn changed_lines(&self) -> u64 {
        self.additions + self.deletions
    }

    pub fn is_reviewed(&self) -> bool {
        self.review_comments > 0
    }
}

fn first_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_info_decodes_hub_payload() {
        let payload = json!({
            "id": "openai/whisper-tiny",
            "downloads": 1000,
            "tags": ["transformers", "license:apache-2.0"],
            "cardData": {"license": "apache-2.0", "model-index": [{"results": []}]},
            "siblings": [{"rfilename": "README.md"}, {"rfilename": "model.safetensors"}],
            "safetensors": {"total": 37_760_640u64, "parameters": {"F32": 37_760_640u64}}
        });
        let info: ModelInfo = serde_json::from_value(payload).unwrap();
        assert_eq!(info.downloads, Some(1000));
        assert_eq!(info.card_str("license"), Some("apache-2.0"));
        assert!(info.model_index().is_some());
        assert_eq!(info.structural_param_count(), Some(37_760_640));
        assert_eq!(info.siblings.len(), 2);
    }

    #[test]
    fn test_model_info_tolerates_sparse_payload() {
        let info: ModelInfo = serde_json::from_value(json!({"id": "x/y"})).unwrap();
        assert_eq!(info.downloads, None);
        assert!(info.card_str("license").is_none());
        assert!(info.model_index().is_none());
    }

    #[test]
    fn test_card_str_takes_first_list_entry() {
        let info: DatasetInfo =
            serde_json::from_value(json!({"cardData": {"license": ["cc-by-4.0", "mit"]}})).unwrap();
        assert_eq!(info.card_str("license"), Some("cc-by-4.0"));
    }

    #[test]
    fn test_github_license_id_skips_noassertion() {
        let info: GitHubRepoInfo = serde_json::from_value(json!({
            "full_name": "a/b",
            "license": {"key": "other", "spdx_id": "NOASSERTION", "name": "Other"}
        }))
        .unwrap();
        assert_eq!(info.license_id(), Some("other"));
    }

    #[test]
    fn test_pull_request_changed_lines() {
        let pr = PullRequestSummary {
            number: 7,
            merged_at: Some("2024-01-01T00:00:00Z".to_string()),
            additions: 30,
            deletions: 12,
            review_comments: 0,
        };
        assert_eq!(pr.changed_lines(), 42);
        assert!(!pr.is_reviewed());
    }
}
