//! The artifact under evaluation: up to three URLs, fixed for one scoring call.

use hub_client::{GitHubRepo, RepoId};
use serde::{Deserialize, Serialize};

/// Model, code repository and dataset URLs of one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub model_url: Option<String>,
    pub code_url: Option<String>,
    pub dataset_url: Option<String>,
}

impl ArtifactReference {
    /// An artifact with no URLs; every probe is NotApplicable for it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model URL. Blank strings leave it unset.
    pub fn with_model(mut self, url: impl Into<String>) -> Self {
        self.model_url = non_blank(url.into());
        self
    }

    /// Set the code repository URL. Blank strings leave it unset.
    pub fn with_code(mut self, url: impl Into<String>) -> Self {
        self.code_url = non_blank(url.into());
        self
    }

    /// Set the dataset URL. Blank strings leave it unset.
    pub fn with_dataset(mut self, url: impl Into<String>) -> Self {
        self.dataset_url = non_blank(url.into());
        self
    }

    /// True when no URL is set; scoring such a reference yields an all-zero record.
    pub fn is_empty(&self) -> bool {
        self.model_url.is_none() && self.code_url.is_none() && self.dataset_url.is_none()
    }

    /// Display name: the repository name of the model URL, else of the code
    /// URL, else of the dataset URL.
    pub fn name(&self) -> String {
        if let Some(url) = &self.model_url {
            return RepoId::from_url(url)
                .map(|repo| repo.short_name().to_string())
                .unwrap_or_else(|_| last_segment(url));
        }
        if let Some(url) = &self.code_url {
            return GitHubRepo::from_url(url)
                .map(|repo| repo.name)
                .unwrap_or_else(|_| last_segment(url));
        }
        if let Some(url) = &self.dataset_url {
            return RepoId::from_url(url)
                .map(|repo| repo.short_name().to_string())
                .unwrap_or_else(|_| last_segment(url));
        }
        String::new()
    }

    /// Category label written to the record.
    pub fn category(&self) -> &'static str {
        if self.model_url.is_some() {
            UrlCategory::Model.label()
        } else if self.dataset_url.is_some() {
            UrlCategory::Dataset.label()
        } else if self.code_url.is_some() {
            UrlCategory::Code.label()
        } else {
            UrlCategory::Other.label()
        }
    }
}

fn non_blank(url: String) -> Option<String> {
    let trimmed = url.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn last_segment(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// What kind of resource a raw URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrlCategory {
    Model,
    Dataset,
    Code,
    Other,
}

impl UrlCategory {
    /// Upper-case label as written into the record's `category` field.
    pub fn label(&self) -> &'static str {
        match self {
            UrlCategory::Model => "MODEL",
            UrlCategory::Dataset => "DATASET",
            UrlCategory::Code => "CODE",
            UrlCategory::Other => "OTHER",
        }
    }
}

/// Classify a raw URL by host and path.
pub fn classify_url(raw: &str) -> UrlCategory {
    let s = raw.trim().to_lowercase();
    if s.contains("huggingface.co") {
        if s.contains("/datasets/") || s.trim_end_matches('/').ends_with("/datasets") {
            return UrlCategory::Dataset;
        }
        return UrlCategory::Model;
    }
    if s.contains("github.com") {
        return UrlCategory::Code;
    }
    UrlCategory::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_url() {
        assert_eq!(
            classify_url("https://huggingface.co/google-bert/bert-base-uncased"),
            UrlCategory::Model
        );
        assert_eq!(
            classify_url("https://huggingface.co/datasets/bookcorpus/bookcorpus"),
            UrlCategory::Dataset
        );
        assert_eq!(
            classify_url("https://github.com/google-research/bert"),
            UrlCategory::Code
        );
        assert_eq!(classify_url("https://example.com/x"), UrlCategory::Other);
        assert_eq!(classify_url(""), UrlCategory::Other);
    }

    #[test]
    fn test_name_prefers_model_repo() {
        let artifact = ArtifactReference::new()
            .with_code("https://github.com/openai/whisper")
            .with_model("https://huggingface.co/openai/whisper-tiny/tree/main");
        assert_eq!(artifact.name(), "whisper-tiny");
        assert_eq!(artifact.category(), "MODEL");
    }

    #[test]
    fn test_name_falls_back_to_code_then_dataset() {
        let code = ArtifactReference::new().with_code("https://github.com/org/tool.git");
        assert_eq!(code.name(), "tool");
        assert_eq!(code.category(), "CODE");

        let dataset = ArtifactReference::new().with_dataset("https://huggingface.co/datasets/squad");
        assert_eq!(dataset.name(), "squad");
    }

    #[test]
    fn test_blank_urls_are_dropped() {
        let artifact = ArtifactReference::new().with_model("  ").with_code("");
        assert!(artifact.is_empty());
        assert_eq!(artifact.name(), "");
        assert_eq!(artifact.category(), "OTHER");
    }
}
