//! hub-client: metadata fetch layer for trustscore
//!
//! Every probe reads remote facts (model cards, commit histories, download
//! counters, repository licenses) through the [`MetadataSource`] trait defined
//! here, so the scoring engine never talks HTTP directly.
//!
//! ## Key Components
//!
//! - `MetadataSource`: async fetch interface, injected into every probe
//! - `HubClient`: `reqwest` implementation against the Hugging Face Hub and GitHub
//! - `RepoId` / `GitHubRepo`: URL to repository addressing
//! - `fakes::StaticSource`: in-memory fixtures for tests

mod client;
mod error;
pub mod fakes;
mod repo;
mod source;
mod types;

pub use client::{HubClient, HubConfig};
pub use error::HubError;
pub use repo::{GitHubRepo, RepoId, RepoKind};
pub use source::MetadataSource;
pub use types::{
    CommitAuthor, CommitEntry, DatasetInfo, GitHubLicense, GitHubRepoInfo, ModelInfo,
    PullRequestSummary, SafetensorsInfo, Sibling,
};

/// Result type for hub-client operations
pub type HubResult<T> = std::result::Result<T, HubError>;
