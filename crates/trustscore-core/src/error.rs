//! Error types for trustscore-core

use std::path::PathBuf;

use hub_client::HubError;
use thiserror::Error;

use crate::probe::ProbeId;
use crate::sandbox::SandboxError;

/// Why a probe could not produce a score. Converted to a `Failed` result at the
/// probe boundary; never crosses the orchestrator.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] HubError),

    #[error("missing data: {0}")]
    MissingData(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("probe cancelled")]
    Cancelled,
}

/// Result type for fallible probe evaluation
pub type EvalResult<T> = std::result::Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("probe {0} is already registered")]
    DuplicateProbe(ProbeId),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_error_converts_to_fetch() {
        let err: ProbeError = HubError::NotFound("models/a/b".to_string()).into();
        match err {
            ProbeError::Fetch(HubError::NotFound(path)) => assert_eq!(path, "models/a/b"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_probe_display() {
        let err = RegistryError::DuplicateProbe(ProbeId::License);
        assert_eq!(err.to_string(), "probe license is already registered");
    }
}
