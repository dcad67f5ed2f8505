//! Error types for the sandbox module.

/// Errors produced by the sandbox layer. A snippet that runs and fails is not
/// an error; these cover the cases where it could not be run at all.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("cannot start interpreter {interpreter}: {reason}")]
    Spawn { interpreter: String, reason: String },

    #[error("sandbox i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid sandbox configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
