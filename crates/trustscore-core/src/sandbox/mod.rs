//! Sandbox: isolated execution of README code snippets.
//!
//! A snippet runs under the configured interpreter in a fresh temporary
//! directory with a cleared environment, closed stdin and a wall-clock limit.
//! The child is killed when its future is dropped, so cancelling the caller
//! also stops the process.
//!
//! # Modules
//!
//! - [`execution`]: `SandboxConfig`, `run_snippet()`, `ExecutionOutcome`
//! - [`snippet`]: fenced code block extraction
//! - [`error`]: `SandboxError` / `SandboxResult`

pub mod error;
pub mod execution;
pub mod snippet;

pub use error::{SandboxError, SandboxResult};
pub use execution::{is_missing_dependency, run_snippet, ExecutionOutcome, SandboxConfig, SandboxRun};
pub use snippet::{first_snippet, CodeSnippet};
