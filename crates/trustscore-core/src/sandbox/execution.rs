//! Snippet execution with a wall-clock limit.

use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use super::error::{SandboxError, SandboxResult};

/// File name the snippet is written to inside the sandbox directory.
const SCRIPT_NAME: &str = "snippet";

/// Stderr fragments that mean the code is fine but its dependencies are absent.
const MISSING_DEPENDENCY_SIGNATURES: &[&str] = &[
    "ModuleNotFoundError",
    "ImportError",
    "NameError",
    "No module named",
];

/// Configuration for sandboxed snippet execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SandboxConfig {
    /// Maximum wall-clock time for one run (milliseconds). Inside a scoring
    /// run the probe timeout also applies; the shorter limit wins.
    pub timeout_ms: u64,
    /// Program that receives the script path as its only argument.
    pub interpreter: String,
    /// Fence language tags accepted as runnable.
    pub languages: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 20_000,
            interpreter: "python3".to_string(),
            languages: vec!["python".to_string(), "py".to_string(), "python3".to_string()],
        }
    }
}

impl SandboxConfig {
    pub fn validate(&self) -> SandboxResult<()> {
        if self.timeout_ms == 0 {
            return Err(SandboxError::InvalidConfig("timeout_ms must be > 0".to_string()));
        }
        if self.interpreter.trim().is_empty() {
            return Err(SandboxError::InvalidConfig("interpreter is empty".to_string()));
        }
        if self.languages.is_empty() {
            return Err(SandboxError::InvalidConfig("no snippet languages".to_string()));
        }
        Ok(())
    }
}

/// How a snippet run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Succeeded,
    MissingDependency,
    Failed,
    TimedOut,
}

impl ExecutionOutcome {
    pub fn score(&self) -> f64 {
        match self {
            ExecutionOutcome::Succeeded => 1.0,
            ExecutionOutcome::MissingDependency => 0.5,
            ExecutionOutcome::Failed | ExecutionOutcome::TimedOut => 0.0,
        }
    }
}

/// Result of one snippet run.
#[derive(Debug, Clone)]
pub struct SandboxRun {
    pub outcome: ExecutionOutcome,
    /// `None` on timeout or when killed by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub duration_ms: u64,
}

pub fn is_missing_dependency(stderr: &str) -> bool {
    MISSING_DEPENDENCY_SIGNATURES
        .iter()
        .any(|sig| stderr.contains(sig))
}

/// Run `code` under `config.interpreter`, never longer than `config.timeout_ms`.
///
/// The working directory is a fresh temp dir that is removed afterwards; the
/// environment holds only `PATH` and `HOME` (the sandbox directory).
pub async fn run_snippet(code: &str, config: &SandboxConfig) -> SandboxResult<SandboxRun> {
    config.validate()?;
    let start = Instant::now();

    let workdir = tempfile::tempdir()?;
    let script = workdir.path().join(SCRIPT_NAME);
    tokio::fs::write(&script, code).await?;

    let mut command = Command::new(&config.interpreter);
    command
        .arg(&script)
        .current_dir(workdir.path())
        .env_clear()
        .env("HOME", workdir.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(path) = std::env::var_os("PATH") {
        command.env("PATH", path);
    }

    let child = command.spawn().map_err(|e| SandboxError::Spawn {
        interpreter: config.interpreter.clone(),
        reason: e.to_string(),
    })?;

    let limit = Duration::from_millis(config.timeout_ms);
    let run = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(output) => {
            let output = output?;
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let outcome = if output.status.success() {
                ExecutionOutcome::Succeeded
            } else if is_missing_dependency(&stderr) {
                ExecutionOutcome::MissingDependency
            } else {
                ExecutionOutcome::Failed
            };
            SandboxRun {
                outcome,
                exit_code: output.status.code(),
                stderr,
                duration_ms: start.elapsed().as_millis() as u64,
            }
        }
        // The child was owned by the dropped future; kill_on_drop reaps it.
        Err(_) => SandboxRun {
            outcome: ExecutionOutcome::TimedOut,
            exit_code: None,
            stderr: String::new(),
            duration_ms: config.timeout_ms,
        },
    };

    debug!(
        interpreter = %config.interpreter,
        outcome = ?run.outcome,
        exit_code = ?run.exit_code,
        duration_ms = run.duration_ms,
        "snippet finished"
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(timeout_ms: u64) -> SandboxConfig {
        SandboxConfig {
            timeout_ms,
            interpreter: "sh".to_string(),
            languages: vec!["sh".to_string()],
        }
    }

    #[test]
    fn test_sandbox_config_default() {
        let cfg = SandboxConfig::default();
        assert_eq!(cfg.timeout_ms, 20_000);
        assert_eq!(cfg.interpreter, "python3");
        assert!(cfg.languages.contains(&"py".to_string()));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_sandbox_config_partial_toml() {
        let cfg: SandboxConfig = toml::from_str("timeout_ms = 500").unwrap();
        assert_eq!(cfg.timeout_ms, 500);
        assert_eq!(cfg.interpreter, "python3");
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            shell(0).validate(),
            Err(SandboxError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_dependency_signatures() {
        assert!(is_missing_dependency(
            "Traceback...\nModuleNotFoundError: No module named 'torch'"
        ));
        assert!(is_missing_dependency("NameError: name 'model' is not defined"));
        assert!(!is_missing_dependency("SyntaxError: invalid syntax"));
    }

    #[tokio::test]
    async fn test_successful_snippet() {
        let run = run_snippet("exit 0\n", &shell(5_000)).await.unwrap();
        assert_eq!(run.outcome, ExecutionOutcome::Succeeded);
        assert_eq!(run.exit_code, Some(0));
        assert_eq!(run.outcome.score(), 1.0);
    }

    #[tokio::test]
    async fn test_missing_dependency_gets_partial_credit() {
        let code = "echo \"ModuleNotFoundError: No module named 'foo'\" >&2\nexit 1\n";
        let run = run_snippet(code, &shell(5_000)).await.unwrap();
        assert_eq!(run.outcome, ExecutionOutcome::MissingDependency);
        assert_eq!(run.outcome.score(), 0.5);
    }

    #[tokio::test]
    async fn test_plain_failure() {
        let run = run_snippet("exit 3\n", &shell(5_000)).await.unwrap();
        assert_eq!(run.outcome, ExecutionOutcome::Failed);
        assert_eq!(run.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_home_is_the_sandbox_directory() {
        let code = format!("cd \"$HOME\" && test -f {SCRIPT_NAME}\n");
        let run = run_snippet(&code, &shell(5_000)).await.unwrap();
        assert_eq!(run.outcome, ExecutionOutcome::Succeeded, "stderr: {}", run.stderr);
    }

    #[tokio::test]
    async fn test_timeout_is_enforced() {
        let start = Instant::now();
        let run = run_snippet("sleep 10\n", &shell(200)).await.unwrap();
        assert_eq!(run.outcome, ExecutionOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unknown_interpreter_is_an_error() {
        let cfg = SandboxConfig {
            interpreter: "definitely-not-an-interpreter-3f9a".to_string(),
            ..shell(1_000)
        };
        let err = run_snippet("print(1)", &cfg).await.unwrap_err();
        assert!(matches!(err, SandboxError::Spawn { .. }));
    }
}
