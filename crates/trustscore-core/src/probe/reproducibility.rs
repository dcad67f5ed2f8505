//! Does the first runnable README snippet actually run?

use async_trait::async_trait;
use hub_client::RepoId;
use tracing::debug;

use crate::artifact::ArtifactReference;
use crate::error::{EvalResult, ProbeError};
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};
use crate::sandbox::{first_snippet, run_snippet, SandboxConfig};

#[derive(Debug, Clone, Default)]
pub struct ReproducibilityProbe {
    sandbox: SandboxConfig,
}

impl ReproducibilityProbe {
    pub fn new(sandbox: SandboxConfig) -> Self {
        Self { sandbox }
    }

    /// Sandbox limits for one run, shortened to fit the probe deadline.
    fn effective_config(&self, ctx: &ProbeContext) -> SandboxConfig {
        let mut config = self.sandbox.clone();
        if let Some(remaining) = ctx.remaining() {
            let remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX);
            config.timeout_ms = config.timeout_ms.min(remaining_ms).max(1);
        }
        config
    }
}

#[async_trait]
impl Probe for ReproducibilityProbe {
    fn id(&self) -> ProbeId {
        ProbeId::Reproducibility
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.model_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        let Some(url) = artifact.model_url.as_deref() else {
            return Ok(Outcome::NotApplicable);
        };
        let repo = RepoId::from_url(url)?;
        let readme = ctx.fetch(ctx.source().model_card(&repo)).await?;

        let Some(snippet) = readme
            .as_deref()
            .and_then(|text| first_snippet(text, &self.sandbox.languages))
        else {
            debug!(model = %repo, "no runnable snippet");
            return Ok(Outcome::scalar(0.0));
        };

        let config = self.effective_config(ctx);
        let run = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => return Err(ProbeError::Cancelled),
            run = run_snippet(&snippet.code, &config) => run?,
        };
        debug!(model = %repo, outcome = ?run.outcome, "snippet executed");
        Ok(Outcome::scalar(run.outcome.score()))
    }
}
