//! Whether the model's license can ship with its code repository's license.

use async_trait::async_trait;
use hub_client::{GitHubRepo, RepoId};
use tracing::debug;

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::normalize::{license_compatibility, LicenseClass};
use crate::probe::license::detect_model_license;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

#[derive(Debug, Clone, Default)]
pub struct LicenseCompatibilityProbe;

impl LicenseCompatibilityProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for LicenseCompatibilityProbe {
    fn id(&self) -> ProbeId {
        ProbeId::LicenseCompat
    }

    fn is_applicable(&self, artifact: &ArtifactReference) -> bool {
        artifact.model_url.is_some() && artifact.code_url.is_some()
    }

    async fn evaluate(
        &self,
        artifact: &ArtifactReference,
        ctx: &ProbeContext,
    ) -> EvalResult<Outcome> {
        let (Some(model_url), Some(code_url)) =
            (artifact.model_url.as_deref(), artifact.code_url.as_deref())
        else {
            return Ok(Outcome::NotApplicable);
        };
        let model = RepoId::from_url(model_url)?;
        let code = GitHubRepo::from_url(code_url)?;

        let (model_license, code_info) = tokio::join!(
            detect_model_license(&model, ctx),
            ctx.fetch(ctx.source().github_repo(&code)),
        );
        let model_class = model_license?
            .map(LicenseClass::of)
            .unwrap_or(LicenseClass::Unknown);
        let code_info = code_info?;
        let code_class = code_info
            .license_id()
            .map(LicenseClass::of)
            .unwrap_or(LicenseClass::Unknown);

        debug!(model = %model, code = %code, ?model_class, ?code_class, "license classes");
        Ok(Outcome::scalar(license_compatibility(model_class, code_class)))
    }
}
