//! The set of probes an orchestrator runs, keyed by [`ProbeId`].

use std::sync::Arc;

use crate::config::ScoringConfig;
use crate::error::RegistryError;
use crate::probe::{
    BusFactorProbe, CodeQualityProbe, DatasetAndCodeProbe, DatasetQualityProbe,
    LicenseCompatibilityProbe, LicenseProbe, PerformanceClaimProbe, Probe, ProbeId, RampUpProbe,
    ReproducibilityProbe, ReviewednessProbe, SizeCompatibilityProbe,
};

/// Probes in registration order. Ids are unique.
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    probes: Vec<Arc<dyn Probe>>,
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

impl ProbeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stable probes, plus the extended ones when `config.extended`.
    pub fn standard(config: &ScoringConfig) -> Self {
        let mut probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(RampUpProbe::new(config.ramp_up.offset, config.ramp_up.scale)),
            Arc::new(BusFactorProbe::new()),
            Arc::new(PerformanceClaimProbe::new(config.performance)),
            Arc::new(LicenseProbe::new(&config.license.allowed)),
            Arc::new(SizeCompatibilityProbe::new(
                config.size.profiles.clone(),
                config.size.overhead,
            )),
            Arc::new(DatasetAndCodeProbe::new()),
            Arc::new(DatasetQualityProbe::new()),
            Arc::new(CodeQualityProbe::new()),
        ];
        if config.extended {
            probes.push(Arc::new(ReproducibilityProbe::new(config.effective_sandbox())));
            probes.push(Arc::new(ReviewednessProbe::new()));
            probes.push(Arc::new(LicenseCompatibilityProbe::new()));
        }
        Self { probes }
    }

    /// Append `probe`. Fails when a probe with the same id is already registered.
    pub fn register(&mut self, probe: Arc<dyn Probe>) -> Result<(), RegistryError> {
        let id = probe.id();
        if self.get(id).is_some() {
            return Err(RegistryError::DuplicateProbe(id));
        }
        self.probes.push(probe);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, probe: Arc<dyn Probe>) -> Result<Self, RegistryError> {
        self.register(probe)?;
        Ok(self)
    }

    /// The probe registered under `id`, if any.
    pub fn get(&self, id: ProbeId) -> Option<&Arc<dyn Probe>> {
        self.probes.iter().find(|p| p.id() == id)
    }

    /// Probes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Probe>> {
        self.probes.iter()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<ProbeId> {
        self.probes.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}
