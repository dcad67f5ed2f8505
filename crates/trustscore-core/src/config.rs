//! Scoring configuration.
//!
//! Layers, later wins: built-in defaults, an optional TOML file, environment
//! variables, then whatever the caller sets afterwards (CLI flags).
//!
//! ```toml
//! extended = true
//!
//! [orchestrator]
//! probe_timeout_ms = 8000
//!
//! [license]
//! allowed = ["mit", "apache-2.0"]
//!
//! [sandbox]
//! interpreter = "python3.11"
//! ```
//!
//! A snippet run is part of the reproducibility probe, so it never outlives
//! `orchestrator.probe_timeout_ms`: with the defaults (5 s probe, 20 s
//! sandbox) snippets get 5 s. Raise `probe_timeout_ms` to give them longer.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::probe::license::DEFAULT_ALLOWED_LICENSES;
use crate::probe::size::DEFAULT_OVERHEAD;
use crate::probe::{DeviceProfile, PerformanceWeights};
use crate::sandbox::SandboxConfig;

pub const ENV_PROBE_TIMEOUT_MS: &str = "TRUSTSCORE_PROBE_TIMEOUT_MS";
pub const ENV_ALLOWED_LICENSES: &str = "TRUSTSCORE_ALLOWED_LICENSES";
pub const ENV_EXTENDED: &str = "TRUSTSCORE_EXTENDED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Per-probe limit, measured from dispatch.
    pub probe_timeout_ms: u64,
    /// Probe tasks allowed to run at once; 0 means one slot per registered probe.
    pub max_concurrent: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5_000,
            max_concurrent: 0,
        }
    }
}

impl OrchestratorConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub allowed: Vec<String>,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_LICENSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// `clamp01((ln downloads - offset) / scale)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampUpConfig {
    pub offset: f64,
    pub scale: f64,
}

impl Default for RampUpConfig {
    fn default() -> Self {
        Self {
            offset: 5.0,
            scale: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    pub overhead: f64,
    pub profiles: Vec<DeviceProfile>,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            overhead: DEFAULT_OVERHEAD,
            profiles: DeviceProfile::defaults(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub orchestrator: OrchestratorConfig,
    pub license: LicenseConfig,
    pub ramp_up: RampUpConfig,
    pub size: SizeConfig,
    pub sandbox: SandboxConfig,
    pub performance: PerformanceWeights,
    /// Also run the reproducibility, reviewedness and license-compatibility probes.
    pub extended: bool,
}

impl ScoringConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults or `path`, with the process environment applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TRUSTSCORE_*` overrides read through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PROBE_TIMEOUT_MS) {
            self.orchestrator.probe_timeout_ms =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_PROBE_TIMEOUT_MS.to_string(),
                    reason: format!("expected milliseconds, got {raw:?}"),
                })?;
        }
        if let Some(raw) = lookup(ENV_ALLOWED_LICENSES) {
            self.license.allowed = split_list(&raw);
        }
        if let Some(raw) = lookup(ENV_EXTENDED) {
            self.extended = parse_flag(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_EXTENDED.to_string(),
                reason: format!("expected a boolean, got {raw:?}"),
            })?;
        }
        Ok(())
    }

    /// Sandbox settings as the reproducibility probe runs them: the run limit
    /// is capped at the probe timeout.
    pub fn effective_sandbox(&self) -> SandboxConfig {
        let mut sandbox = self.sandbox.clone();
        sandbox.timeout_ms = sandbox.timeout_ms.min(self.orchestrator.probe_timeout_ms);
        sandbox
    }

    /// Whether `sandbox.timeout_ms` is cut short by the probe timeout.
    pub fn sandbox_timeout_capped(&self) -> bool {
        self.sandbox.timeout_ms > self.orchestrator.probe_timeout_ms
    }

    /// Reject values no scoring run can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if self.orchestrator.probe_timeout_ms == 0 {
            return Err(invalid("orchestrator.probe_timeout_ms", "must be > 0"));
        }
        if !(self.ramp_up.scale.is_finite() && self.ramp_up.scale > 0.0) {
            return Err(invalid("ramp_up.scale", "must be a positive number"));
        }
        if !self.ramp_up.offset.is_finite() {
            return Err(invalid("ramp_up.offset", "must be finite"));
        }
        if !(self.size.overhead.is_finite() && self.size.overhead >= 1.0) {
            return Err(invalid("size.overhead", "must be >= 1.0"));
        }
        if self.size.profiles.is_empty() {
            return Err(invalid("size.profiles", "at least one profile is required"));
        }
        let mut seen = HashSet::new();
        for profile in &self.size.profiles {
            if !seen.insert(profile.name.as_str()) {
                return Err(invalid(
                    "size.profiles",
                    &format!("duplicate profile {}", profile.name),
                ));
            }
            if profile.memory_bytes == 0 {
                return Err(invalid(
                    "size.profiles",
                    &format!("profile {} has no memory", profile.name),
                ));
            }
        }
        let w = &self.performance;
        if [w.presence, w.detail, w.evidence, w.confirmation]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
            || w.total() <= 0.0
        {
            return Err(invalid(
                "performance",
                "weights must be non-negative with a positive sum",
            ));
        }
        self.sandbox
            .validate()
            .map_err(|e| invalid("sandbox", &e.to_string()))?;
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.orchestrator.probe_timeout_ms, 5_000);
        assert_eq!(cfg.orchestrator.max_concurrent, 0);
        assert_eq!(cfg.size.profiles.len(), 4);
        assert!(!cfg.extended);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = ScoringConfig::from_toml_str(
            "extended = true\n[orchestrator]\nprobe_timeout_ms = 900\n[license]\nallowed = [\"MIT\"]\n",
        )
        .unwrap();
        assert!(cfg.extended);
        assert_eq!(cfg.orchestrator.probe_timeout_ms, 900);
        assert_eq!(cfg.license.allowed, vec!["MIT"]);
        assert_eq!(cfg.ramp_up, RampUpConfig::default());
        assert_eq!(cfg.sandbox, SandboxConfig::default());
    }

    #[test]
    fn test_custom_profiles_from_toml() {
        let cfg = ScoringConfig::from_toml_str(
            "[size]\n[[size.profiles]]\nname = \"phone\"\nmemory_bytes = 4000000000\n\
             supports_accelerator = false\ncomfort_param_count = 1e8\n",
        )
        .unwrap();
        assert_eq!(cfg.size.profiles.len(), 1);
        assert_eq!(cfg.size.profiles[0].name, "phone");
        assert_eq!(cfg.size.overhead, DEFAULT_OVERHEAD);
    }

    #[test]
    fn test_bad_toml_is_rejected() {
        let err = ScoringConfig::from_toml_str("[orchestrator]\nprobe_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = ScoringConfig::default();
        cfg.apply_env_from(env(&[
            (ENV_PROBE_TIMEOUT_MS, "1234"),
            (ENV_ALLOWED_LICENSES, "mit, gpl-3.0 ,"),
            (ENV_EXTENDED, "yes"),
        ]))
        .unwrap();
        assert_eq!(cfg.orchestrator.probe_timeout_ms, 1234);
        assert_eq!(cfg.license.allowed, vec!["mit", "gpl-3.0"]);
        assert!(cfg.extended);

        let err = cfg
            .apply_env_from(env(&[(ENV_EXTENDED, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validation_catches_bad_values() {
        let mut cfg = ScoringConfig::default();
        cfg.orchestrator.probe_timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.size.profiles.push(DeviceProfile::new("desktop_pc", 1, true, 1.0));
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.performance = PerformanceWeights {
            presence: 0.0,
            detail: 0.0,
            evidence: 0.0,
            confirmation: 0.0,
        };
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.sandbox.interpreter = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_sandbox_limit_is_capped_by_orchestrator_timeout() {
        let config = ScoringConfig::default();
        assert!(config.sandbox_timeout_capped());
        assert_eq!(config.effective_sandbox().timeout_ms, 5_000);

        let mut generous = ScoringConfig::default();
        generous.orchestrator.probe_timeout_ms = 30_000;
        assert!(!generous.sandbox_timeout_capped());
        assert_eq!(generous.effective_sandbox().timeout_ms, 20_000);
        assert_eq!(generous.effective_sandbox().interpreter, "python3");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ramp_up]\noffset = 4.0").unwrap();
        let cfg = ScoringConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.ramp_up.offset, 4.0);
        assert_eq!(cfg.ramp_up.scale, 10.0);

        let missing = ScoringConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
