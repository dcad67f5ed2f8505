//! Deployability of a model across device profiles.
//!
//! For each profile the probe picks the most preferred numeric precision whose
//! weights (times a runtime overhead factor) fit in memory, scores that
//! precision on a fixed ordinal table, and decays the result smoothly once the
//! parameter count passes the profile's comfortable size.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use hub_client::{ModelInfo, RepoId};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactReference;
use crate::error::{EvalResult, ProbeError};
use crate::normalize::{clamp01, parse_param_count, parse_param_value};
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId, Score};

/// Card keys that may declare a parameter count, in lookup order.
const PARAM_KEYS: &[&str] = &[
    "model_parameters",
    "num_parameters",
    "parameters",
    "parameter_count",
    "params",
    "model_size",
];

/// Exponent of the throughput penalty.
const PENALTY_SOFTNESS: f64 = 1.2;

/// Default runtime-memory multiplier on top of raw weight size.
pub const DEFAULT_OVERHEAD: f64 = 1.3;

/// A named hardware budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub memory_bytes: u64,
    pub supports_accelerator: bool,
    /// Parameter count the device runs without noticeable slowdown.
    pub comfort_param_count: f64,
}

impl DeviceProfile {
    pub fn new(
        name: &str,
        memory_bytes: u64,
        supports_accelerator: bool,
        comfort_param_count: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            memory_bytes,
            supports_accelerator,
            comfort_param_count,
        }
    }

    /// The four canonical profiles.
    pub fn defaults() -> Vec<DeviceProfile> {
        vec![
            DeviceProfile::new("raspberry_pi", 6_000_000_000, false, 5e7),
            DeviceProfile::new("jetson_nano", 3_000_000_000, true, 1e8),
            DeviceProfile::new("desktop_pc", 12_000_000_000, true, 2e9),
            DeviceProfile::new("aws_server", 16_000_000_000, true, 3e9),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Fp32,
    Fp16,
    Int8,
    Bit4,
}

impl Precision {
    pub fn bytes_per_param(&self) -> f64 {
        match self {
            Precision::Fp32 => 4.0,
            Precision::Fp16 => 2.0,
            Precision::Int8 => 1.0,
            Precision::Bit4 => 0.5,
        }
    }

    pub fn base_score(&self) -> f64 {
        match self {
            Precision::Fp16 => 1.0,
            Precision::Int8 => 0.85,
            Precision::Bit4 => 0.70,
            Precision::Fp32 => 0.60,
        }
    }
}

const ACCELERATOR_ORDER: [Precision; 3] = [Precision::Fp16, Precision::Int8, Precision::Bit4];
const CPU_ORDER: [Precision; 3] = [Precision::Int8, Precision::Bit4, Precision::Fp32];

/// First precision in the profile's preference order that fits in memory.
pub fn pick_precision(params: f64, profile: &DeviceProfile, overhead: f64) -> Option<Precision> {
    let order = if profile.supports_accelerator {
        &ACCELERATOR_ORDER
    } else {
        &CPU_ORDER
    };
    order
        .iter()
        .copied()
        .find(|p| params * p.bytes_per_param() * overhead <= profile.memory_bytes as f64)
}

/// `1 / (1 + (params / max(1, comfort))^1.2)`
pub fn throughput_penalty(params: f64, comfort: f64) -> f64 {
    1.0 / (1.0 + (params / comfort.max(1.0)).powf(PENALTY_SOFTNESS))
}

/// Score per profile name.
pub fn device_scores(
    params: f64,
    profiles: &[DeviceProfile],
    overhead: f64,
) -> BTreeMap<String, f64> {
    profiles
        .iter()
        .map(|profile| {
            let base = pick_precision(params, profile, overhead)
                .map(|p| p.base_score())
                .unwrap_or(0.0);
            let penalty = throughput_penalty(params, profile.comfort_param_count);
            (profile.name.clone(), clamp01(base * penalty))
        })
        .collect()
}

fn model_size_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)model\s*size\s*[:\-]?\s*([0-9][0-9.,]*\s*[KMB]|[0-9][0-9.,]*)\s*params?")
            .expect("valid regex")
    })
}

/// Declared card keys, then the hub's structural count.
pub fn param_count_from_metadata(info: &ModelInfo) -> Option<f64> {
    PARAM_KEYS
        .iter()
        .filter_map(|key| info.card_value(key))
        .filter_map(parse_param_value)
        .find(|n| *n > 0.0)
        .or_else(|| {
            info.structural_param_count()
                .filter(|n| *n > 0)
                .map(|n| n as f64)
        })
}

/// `Model size: 7B params` style statements in a README.
pub fn param_count_from_readme(readme: &str) -> Option<f64> {
    model_size_regex()
        .captures_iter(readme)
        .filter_map(|caps| parse_param_count(&caps[1]))
        .find(|n| *n > 0.0)
}

#[derive(Debug, Clone)]
pub struct SizeCompatibilityProbe {
    profiles: Vec<DeviceProfile>,
    overhead: f64,
}

impl Default for SizeCompatibilityProbe {
    fn default() -> Self {
        Self::new(DeviceProfile::defaults(), DEFAULT_OVERHEAD)
    }
}

impl SizeCompatibilityProbe {
    pub fn new(profiles: Vec<DeviceProfile>, overhead: f64) -> Self {
        Self { profiles, overhead }
    }

    pub fn profiles(&self) -> &[DeviceProfile] {
        &self.profiles
    }
}

#[async_trait]
impl Probe for SizeCompatibilityProbe {
    fn id(&self) -> ProbeId {
        ProbeId::SizeScore
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
        let info = ctx.fetch(ctx.source().model_info(&repo)).await?;

        let params = match param_count_from_metadata(&info) {
            Some(n) => n,
            None => ctx
                .fetch(ctx.source().model_card(&repo))
                .await?
                .as_deref()
                .and_then(param_count_from_readme)
                .ok_or_else(|| {
                    ProbeError::MissingData(format!("no parameter count for {repo}"))
                })?,
        };

        Ok(Outcome::Scored(Score::Devices(device_scores(
            params,
            &self.profiles,
            self.overhead,
        ))))
    }
}
