//! The composite record and the aggregation that builds it.
//!
//! Serialized field order is fixed by declaration order here; consumers rely
//! on it, so new fields only ever go into [`ExtendedMetrics`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::artifact::ArtifactReference;
use crate::probe::{ProbeId, ProbeResult, ProbeStatus, Score};

/// Weights used to fold the size map into one scalar for `net_score`.
pub const DEVICE_WEIGHTS: &[(&str, f64)] = &[
    ("raspberry_pi", 0.30),
    ("jetson_nano", 0.25),
    ("desktop_pc", 0.20),
    ("aws_server", 0.25),
];

/// Per-device size compatibility. The four canonical profiles are always
/// present; custom profiles follow them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SizeScore {
    pub raspberry_pi: f64,
    pub jetson_nano: f64,
    pub desktop_pc: f64,
    pub aws_server: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl SizeScore {
    /// Split a profile map into the canonical fields and the custom extras.
    /// Missing canonical profiles read as 0.0.
    pub fn from_devices(devices: &BTreeMap<String, f64>) -> Self {
        let mut extra = devices.clone();
        let raspberry_pi = extra.remove("raspberry_pi").unwrap_or(0.0);
        let jetson_nano = extra.remove("jetson_nano").unwrap_or(0.0);
        let desktop_pc = extra.remove("desktop_pc").unwrap_or(0.0);
        let aws_server = extra.remove("aws_server").unwrap_or(0.0);
        Self {
            raspberry_pi,
            jetson_nano,
            desktop_pc,
            aws_server,
            extra,
        }
    }
}

/// Fields reported only when the extended probes ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtendedMetrics {
    pub reproducibility: f64,
    pub reproducibility_latency: u64,
    pub reviewedness: f64,
    pub reviewedness_latency: u64,
    pub license_compat: f64,
    pub license_compat_latency: u64,
    /// Probe field name to outcome, for every probe that was registered.
    pub probe_status: BTreeMap<String, ProbeStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositeScoreRecord {
    pub name: String,
    pub category: String,
    pub net_score: f64,
    pub net_score_latency: u64,
    pub ramp_up_time: f64,
    pub ramp_up_time_latency: u64,
    pub bus_factor: f64,
    pub bus_factor_latency: u64,
    pub performance_claims: f64,
    pub performance_claims_latency: u64,
    pub license: f64,
    pub license_latency: u64,
    pub size_score: SizeScore,
    pub size_score_latency: u64,
    pub dataset_and_code_score: f64,
    pub dataset_and_code_score_latency: u64,
    pub dataset_quality: f64,
    pub dataset_quality_latency: u64,
    pub code_quality: f64,
    pub code_quality_latency: u64,
    #[serde(flatten)]
    pub extended: Option<ExtendedMetrics>,
}

impl CompositeScoreRecord {
    /// Build the record from whatever results exist. Missing probes read as
    /// 0.0 with zero latency.
    pub fn assemble(
        artifact: &ArtifactReference,
        results: &BTreeMap<ProbeId, ProbeResult>,
        net_score_latency: u64,
        extended: bool,
    ) -> Self {
        let scalar = |id: ProbeId| results.get(&id).map(scalar_value).unwrap_or(0.0);
        let latency = |id: ProbeId| results.get(&id).map(|r| r.latency_ms).unwrap_or(0);

        let size_score = results
            .get(&ProbeId::SizeScore)
            .and_then(|r| r.value.as_devices())
            .map(SizeScore::from_devices)
            .unwrap_or_default();

        let extended = extended.then(|| ExtendedMetrics {
            reproducibility: scalar(ProbeId::Reproducibility),
            reproducibility_latency: latency(ProbeId::Reproducibility),
            reviewedness: scalar(ProbeId::Reviewedness),
            reviewedness_latency: latency(ProbeId::Reviewedness),
            license_compat: scalar(ProbeId::LicenseCompat),
            license_compat_latency: latency(ProbeId::LicenseCompat),
            probe_status: results
                .iter()
                .map(|(id, r)| (id.field_name().to_string(), r.status))
                .collect(),
        });

        Self {
            name: artifact.name(),
            category: artifact.category().to_string(),
            net_score: net_score(results),
            net_score_latency,
            ramp_up_time: scalar(ProbeId::RampUpTime),
            ramp_up_time_latency: latency(ProbeId::RampUpTime),
            bus_factor: scalar(ProbeId::BusFactor),
            bus_factor_latency: latency(ProbeId::BusFactor),
            performance_claims: scalar(ProbeId::PerformanceClaims),
            performance_claims_latency: latency(ProbeId::PerformanceClaims),
            license: scalar(ProbeId::License),
            license_latency: latency(ProbeId::License),
            size_score,
            size_score_latency: latency(ProbeId::SizeScore),
            dataset_and_code_score: scalar(ProbeId::DatasetAndCodeScore),
            dataset_and_code_score_latency: latency(ProbeId::DatasetAndCodeScore),
            dataset_quality: scalar(ProbeId::DatasetQuality),
            dataset_quality_latency: latency(ProbeId::DatasetQuality),
            code_quality: scalar(ProbeId::CodeQuality),
            code_quality_latency: latency(ProbeId::CodeQuality),
            extended,
        }
    }

    /// One NDJSON line, without the trailing newline.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Scalar view of a result; device maps are collapsed.
fn scalar_value(result: &ProbeResult) -> f64 {
    match &result.value {
        Score::Scalar(v) => *v,
        Score::Devices(map) => collapse_devices(map),
    }
}

/// Weighted mean over the canonical devices present in `devices`; plain mean
/// when none of them are; 0.0 for an empty map.
pub fn collapse_devices(devices: &BTreeMap<String, f64>) -> f64 {
    let (weighted, total) = DEVICE_WEIGHTS
        .iter()
        .filter_map(|(name, w)| devices.get(*name).map(|v| (w * v, *w)))
        .fold((0.0, 0.0), |(sv, sw), (v, w)| (sv + v, sw + w));
    if total > 0.0 {
        return weighted / total;
    }
    if devices.is_empty() {
        return 0.0;
    }
    devices.values().sum::<f64>() / devices.len() as f64
}

/// Mean of the stable fields whose probes applied; 0.0 when none did.
/// Failed probes count as 0.0; extended probes never contribute.
pub fn net_score(results: &BTreeMap<ProbeId, ProbeResult>) -> f64 {
    let applicable: Vec<f64> = ProbeId::STABLE
        .iter()
        .filter_map(|id| results.get(id))
        .filter(|r| r.status != ProbeStatus::NotApplicable)
        .map(scalar_value)
        .collect();
    if applicable.is_empty() {
        return 0.0;
    }
    applicable.iter().sum::<f64>() / applicable.len() as f64
}
