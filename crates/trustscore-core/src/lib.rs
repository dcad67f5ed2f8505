//! trustscore-core: composite trust scoring for published ML artifacts
//!
//! An [`ArtifactReference`] (model, code and dataset URLs) is scored by a set
//! of independent probes running concurrently; the [`Orchestrator`] joins
//! their results into one [`CompositeScoreRecord`].
//!
//! ## Key Components
//!
//! - `probe`: the `Probe` trait and the eleven probes
//! - `normalize`: license and parameter-count normalization, `clamp01`
//! - `registry` / `orchestrator`: probe set, fan-out, deadlines, aggregation
//! - `record`: the fixed-order NDJSON record and `net_score`
//! - `sandbox`: isolated execution of README snippets
//! - `config`, `telemetry`, `obs`, `metrics`: ambient plumbing

pub mod artifact;
pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod orchestrator;
pub mod probe;
pub mod record;
pub mod registry;
pub mod sandbox;
pub mod telemetry;

pub use artifact::{classify_url, ArtifactReference, UrlCategory};
pub use config::{LicenseConfig, OrchestratorConfig, RampUpConfig, ScoringConfig, SizeConfig};
pub use error::{ConfigError, EvalResult, ProbeError, RegistryError};
pub use metrics::ProbeMetrics;
pub use orchestrator::{Orchestrator, Phase, ScoringReport};
pub use probe::{
    DeviceProfile, Outcome, PerformanceWeights, Probe, ProbeContext, ProbeId, ProbeResult,
    ProbeStatus, Score,
};
pub use record::{collapse_devices, net_score, CompositeScoreRecord, ExtendedMetrics, SizeScore};
pub use registry::ProbeRegistry;
pub use sandbox::{SandboxConfig, SandboxError};
pub use telemetry::{init_tracing, redact_secrets};
