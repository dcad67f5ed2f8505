//! Full scoring pass over in-memory hub fixtures.

use std::sync::Arc;

use hub_client::fakes::StaticSource;
use hub_client::{CommitEntry, ModelInfo};
use serde_json::json;
use trustscore_core::{
    ArtifactReference, Orchestrator, ProbeId, ProbeMetrics, ProbeStatus, ScoringConfig,
};

fn commits() -> Vec<CommitEntry> {
    ["alice", "bob"]
        .iter()
        .flat_map(|author| (0..5).map(move |_| CommitEntry::by(&[*author])))
        .collect()
}

fn source() -> StaticSource {
    StaticSource::new()
        .with_model(
            "acme/bert-tiny",
            ModelInfo {
                id: "acme/bert-tiny".to_string(),
                downloads: Some(1000),
                card_data: Some(json!({ "license": "Apache-2.0" })),
                ..ModelInfo::default()
            },
        )
        .with_commits("acme/bert-tiny", commits())
}

fn config() -> ScoringConfig {
    let mut config = ScoringConfig::default();
    config.license.allowed = vec!["apache-2.0".to_string(), "mit".to_string()];
    config
}

#[tokio::test]
async fn model_only_artifact_scores_as_expected() {
    let orchestrator =
        Orchestrator::standard(&config(), Arc::new(source()), Arc::new(ProbeMetrics::new()));
    let artifact = ArtifactReference::new().with_model("https://huggingface.co/acme/bert-tiny");

    let report = orchestrator.score_detailed(&artifact).await;
    let record = &report.record;

    assert_eq!(record.bus_factor, 1.0);
    assert_eq!(record.license, 1.0);
    let ramp = (1000f64.ln() - 5.0) / 10.0;
    assert!((record.ramp_up_time - ramp).abs() < 1e-9);
    assert!((record.ramp_up_time - 0.1908).abs() < 1e-3);

    // No code or dataset URL: those probes do not apply and stay out of net_score.
    for id in [
        ProbeId::DatasetAndCodeScore,
        ProbeId::DatasetQuality,
        ProbeId::CodeQuality,
    ] {
        assert_eq!(report.status(id), Some(ProbeStatus::NotApplicable));
    }
    // Without any parameter count the size probe fails and counts as 0.0.
    assert_eq!(report.status(ProbeId::SizeScore), Some(ProbeStatus::Failed));
    assert_eq!(report.status(ProbeId::PerformanceClaims), Some(ProbeStatus::Ok));
    assert_eq!(record.performance_claims, 0.0);

    let expected_net = (ramp + 1.0 + 0.0 + 1.0 + 0.0) / 5.0;
    assert!((record.net_score - expected_net).abs() < 1e-9);

    let line = record.to_ndjson_line().unwrap();
    assert!(!line.contains('\n'));
    assert!(line.starts_with("{\"name\":\"bert-tiny\",\"category\":\"MODEL\",\"net_score\":"));
}

#[tokio::test]
async fn disallowed_license_scores_zero() {
    let mut config = config();
    config.license.allowed = vec!["mit".to_string()];
    let orchestrator =
        Orchestrator::standard(&config, Arc::new(source()), Arc::new(ProbeMetrics::new()));
    let artifact = ArtifactReference::new().with_model("https://huggingface.co/acme/bert-tiny");
    let record = orchestrator.score(&artifact).await;
    assert_eq!(record.license, 0.0);
    assert_eq!(record.bus_factor, 1.0);
}
