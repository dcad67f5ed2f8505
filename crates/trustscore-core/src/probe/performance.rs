//! Evidence behind published performance claims.
//!
//! Claims come from two places: structured `model-index` results on the hub,
//! and free-text README mentions (`MMLU accuracy: 72.3%`, or a
//! `| bench | metric | value |` table row). Four sub-signals are blended:
//!
//! - presence: any claim at all
//! - detail: structured claims, boosted by the split/task context they carry
//! - evidence: an evaluation section, setup details, confirming links
//! - confirmation: structured results, or links to a leaderboard or paper

use std::sync::OnceLock;

use async_trait::async_trait;
use hub_client::{ModelInfo, RepoId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::ArtifactReference;
use crate::error::EvalResult;
use crate::normalize::clamp01;
use crate::probe::{Outcome, Probe, ProbeContext, ProbeId};

const BENCHMARK_KEYWORDS: &[&str] = &[
    "mmlu", "hellaswag", "winogrande", "arc", "truthfulqa", "gsm8k", "lambada", "piqa", "qnli",
    "qqp", "mnli", "sst-2", "cola", "rte", "mrpc", "squad", "squad v1", "squad v2", "xquad",
    "rouge", "bleu", "meteor", "chrf", "wer", "cer", "ter", "imagenet", "cifar-10", "cifar100",
    "ms coco", "pascal voc", "mnist",
];

const METRIC_KEYWORDS: &[&str] = &[
    "accuracy", "acc", "f1", "f1-score", "precision", "recall", "exact match", "em", "bleu",
    "rouge", "rouge-l", "meteor", "chrf", "perplexity", "ppl", "wer", "cer", "ter",
];

/// `87.5`, `87`, `87%`, `.875`
const NUMERIC_PATTERN: &str = r"(?:\d{1,3}(?:\.\d+)?%?|\.\d+)";

/// Hosts that independently confirm a result.
const CONFIRMING_DOMAINS: &[&str] = &[
    "paperswithcode.com",
    "arxiv.org",
    "open-llm-leaderboard",
    "mlcommons.org",
    "nlp.stanford.edu",
    "rajpurkar.github.io",
    "allenai.org",
    "mosaicml.com",
];

const EVIDENCE_SECTION_HINTS: &[&str] = &[
    "evaluation",
    "results",
    "benchmarks",
    "leaderboard",
    "reproduc",
    "experimental setup",
    "setup",
    "methodology",
];

const SETUP_HINTS: &[&str] = &[
    "seed",
    "gpu",
    "hardware",
    "a100",
    "v100",
    "cpu",
    "epochs",
    "batch size",
    "learning rate",
    "eval",
];

/// Structured claims sampled for the context boost.
const DETAIL_SAMPLE: usize = 5;

/// Blend weights of the four sub-signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceWeights {
    pub presence: f64,
    pub detail: f64,
    pub evidence: f64,
    pub confirmation: f64,
}

impl Default for PerformanceWeights {
    fn default() -> Self {
        Self {
            presence: 0.25,
            detail: 0.25,
            evidence: 0.25,
            confirmation: 0.25,
        }
    }
}

impl PerformanceWeights {
    /// Rewards having any claim over how well it is backed.
    pub fn presence_weighted() -> Self {
        Self {
            presence: 0.45,
            detail: 0.15,
            evidence: 0.10,
            confirmation: 0.30,
        }
    }

    pub fn total(&self) -> f64 {
        self.presence + self.detail + self.evidence + self.confirmation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceClaim {
    pub benchmark: String,
    pub metric: String,
    pub value: f64,
    pub split: Option<String>,
    pub task: Option<String>,
    pub tabular: bool,
}

fn keyword_alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

fn inline_claim_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)(?P<bench>{}).{{0,40}}(?P<metric>{}).{{0,10}}(?P<val>{})",
            keyword_alternation(BENCHMARK_KEYWORDS),
            keyword_alternation(METRIC_KEYWORDS),
            NUMERIC_PATTERN,
        ))
        .expect("valid regex")
    })
}

fn table_claim_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\|\s*(?P<bench>{})\s*\|\s*(?P<metric>{})\s*\|\s*(?P<val>{})\s*\|",
            keyword_alternation(BENCHMARK_KEYWORDS),
            keyword_alternation(METRIC_KEYWORDS),
            NUMERIC_PATTERN,
        ))
        .expect("valid regex")
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').parse::<f64>().ok()
}

/// Free-text claims from a README, inline mentions first, then table rows.
pub fn readme_claims(readme: &str) -> Vec<PerformanceClaim> {
    let text = readme.to_lowercase();
    let mut claims = Vec::new();
    for (re, tabular) in [(inline_claim_regex(), false), (table_claim_regex(), true)] {
        for caps in re.captures_iter(&text) {
            let Some(value) = parse_number(&caps["val"]) else {
                continue;
            };
            claims.push(PerformanceClaim {
                benchmark: caps["bench"].to_string(),
                metric: caps["metric"].to_string(),
                value,
                split: None,
                task: None,
                tabular,
            });
        }
    }
    claims
}

fn non_empty_str<'a>(value: Option<&'a Value>, keys: &[&str]) -> Option<&'a str> {
    let value = value?;
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn metric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Claims from `model-index[].results[].metrics[]`.
pub fn model_index_claims(info: &ModelInfo) -> Vec<PerformanceClaim> {
    let Some(Value::Array(entries)) = info.model_index() else {
        return Vec::new();
    };

    let mut claims = Vec::new();
    let results = entries
        .iter()
        .filter_map(|entry| entry.get("results").and_then(Value::as_array))
        .flatten();
    for result in results {
        let dataset = result.get("dataset");
        let task_value = result.get("task");
        let split = non_empty_str(dataset, &["type", "split"]);
        let task = non_empty_str(task_value, &["type", "name"]);
        let benchmark = non_empty_str(dataset, &["name"]).or(task).unwrap_or_default();

        let metrics = result
            .get("metrics")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for metric in metrics {
            let Some(name) = non_empty_str(Some(metric), &["name", "type"]) else {
                continue;
            };
            let Some(value) = metric.get("value").and_then(metric_value) else {
                continue;
            };
            claims.push(PerformanceClaim {
                benchmark: benchmark.to_string(),
                metric: name.to_lowercase(),
                value,
                split: split.map(str::to_string),
                task: task.map(str::to_string),
                tabular: false,
            });
        }
    }
    claims
}

/// README cues that a result can be checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvidenceSignals {
    pub evaluation_section: bool,
    pub setup_details: bool,
    pub confirming_links: bool,
}

impl EvidenceSignals {
    pub fn scan(readme: &str) -> Self {
        let text = readme.to_lowercase();
        let any = |hints: &[&str]| hints.iter().any(|h| text.contains(h));
        Self {
            evaluation_section: any(EVIDENCE_SECTION_HINTS),
            setup_details: any(SETUP_HINTS),
            confirming_links: any(CONFIRMING_DOMAINS),
        }
    }
}

/// The four sub-signals, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceBreakdown {
    pub presence: f64,
    pub detail: f64,
    pub evidence: f64,
    pub confirmation: f64,
}

impl PerformanceBreakdown {
    pub fn assess(
        structured: &[PerformanceClaim],
        unstructured: &[PerformanceClaim],
        signals: EvidenceSignals,
    ) -> Self {
        let presence = if structured.is_empty() && unstructured.is_empty() {
            0.0
        } else {
            1.0
        };

        let detail = if !structured.is_empty() {
            let sample = &structured[..structured.len().min(DETAIL_SAMPLE)];
            let hits = sample
                .iter()
                .map(|c| usize::from(c.split.is_some()) + usize::from(c.task.is_some()))
                .sum::<usize>();
            clamp01(0.7 + 0.3 * hits as f64 / (2 * sample.len()) as f64)
        } else if !unstructured.is_empty() {
            0.5
        } else {
            0.0
        };

        let mut evidence = 0.0;
        if signals.evaluation_section {
            evidence += 0.4;
        }
        if signals.setup_details {
            evidence += 0.3;
        }
        if signals.confirming_links {
            evidence += 0.3;
        }

        let confirmation = if !structured.is_empty() {
            1.0
        } else if signals.confirming_links {
            0.7
        } else {
            0.0
        };

        Self {
            presence,
            detail,
            evidence: clamp01(evidence),
            confirmation,
        }
    }

    pub fn score(&self, weights: &PerformanceWeights) -> f64 {
        clamp01(
            weights.presence * self.presence
                + weights.detail * self.detail
                + weights.evidence * self.evidence
                + weights.confirmation * self.confirmation,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceClaimProbe {
    weights: PerformanceWeights,
}

impl PerformanceClaimProbe {
    pub fn new(weights: PerformanceWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &PerformanceWeights {
        &self.weights
    }
}

#[async_trait]
impl Probe for PerformanceClaimProbe {
    fn id(&self) -> ProbeId {
        ProbeId::PerformanceClaims
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
        let source = ctx.source();
        let (info, readme) = tokio::join!(
            ctx.fetch(source.model_info(&repo)),
            ctx.fetch(source.model_card(&repo)),
        );
        let info = info?;
        let readme = readme?.unwrap_or_default();

        let structured = model_index_claims(&info);
        let unstructured = readme_claims(&readme);
        let breakdown =
            PerformanceBreakdown::assess(&structured, &unstructured, EvidenceSignals::scan(&readme));
        tracing::debug!(
            model = %repo,
            structured = structured.len(),
            unstructured = unstructured.len(),
            ?breakdown,
            "performance claims assessed"
        );
        Ok(Outcome::scalar(breakdown.score(&self.weights)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hub_client::fakes::StaticSource;
    use serde_json::json;

    use crate::probe::{ProbeStatus, Score};

    fn glue_index() -> Value {
        json!([{
            "name": "m",
            "results": [{
                "task": {"type": "text-classification"},
                "dataset": {"name": "glue", "type": "sst2"},
                "metrics": [
                    {"type": "accuracy", "value": 0.93},
                    {"name": "F1", "value": "91.2"},
                    {"type": "loss", "value": null}
                ]
            }]
        }])
    }

    #[test]
    fn test_weight_presets_sum_to_one() {
        assert!((PerformanceWeights::default().total() - 1.0).abs() < 1e-12);
        assert!((PerformanceWeights::presence_weighted().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_model_index_claims() {
        let info = ModelInfo {
            model_index: Some(glue_index()),
            ..ModelInfo::default()
        };
        let claims = model_index_claims(&info);
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].benchmark, "glue");
        assert_eq!(claims[0].metric, "accuracy");
        assert_eq!(claims[0].split.as_deref(), Some("sst2"));
        assert_eq!(claims[0].task.as_deref(), Some("text-classification"));
        assert_eq!(claims[1].metric, "f1");
        assert!((claims[1].value - 91.2).abs() < 1e-9);
    }

    #[test]
    fn test_model_index_from_card_front_matter() {
        let info = ModelInfo {
            card_data: Some(json!({ "model-index": glue_index() })),
            ..ModelInfo::default()
        };
        assert_eq!(model_index_claims(&info).len(), 2);
    }

    #[test]
    fn test_readme_claims() {
        let claims = readme_claims("We reach MMLU accuracy: 72.3% on the test set.");
        assert!(!claims.is_empty());
        assert_eq!(claims[0].benchmark, "mmlu");
        assert_eq!(claims[0].metric, "accuracy");

        let table = readme_claims("| Benchmark | Metric | Score |\n|---|---|---|\n| SQuAD | F1 | 88.5 |\n");
        let row = table.iter().find(|c| c.tabular).unwrap();
        assert_eq!(row.benchmark, "squad");
        assert_eq!(row.metric, "f1");
        assert!((row.value - 88.5).abs() < 1e-9);

        assert!(readme_claims("A friendly chatbot.").is_empty());
    }

    #[test]
    fn test_breakdown_without_claims_is_zero() {
        let b = PerformanceBreakdown::assess(&[], &[], EvidenceSignals::default());
        assert_eq!(b.score(&PerformanceWeights::default()), 0.0);
    }

    #[test]
    fn test_structured_claims_with_full_context() {
        let info = ModelInfo {
            model_index: Some(glue_index()),
            ..ModelInfo::default()
        };
        let b = PerformanceBreakdown::assess(
            &model_index_claims(&info),
            &[],
            EvidenceSignals::default(),
        );
        assert_eq!(b.presence, 1.0);
        assert!((b.detail - 1.0).abs() < 1e-12);
        assert_eq!(b.evidence, 0.0);
        assert_eq!(b.confirmation, 1.0);
        assert!((b.score(&PerformanceWeights::default()) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_readme_only_with_evidence() {
        let readme = "## Evaluation\nSQuAD EM 88.4 on one A100 GPU.\n\
                      See https://paperswithcode.com/sota/question-answering-on-squad";
        let signals = EvidenceSignals::scan(readme);
        assert!(signals.evaluation_section && signals.setup_details && signals.confirming_links);
        let b = PerformanceBreakdown::assess(&[], &readme_claims(readme), signals);
        assert_eq!(b.detail, 0.5);
        assert!((b.evidence - 1.0).abs() < 1e-12);
        assert_eq!(b.confirmation, 0.7);
        assert!((b.score(&PerformanceWeights::default()) - 0.8).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_probe_combines_hub_and_readme() {
        let source = StaticSource::new()
            .with_model(
                "acme/m",
                ModelInfo {
                    model_index: Some(glue_index()),
                    ..ModelInfo::default()
                },
            )
            .with_card("acme/m", "## Results\nTrained with seed 42.\nhttps://arxiv.org/abs/1");
        let ctx = ProbeContext::new(Arc::new(source));
        let artifact = ArtifactReference::new().with_model("https://huggingface.co/acme/m");
        let result = PerformanceClaimProbe::default().compute(&artifact, &ctx).await;
        assert_eq!(result.status, ProbeStatus::Ok);
        match result.value {
            Score::Scalar(v) => assert!((v - 1.0).abs() < 1e-9, "got {v}"),
            other => panic!("unexpected score shape: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_probe_fails_when_hub_is_down() {
        let ctx = ProbeContext::new(Arc::new(StaticSource::offline()));
        let artifact = ArtifactReference::new().with_model("https://huggingface.co/acme/m");
        let result = PerformanceClaimProbe::default().compute(&artifact, &ctx).await;
        assert_eq!(result.status, ProbeStatus::Failed);
    }
}
