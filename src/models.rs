//! Core data models for trustcard
//!
//! These models are shared by the analyzers, the scoring engine and the
//! reporters: artifact references, metric values (with the "not applicable"
//! sentinel), per-metric results and the final scorecard.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Kind of registry entry being scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    Model,
    Dataset,
    Code,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Model => write!(f, "model"),
            ArtifactKind::Dataset => write!(f, "dataset"),
            ArtifactKind::Code => write!(f, "code"),
        }
    }
}

/// An artifact as handed over by the registry layer.
///
/// Immutable once scoring begins: analyzers only ever see `&ArtifactRef`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "type")]
    pub kind: ArtifactKind,
    /// URL or local path of the linked code repository
    #[serde(default, alias = "code_link", alias = "code")]
    pub source_repository: Option<String>,
    #[serde(default, alias = "dataset")]
    pub dataset_link: Option<String>,
    #[serde(default, alias = "model_url", alias = "model")]
    pub model_link: Option<String>,
    /// Structured configuration (typically the model's `config.json`)
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub model_card: Option<String>,
}

impl ArtifactRef {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Default::default()
        }
    }

    pub fn with_repository(mut self, repo: impl Into<String>) -> Self {
        self.source_repository = Some(repo.into());
        self
    }

    pub fn with_dataset(mut self, link: impl Into<String>) -> Self {
        self.dataset_link = Some(link.into());
        self
    }

    pub fn with_model_card(mut self, card: impl Into<String>) -> Self {
        self.model_card = Some(card.into());
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Blank links count as absent
    pub fn normalized(mut self) -> Self {
        for link in [
            &mut self.source_repository,
            &mut self.dataset_link,
            &mut self.model_link,
        ] {
            let trimmed = link.as_deref().map(|v| v.trim().to_string());
            *link = trimmed.filter(|v| !v.is_empty());
        }
        if self.model_card.as_deref().is_some_and(|c| c.trim().is_empty()) {
            self.model_card = None;
        }
        if self.name.is_empty() {
            self.name = self.id.clone();
        }
        self
    }
}

/// Value of a single metric.
///
/// Either a score in `[0.0, 1.0]` or the sentinel `-1.0` meaning "not
/// computable / not applicable". Out-of-range inputs are clamped and NaN
/// becomes `0.0`, so a `MetricValue` is always one of the two legal shapes.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct MetricValue(f64);

impl MetricValue {
    pub const ZERO: MetricValue = MetricValue(0.0);
    pub const ONE: MetricValue = MetricValue(1.0);
    pub const NOT_APPLICABLE: MetricValue = MetricValue(-1.0);

    /// Create a normal score, clamping to [0.0, 1.0]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Interpret a raw number, keeping exactly `-1.0` as the sentinel
    pub fn from_raw(value: f64) -> Self {
        if value == -1.0 {
            Self::NOT_APPLICABLE
        } else {
            Self::new(value)
        }
    }

    pub fn is_not_applicable(&self) -> bool {
        self.0 == -1.0
    }

    /// Raw number, sentinel included
    pub fn get(&self) -> f64 {
        self.0
    }

    /// Score if applicable
    pub fn score(&self) -> Option<f64> {
        (!self.is_not_applicable()).then_some(self.0)
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<MetricValue> for f64 {
    fn from(value: MetricValue) -> Self {
        value.0
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::from_raw(value)
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_not_applicable() {
            write!(f, "n/a")
        } else {
            write!(f, "{:.2}", self.0)
        }
    }
}

/// Every metric the scorecard carries, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    BusFactor,
    CodeQuality,
    DatasetQuality,
    #[serde(rename = "dataset_and_code_score")]
    DatasetAndCode,
    License,
    PerformanceClaims,
    RampUpTime,
    Reproducibility,
    Reviewedness,
    Treescore,
}

impl MetricKind {
    pub const ALL: [MetricKind; 10] = [
        MetricKind::BusFactor,
        MetricKind::CodeQuality,
        MetricKind::DatasetQuality,
        MetricKind::DatasetAndCode,
        MetricKind::License,
        MetricKind::PerformanceClaims,
        MetricKind::RampUpTime,
        MetricKind::Reproducibility,
        MetricKind::Reviewedness,
        MetricKind::Treescore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::BusFactor => "bus_factor",
            MetricKind::CodeQuality => "code_quality",
            MetricKind::DatasetQuality => "dataset_quality",
            MetricKind::DatasetAndCode => "dataset_and_code_score",
            MetricKind::License => "license",
            MetricKind::PerformanceClaims => "performance_claims",
            MetricKind::RampUpTime => "ramp_up_time",
            MetricKind::Reproducibility => "reproducibility",
            MetricKind::Reviewedness => "reviewedness",
            MetricKind::Treescore => "treescore",
        }
    }

    /// Key used for the latency field in serialized scorecards
    pub fn latency_key(&self) -> String {
        format!("{}_latency", self.as_str())
    }

    /// Lookup by name; also accepts `tree_score` and `dataset_and_code`
    pub fn from_name(name: &str) -> Option<MetricKind> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "tree_score" => Some(MetricKind::Treescore),
            "dataset_and_code" => Some(MetricKind::DatasetAndCode),
            other => MetricKind::ALL.into_iter().find(|k| k.as_str() == other),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a metric's value came to be
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The analyzer produced a value
    Computed,
    /// The metric does not apply to this artifact (value is the sentinel)
    Inapplicable,
    /// The analyzer failed or timed out and its documented fallback was used
    Fallback { reason: String },
}

impl Outcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }
}

/// Result of one analyzer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub name: MetricKind,
    pub value: MetricValue,
    pub latency_ms: u64,
    pub outcome: Outcome,
}

impl MetricResult {
    pub fn computed(name: MetricKind, value: MetricValue, latency_ms: u64) -> Self {
        Self {
            name,
            value,
            latency_ms,
            outcome: Outcome::Computed,
        }
    }

    pub fn inapplicable(name: MetricKind, latency_ms: u64) -> Self {
        Self {
            name,
            value: MetricValue::NOT_APPLICABLE,
            latency_ms,
            outcome: Outcome::Inapplicable,
        }
    }

    pub fn fallback(
        name: MetricKind,
        value: MetricValue,
        latency_ms: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name,
            value,
            latency_ms,
            outcome: Outcome::Fallback {
                reason: reason.into(),
            },
        }
    }
}

/// Hardware compatibility derived from repository size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeScore {
    pub raspberry_pi: f64,
    pub jetson_nano: f64,
    pub desktop_pc: f64,
    pub aws_server: f64,
}

/// Directed parent relationship between two artifacts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineageEdge {
    pub child: String,
    pub parent: String,
}

/// Complete trust scorecard for one artifact.
///
/// Built once by the scoring engine and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Scorecard {
    artifact_id: String,
    metrics: BTreeMap<MetricKind, MetricResult>,
    net_score: MetricValue,
    net_score_latency_ms: u64,
    size_score: SizeScore,
    size_score_latency_ms: u64,
    computed_at: DateTime<Utc>,
}

impl Scorecard {
    pub(crate) fn new(
        artifact_id: String,
        metrics: BTreeMap<MetricKind, MetricResult>,
        net_score: MetricValue,
        net_score_latency_ms: u64,
        size: (SizeScore, u64),
    ) -> Self {
        Self {
            artifact_id,
            metrics,
            net_score,
            net_score_latency_ms,
            size_score: size.0,
            size_score_latency_ms: size.1,
            computed_at: Utc::now(),
        }
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn net_score(&self) -> MetricValue {
        self.net_score
    }

    pub fn net_score_latency_ms(&self) -> u64 {
        self.net_score_latency_ms
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn size_score(&self) -> SizeScore {
        self.size_score
    }

    pub fn size_score_latency_ms(&self) -> u64 {
        self.size_score_latency_ms
    }

    pub fn metric(&self, kind: MetricKind) -> Option<&MetricResult> {
        self.metrics.get(&kind)
    }

    /// Metric value, or the sentinel if the metric is absent
    pub fn value(&self, kind: MetricKind) -> MetricValue {
        self.metrics
            .get(&kind)
            .map(|m| m.value)
            .unwrap_or(MetricValue::NOT_APPLICABLE)
    }

    /// All metric results in output order
    pub fn metrics(&self) -> impl Iterator<Item = &MetricResult> {
        self.metrics.values()
    }

    pub fn results(&self) -> &BTreeMap<MetricKind, MetricResult> {
        &self.metrics
    }

    /// Metrics that degraded to their fallback value
    pub fn fallbacks(&self) -> impl Iterator<Item = &MetricResult> {
        self.metrics.values().filter(|m| m.outcome.is_fallback())
    }
}

impl Serialize for Scorecard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("artifact_id", &self.artifact_id)?;
        map.serialize_entry("computed_at", &self.computed_at.to_rfc3339())?;
        map.serialize_entry("net_score", &self.net_score)?;
        map.serialize_entry("net_score_latency", &self.net_score_latency_ms)?;
        for kind in MetricKind::ALL {
            let (value, latency) = self
                .metrics
                .get(&kind)
                .map(|m| (m.value, m.latency_ms))
                .unwrap_or((MetricValue::NOT_APPLICABLE, 0));
            map.serialize_entry(kind.as_str(), &value)?;
            map.serialize_entry(&kind.latency_key(), &latency)?;
        }
        map.serialize_entry("size_score", &self.size_score)?;
        map.serialize_entry("size_score_latency", &self.size_score_latency_ms)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_value_clamps() {
        assert_eq!(MetricValue::new(1.7).get(), 1.0);
        assert_eq!(MetricValue::new(-0.3).get(), 0.0);
        assert_eq!(MetricValue::new(f64::NAN).get(), 0.0);
        assert!(!MetricValue::new(-1.0).is_not_applicable());
    }

    #[test]
    fn test_metric_value_sentinel() {
        let v = MetricValue::from_raw(-1.0);
        assert!(v.is_not_applicable());
        assert_eq!(v.score(), None);
        assert_eq!(v.to_string(), "n/a");
        assert_eq!(MetricValue::from_raw(0.25).score(), Some(0.25));
    }

    #[test]
    fn test_metric_kind_names() {
        assert_eq!(MetricKind::from_name("tree_score"), Some(MetricKind::Treescore));
        assert_eq!(MetricKind::from_name("ramp-up-time"), Some(MetricKind::RampUpTime));
        assert_eq!(
            MetricKind::from_name("dataset_and_code_score"),
            Some(MetricKind::DatasetAndCode)
        );
        assert_eq!(MetricKind::from_name("size"), None);
        assert_eq!(MetricKind::Reviewedness.latency_key(), "reviewedness_latency");
    }

    #[test]
    fn test_artifact_aliases() {
        let artifact: ArtifactRef = serde_json::from_str(
            r#"{"id": "m1", "type": "model", "code_link": " https://github.com/a/b ", "dataset": ""}"#,
        )
        .unwrap();
        let artifact = artifact.normalized();
        assert_eq!(artifact.source_repository.as_deref(), Some("https://github.com/a/b"));
        assert!(artifact.dataset_link.is_none());
        assert_eq!(artifact.name, "m1");
    }

    #[test]
    fn test_scorecard_serializes_every_key() {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            MetricKind::License,
            MetricResult::computed(MetricKind::License, MetricValue::ONE, 3),
        );
        let card = Scorecard::new(
            "m1".to_string(),
            metrics,
            MetricValue::new(0.15),
            10,
            (SizeScore::default(), 1),
        );
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["license"], 1.0);
        assert_eq!(json["license_latency"], 3);
        assert_eq!(json["treescore"], -1.0);
        assert_eq!(json["net_score"], 0.15);
        for kind in MetricKind::ALL {
            assert!(json.get(kind.as_str()).is_some(), "missing {}", kind);
            assert!(json.get(kind.latency_key()).is_some());
        }
    }
}
