//! Per-metric analyzers
//!
//! Every analyzer computes exactly one [`MetricKind`] from an
//! [`ArtifactRef`] and read-only [`Collaborators`]. Analyzers never fail:
//! collaborator errors are logged and replaced by the analyzer's documented
//! fallback value.
//!
//! # Example
//!
//! ```rust,ignore
//! use trustcard::metrics::{Analyzer, BusFactorAnalyzer};
//!
//! let result = BusFactorAnalyzer.compute(&artifact, &collaborators).await;
//! println!("{} = {} ({}ms)", result.name, result.value, result.latency_ms);
//! ```

mod bus_factor;
mod code_quality;
mod dataset_code;
mod dataset_quality;
pub mod latency;
mod license;
mod performance_claims;
mod ramp_up;
mod reproducibility;
mod reviewedness;
mod size;
mod treescore;

pub use bus_factor::{bus_factor_score, BusFactorAnalyzer};
pub use code_quality::{code_quality_score, CodeQualityAnalyzer};
pub use dataset_code::DatasetAndCodeAnalyzer;
pub use dataset_quality::{popularity, DatasetQualityAnalyzer};
pub use latency::{duration_ms, timed, Stopwatch};
pub use license::{classify_license, extract_license_text, LicenseAnalyzer, LicenseClass};
pub use performance_claims::PerformanceClaimsAnalyzer;
pub use ramp_up::RampUpAnalyzer;
pub use reproducibility::ReproducibilityAnalyzer;
pub use reviewedness::ReviewednessAnalyzer;
pub use size::{size_score, SizeAnalyzer};
pub use treescore::TreescoreAnalyzer;

use crate::collaborators::{CollabResult, Collaborators};
use crate::lineage::{LineageResolver, LineageSettings};
use crate::models::{ArtifactRef, MetricKind, MetricResult, MetricValue};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// What an analyzer measured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Score(MetricValue),
    /// The metric does not apply; reported as the `-1.0` sentinel
    Inapplicable,
}

impl Measurement {
    /// Clamped score
    pub fn score(value: f64) -> Self {
        Measurement::Score(MetricValue::new(value))
    }
}

/// Unit computing one metric
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Value reported when measuring fails, panics or times out
    fn fallback(&self) -> MetricValue {
        MetricValue::ZERO
    }

    /// Measure the metric. Errors are collaborator failures, not
    /// inapplicability.
    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement>;

    /// Timed measurement with the fallback applied
    async fn compute(&self, artifact: &ArtifactRef, collaborators: &Collaborators) -> MetricResult {
        let kind = self.kind();
        let (outcome, latency_ms) = timed(self.measure(artifact, collaborators)).await;
        match outcome {
            Ok(Measurement::Score(value)) => {
                debug!("{} for {} = {} ({}ms)", kind, artifact.id, value, latency_ms);
                MetricResult::computed(kind, value, latency_ms)
            }
            Ok(Measurement::Inapplicable) => {
                debug!("{} not applicable to {}", kind, artifact.id);
                MetricResult::inapplicable(kind, latency_ms)
            }
            Err(e) => {
                warn!(
                    "{} failed for {}: {}; using fallback {}",
                    kind,
                    artifact.id,
                    e,
                    self.fallback()
                );
                MetricResult::fallback(kind, self.fallback(), latency_ms, e.to_string())
            }
        }
    }
}

/// The full analyzer set, one per [`MetricKind`]
pub fn default_analyzers(lineage: LineageSettings) -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(BusFactorAnalyzer),
        Arc::new(CodeQualityAnalyzer),
        Arc::new(DatasetQualityAnalyzer),
        Arc::new(DatasetAndCodeAnalyzer),
        Arc::new(LicenseAnalyzer),
        Arc::new(PerformanceClaimsAnalyzer),
        Arc::new(RampUpAnalyzer),
        Arc::new(ReproducibilityAnalyzer),
        Arc::new(ReviewednessAnalyzer),
        Arc::new(TreescoreAnalyzer::new(LineageResolver::new(lineage))),
    ]
}

/// README / model card text: the artifact's own card first, then the
/// repository README
pub(crate) async fn readme_text(
    artifact: &ArtifactRef,
    collaborators: &Collaborators,
) -> CollabResult<Option<String>> {
    if let Some(card) = artifact.model_card.as_deref().filter(|c| !c.trim().is_empty()) {
        return Ok(Some(card.to_string()));
    }
    match &collaborators.repository {
        Some(repo) => Ok(repo
            .read_model_card()
            .await?
            .filter(|c| !c.trim().is_empty())),
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod testing;
