//! Performance claims: does the README back its claims with benchmarks and
//! concrete metrics?

use super::{readme_text, Analyzer, Measurement};
use crate::collaborators::{CollabResult, Collaborators, PerformanceClaims};
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;

fn claims_score(claims: &PerformanceClaims) -> f64 {
    0.5 * claims.mentions_benchmarks.clamp(0.0, 1.0) + 0.5 * claims.has_metrics.clamp(0.0, 1.0)
}

pub struct PerformanceClaimsAnalyzer;

#[async_trait]
impl Analyzer for PerformanceClaimsAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::PerformanceClaims
    }

    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let Some(readme) = readme_text(artifact, collaborators).await? else {
            return Ok(Measurement::score(0.0));
        };
        let claims = collaborators.text.get_performance_claims(&readme).await;
        Ok(Measurement::score(claims_score(&claims)))
    }
}
