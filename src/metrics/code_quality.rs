//! Code quality from lint density and the presence of tests

use super::{Analyzer, Measurement};
use crate::collaborators::{CodeQualityStats, CollabResult, Collaborators};
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;

const LINT_WEIGHT: f64 = 0.6;
const TESTS_WEIGHT: f64 = 0.4;
/// Score lost per lint error
const LINT_PENALTY: f64 = 0.05;

/// `0.6 × max(0, 1 − 0.05 × lint_errors) + 0.4 × has_tests`
pub fn code_quality_score(stats: &CodeQualityStats) -> f64 {
    let lint_errors = stats.lint_errors.unwrap_or(0) as f64;
    let lint_score = (1.0 - LINT_PENALTY * lint_errors).max(0.0);
    let tests = if stats.has_tests { 1.0 } else { 0.0 };
    LINT_WEIGHT * lint_score + TESTS_WEIGHT * tests
}

pub struct CodeQualityAnalyzer;

#[async_trait]
impl Analyzer for CodeQualityAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::CodeQuality
    }

    async fn measure(
        &self,
        _artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let Some(repo) = &collaborators.repository else {
            return Ok(Measurement::score(0.0));
        };
        let stats = repo.code_quality_stats().await?;
        Ok(Measurement::score(code_quality_score(&stats)))
    }
}
