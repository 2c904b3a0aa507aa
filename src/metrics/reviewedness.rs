//! Reviewedness: share of code that landed through reviewed pull requests.
//!
//! Not applicable (`-1.0`) without a GitHub repository, without pull
//! requests, or without any code lines.

use super::{Analyzer, Measurement};
use crate::collaborators::{CollabResult, Collaborators};
use crate::models::{ArtifactRef, MetricKind, MetricValue};
use async_trait::async_trait;

pub struct ReviewednessAnalyzer;

#[async_trait]
impl Analyzer for ReviewednessAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::Reviewedness
    }

    fn fallback(&self) -> MetricValue {
        MetricValue::NOT_APPLICABLE
    }

    async fn measure(
        &self,
        _artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let Some(repo) = &collaborators.repository else {
            return Ok(Measurement::Inapplicable);
        };
        if !repo.has_github_repository().await {
            return Ok(Measurement::Inapplicable);
        }

        let summary = repo.analyze_pull_requests().await?;
        if summary.pull_requests == 0 || summary.total_code_lines == 0 {
            return Ok(Measurement::Inapplicable);
        }
        let ratio = summary.reviewed_code_lines as f64 / summary.total_code_lines as f64;
        Ok(Measurement::score(ratio))
    }
}
