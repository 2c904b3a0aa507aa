//! Bus factor: how evenly recent commits are spread across contributors
//!
//! ```text
//! C = Σ (commits_i / total)²   over the top 10 contributors
//! bus_factor = 1 - C
//! ```

use super::{Analyzer, Measurement};
use crate::collaborators::{CollabResult, Collaborators, CommitStats};
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;

const TOP_CONTRIBUTORS: usize = 10;

pub fn bus_factor_score(stats: &CommitStats) -> f64 {
    if stats.total_commits == 0 {
        return 0.0;
    }
    let mut counts: Vec<usize> = stats.contributors.values().copied().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let total = stats.total_commits as f64;
    let concentration: f64 = counts
        .iter()
        .take(TOP_CONTRIBUTORS)
        .map(|&c| (c as f64 / total).powi(2))
        .sum();
    (1.0 - concentration).clamp(0.0, 1.0)
}

pub struct BusFactorAnalyzer;

#[async_trait]
impl Analyzer for BusFactorAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::BusFactor
    }

    async fn measure(
        &self,
        _artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let Some(repo) = &collaborators.repository else {
            return Ok(Measurement::score(0.0));
        };
        let stats = repo.commit_stats().await?;
        Ok(Measurement::score(bus_factor_score(&stats)))
    }
}
