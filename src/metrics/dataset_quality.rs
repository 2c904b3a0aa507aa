//! Dataset quality from Hugging Face popularity signals
//!
//! ```text
//! norm(v, max) = min(ln(1 + v) / ln(1 + max), 1)
//! dataset_quality = 0.5 × norm(likes, 9_030) + 0.5 × norm(downloads, 4_180_000)
//! ```
//!
//! Artifacts without a dataset, or with a dataset hosted elsewhere, get a
//! neutral 0.5.

use super::{Analyzer, Measurement};
use crate::collaborators::{extract_hf_repo_id, is_hf_dataset_url, CollabResult, Collaborators};
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;

/// Likes of a top-tier Hugging Face dataset
pub const MAX_DATASET_LIKES: u64 = 9_030;
/// Downloads of a top-tier Hugging Face dataset
pub const MAX_DATASET_DOWNLOADS: u64 = 4_180_000;

const NEUTRAL: f64 = 0.5;

/// Log-scaled popularity in [0, 1]
pub fn popularity(value: u64, max: u64) -> f64 {
    if value == 0 || max == 0 {
        return 0.0;
    }
    ((value as f64).ln_1p() / (max as f64).ln_1p()).min(1.0)
}

pub struct DatasetQualityAnalyzer;

#[async_trait]
impl Analyzer for DatasetQualityAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::DatasetQuality
    }

    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let Some(link) = artifact.dataset_link.as_deref() else {
            return Ok(Measurement::score(NEUTRAL));
        };
        let repo_id = match extract_hf_repo_id(link) {
            Some(id) if is_hf_dataset_url(link) => id,
            _ => return Ok(Measurement::score(NEUTRAL)),
        };

        let stats = collaborators.datasets.dataset_stats(&repo_id).await?;
        let score = 0.5 * popularity(stats.likes, MAX_DATASET_LIKES)
            + 0.5 * popularity(stats.downloads, MAX_DATASET_DOWNLOADS);
        Ok(Measurement::score(score))
    }
}
