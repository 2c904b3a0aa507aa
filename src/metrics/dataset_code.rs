//! Whether the artifact links both its training data and its code.
//! Reported for transparency; it carries no weight in the net score.

use super::{Analyzer, Measurement};
use crate::collaborators::{is_code_repository, CollabResult, Collaborators};
use crate::git::is_remote_url;
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;

const DATASET_WEIGHT: f64 = 0.6;
const CODE_WEIGHT: f64 = 0.4;

pub struct DatasetAndCodeAnalyzer;

#[async_trait]
impl Analyzer for DatasetAndCodeAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::DatasetAndCode
    }

    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let has_dataset = artifact.dataset_link.is_some();
        // Local checkouts count as code; remote links must point at a code host
        let has_code = match artifact.source_repository.as_deref() {
            Some(link) if is_remote_url(link) => is_code_repository(link),
            Some(_) => collaborators.repository.is_some(),
            None => false,
        };

        let mut score = 0.0;
        if has_dataset {
            score += DATASET_WEIGHT;
        }
        if has_code {
            score += CODE_WEIGHT;
        }
        Ok(Measurement::score(score))
    }
}
