//! Treescore: mean net score of the artifact's scored ancestors

use super::{Analyzer, Measurement};
use crate::collaborators::{CollabResult, Collaborators};
use crate::lineage::LineageResolver;
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;
use tracing::debug;

pub struct TreescoreAnalyzer {
    resolver: LineageResolver,
}

impl TreescoreAnalyzer {
    pub fn new(resolver: LineageResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Analyzer for TreescoreAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::Treescore
    }

    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let resolution = self.resolver.resolve(artifact, &collaborators.lineage).await?;
        debug!(
            "{} lineage: {} edges, {} scored ancestors",
            artifact.id,
            resolution.edges.len(),
            resolution.scores.len()
        );
        Ok(Measurement::score(resolution.mean_score().unwrap_or(0.0)))
    }
}
