//! Reproducibility: can the published demo code actually be run?
//!
//! - demo files present: all run → 1.0, some run → 0.5, none run → 0.0
//! - no demo files: the first snippet extracted from the model card is
//!   executed; it runs → 1.0, otherwise 0.0
//!
//! The value is always one of {0.0, 0.5, 1.0}.

use super::{readme_text, Analyzer, Measurement};
use crate::collaborators::{CollabResult, Collaborators};
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;
use tracing::debug;

fn demo_score(runs: usize, total: usize) -> f64 {
    if total == 0 || runs == 0 {
        0.0
    } else if runs == total {
        1.0
    } else {
        0.5
    }
}

pub struct ReproducibilityAnalyzer;

#[async_trait]
impl Analyzer for ReproducibilityAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::Reproducibility
    }

    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        if let Some(repo) = &collaborators.repository {
            let demos = repo.find_demo_files().await?;
            if !demos.is_empty() {
                let outcomes = repo.test_code_execution(&demos).await?;
                let runs = outcomes.iter().filter(|o| o.runs).count();
                debug!("{}/{} demo files ran for {}", runs, demos.len(), artifact.id);
                return Ok(Measurement::score(demo_score(runs, demos.len())));
            }
        }

        let Some(card) = readme_text(artifact, collaborators).await? else {
            return Ok(Measurement::score(0.0));
        };
        let snippets = collaborators.text.extract_code_from_text(&card).await;
        let (Some(snippet), Some(repo)) = (snippets.first(), &collaborators.repository) else {
            return Ok(Measurement::score(0.0));
        };

        let outcome = repo.test_extracted_code(snippet).await?;
        Ok(Measurement::score(if outcome.runs { 1.0 } else { 0.0 }))
    }
}
