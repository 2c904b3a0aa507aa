//! Ramp-up time: how quickly a newcomer can start using the artifact

use super::{readme_text, Analyzer, Measurement};
use crate::collaborators::{CollabResult, Collaborators, RampUpSignals};
use crate::models::{ArtifactRef, MetricKind};
use async_trait::async_trait;

const CLARITY_WEIGHT: f64 = 0.6;
const EXAMPLES_WEIGHT: f64 = 0.25;
const DEPENDENCIES_WEIGHT: f64 = 0.15;

fn ramp_up_score(clarity: f64, signals: RampUpSignals) -> f64 {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    CLARITY_WEIGHT * clarity.clamp(0.0, 1.0)
        + EXAMPLES_WEIGHT * flag(signals.has_examples)
        + DEPENDENCIES_WEIGHT * flag(signals.has_dependencies)
}

pub struct RampUpAnalyzer;

#[async_trait]
impl Analyzer for RampUpAnalyzer {
    fn kind(&self) -> MetricKind {
        MetricKind::RampUpTime
    }

    async fn measure(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> CollabResult<Measurement> {
        let readme = readme_text(artifact, collaborators).await?;
        let signals = match &collaborators.repository {
            Some(repo) => repo.ramp_up_signals().await?,
            None => RampUpSignals::default(),
        };

        // Nothing to read and nothing to run
        if readme.is_none() && collaborators.repository.is_none() {
            return Ok(Measurement::score(0.0));
        }

        let clarity = match &readme {
            Some(text) => collaborators.text.get_readme_clarity(text).await,
            None => 0.0,
        };
        Ok(Measurement::score(ramp_up_score(clarity, signals)))
    }
}
