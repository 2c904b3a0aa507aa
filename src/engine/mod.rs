//! Scoring engine
//!
//! The ScoringEngine orchestrates one scoring request:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ScoringEngine                       │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Spawn every analyzer (and the size check) as a task │
//! │  2. Bound each task with its own timeout                │
//! │  3. Join all; timeouts and panics become fallbacks      │
//! │  4. Aggregate the net score                             │
//! │  5. Emit an immutable Scorecard                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests move through `Pending → Running → Partial → Complete`. There is
//! no failed state: a request either completes with every metric present
//! (computed or fallback) or is cancelled, in which case no scorecard is
//! produced.

use crate::collaborators::Collaborators;
use crate::lineage::LineageSettings;
use crate::metrics::{default_analyzers, duration_ms, Analyzer, SizeAnalyzer, Stopwatch};
use crate::models::{ArtifactRef, MetricKind, MetricResult, MetricValue, Scorecard, SizeScore};
use crate::scoring::{NetScoreAggregator, WeightTable};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const DEFAULT_METRIC_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("scoring of {0} was cancelled")]
    Cancelled(String),
}

/// Progress of one scoring request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringState {
    /// Accepted, nothing dispatched yet
    Pending,
    /// Analyzers dispatched, no result yet
    Running,
    /// Some analyzers have reported
    Partial,
    /// Scorecard built
    Complete,
}

/// Orchestrates all analyzers for an artifact
pub struct ScoringEngine {
    analyzers: Vec<Arc<dyn Analyzer>>,
    aggregator: NetScoreAggregator,
    metric_timeout: Duration,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        ScoringEngineBuilder::new().build()
    }
}

impl ScoringEngine {
    pub fn builder() -> ScoringEngineBuilder {
        ScoringEngineBuilder::new()
    }

    pub fn analyzers(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.analyzers.iter().map(|a| a.kind())
    }

    pub fn weights(&self) -> &WeightTable {
        self.aggregator.weights()
    }

    pub async fn score(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
    ) -> Result<Scorecard, ScoringError> {
        self.score_with(artifact, collaborators, &CancellationToken::new(), None)
            .await
    }

    /// Score with cancellation and optional progress reporting.
    ///
    /// Cancelling `cancel` aborts every in-flight analyzer and returns
    /// [`ScoringError::Cancelled`].
    pub async fn score_with(
        &self,
        artifact: &ArtifactRef,
        collaborators: &Collaborators,
        cancel: &CancellationToken,
        progress: Option<&watch::Sender<ScoringState>>,
    ) -> Result<Scorecard, ScoringError> {
        let report = |state: ScoringState| {
            if let Some(tx) = progress {
                tx.send_replace(state);
            }
        };
        report(ScoringState::Pending);

        let watch_total = Stopwatch::start();
        let artifact = Arc::new(artifact.clone().normalized());
        info!("Scoring {} ({} analyzers)", artifact.id, self.analyzers.len());

        let mut tasks = JoinSet::new();
        let mut pending: HashMap<tokio::task::Id, (MetricKind, MetricValue, Stopwatch)> =
            HashMap::new();

        for analyzer in &self.analyzers {
            let analyzer = Arc::clone(analyzer);
            let artifact = Arc::clone(&artifact);
            let collaborators = collaborators.clone();
            let timeout = self.metric_timeout;
            let kind = analyzer.kind();
            let fallback = analyzer.fallback();
            let started = Stopwatch::start();

            let handle = tasks.spawn(async move {
                match tokio::time::timeout(timeout, analyzer.compute(&artifact, &collaborators)).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("{} timed out after {:?}; using fallback {}", kind, timeout, fallback);
                        MetricResult::fallback(
                            kind,
                            fallback,
                            started.elapsed_ms(),
                            format!("timed out after {}ms", timeout.as_millis()),
                        )
                    }
                }
            });
            pending.insert(handle.id(), (kind, fallback, started));
        }

        // Own JoinSet so that dropping this future aborts the size check too
        let mut size_task = JoinSet::new();
        {
            let collaborators = collaborators.clone();
            let timeout = self.metric_timeout;
            size_task.spawn(async move {
                tokio::time::timeout(timeout, SizeAnalyzer.compute(&collaborators))
                    .await
                    .unwrap_or((SizeScore::default(), duration_ms(timeout)))
            });
        }
        report(ScoringState::Running);

        let mut metrics: BTreeMap<MetricKind, MetricResult> = BTreeMap::new();
        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    size_task.abort_all();
                    warn!("Scoring of {} cancelled", artifact.id);
                    return Err(ScoringError::Cancelled(artifact.id.clone()));
                }
                joined = tasks.join_next_with_id() => joined,
            };

            let result = match joined {
                None => break,
                Some(Ok((id, result))) => {
                    pending.remove(&id);
                    result
                }
                Some(Err(e)) => {
                    let Some((kind, fallback, started)) = pending.remove(&e.id()) else {
                        error!("Unknown analyzer task failed: {}", e);
                        continue;
                    };
                    error!("{} panicked: {}", kind, panic_message(e));
                    MetricResult::fallback(kind, fallback, started.elapsed_ms(), "analyzer panicked")
                }
            };
            debug!("{} = {} ({}ms)", result.name, result.value, result.latency_ms);
            metrics.insert(result.name, result);
            if !pending.is_empty() {
                report(ScoringState::Partial);
            }
        }

        let size = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                size_task.abort_all();
                return Err(ScoringError::Cancelled(artifact.id.clone()));
            }
            size = size_task.join_next() => match size {
                Some(Ok(size)) => size,
                Some(Err(e)) => {
                    error!("size check failed: {}", e);
                    (SizeScore::default(), 0)
                }
                None => (SizeScore::default(), 0),
            },
        };

        let net_score = self.aggregator.aggregate(&metrics);
        let fallbacks = metrics.values().filter(|m| m.outcome.is_fallback()).count();
        let scorecard = Scorecard::new(
            artifact.id.clone(),
            metrics,
            net_score,
            watch_total.elapsed_ms(),
            size,
        );
        report(ScoringState::Complete);

        info!(
            "Scored {}: net_score={} ({} fallbacks, {}ms)",
            scorecard.artifact_id(),
            scorecard.net_score(),
            fallbacks,
            scorecard.net_score_latency_ms()
        );
        Ok(scorecard)
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for ScoringEngine with fluent API
pub struct ScoringEngineBuilder {
    analyzers: Option<Vec<Arc<dyn Analyzer>>>,
    weights: WeightTable,
    metric_timeout: Duration,
    lineage: LineageSettings,
}

impl Default for ScoringEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringEngineBuilder {
    pub fn new() -> Self {
        Self {
            analyzers: None,
            weights: WeightTable::standard(),
            metric_timeout: DEFAULT_METRIC_TIMEOUT,
            lineage: LineageSettings::default(),
        }
    }

    /// Replace the default analyzer set
    pub fn analyzers(mut self, analyzers: Vec<Arc<dyn Analyzer>>) -> Self {
        self.analyzers = Some(analyzers);
        self
    }

    pub fn weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    /// Per-analyzer wall-clock bound
    pub fn metric_timeout(mut self, timeout: Duration) -> Self {
        self.metric_timeout = timeout;
        self
    }

    /// Lineage traversal used by the default treescore analyzer
    pub fn lineage(mut self, lineage: LineageSettings) -> Self {
        self.lineage = lineage;
        self
    }

    pub fn build(self) -> ScoringEngine {
        let lineage = self.lineage;
        ScoringEngine {
            analyzers: self
                .analyzers
                .unwrap_or_else(|| default_analyzers(lineage)),
            aggregator: NetScoreAggregator::new(self.weights),
            metric_timeout: self.metric_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CollabResult;
    use crate::metrics::testing::FakeRepository;
    use crate::metrics::Measurement;
    use crate::models::Outcome;
    use async_trait::async_trait;

    struct Fixed(MetricKind, f64);

    #[async_trait]
    impl Analyzer for Fixed {
        fn kind(&self) -> MetricKind {
            self.0
        }

        async fn measure(&self, _: &ArtifactRef, _: &Collaborators) -> CollabResult<Measurement> {
            Ok(Measurement::score(self.1))
        }
    }

    struct Sleepy(MetricKind);

    #[async_trait]
    impl Analyzer for Sleepy {
        fn kind(&self) -> MetricKind {
            self.0
        }

        async fn measure(&self, _: &ArtifactRef, _: &Collaborators) -> CollabResult<Measurement> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Measurement::score(1.0))
        }
    }

    struct Panicky;

    #[async_trait]
    impl Analyzer for Panicky {
        fn kind(&self) -> MetricKind {
            MetricKind::Reviewedness
        }

        fn fallback(&self) -> MetricValue {
            MetricValue::NOT_APPLICABLE
        }

        async fn measure(&self, _: &ArtifactRef, _: &Collaborators) -> CollabResult<Measurement> {
            panic!("analyzer bug");
        }
    }

    fn engine(analyzers: Vec<Arc<dyn Analyzer>>) -> ScoringEngine {
        ScoringEngine::builder()
            .analyzers(analyzers)
            .metric_timeout(Duration::from_millis(100))
            .build()
    }

    #[tokio::test]
    async fn test_default_engine_offline() {
        let card = ScoringEngine::default()
            .score(&ArtifactRef::new("lonely"), &Collaborators::offline())
            .await
            .unwrap();
        assert_eq!(card.value(MetricKind::Reproducibility).get(), 0.0);
        assert!(card.value(MetricKind::Reviewedness).is_not_applicable());
        assert_eq!(card.value(MetricKind::DatasetQuality).get(), 0.5);
        // Only the neutral dataset score contributes
        assert!((card.net_score().get() - 0.05).abs() < 1e-9);
        assert_eq!(card.metrics().count(), MetricKind::ALL.len());
    }

    #[tokio::test]
    async fn test_timeout_degrades_single_metric() {
        let card = engine(vec![
            Arc::new(Fixed(MetricKind::License, 1.0)),
            Arc::new(Sleepy(MetricKind::BusFactor)),
        ])
        .score(&ArtifactRef::new("m"), &Collaborators::offline())
        .await
        .unwrap();

        assert_eq!(card.value(MetricKind::License).get(), 1.0);
        let bus = card.metric(MetricKind::BusFactor).unwrap();
        assert_eq!(bus.value.get(), 0.0);
        assert!(matches!(&bus.outcome, Outcome::Fallback { reason } if reason.contains("timed out")));
        assert!((card.net_score().get() - 0.15).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_panic_uses_fallback() {
        let card = engine(vec![
            Arc::new(Panicky),
            Arc::new(Fixed(MetricKind::CodeQuality, 1.0)),
        ])
        .score(&ArtifactRef::new("m"), &Collaborators::offline())
        .await
        .unwrap();
        let review = card.metric(MetricKind::Reviewedness).unwrap();
        assert!(review.value.is_not_applicable());
        assert!(review.outcome.is_fallback());
        assert_eq!(card.value(MetricKind::CodeQuality).get(), 1.0);
    }

    #[tokio::test]
    async fn test_cancellation_returns_error() {
        let cancel = CancellationToken::new();
        let engine = engine(vec![Arc::new(Sleepy(MetricKind::License))]);
        let artifact = ArtifactRef::new("m");
        let collab = Collaborators::offline();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        let err = engine
            .score_with(&artifact, &collab, &cancel, None)
            .await
            .unwrap_err();
        assert_eq!(err, ScoringError::Cancelled("m".to_string()));
    }

    #[tokio::test]
    async fn test_progress_reaches_complete() {
        let (tx, rx) = watch::channel(ScoringState::Pending);
        let engine = engine(vec![
            Arc::new(Fixed(MetricKind::License, 1.0)),
            Arc::new(Fixed(MetricKind::BusFactor, 1.0)),
        ]);
        engine
            .score_with(
                &ArtifactRef::new("m"),
                &Collaborators::offline(),
                &CancellationToken::new(),
                Some(&tx),
            )
            .await
            .unwrap();
        assert_eq!(*rx.borrow(), ScoringState::Complete);
    }

    #[tokio::test]
    async fn test_size_score_recorded() {
        let repo = FakeRepository {
            size_bytes: 10 * 1024 * 1024,
            ..Default::default()
        };
        let collab = Collaborators::offline().with_repository(Arc::new(repo));
        let card = engine(vec![])
            .score(&ArtifactRef::new("m"), &collab)
            .await
            .unwrap();
        assert_eq!(card.size_score().raspberry_pi, 1.0);
        assert_eq!(card.net_score().get(), 0.0);
    }

    fn hanging_size_repo() -> (FakeRepository, Arc<()>) {
        let in_flight = Arc::new(());
        let repo = FakeRepository {
            size_delay: Some(Duration::from_secs(3600)),
            size_in_flight: Arc::clone(&in_flight),
            ..Default::default()
        };
        (repo, in_flight)
    }

    #[tokio::test]
    async fn test_cancellation_during_size_check() {
        let (repo, in_flight) = hanging_size_repo();
        let collab = Collaborators::offline().with_repository(Arc::new(repo));
        let engine = ScoringEngine::builder()
            .analyzers(vec![Arc::new(Fixed(MetricKind::License, 1.0))])
            .metric_timeout(Duration::from_secs(3600))
            .build();

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = engine
            .score_with(&ArtifactRef::new("m"), &collab, &cancel, None)
            .await
            .unwrap_err();
        assert_eq!(err, ScoringError::Cancelled("m".to_string()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(Arc::strong_count(&in_flight), 1);
    }

    #[tokio::test]
    async fn test_dropping_request_aborts_size_check() {
        let (repo, in_flight) = hanging_size_repo();
        let collab = Collaborators::offline().with_repository(Arc::new(repo));
        let engine = ScoringEngine::builder()
            .analyzers(vec![])
            .metric_timeout(Duration::from_secs(3600))
            .build();
        let artifact = ArtifactRef::new("m");

        let mut scoring = Box::pin(engine.score(&artifact, &collab));
        tokio::select! {
            _ = &mut scoring => panic!("size check finished early"),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
        assert_eq!(Arc::strong_count(&in_flight), 2);

        drop(scoring);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(Arc::strong_count(&in_flight), 1);
    }
}
