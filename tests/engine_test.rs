//! Integration tests for the scoring engine
//!
//! These drive the public library API with scripted collaborators and
//! check the scorecard-level guarantees:
//! - every metric key is present and the net score stays in [0, 1]
//! - one slow or failing collaborator only degrades its own metrics
//! - identical collaborator responses give identical scorecards

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use trustcard::collaborators::{
    CodeQualityStats, CollabResult, CollaboratorError, Collaborators, CommitStats,
    ExecutionOutcome, ExtractedCode, InMemoryRegistry, PullRequestSummary, RampUpSignals,
    RepositoryInspector,
};
use trustcard::engine::ScoringEngine;
use trustcard::models::{ArtifactRef, MetricKind, Scorecard};
use trustcard::scoring::WeightTable;

/// Repository whose every answer is fixed up front
#[derive(Clone, Default)]
struct ScriptedRepo {
    github: bool,
    demos: Vec<String>,
    runnable: Vec<String>,
    readme: Option<String>,
    pulls: PullRequestSummary,
    commits: CommitStats,
    quality: CodeQualityStats,
    ramp: RampUpSignals,
    size_bytes: u64,
    /// Delay applied to history queries
    history_delay: Option<Duration>,
    history_fails: bool,
}

impl ScriptedRepo {
    async fn history_gate(&self) -> CollabResult<()> {
        if let Some(delay) = self.history_delay {
            tokio::time::sleep(delay).await;
        }
        if self.history_fails {
            return Err(CollaboratorError::Unavailable("git history offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryInspector for ScriptedRepo {
    fn location(&self) -> &str {
        "scripted"
    }

    async fn has_github_repository(&self) -> bool {
        self.github
    }

    async fn find_demo_files(&self) -> CollabResult<Vec<String>> {
        Ok(self.demos.clone())
    }

    async fn test_code_execution(&self, files: &[String]) -> CollabResult<Vec<ExecutionOutcome>> {
        Ok(files
            .iter()
            .map(|f| {
                if self.runnable.contains(f) {
                    ExecutionOutcome::ok(f.clone())
                } else {
                    ExecutionOutcome::failed(f.clone(), "ImportError")
                }
            })
            .collect())
    }

    async fn test_extracted_code(&self, _code: &ExtractedCode) -> CollabResult<ExecutionOutcome> {
        Ok(ExecutionOutcome::failed("snippet", "not runnable"))
    }

    async fn read_model_card(&self) -> CollabResult<Option<String>> {
        Ok(self.readme.clone())
    }

    async fn read_license_file(&self) -> CollabResult<Option<String>> {
        Ok(None)
    }

    async fn analyze_pull_requests(&self) -> CollabResult<PullRequestSummary> {
        self.history_gate().await?;
        Ok(self.pulls)
    }

    async fn commit_stats(&self) -> CollabResult<CommitStats> {
        self.history_gate().await?;
        Ok(self.commits.clone())
    }

    async fn code_quality_stats(&self) -> CollabResult<CodeQualityStats> {
        Ok(self.quality.clone())
    }

    async fn ramp_up_signals(&self) -> CollabResult<RampUpSignals> {
        Ok(self.ramp)
    }

    async fn repository_size_bytes(&self) -> CollabResult<u64> {
        Ok(self.size_bytes)
    }
}

fn healthy_repo() -> ScriptedRepo {
    let demos: Vec<String> = ["demo.py", "examples/train.py", "examples/infer.py"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    ScriptedRepo {
        github: true,
        runnable: demos.clone(),
        demos,
        readme: Some("# Model\n\n## License\n\nApache-2.0\n".to_string()),
        pulls: PullRequestSummary {
            pull_requests: 14,
            total_code_lines: 1000,
            reviewed_code_lines: 850,
        },
        commits: CommitStats {
            total_commits: 40,
            contributors: [("ana", 10), ("bo", 10), ("cy", 10), ("di", 10)]
                .into_iter()
                .map(|(n, c)| (n.to_string(), c))
                .collect(),
        },
        quality: CodeQualityStats {
            has_tests: true,
            lint_errors: Some(2),
            python_files: 12,
        },
        ramp: RampUpSignals {
            has_examples: true,
            has_dependencies: true,
        },
        size_bytes: 300 * 1024 * 1024,
        ..Default::default()
    }
}

fn registry() -> InMemoryRegistry {
    InMemoryRegistry::new()
        .with_model("org/child", None, &["org/base-a", "org/base-b"])
        .with_model("org/base-a", Some(0.85), &[])
        .with_model("org/base-b", Some(0.75), &[])
}

fn collaborators(repo: ScriptedRepo) -> Collaborators {
    Collaborators::offline()
        .with_repository(Arc::new(repo))
        .with_lineage(Arc::new(registry()))
}

fn artifact() -> ArtifactRef {
    ArtifactRef::new("org/child").with_repository("https://github.com/org/child")
}

async fn score(engine: &ScoringEngine, collab: &Collaborators) -> Scorecard {
    engine.score(&artifact(), collab).await.expect("not cancelled")
}

#[tokio::test]
async fn test_healthy_artifact_scorecard() {
    let card = score(&ScoringEngine::default(), &collaborators(healthy_repo())).await;

    assert_eq!(card.value(MetricKind::Reproducibility).get(), 1.0);
    assert!((card.value(MetricKind::Reviewedness).get() - 0.85).abs() < 0.01);
    assert!((card.value(MetricKind::Treescore).get() - 0.80).abs() < 1e-9);
    assert!((card.value(MetricKind::BusFactor).get() - 0.75).abs() < 1e-9);
    assert_eq!(card.value(MetricKind::License).get(), 1.0);
    assert_eq!(card.size_score().raspberry_pi, 1.0);
    assert_eq!(card.fallbacks().count(), 0);

    let net = card.net_score().get();
    assert!((0.0..=1.0).contains(&net));
    assert!(net > 0.5, "healthy artifact scored {net}");
}

#[tokio::test]
async fn test_serialized_card_has_every_key() {
    let card = score(&ScoringEngine::default(), &collaborators(healthy_repo())).await;
    let json = serde_json::to_value(&card).unwrap();
    for key in [
        "net_score",
        "net_score_latency",
        "size_score",
        "size_score_latency",
        "artifact_id",
        "computed_at",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    for kind in MetricKind::ALL {
        assert!(json.get(kind.as_str()).is_some(), "missing {kind}");
        assert!(json.get(kind.latency_key()).is_some(), "missing {kind} latency");
    }
}

#[tokio::test]
async fn test_bare_artifact() {
    let card = ScoringEngine::default()
        .score(&ArtifactRef::new("lonely"), &Collaborators::offline())
        .await
        .unwrap();
    assert_eq!(card.value(MetricKind::Reproducibility).get(), 0.0);
    assert_eq!(card.value(MetricKind::Reviewedness).get(), -1.0);
    assert_eq!(card.value(MetricKind::Treescore).get(), 0.0);
    let net = card.net_score().get();
    assert!((0.0..=1.0).contains(&net));
}

#[tokio::test]
async fn test_idempotent_scores() {
    let engine = ScoringEngine::default();
    let collab = collaborators(healthy_repo());
    let first = score(&engine, &collab).await;
    let second = score(&engine, &collab).await;

    assert_eq!(first.net_score(), second.net_score());
    for kind in MetricKind::ALL {
        assert_eq!(first.value(kind), second.value(kind), "{kind} differs");
    }
}

#[tokio::test]
async fn test_inapplicable_reviewedness_contributes_nothing() {
    let engine = ScoringEngine::default();
    let reviewed = ScriptedRepo {
        pulls: PullRequestSummary {
            pull_requests: 3,
            total_code_lines: 100,
            reviewed_code_lines: 100,
        },
        ..healthy_repo()
    };
    let off_github = ScriptedRepo {
        github: false,
        ..reviewed.clone()
    };

    let with_review = score(&engine, &collaborators(reviewed)).await;
    let without = score(&engine, &collaborators(off_github)).await;
    assert_eq!(with_review.value(MetricKind::Reviewedness).get(), 1.0);
    assert!(without.value(MetricKind::Reviewedness).is_not_applicable());

    let weight = WeightTable::standard().weight(MetricKind::Reviewedness);
    let diff = with_review.net_score().get() - without.net_score().get();
    assert!((diff - weight).abs() < 1e-9, "diff {diff} != weight {weight}");
}

#[tokio::test]
async fn test_slow_history_degrades_only_its_metrics() {
    let engine = ScoringEngine::builder()
        .metric_timeout(Duration::from_millis(200))
        .build();
    let slow = ScriptedRepo {
        history_delay: Some(Duration::from_secs(20)),
        ..healthy_repo()
    };
    let card = score(&engine, &collaborators(slow)).await;

    let bus = card.metric(MetricKind::BusFactor).unwrap();
    assert!(bus.outcome.is_fallback());
    assert_eq!(bus.value.get(), 0.0);
    let review = card.metric(MetricKind::Reviewedness).unwrap();
    assert!(review.outcome.is_fallback());
    assert!(review.value.is_not_applicable());

    // Unaffected metrics still computed
    assert_eq!(card.value(MetricKind::Reproducibility).get(), 1.0);
    assert!((card.value(MetricKind::Treescore).get() - 0.80).abs() < 1e-9);
    assert_eq!(card.fallbacks().count(), 2);
}

#[tokio::test]
async fn test_failing_history_uses_fallbacks() {
    let broken = ScriptedRepo {
        history_fails: true,
        ..healthy_repo()
    };
    let card = score(&ScoringEngine::default(), &collaborators(broken)).await;
    assert_eq!(card.value(MetricKind::BusFactor).get(), 0.0);
    assert!(card.value(MetricKind::Reviewedness).is_not_applicable());
    assert!((0.0..=1.0).contains(&card.net_score().get()));
}

#[tokio::test]
async fn test_partial_demo_success() {
    let repo = ScriptedRepo {
        runnable: vec!["demo.py".to_string()],
        ..healthy_repo()
    };
    let card = score(&ScoringEngine::default(), &collaborators(repo)).await;
    assert_eq!(card.value(MetricKind::Reproducibility).get(), 0.5);
}

#[tokio::test]
async fn test_custom_weights_change_net_score() {
    let only_license: std::collections::BTreeMap<String, f64> = MetricKind::ALL
        .iter()
        .map(|k| (k.as_str().to_string(), if *k == MetricKind::License { 1.0 } else { 0.0 }))
        .collect();
    let engine = ScoringEngine::builder()
        .weights(WeightTable::with_overrides(&only_license).unwrap())
        .build();
    let card = score(&engine, &collaborators(healthy_repo())).await;
    assert!((card.net_score().get() - 1.0).abs() < 1e-9);
}
