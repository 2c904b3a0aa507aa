//! Score command - build collaborators and run the engine per artifact

use crate::ai::LlmText;
use crate::collaborators::{
    Collaborators, GenerativeText, HuggingFaceHub, InMemoryRegistry, LocalRepository,
    NeutralText, OfflineHub, RepositoryInspector, RepositoryOptions,
};
use crate::config::{ProjectConfig, UserConfig};
use crate::engine::{ScoringEngine, ScoringError};
use crate::git::is_remote_url;
use crate::models::{ArtifactRef, Scorecard};
use crate::reporters::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use console::style;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ScoreOptions {
    pub artifacts: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub repo: Option<PathBuf>,
    pub no_exec: bool,
    pub offline: bool,
    pub metric_timeout_ms: Option<u64>,
    pub jobs: usize,
    pub fail_under: Option<f64>,
}

/// Everything shared by all artifacts of one invocation
struct Shared {
    engine: ScoringEngine,
    base: Collaborators,
    repo_options: RepositoryOptions,
    local_repo: Option<PathBuf>,
    github_token: Option<String>,
    clone_timeout: Duration,
}

/// Run the score command
pub fn run(options: ScoreOptions, project: ProjectConfig) -> Result<()> {
    let artifacts = load_artifacts(&options.artifacts)?;
    if artifacts.is_empty() {
        bail!("No artifacts found in {}", options.artifacts.display());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let cards = runtime.block_on(score_all(artifacts, &options, &project))?;

    let weights = project.scoring.weight_table();
    let rendered = reporters::report(&cards, &weights, options.format)?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} scorecard(s) to {}",
                style("✓").green(),
                cards.len(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", rendered),
    }

    if let Some(threshold) = options.fail_under {
        let failing: Vec<&str> = cards
            .iter()
            .filter(|c| c.net_score().get() < threshold)
            .map(|c| c.artifact_id())
            .collect();
        if !failing.is_empty() {
            bail!(
                "{} artifact(s) scored below {:.2}: {}",
                failing.len(),
                threshold,
                failing.join(", ")
            );
        }
    }
    Ok(())
}

/// A JSON artifact object or an array of them; `-` reads stdin
pub(crate) fn load_artifacts(path: &Path) -> Result<Vec<ArtifactRef>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read artifacts from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let artifacts = if value.is_array() {
        serde_json::from_value::<Vec<ArtifactRef>>(value)
    } else {
        serde_json::from_value::<ArtifactRef>(value).map(|a| vec![a])
    }
    .with_context(|| format!("{} does not describe artifacts", path.display()))?;
    Ok(artifacts)
}

fn build_shared(options: &ScoreOptions, project: &ProjectConfig) -> Result<Shared> {
    let user = UserConfig::load()?;

    let text: Arc<dyn GenerativeText> = match user.ai_client() {
        Some(client) if !options.offline => {
            info!("Using {:?} ({}) for generative text", client.backend(), client.model());
            Arc::new(LlmText::new(client))
        }
        _ => {
            if !options.offline {
                warn!(
                    "No {} configured; README clarity and claims use neutral defaults",
                    user.ai_backend().env_key()
                );
            }
            Arc::new(NeutralText)
        }
    };

    let mut base = Collaborators::offline().with_text(text);
    if !options.offline {
        base = base.with_datasets(Arc::new(HuggingFaceHub::new(
            user.huggingface_token().map(str::to_string),
        )));
    } else {
        base = base.with_datasets(Arc::new(OfflineHub));
    }
    if let Some(path) = &options.registry {
        base = base.with_lineage(Arc::new(InMemoryRegistry::load(path)?));
    }

    let metric_timeout = options
        .metric_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| project.engine.metric_timeout());

    let mut repo_options = project.execution.repository_options();
    if options.no_exec {
        repo_options.execution_enabled = false;
    }
    let repo_options = repo_options.within_metric_budget(metric_timeout);
    let engine = ScoringEngine::builder()
        .weights(project.scoring.weight_table())
        .metric_timeout(metric_timeout)
        .lineage(project.engine.lineage_settings())
        .build();

    Ok(Shared {
        engine,
        base,
        repo_options,
        local_repo: options.repo.clone(),
        github_token: user.github_token().map(str::to_string),
        clone_timeout: project.engine.clone_timeout(),
    })
}

/// Repository inspector for one artifact; `None` when there is none or it
/// cannot be opened
async fn open_repository(
    artifact: &ArtifactRef,
    shared: &Shared,
) -> Option<Arc<dyn RepositoryInspector>> {
    let opened = if let Some(path) = &shared.local_repo {
        LocalRepository::open(path, shared.repo_options.clone())
    } else {
        let location = artifact.source_repository.as_deref()?;
        if is_remote_url(location) {
            LocalRepository::clone(
                location,
                shared.github_token.as_deref(),
                shared.repo_options.clone(),
                shared.clone_timeout,
            )
            .await
        } else {
            LocalRepository::open(Path::new(location), shared.repo_options.clone())
        }
    };

    match opened {
        Ok(repo) => Some(Arc::new(repo)),
        Err(e) => {
            warn!(
                "Repository for {} unavailable, repository metrics will fall back: {:#}",
                artifact.id, e
            );
            None
        }
    }
}

async fn score_one(
    artifact: ArtifactRef,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) -> Result<Scorecard, ScoringError> {
    let artifact = artifact.normalized();
    let repository = tokio::select! {
        _ = cancel.cancelled() => return Err(ScoringError::Cancelled(artifact.id.clone())),
        repo = open_repository(&artifact, &shared) => repo,
    };
    let mut collaborators = shared.base.clone();
    collaborators.repository = repository;
    shared
        .engine
        .score_with(&artifact, &collaborators, &cancel, None)
        .await
}

async fn score_all(
    artifacts: Vec<ArtifactRef>,
    options: &ScoreOptions,
    project: &ProjectConfig,
) -> Result<Vec<Scorecard>> {
    let shared = Arc::new(build_shared(options, project)?);
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling in-flight scoring");
                cancel.cancel();
            }
        });
    }

    let permits = Arc::new(Semaphore::new(options.jobs.max(1)));
    let mut tasks = JoinSet::new();
    for (index, artifact) in artifacts.into_iter().enumerate() {
        let shared = Arc::clone(&shared);
        let cancel = cancel.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (index, score_one(artifact, shared, cancel).await)
        });
    }

    let mut cards = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.context("Scoring task failed")?;
        cards.push((index, result?));
    }
    // Input order
    cards.sort_by_key(|(index, _)| *index);
    Ok(cards.into_iter().map(|(_, card)| card).collect())
}
