//! External collaborators consumed by the analyzers
//!
//! The scoring core never owns these systems; it only calls them through the
//! traits below. Each trait has a concrete implementation in this module tree:
//!
//! - [`RepositoryInspector`]: [`LocalRepository`] (git2 + filesystem + subprocesses)
//! - [`GenerativeText`]: [`crate::ai::LlmText`] (LLM chat completions)
//! - [`LineageSource`]: [`InMemoryRegistry`] (optionally loaded from JSON)
//! - [`DatasetHub`]: [`HuggingFaceHub`] (Hugging Face dataset API)
//!
//! [`Collaborators`] bundles read-only handles to all of them for one
//! scoring request.

mod exec;
mod hub;
mod local_repo;
mod registry;

pub use exec::{interpreter_for, run_process, run_process_with_env, ProcessOutput};
pub use hub::{
    extract_hf_repo_id, is_code_repository, is_dataset_url, is_hf_dataset_url, HuggingFaceHub,
};
pub use local_repo::{LocalRepository, RepositoryOptions};
pub use registry::{InMemoryRegistry, RegistryEntry};

use crate::ai::AiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by collaborator calls. Analyzers convert these into
/// fallback values; they never reach the caller of the engine.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("{what} timed out after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CollabResult<T> = Result<T, CollaboratorError>;

/// Commit counts per author over the analysis window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitStats {
    pub total_commits: usize,
    /// author -> commit count
    pub contributors: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeQualityStats {
    pub has_tests: bool,
    /// Lint error count, `None` when no linter could be run
    pub lint_errors: Option<usize>,
    pub python_files: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RampUpSignals {
    pub has_examples: bool,
    pub has_dependencies: bool,
}

/// Pull-request review coverage of a repository's history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub pull_requests: usize,
    pub total_code_lines: u64,
    pub reviewed_code_lines: u64,
}

/// Outcome of executing one demo file or snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub target: String,
    pub runs: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ExecutionOutcome {
    pub fn ok(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            runs: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(target: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            runs: false,
            errors: vec![error.into()],
        }
    }
}

/// A code snippet pulled out of free text (model card, README)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCode {
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "python".to_string()
}

/// Structured summary of the performance claims in a README
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceClaims {
    #[serde(default)]
    pub mentions_benchmarks: f64,
    #[serde(default)]
    pub has_metrics: f64,
    #[serde(default)]
    pub claims: Vec<String>,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub downloads: u64,
}

/// Read-only view of the artifact's linked source repository
#[async_trait]
pub trait RepositoryInspector: Send + Sync {
    /// URL or path the repository was opened from (for logging)
    fn location(&self) -> &str;

    /// Whether the repository is hosted on GitHub (pull-request history exists)
    async fn has_github_repository(&self) -> bool;

    /// Demo / example / tutorial programs, as repository-relative paths
    async fn find_demo_files(&self) -> CollabResult<Vec<String>>;

    /// Execute each file and report whether it ran cleanly
    async fn test_code_execution(&self, files: &[String]) -> CollabResult<Vec<ExecutionOutcome>>;

    /// Execute a snippet extracted from documentation
    async fn test_extracted_code(&self, code: &ExtractedCode) -> CollabResult<ExecutionOutcome>;

    /// README / model card text
    async fn read_model_card(&self) -> CollabResult<Option<String>>;

    /// Leading text of a `LICENSE*` file
    async fn read_license_file(&self) -> CollabResult<Option<String>>;

    async fn analyze_pull_requests(&self) -> CollabResult<PullRequestSummary>;

    async fn commit_stats(&self) -> CollabResult<CommitStats>;

    async fn code_quality_stats(&self) -> CollabResult<CodeQualityStats>;

    async fn ramp_up_signals(&self) -> CollabResult<RampUpSignals>;

    async fn repository_size_bytes(&self) -> CollabResult<u64>;
}

/// Generative-text service. Every method returns a neutral default on
/// malformed or missing responses instead of failing.
#[async_trait]
pub trait GenerativeText: Send + Sync {
    async fn extract_code_from_text(&self, text: &str) -> Vec<ExtractedCode>;

    async fn get_performance_claims(&self, readme_text: &str) -> PerformanceClaims;

    /// Clarity of a README in [0, 1]; `0.5` when unknown
    async fn get_readme_clarity(&self, readme_text: &str) -> f64;
}

/// Lineage store / model registry
#[async_trait]
pub trait LineageSource: Send + Sync {
    async fn get_parent_models(&self, artifact_id: &str) -> CollabResult<Vec<String>>;

    /// Parent identifiers named by a structured configuration
    fn extract_lineage_from_config(&self, config: &serde_json::Value) -> Vec<String> {
        crate::lineage::extract_lineage_from_config(config)
    }

    /// Previously computed net score, `None` when the registry has none
    async fn get_model_score(&self, artifact_id: &str) -> CollabResult<Option<f64>>;
}

#[async_trait]
pub trait DatasetHub: Send + Sync {
    async fn dataset_stats(&self, repo_id: &str) -> CollabResult<DatasetStats>;
}

/// Generative-text stand-in used when no LLM is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralText;

pub(crate) const DEFAULT_CLARITY: f64 = 0.5;

#[async_trait]
impl GenerativeText for NeutralText {
    async fn extract_code_from_text(&self, _text: &str) -> Vec<ExtractedCode> {
        Vec::new()
    }

    async fn get_performance_claims(&self, _readme_text: &str) -> PerformanceClaims {
        PerformanceClaims::default()
    }

    async fn get_readme_clarity(&self, _readme_text: &str) -> f64 {
        DEFAULT_CLARITY
    }
}

/// Dataset hub stand-in that is never reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineHub;

#[async_trait]
impl DatasetHub for OfflineHub {
    async fn dataset_stats(&self, repo_id: &str) -> CollabResult<DatasetStats> {
        Err(CollaboratorError::Unavailable(format!(
            "dataset hub offline, cannot look up {repo_id}"
        )))
    }
}

/// Read-only collaborator handles for one scoring request
#[derive(Clone)]
pub struct Collaborators {
    /// `None` when the artifact has no linked repository (or it could not be opened)
    pub repository: Option<Arc<dyn RepositoryInspector>>,
    pub text: Arc<dyn GenerativeText>,
    pub lineage: Arc<dyn LineageSource>,
    pub datasets: Arc<dyn DatasetHub>,
}

impl Collaborators {
    /// No repository, neutral text, empty registry, offline hub
    pub fn offline() -> Self {
        Self {
            repository: None,
            text: Arc::new(NeutralText),
            lineage: Arc::new(InMemoryRegistry::default()),
            datasets: Arc::new(OfflineHub),
        }
    }

    pub fn with_repository(mut self, repository: Arc<dyn RepositoryInspector>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_text(mut self, text: Arc<dyn GenerativeText>) -> Self {
        self.text = text;
        self
    }

    pub fn with_lineage(mut self, lineage: Arc<dyn LineageSource>) -> Self {
        self.lineage = lineage;
        self
    }

    pub fn with_datasets(mut self, datasets: Arc<dyn DatasetHub>) -> Self {
        self.datasets = datasets;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field(
                "repository",
                &self.repository.as_ref().map(|r| r.location().to_string()),
            )
            .finish_non_exhaustive()
    }
}
