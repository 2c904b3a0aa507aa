//! Repository inspector over a local checkout
//!
//! Filesystem scans use `ignore::WalkBuilder` and run on the blocking pool;
//! demo programs and linters run as subprocesses with a timeout.

use super::exec::{interpreter_for, run_process};
use super::{
    CodeQualityStats, CollabResult, CollaboratorError, CommitStats, ExecutionOutcome,
    ExtractedCode, PullRequestSummary, RampUpSignals, RepositoryInspector,
};
use crate::git::{clone_repository, summarize_reviews, ClonedRepository, GitHistory};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use ignore::WalkBuilder;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Commits further back than this are outside the bus-factor window
const COMMIT_WINDOW_DAYS: i64 = 365;
/// First-parent commits inspected for review coverage
const MAX_REVIEW_COMMITS: usize = 5_000;
const LICENSE_HEAD_LINES: usize = 40;

const DEMO_PREFIXES: &[&str] = &["demo", "example", "tutorial", "quickstart", "usage"];
const DEMO_DIRS: &[&str] = &["examples", "example", "demo", "demos"];
const EXAMPLE_MARKERS: &[&str] = &["examples", "notebooks", "demo.py", "example.py"];
const DEPENDENCY_MANIFESTS: &[&str] =
    &["requirements.txt", "pyproject.toml", "setup.py", "Pipfile"];
const TEST_PREFIXES: &[&str] = &["test", "spec"];

/// Execution and scan limits for a [`LocalRepository`]
#[derive(Debug, Clone)]
pub struct RepositoryOptions {
    pub execution_enabled: bool,
    pub execution_timeout: Duration,
    pub max_demo_files: usize,
    pub python: String,
    pub lint_timeout: Duration,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            execution_enabled: true,
            execution_timeout: Duration::from_secs(20),
            max_demo_files: 10,
            python: "python3".to_string(),
            lint_timeout: Duration::from_secs(120),
        }
    }
}

impl RepositoryOptions {
    /// Cap the per-program execution timeout at `metric_timeout`
    pub fn within_metric_budget(mut self, metric_timeout: Duration) -> Self {
        if self.execution_enabled && self.execution_timeout > metric_timeout {
            warn!(
                "execution timeout {:?} exceeds the metric timeout {:?}; using {:?}",
                self.execution_timeout, metric_timeout, metric_timeout
            );
            self.execution_timeout = metric_timeout;
        }
        self
    }
}

#[derive(Debug)]
pub struct LocalRepository {
    root: PathBuf,
    location: String,
    options: RepositoryOptions,
    // Keeps a scratch clone alive for as long as the inspector is in use
    _clone: Option<Arc<ClonedRepository>>,
}

impl LocalRepository {
    /// Inspect an existing checkout
    pub fn open(path: &Path, options: RepositoryOptions) -> Result<Self> {
        if !path.is_dir() {
            bail!("Repository path {} is not a directory", path.display());
        }
        Ok(Self {
            root: path.to_path_buf(),
            location: path.display().to_string(),
            options,
            _clone: None,
        })
    }

    /// Clone `url` into a temporary directory and inspect the clone
    pub async fn clone(
        url: &str,
        token: Option<&str>,
        options: RepositoryOptions,
        timeout: Duration,
    ) -> Result<Self> {
        let cloned = clone_repository(url, token, timeout).await?;
        Ok(Self {
            root: cloned.path().to_path_buf(),
            location: cloned.url().to_string(),
            options,
            _clone: Some(Arc::new(cloned)),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn blocking<T, F>(&self, f: F) -> CollabResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> CollabResult<T> + Send + 'static,
    {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || f(&root)).await?
    }

    async fn execute(&self, path: &Path, label: &str) -> ExecutionOutcome {
        execute_file(
            &self.root,
            &self.options.python,
            self.options.execution_timeout,
            path,
            label,
        )
        .await
    }

    async fn count_lint_errors(&self) -> Option<usize> {
        let ruff = vec![
            "ruff".to_string(),
            "check".to_string(),
            "--exit-zero".to_string(),
            "--output-format".to_string(),
            "json".to_string(),
            ".".to_string(),
        ];
        let output = run_process(&ruff, "ruff", self.options.lint_timeout, Some(&self.root)).await;
        if output.completed {
            if let Some(count) = serde_json::from_str::<serde_json::Value>(&output.stdout)
                .ok()
                .and_then(|v| v.as_array().map(Vec::len))
            {
                return Some(count);
            }
        }

        let flake8 = vec![
            "flake8".to_string(),
            "--count".to_string(),
            "--quiet".to_string(),
            ".".to_string(),
        ];
        let output =
            run_process(&flake8, "flake8", self.options.lint_timeout, Some(&self.root)).await;
        if !output.completed {
            debug!("No Python linter available for {}", self.location);
            return None;
        }
        parse_trailing_count(&output.stdout).or_else(|| parse_trailing_count(&output.stderr))
    }
}

/// Run one program from `root` with the interpreter its extension implies
async fn execute_file(
    root: &Path,
    python: &str,
    timeout: Duration,
    path: &Path,
    label: &str,
) -> ExecutionOutcome {
    let Some(mut cmd) = interpreter_for(path, python) else {
        return ExecutionOutcome::failed(label, "no interpreter for file type");
    };
    cmd.push(path.to_string_lossy().to_string());

    let output = run_process(&cmd, label, timeout, Some(root)).await;
    if output.succeeded() {
        debug!("{} ran cleanly", label);
        ExecutionOutcome::ok(label)
    } else {
        debug!("{} failed: {}", label, output.failure_reason());
        ExecutionOutcome::failed(label, output.failure_reason())
    }
}

/// Last non-empty line parsed as an integer (flake8 `--count`)
fn parse_trailing_count(text: &str) -> Option<usize> {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| l.trim().parse().ok())
}

/// Files under `root`, repository-relative, respecting .gitignore
fn walk_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

fn components_lowercase(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect()
}

pub(crate) fn is_demo_file(rel: &Path) -> bool {
    let parts = components_lowercase(rel);
    let Some((name, dirs)) = parts.split_last() else {
        return false;
    };
    DEMO_PREFIXES.iter().any(|p| name.starts_with(p))
        || dirs.iter().any(|d| DEMO_DIRS.contains(&d.as_str()))
}

pub(crate) fn is_test_path(rel: &Path) -> bool {
    components_lowercase(rel)
        .iter()
        .any(|part| TEST_PREFIXES.iter().any(|p| part.starts_with(p)))
}

fn has_example_marker(rel: &Path) -> bool {
    components_lowercase(rel)
        .iter()
        .any(|part| EXAMPLE_MARKERS.iter().any(|m| part.starts_with(m)))
}

/// Root-level file whose lowercase name starts with one of `prefixes`,
/// preferring Markdown
fn find_root_file(root: &Path, prefixes: &[&str]) -> std::io::Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(root)?
        .flatten()
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .is_some_and(|n| prefixes.iter().any(|pre| n.starts_with(pre)))
        })
        .collect();
    candidates.sort_by_key(|p| {
        let is_md = p
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        (!is_md, p.clone())
    });
    Ok(candidates.into_iter().next())
}

fn snippet_extension(language: &str) -> Option<&'static str> {
    match language.trim().to_ascii_lowercase().as_str() {
        "" | "python" | "py" | "python3" => Some("py"),
        "bash" | "sh" | "shell" => Some("sh"),
        "javascript" | "js" | "node" => Some("js"),
        _ => None,
    }
}

#[async_trait]
impl RepositoryInspector for LocalRepository {
    fn location(&self) -> &str {
        &self.location
    }

    async fn has_github_repository(&self) -> bool {
        if self.location.to_lowercase().contains("github.com") {
            return true;
        }
        self.blocking(|root| {
            Ok(GitHistory::open(root)
                .ok()
                .and_then(|h| h.origin_url())
                .is_some_and(|url| url.to_lowercase().contains("github.com")))
        })
        .await
        .unwrap_or(false)
    }

    async fn find_demo_files(&self) -> CollabResult<Vec<String>> {
        let limit = self.options.max_demo_files;
        let python = self.options.python.clone();
        self.blocking(move |root| {
            let demos: Vec<String> = walk_files(root)
                .into_iter()
                .filter(|rel| is_demo_file(rel) && interpreter_for(rel, &python).is_some())
                .take(limit)
                .map(|rel| rel.to_string_lossy().to_string())
                .collect();
            Ok(demos)
        })
        .await
    }

    async fn test_code_execution(&self, files: &[String]) -> CollabResult<Vec<ExecutionOutcome>> {
        if !self.options.execution_enabled {
            return Err(CollaboratorError::Unavailable(
                "code execution is disabled".to_string(),
            ));
        }
        // Demos run side by side; the batch is bounded by one execution
        // timeout. Dropping the set kills any child still running.
        let mut tasks = JoinSet::new();
        for (idx, file) in files.iter().enumerate() {
            let root = self.root.clone();
            let python = self.options.python.clone();
            let timeout = self.options.execution_timeout;
            let file = file.clone();
            tasks.spawn(async move {
                let path = root.join(&file);
                let outcome = execute_file(&root, &python, timeout, &path, &file).await;
                (idx, outcome)
            });
        }

        let mut outcomes: Vec<(usize, ExecutionOutcome)> = Vec::with_capacity(files.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined?);
        }
        outcomes.sort_by_key(|(idx, _)| *idx);
        Ok(outcomes.into_iter().map(|(_, o)| o).collect())
    }

    async fn test_extracted_code(&self, code: &ExtractedCode) -> CollabResult<ExecutionOutcome> {
        if !self.options.execution_enabled {
            return Err(CollaboratorError::Unavailable(
                "code execution is disabled".to_string(),
            ));
        }
        let Some(ext) = snippet_extension(&code.language) else {
            return Ok(ExecutionOutcome::failed(
                "extracted snippet",
                format!("unsupported language {}", code.language),
            ));
        };

        let scratch = tempfile::Builder::new()
            .prefix("trustcard-snippet-")
            .tempdir()?;
        let path = scratch.path().join(format!("snippet.{ext}"));
        tokio::fs::write(&path, &code.code).await?;

        Ok(self.execute(&path, "extracted snippet").await)
    }

    async fn read_model_card(&self) -> CollabResult<Option<String>> {
        self.blocking(|root| {
            let Some(path) = find_root_file(root, &["readme"])? else {
                return Ok(None);
            };
            let bytes = std::fs::read(&path)?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        })
        .await
    }

    async fn read_license_file(&self) -> CollabResult<Option<String>> {
        self.blocking(|root| {
            let Some(path) = find_root_file(root, &["license", "licence", "copying"])? else {
                return Ok(None);
            };
            let reader = BufReader::new(std::fs::File::open(&path)?);
            let head: Vec<String> = reader
                .lines()
                .map_while(|l| l.ok())
                .take(LICENSE_HEAD_LINES)
                .collect();
            Ok(Some(head.join("\n")))
        })
        .await
    }

    async fn analyze_pull_requests(&self) -> CollabResult<PullRequestSummary> {
        self.blocking(|root| {
            let history = GitHistory::open(root)?;
            let commits = history.first_parent_commits(MAX_REVIEW_COMMITS)?;
            Ok(summarize_reviews(&commits))
        })
        .await
    }

    async fn commit_stats(&self) -> CollabResult<CommitStats> {
        self.blocking(|root| {
            let history = GitHistory::open(root)?;
            let since = Utc::now() - ChronoDuration::days(COMMIT_WINDOW_DAYS);
            let (total_commits, contributors) = history.author_commit_counts(Some(since))?;
            Ok(CommitStats {
                total_commits,
                contributors,
            })
        })
        .await
    }

    async fn code_quality_stats(&self) -> CollabResult<CodeQualityStats> {
        let (has_tests, python_files) = self
            .blocking(|root| {
                let files = walk_files(root);
                let has_tests = files.iter().any(|f| is_test_path(f));
                let python_files = files
                    .iter()
                    .filter(|f| f.extension().is_some_and(|e| e == "py"))
                    .count();
                Ok((has_tests, python_files))
            })
            .await?;

        let lint_errors = if python_files > 0 {
            self.count_lint_errors().await
        } else {
            Some(0)
        };
        if lint_errors.is_none() {
            warn!(
                "Neither ruff nor flake8 found; lint errors for {} counted as 0",
                self.location
            );
        }

        Ok(CodeQualityStats {
            has_tests,
            lint_errors,
            python_files,
        })
    }

    async fn ramp_up_signals(&self) -> CollabResult<RampUpSignals> {
        self.blocking(|root| {
            let has_examples = walk_files(root).iter().any(|f| has_example_marker(f));
            let has_dependencies = DEPENDENCY_MANIFESTS.iter().any(|m| root.join(m).exists());
            Ok(RampUpSignals {
                has_examples,
                has_dependencies,
            })
        })
        .await
    }

    async fn repository_size_bytes(&self) -> CollabResult<u64> {
        self.blocking(|root| {
            let total = WalkBuilder::new(root)
                .standard_filters(false)
                .build()
                .flatten()
                .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
                .filter_map(|e| e.metadata().ok())
                .map(|m| m.len())
                .sum();
            Ok(total)
        })
        .await
    }
}
