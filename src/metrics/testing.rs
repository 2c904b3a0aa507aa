//! Scripted collaborators for analyzer tests

use crate::collaborators::{
    CodeQualityStats, CollabResult, CollaboratorError, CommitStats, DatasetHub, DatasetStats,
    ExecutionOutcome, ExtractedCode, GenerativeText, PerformanceClaims, PullRequestSummary,
    RampUpSignals, RepositoryInspector,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeRepository {
    pub github: bool,
    pub demos: Vec<String>,
    pub runnable: HashSet<String>,
    pub snippet_runs: bool,
    pub readme: Option<String>,
    pub license_file: Option<String>,
    pub pulls: PullRequestSummary,
    pub commits: CommitStats,
    pub quality: CodeQualityStats,
    pub ramp: RampUpSignals,
    pub size_bytes: u64,
    /// Delay before the size answer
    pub size_delay: Option<Duration>,
    /// Cloned for as long as a size query is in flight
    pub size_in_flight: Arc<()>,
    /// Every fallible call errors
    pub failing: bool,
}

impl FakeRepository {
    pub fn with_readme(mut self, text: &str) -> Self {
        self.readme = Some(text.to_string());
        self
    }

    pub fn with_demos(mut self, demos: &[&str], runnable: &[&str]) -> Self {
        self.demos = demos.iter().map(|d| d.to_string()).collect();
        self.runnable = runnable.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn on_github(mut self, pulls: usize, total: u64, reviewed: u64) -> Self {
        self.github = true;
        self.pulls = PullRequestSummary {
            pull_requests: pulls,
            total_code_lines: total,
            reviewed_code_lines: reviewed,
        };
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    fn check(&self) -> CollabResult<()> {
        if self.failing {
            Err(CollaboratorError::Unavailable("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RepositoryInspector for FakeRepository {
    fn location(&self) -> &str {
        "fake://repo"
    }

    async fn has_github_repository(&self) -> bool {
        self.github
    }

    async fn find_demo_files(&self) -> CollabResult<Vec<String>> {
        self.check()?;
        Ok(self.demos.clone())
    }

    async fn test_code_execution(&self, files: &[String]) -> CollabResult<Vec<ExecutionOutcome>> {
        self.check()?;
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
        self.check()?;
        Ok(if self.snippet_runs {
            ExecutionOutcome::ok("snippet")
        } else {
            ExecutionOutcome::failed("snippet", "SyntaxError")
        })
    }

    async fn read_model_card(&self) -> CollabResult<Option<String>> {
        self.check()?;
        Ok(self.readme.clone())
    }

    async fn read_license_file(&self) -> CollabResult<Option<String>> {
        self.check()?;
        Ok(self.license_file.clone())
    }

    async fn analyze_pull_requests(&self) -> CollabResult<PullRequestSummary> {
        self.check()?;
        Ok(self.pulls)
    }

    async fn commit_stats(&self) -> CollabResult<CommitStats> {
        self.check()?;
        Ok(self.commits.clone())
    }

    async fn code_quality_stats(&self) -> CollabResult<CodeQualityStats> {
        self.check()?;
        Ok(self.quality.clone())
    }

    async fn ramp_up_signals(&self) -> CollabResult<RampUpSignals> {
        self.check()?;
        Ok(self.ramp)
    }

    async fn repository_size_bytes(&self) -> CollabResult<u64> {
        self.check()?;
        let _in_flight = Arc::clone(&self.size_in_flight);
        if let Some(delay) = self.size_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.size_bytes)
    }
}

#[derive(Debug, Clone)]
pub struct FakeText {
    pub code: Vec<ExtractedCode>,
    pub claims: PerformanceClaims,
    pub clarity: f64,
}

impl Default for FakeText {
    fn default() -> Self {
        Self {
            code: Vec::new(),
            claims: PerformanceClaims::default(),
            clarity: 0.5,
        }
    }
}

impl FakeText {
    pub fn with_snippet(mut self, code: &str) -> Self {
        self.code.push(ExtractedCode {
            code: code.to_string(),
            language: "python".to_string(),
        });
        self
    }
}

#[async_trait]
impl GenerativeText for FakeText {
    async fn extract_code_from_text(&self, _text: &str) -> Vec<ExtractedCode> {
        self.code.clone()
    }

    async fn get_performance_claims(&self, _readme_text: &str) -> PerformanceClaims {
        self.claims.clone()
    }

    async fn get_readme_clarity(&self, _readme_text: &str) -> f64 {
        self.clarity
    }
}

/// Hub answering with fixed stats, or failing when `stats` is `None`
#[derive(Debug, Clone, Default)]
pub struct FakeHub {
    pub stats: Option<DatasetStats>,
}

#[async_trait]
impl DatasetHub for FakeHub {
    async fn dataset_stats(&self, repo_id: &str) -> CollabResult<DatasetStats> {
        self.stats
            .ok_or_else(|| CollaboratorError::Http(format!("404 for {repo_id}")))
    }
}
