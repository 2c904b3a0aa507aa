//! Git history extraction using libgit2
//!
//! Walks commit history for contributor concentration (bus factor) and the
//! first-parent chain used for pull-request review coverage.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Repository, Sort};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// One commit on the first-parent chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// First line of the message
    pub subject: String,
    /// > 1 for merge commits
    pub parent_count: usize,
    /// Lines added relative to the first parent
    pub insertions: usize,
}

impl CommitInfo {
    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }
}

/// Git history analyzer using libgit2.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open the repository containing `path` (any subdirectory works)
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("No git repository at {}", path.display()))?;
        debug!("Opened git repository at {}", repo.path().display());
        Ok(Self { repo })
    }

    /// URL of the `origin` remote, if configured
    pub fn origin_url(&self) -> Option<String> {
        self.repo
            .find_remote("origin")
            .ok()
            .and_then(|r| r.url().map(str::to_string))
    }

    /// Commit count per author since `since` (all history when `None`).
    ///
    /// Returns `(total_commits, author -> count)`. Commits without an author
    /// name count toward the total but not toward any contributor.
    pub fn author_commit_counts(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<(usize, BTreeMap<String, usize>)> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        if self.push_head(&mut revwalk)?.is_none() {
            return Ok((0, BTreeMap::new()));
        }

        let mut total = 0;
        let mut contributors: BTreeMap<String, usize> = BTreeMap::new();

        for oid_result in revwalk {
            let commit = self.repo.find_commit(oid_result?)?;

            if let Some(since_ts) = since {
                let commit_dt = Utc.timestamp_opt(commit.time().seconds(), 0).single();
                if commit_dt.is_some_and(|dt| dt < since_ts) {
                    break; // Commits are sorted by time, so we can stop
                }
            }

            total += 1;
            let author = commit.author();
            if let Some(name) = author.name().filter(|n| !n.trim().is_empty()) {
                *contributors.entry(name.to_string()).or_default() += 1;
            }
        }

        Ok((total, contributors))
    }

    /// Commits on the first-parent chain of HEAD, newest first.
    ///
    /// Line counts are taken against the first parent, so a merge commit
    /// carries the full change set of the branch it merged.
    pub fn first_parent_commits(&self, max_commits: usize) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL)?;
        revwalk.simplify_first_parent()?;
        if self.push_head(&mut revwalk)?.is_none() {
            return Ok(Vec::new());
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            if commits.len() >= max_commits {
                break;
            }
            let commit = self.repo.find_commit(oid_result?)?;
            commits.push(self.extract_commit_info(&commit)?);
        }

        Ok(commits)
    }

    /// Push HEAD onto the walk; `None` for a repository without commits.
    fn push_head(&self, revwalk: &mut git2::Revwalk) -> Result<Option<()>> {
        if self.repo.is_empty()? {
            return Ok(None);
        }
        match self.repo.head() {
            Ok(_) => {}
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        match revwalk.push_head() {
            Ok(()) => Ok(Some(())),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn extract_commit_info(&self, commit: &git2::Commit) -> Result<CommitInfo> {
        let subject = commit
            .summary()
            .map(str::to_string)
            .unwrap_or_default();

        // Diff against the first parent; the root commit diffs against nothing
        let base = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let stats = self
            .repo
            .diff_tree_to_tree(base.as_ref(), Some(&commit.tree()?), None)?
            .stats()?;

        Ok(CommitInfo {
            subject,
            parent_count: commit.parent_count(),
            insertions: stats.insertions(),
        })
    }
}
