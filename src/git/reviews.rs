//! Pull-request review coverage from merge history
//!
//! GitHub leaves two recognisable traces on the default branch: merge
//! commits titled `Merge pull request #N from ...` and squash merges whose
//! subject ends with `(#N)`. Lines landed through either count as reviewed.

use super::history::CommitInfo;
use crate::collaborators::PullRequestSummary;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

static MERGE_SUBJECT: OnceLock<Regex> = OnceLock::new();
static SQUASH_SUBJECT: OnceLock<Regex> = OnceLock::new();

fn merge_subject() -> &'static Regex {
    MERGE_SUBJECT
        .get_or_init(|| Regex::new(r"^Merge pull request #(\d+)\b").expect("valid regex"))
}

fn squash_subject() -> &'static Regex {
    SQUASH_SUBJECT.get_or_init(|| Regex::new(r"\(#(\d+)\)\s*$").expect("valid regex"))
}

/// Pull-request number a first-parent commit landed, if any
pub fn pull_request_number(commit: &CommitInfo) -> Option<u64> {
    let subject = commit.subject.trim();
    let caps = if commit.is_merge() {
        merge_subject().captures(subject)
    } else {
        squash_subject().captures(subject)
    }?;
    caps[1].parse().ok()
}

/// Fold first-parent commits into review coverage
pub fn summarize_reviews(commits: &[CommitInfo]) -> PullRequestSummary {
    let mut numbers = BTreeSet::new();
    let mut summary = PullRequestSummary::default();

    for commit in commits {
        let added = commit.insertions as u64;
        summary.total_code_lines += added;
        if let Some(number) = pull_request_number(commit) {
            numbers.insert(number);
            summary.reviewed_code_lines += added;
        }
    }

    summary.pull_requests = numbers.len();
    summary
}
