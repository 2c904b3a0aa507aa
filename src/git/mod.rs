//! Git history analysis module
//!
//! # Features
//!
//! - Count commits per author over a time window (bus factor)
//! - Walk the first-parent chain and recognise pull-request merges
//!   (reviewedness)
//! - Clone remote repositories into scratch directories
//!
//! # Example
//!
//! ```no_run
//! use trustcard::git::{summarize_reviews, GitHistory};
//! use std::path::Path;
//!
//! let history = GitHistory::open(Path::new("/path/to/repo")).unwrap();
//! let commits = history.first_parent_commits(5_000).unwrap();
//! let reviews = summarize_reviews(&commits);
//! println!("{} PRs", reviews.pull_requests);
//! ```

pub mod clone;
pub mod history;
pub mod reviews;

pub use clone::{clone_repository, is_remote_url, normalize_git_url, ClonedRepository};
pub use history::{CommitInfo, GitHistory};
pub use reviews::{pull_request_number, summarize_reviews};
