//! Cloning remote repositories into scratch directories
//!
//! libgit2 is built without its network transports, so clones go through
//! the `git` binary. The checkout lives in a [`tempfile::TempDir`] and is
//! removed when the [`ClonedRepository`] is dropped.

use crate::collaborators::run_process_with_env;
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;
use tracing::info;

static WEB_SUFFIXES: OnceLock<Vec<Regex>> = OnceLock::new();

fn web_suffixes() -> &'static [Regex] {
    WEB_SUFFIXES.get_or_init(|| {
        [
            r"/tree/[^/]+/?$",
            r"/blob/[^/]+/.*$",
            r"/commits?/[^/]+/?$",
            r"/releases?/?.*$",
            r"/issues?/?.*$",
            r"/pull/?.*$",
            r"/wiki/?.*$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

/// Strip web-interface paths (`/tree/main`, `/blob/...`, `/issues`, ...) so
/// the URL can be handed to `git clone`
pub fn normalize_git_url(url: &str) -> String {
    let mut normalized = url.trim().trim_end_matches('/').to_string();
    for pattern in web_suffixes() {
        normalized = pattern.replace(&normalized, "").into_owned();
    }
    normalized
}

/// Whether `location` names a remote repository rather than a local path
pub fn is_remote_url(location: &str) -> bool {
    let location = location.trim();
    ["http://", "https://", "ssh://", "git://", "git@"]
        .iter()
        .any(|scheme| location.starts_with(scheme))
}

/// A clone that is deleted on drop
#[derive(Debug)]
pub struct ClonedRepository {
    dir: TempDir,
    url: String,
}

impl ClonedRepository {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// `git -c`-equivalent settings, passed through `GIT_CONFIG_*` variables
/// so they stay out of the child's arguments and the clone's `.git/config`
fn git_config_env(settings: &[(&str, String)]) -> Vec<(String, String)> {
    let mut env = vec![("GIT_CONFIG_COUNT".to_string(), settings.len().to_string())];
    for (i, (key, value)) in settings.iter().enumerate() {
        env.push((format!("GIT_CONFIG_KEY_{i}"), key.to_string()));
        env.push((format!("GIT_CONFIG_VALUE_{i}"), value.clone()));
    }
    env
}

/// HTTP basic authorization header for a GitHub token
fn github_auth_header(token: &str) -> String {
    let credentials = STANDARD.encode(format!("x-access-token:{token}"));
    format!("Authorization: Basic {credentials}")
}

/// Environment for `git clone`; the token applies to github.com HTTPS only
fn clone_env(url: &str, token: Option<&str>) -> Vec<(String, String)> {
    let mut env = vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())];
    if let Some(token) = token.filter(|_| url.starts_with("https://github.com/")) {
        env.extend(git_config_env(&[(
            "http.https://github.com/.extraHeader",
            github_auth_header(token),
        )]));
    }
    env
}

/// Clone `url` into a fresh temporary directory.
///
/// Full history is fetched; bus factor and review coverage walk it. A
/// GitHub token, when given, is sent as an HTTP header for github.com only.
pub async fn clone_repository(
    url: &str,
    token: Option<&str>,
    timeout: Duration,
) -> Result<ClonedRepository> {
    let normalized = normalize_git_url(url);
    let dir = tempfile::Builder::new()
        .prefix("trustcard-")
        .tempdir()
        .context("Failed to create clone directory")?;

    info!("Cloning repository: {}", normalized);
    let cmd = vec![
        "git".to_string(),
        "clone".to_string(),
        "--quiet".to_string(),
        "--no-tags".to_string(),
        normalized.clone(),
        dir.path().to_string_lossy().to_string(),
    ];
    let env = clone_env(&normalized, token);
    let output = run_process_with_env(&cmd, "git clone", timeout, None, &env).await;
    if !output.succeeded() {
        bail!("Failed to clone {}: {}", normalized, output.failure_reason());
    }

    Ok(ClonedRepository {
        dir,
        url: normalized,
    })
}
