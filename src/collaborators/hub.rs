//! Hugging Face dataset hub client and URL classification
//!
//! Sync HTTP via ureq, moved off the async runtime with `spawn_blocking`.

use super::{CollabResult, CollaboratorError, DatasetHub, DatasetStats};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

static DATASET_ID: OnceLock<Regex> = OnceLock::new();
static REPO_ID: OnceLock<Regex> = OnceLock::new();

fn dataset_id_pattern() -> &'static Regex {
    DATASET_ID.get_or_init(|| {
        Regex::new(r"huggingface\.co/datasets/([^/?#]+(?:/[^/?#]+)?)").expect("valid regex")
    })
}

fn repo_id_pattern() -> &'static Regex {
    REPO_ID.get_or_init(|| {
        Regex::new(r"huggingface\.co/([^/?#]+(?:/[^/?#]+)?)").expect("valid regex")
    })
}

/// `org/name` (or bare `name`) from a Hugging Face dataset or model URL.
/// Spaces are not repositories of this kind and yield `None`.
pub fn extract_hf_repo_id(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    if let Some(caps) = dataset_id_pattern().captures(url) {
        return Some(caps[1].to_string());
    }
    let caps = repo_id_pattern().captures(url)?;
    let id = &caps[1];
    if id == "spaces" || id.starts_with("spaces/") || id == "datasets" {
        return None;
    }
    Some(id.to_string())
}

fn host_and_path(url: &str) -> (String, String) {
    let lower = url.trim().to_ascii_lowercase();
    let rest = lower
        .split_once("://")
        .map(|(_, rest)| rest.to_string())
        .unwrap_or(lower);
    match rest.split_once('/') {
        Some((host, path)) => (host.to_string(), format!("/{path}")),
        None => (rest, String::new()),
    }
}

/// GitHub, GitLab, or a Hugging Face Space
pub fn is_code_repository(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    let (host, path) = host_and_path(url);
    host.contains("github.com")
        || host.contains("gitlab.com")
        || (host.contains("huggingface.co") && path.contains("/spaces/"))
}

pub fn is_dataset_url(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    let (host, path) = host_and_path(url);
    host.contains("image-net.org")
        || host.contains("kaggle.com")
        || host.contains("archive.ics.uci.edu")
        || path.contains("/datasets/")
}

/// Hosted on the Hugging Face hub as a dataset
pub fn is_hf_dataset_url(url: &str) -> bool {
    let (host, path) = host_and_path(url);
    host.contains("huggingface.co") && path.starts_with("/datasets/")
}

/// Dataset statistics from the Hugging Face hub API
#[derive(Clone)]
pub struct HuggingFaceHub {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl HuggingFaceHub {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_HUB_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            agent: make_agent(Duration::from_secs(15)),
        }
    }

    fn fetch(&self, repo_id: &str) -> CollabResult<DatasetStats> {
        let url = format!("{}/api/datasets/{}", self.base_url, repo_id);
        debug!("GET {}", url);

        let mut req = self.agent.get(&url);
        if let Some(token) = &self.token {
            req = req.header("Authorization", &format!("Bearer {}", token));
        }

        let response = req
            .call()
            .map_err(|e| CollaboratorError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(CollaboratorError::Http(format!(
                "{} returned status {}",
                url, status
            )));
        }

        response
            .into_body()
            .read_json::<DatasetStats>()
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))
    }
}

impl std::fmt::Debug for HuggingFaceHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceHub")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl DatasetHub for HuggingFaceHub {
    async fn dataset_stats(&self, repo_id: &str) -> CollabResult<DatasetStats> {
        let hub = self.clone();
        let repo_id = repo_id.to_string();
        tokio::task::spawn_blocking(move || hub.fetch(&repo_id)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_repo_ids() {
        assert_eq!(
            extract_hf_repo_id("https://huggingface.co/datasets/allenai/c4").as_deref(),
            Some("allenai/c4")
        );
        assert_eq!(
            extract_hf_repo_id("https://huggingface.co/datasets/squad/").as_deref(),
            Some("squad")
        );
        assert_eq!(
            extract_hf_repo_id("https://huggingface.co/ibm-granite/granite-docling-258M/tree/main")
                .as_deref(),
            Some("ibm-granite/granite-docling-258M")
        );
        assert_eq!(
            extract_hf_repo_id("https://huggingface.co/spaces/org/demo"),
            None
        );
        assert_eq!(extract_hf_repo_id("https://github.com/org/repo"), None);
    }

    #[test]
    fn test_url_classification() {
        assert!(is_code_repository("https://github.com/huggingface/transformers"));
        assert!(is_code_repository("https://GitLab.com/group/project"));
        assert!(is_code_repository("https://huggingface.co/spaces/org/app"));
        assert!(!is_code_repository("https://huggingface.co/bert-base-uncased"));
        assert!(!is_code_repository(""));

        assert!(is_dataset_url("https://huggingface.co/datasets/squad"));
        assert!(is_dataset_url("https://www.kaggle.com/c/titanic"));
        assert!(!is_dataset_url("https://github.com/org/repo"));

        assert!(is_hf_dataset_url("https://huggingface.co/datasets/squad"));
        assert!(!is_hf_dataset_url("https://www.kaggle.com/datasets/x/y"));
    }

    #[test]
    fn test_hub_base_url_trimmed() {
        let hub = HuggingFaceHub::with_base_url("http://localhost:9/", None);
        assert_eq!(hub.base_url, "http://localhost:9");
    }
}
