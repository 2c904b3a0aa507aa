//! Lineage resolution
//!
//! Parents of an artifact come from three places, unioned in this order:
//!
//! 1. the lineage store ([`LineageSource::get_parent_models`])
//! 2. structured configuration (`base_model`, `parent_model`,
//!    `base_model_name_or_path`, `_name_or_path`)
//! 3. `base_model:` in the model card's YAML front matter
//!
//! Ancestor scores are resolved breadth-first up to a configurable depth.
//! At depth 1 only direct parents are scored. At greater depths an ancestor
//! without a stored score contributes its own parents one level further.
//! A visited set cuts cycles, and an artifact is never its own parent.

use crate::collaborators::{CollabResult, LineageSource};
use crate::models::{ArtifactRef, LineageEdge};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

const CONFIG_PARENT_KEYS: &[&str] = &[
    "base_model",
    "parent_model",
    "base_model_name_or_path",
    "_name_or_path",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageSettings {
    /// 1 = direct parents only
    pub depth: usize,
    /// Bound on each parent-score lookup
    pub lookup_timeout: Duration,
}

impl Default for LineageSettings {
    fn default() -> Self {
        Self {
            depth: 1,
            lookup_timeout: Duration::from_millis(5_000),
        }
    }
}

/// Parent identifiers named by a model configuration
pub fn extract_lineage_from_config(config: &Value) -> Vec<String> {
    let Some(obj) = config.as_object() else {
        return Vec::new();
    };
    let mut parents = Vec::new();
    for key in CONFIG_PARENT_KEYS {
        match obj.get(*key) {
            Some(Value::String(s)) => parents.push(s.clone()),
            Some(Value::Array(items)) => parents.extend(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string),
            ),
            _ => {}
        }
    }
    clean_ids(parents)
}

/// `base_model` entries from a model card's YAML front matter.
/// Accepts a scalar (`base_model: org/name`) or a block list.
pub fn extract_lineage_from_model_card(card: &str) -> Vec<String> {
    let mut lines = card.lines();
    if lines.next().map(str::trim) != Some("---") {
        return Vec::new();
    }

    let mut parents = Vec::new();
    let mut in_list = false;
    for line in lines.take_while(|l| l.trim() != "---") {
        let trimmed = line.trim();
        if in_list {
            if let Some(item) = trimmed.strip_prefix("- ") {
                parents.push(unquote(item));
                continue;
            }
            in_list = false;
        }
        if let Some(value) = trimmed.strip_prefix("base_model:") {
            let value = value.trim();
            if value.is_empty() {
                in_list = true;
            } else if let Some(inline) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                parents.extend(inline.split(',').map(unquote));
            } else {
                parents.push(unquote(value));
            }
        }
    }
    clean_ids(parents)
}

fn unquote(v: &str) -> String {
    v.trim().trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// Drop blanks, local paths and duplicates, keeping first-seen order
fn clean_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && !id.starts_with('/') && !id.starts_with('.'))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Outcome of resolving one artifact's ancestry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageResolution {
    pub edges: Vec<LineageEdge>,
    /// Scores of every ancestor that had one
    pub scores: Vec<(String, f64)>,
}

impl LineageResolution {
    /// Mean of the retrieved ancestor scores, `None` when there are none
    pub fn mean_score(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let sum: f64 = self.scores.iter().map(|(_, s)| s).sum();
        Some(sum / self.scores.len() as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineageResolver {
    settings: LineageSettings,
}

impl LineageResolver {
    pub fn new(settings: LineageSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> LineageSettings {
        self.settings
    }

    /// Direct parents from every source, deduplicated, self excluded
    pub async fn direct_parents(
        &self,
        artifact: &ArtifactRef,
        source: &dyn LineageSource,
    ) -> CollabResult<Vec<String>> {
        let mut parents = source.get_parent_models(&artifact.id).await?;
        if let Some(config) = &artifact.config {
            parents.extend(source.extract_lineage_from_config(config));
        }
        if let Some(card) = &artifact.model_card {
            parents.extend(extract_lineage_from_model_card(card));
        }
        let mut parents = clean_ids(parents);
        parents.retain(|p| p != &artifact.id);
        Ok(parents)
    }

    pub async fn resolve(
        &self,
        artifact: &ArtifactRef,
        source: &Arc<dyn LineageSource>,
    ) -> CollabResult<LineageResolution> {
        let mut resolution = LineageResolution::default();
        let mut visited: HashSet<String> = HashSet::from([artifact.id.clone()]);

        let mut frontier = Vec::new();
        for parent in self.direct_parents(artifact, source.as_ref()).await? {
            if visited.insert(parent.clone()) {
                resolution.edges.push(LineageEdge {
                    child: artifact.id.clone(),
                    parent: parent.clone(),
                });
                frontier.push(parent);
            }
        }

        let depth = self.settings.depth.max(1);
        for level in 1..=depth {
            if frontier.is_empty() {
                break;
            }
            let mut unscored = Vec::new();
            for (id, score) in self.lookup_scores(&frontier, source).await {
                match score {
                    Some(s) => resolution.scores.push((id, s)),
                    None if level < depth => unscored.push(id),
                    None => debug!("Ancestor {} has no stored score", id),
                }
            }

            let mut next = Vec::new();
            for (id, grandparents) in self.lookup_parents(&unscored, source).await {
                for gp in clean_ids(grandparents) {
                    if visited.insert(gp.clone()) {
                        resolution.edges.push(LineageEdge {
                            child: id.clone(),
                            parent: gp.clone(),
                        });
                        next.push(gp);
                    }
                }
            }
            frontier = next;
        }

        Ok(resolution)
    }

    /// Concurrent, individually time-bounded score lookups, returned in
    /// the order of `ids`
    async fn lookup_scores(
        &self,
        ids: &[String],
        source: &Arc<dyn LineageSource>,
    ) -> Vec<(String, Option<f64>)> {
        let timeout = self.settings.lookup_timeout;
        let mut tasks = JoinSet::new();
        for (idx, id) in ids.iter().enumerate() {
            let source = Arc::clone(source);
            let id = id.clone();
            tasks.spawn(async move {
                let score = match tokio::time::timeout(timeout, source.get_model_score(&id)).await {
                    Ok(Ok(score)) => score.filter(|s| s.is_finite()).map(|s| s.clamp(0.0, 1.0)),
                    Ok(Err(e)) => {
                        warn!("Score lookup for {} failed: {}", id, e);
                        None
                    }
                    Err(_) => {
                        warn!("Score lookup for {} timed out after {:?}", id, timeout);
                        None
                    }
                };
                (idx, id, score)
            });
        }

        let mut results: Vec<(usize, String, Option<f64>)> = Vec::with_capacity(ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(r) => results.push(r),
                Err(e) => warn!("Score lookup task failed: {}", e),
            }
        }
        results.sort_by_key(|(idx, _, _)| *idx);
        results.into_iter().map(|(_, id, s)| (id, s)).collect()
    }

    /// Parents of every id in `ids`, fetched like [`Self::lookup_scores`].
    /// A failed or timed-out lookup yields no parents.
    async fn lookup_parents(
        &self,
        ids: &[String],
        source: &Arc<dyn LineageSource>,
    ) -> Vec<(String, Vec<String>)> {
        let timeout = self.settings.lookup_timeout;
        let mut tasks = JoinSet::new();
        for (idx, id) in ids.iter().enumerate() {
            let source = Arc::clone(source);
            let id = id.clone();
            tasks.spawn(async move {
                let parents = match tokio::time::timeout(timeout, source.get_parent_models(&id)).await {
                    Ok(Ok(parents)) => parents,
                    Ok(Err(e)) => {
                        warn!("Parent lookup for ancestor {} failed: {}", id, e);
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("Parent lookup for ancestor {} timed out after {:?}", id, timeout);
                        Vec::new()
                    }
                };
                (idx, id, parents)
            });
        }

        let mut results: Vec<(usize, String, Vec<String>)> = Vec::with_capacity(ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(r) => results.push(r),
                Err(e) => warn!("Parent lookup task failed: {}", e),
            }
        }
        results.sort_by_key(|(idx, _, _)| *idx);
        results.into_iter().map(|(_, id, p)| (id, p)).collect()
    }
}
