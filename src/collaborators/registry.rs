//! In-memory lineage registry
//!
//! Holds parent links and previously computed net scores for artifacts the
//! registry already knows. The CLI loads it from a JSON file:
//!
//! ```json
//! {
//!   "google/bert-base": { "net_score": 0.82 },
//!   "acme/bert-finetune": { "parents": ["google/bert-base"], "net_score": 0.61 }
//! }
//! ```

use super::{CollabResult, LineageSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub net_score: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact with its stored score and direct parents
    pub fn with_model(
        mut self,
        id: impl Into<String>,
        net_score: Option<f64>,
        parents: &[&str],
    ) -> Self {
        self.entries.insert(
            id.into(),
            RegistryEntry {
                parents: parents.iter().map(|p| p.to_string()).collect(),
                net_score,
            },
        );
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, RegistryEntry> =
            serde_json::from_str(json).context("Failed to parse lineage registry")?;
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry file {}", path.display()))?;
        let registry = Self::from_json(&content)
            .with_context(|| format!("Invalid registry file {}", path.display()))?;
        debug!(
            "Loaded {} registry entries from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LineageSource for InMemoryRegistry {
    async fn get_parent_models(&self, artifact_id: &str) -> CollabResult<Vec<String>> {
        Ok(self
            .entries
            .get(artifact_id)
            .map(|e| e.parents.clone())
            .unwrap_or_default())
    }

    async fn get_model_score(&self, artifact_id: &str) -> CollabResult<Option<f64>> {
        Ok(self
            .entries
            .get(artifact_id)
            .and_then(|e| e.net_score)
            .filter(|s| s.is_finite()))
    }
}
