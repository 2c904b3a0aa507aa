//! Project-level configuration support
//!
//! Loads configuration from `trustcard.toml` or `.trustcardrc.json` in the
//! working directory, or from an explicit `--config` path.
//!
//! # Configuration Format
//!
//! ```toml
//! # trustcard.toml
//!
//! [scoring]
//! weights = { license = 0.2, bus_factor = 0.1 }
//!
//! [engine]
//! metric_timeout_ms = 30000
//! lineage_timeout_ms = 5000
//! lineage_depth = 1
//!
//! [execution]
//! enabled = true
//! timeout_secs = 20
//! max_demo_files = 10
//! python = "python3"
//! ```

use crate::collaborators::RepositoryOptions;
use crate::lineage::LineageSettings;
use crate::scoring::WeightTable;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "trustcard.toml";
pub const JSON_CONFIG_FILE_NAME: &str = ".trustcardrc.json";

/// Project-level configuration loaded from trustcard.toml or similar
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// Net-score weight overrides, keyed by metric name
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl ScoringConfig {
    /// Standard weights with the overrides merged in; an invalid table
    /// falls back to the standard weights
    pub fn weight_table(&self) -> WeightTable {
        WeightTable::from_config(Some(&self.weights))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_metric_timeout_ms")]
    pub metric_timeout_ms: u64,

    #[serde(default = "default_lineage_timeout_ms")]
    pub lineage_timeout_ms: u64,

    /// 1 = direct parents only
    #[serde(default = "default_lineage_depth")]
    pub lineage_depth: usize,

    /// Bound on cloning a remote repository before scoring
    #[serde(default = "default_clone_timeout_secs")]
    pub clone_timeout_secs: u64,
}

fn default_metric_timeout_ms() -> u64 {
    30_000
}

fn default_lineage_timeout_ms() -> u64 {
    5_000
}

fn default_lineage_depth() -> usize {
    1
}

fn default_clone_timeout_secs() -> u64 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metric_timeout_ms: default_metric_timeout_ms(),
            lineage_timeout_ms: default_lineage_timeout_ms(),
            lineage_depth: default_lineage_depth(),
            clone_timeout_secs: default_clone_timeout_secs(),
        }
    }
}

impl EngineConfig {
    pub fn metric_timeout(&self) -> Duration {
        Duration::from_millis(self.metric_timeout_ms.max(1))
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs.max(1))
    }

    pub fn lineage_settings(&self) -> LineageSettings {
        if self.lineage_depth == 0 {
            warn!("lineage_depth = 0 would skip every parent; using 1");
        }
        LineageSettings {
            depth: self.lineage_depth.max(1),
            lookup_timeout: Duration::from_millis(self.lineage_timeout_ms.max(1)),
        }
    }
}

/// Demo and snippet execution
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_demo_files")]
    pub max_demo_files: usize,

    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_lint_timeout_secs")]
    pub lint_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_demo_files() -> usize {
    10
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_lint_timeout_secs() -> u64 {
    120
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            max_demo_files: default_max_demo_files(),
            python: default_python(),
            lint_timeout_secs: default_lint_timeout_secs(),
        }
    }
}

impl ExecutionConfig {
    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            execution_enabled: self.enabled,
            execution_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            max_demo_files: self.max_demo_files,
            python: self.python.clone(),
            lint_timeout: Duration::from_secs(self.lint_timeout_secs.max(1)),
        }
    }
}

/// Load project configuration from a directory
///
/// Looks for config files in order:
/// 1. trustcard.toml
/// 2. .trustcardrc.json
///
/// Returns default config if no file found. Unreadable files are warned
/// about and skipped.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    for name in [CONFIG_FILE_NAME, JSON_CONFIG_FILE_NAME] {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load an explicit config file; JSON when the extension says so, TOML
/// otherwise
pub fn load_config_file(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?
    };
    Ok(config)
}

/// Example config written by `trustcard init`
pub const EXAMPLE_CONFIG: &str = r#"# trustcard project configuration

[scoring]
# Net-score weights by metric. Unlisted metrics keep their defaults and the
# table is normalised to sum to 1.0.
# weights = { bus_factor = 0.15, code_quality = 0.15, license = 0.15, ramp_up_time = 0.15, dataset_quality = 0.10, performance_claims = 0.10, reproducibility = 0.10, reviewedness = 0.05, treescore = 0.05 }

[engine]
metric_timeout_ms = 30000
lineage_timeout_ms = 5000
lineage_depth = 1
# clone_timeout_secs = 300

[execution]
# Set to false to never run demo or model-card code
enabled = true
timeout_secs = 20
max_demo_files = 10
python = "python3"
"#;

#[cfg(test)]
mod tests;
