//! Configuration module for trustcard
//!
//! This module handles:
//! - Project-level configuration (trustcard.toml)
//! - Net-score weight overrides
//! - Engine timeouts and execution limits
//! - User-level credentials (~/.config/trustcard/config.toml)

mod project_config;
mod user_config;

pub use project_config::{
    load_config_file, load_project_config, EngineConfig, ExecutionConfig, ProjectConfig,
    ScoringConfig, CONFIG_FILE_NAME, EXAMPLE_CONFIG, JSON_CONFIG_FILE_NAME,
};
pub use user_config::{GithubConfig, HuggingFaceConfig, UserAiConfig, UserConfig};
