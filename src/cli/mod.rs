//! CLI command definitions and handlers

mod init;
mod score;

use crate::config::{load_config_file, load_project_config, ProjectConfig, UserConfig, CONFIG_FILE_NAME};
use crate::reporters::OutputFormat;
use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

pub use score::ScoreOptions;

/// Parse and validate the concurrent artifact count (1-32)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("jobs must be at least 1".to_string())
    } else if n > 32 {
        Err("jobs cannot exceed 32".to_string())
    } else {
        Ok(n)
    }
}

fn parse_unit_score(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err("score must be between 0.0 and 1.0".to_string())
    }
}

/// trustcard - trustworthiness scorecards for ML artifacts
#[derive(Parser, Debug)]
#[command(name = "trustcard")]
#[command(
    version,
    about = "Score ML models and datasets for trustworthiness: bus factor, reproducibility, reviewedness, lineage and more",
    after_help = "\
Examples:
  trustcard score artifact.json                     Score one artifact (or a JSON array of them)
  trustcard score models.json --format ndjson       One JSON scorecard per line
  trustcard score model.json --registry reg.json    Resolve lineage from a registry export
  trustcard score model.json --repo ./checkout      Inspect a local checkout
  trustcard weights                                 Show the effective net-score weights
  trustcard init                                    Write an example trustcard.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Project config file (default: ./trustcard.toml or ./.trustcardrc.json)
    #[arg(long, global = true, env = "TRUSTCARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score artifacts described in a JSON file ("-" reads stdin)
    Score {
        /// JSON artifact object or array of objects
        artifacts: PathBuf,

        /// Output format: text, json, ndjson, markdown (or md)
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "ndjson", "jsonl", "markdown", "md"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Lineage registry export (JSON map of id -> {parents, net_score})
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Local checkout to inspect instead of each artifact's repository
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Never execute demo or model-card code
        #[arg(long)]
        no_exec: bool,

        /// Skip the LLM and the dataset hub (neutral defaults are used)
        #[arg(long)]
        offline: bool,

        /// Per-metric timeout in milliseconds (overrides config)
        #[arg(long)]
        metric_timeout_ms: Option<u64>,

        /// Artifacts scored concurrently (1-32)
        #[arg(long, short = 'j', default_value = "4", value_parser = parse_jobs)]
        jobs: usize,

        /// Exit with code 1 if any net score is below this value (CI mode)
        #[arg(long, value_parser = parse_unit_score)]
        fail_under: Option<f64>,
    },

    /// Show the effective net-score weight table
    Weights,

    /// Write an example trustcard.toml into a directory
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Manage user configuration (~/.config/trustcard/config.toml)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize user config file with example settings
    Init,
    /// Show current config and paths
    Show,
}

/// Project config from `--config`, else from the working directory
fn project_config(explicit: Option<&Path>) -> Result<ProjectConfig> {
    match explicit {
        Some(path) => load_config_file(path),
        None => Ok(load_project_config(Path::new("."))),
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Score {
            artifacts,
            format,
            output,
            registry,
            repo,
            no_exec,
            offline,
            metric_timeout_ms,
            jobs,
            fail_under,
        } => {
            let project = project_config(cli.config.as_deref())?;
            let options = ScoreOptions {
                artifacts,
                format: format.parse::<OutputFormat>()?,
                output,
                registry,
                repo,
                no_exec,
                offline,
                metric_timeout_ms,
                jobs,
                fail_under,
            };
            score::run(options, project)
        }

        Commands::Weights => {
            let project = project_config(cli.config.as_deref())?;
            show_weights(&project)
        }

        Commands::Init { path } => init::run(&path),

        Commands::Config { action } => run_config_action(action),
    }
}

fn show_weights(project: &ProjectConfig) -> Result<()> {
    let table = project.scoring.weight_table();
    println!("{}", style("Net-score weights").bold());
    for (kind, weight) in table.iter() {
        println!("  {:<22} {:.3}", kind.as_str(), weight);
    }
    println!("  {:<22} {:.3}", style("total").dim(), table.total());
    Ok(())
}

fn run_config_action(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = UserConfig::init_user_config()?;
            println!("{} Config initialized at: {}", style("✓").green(), path.display());
            println!("\nEdit to add your API keys, or set via environment:");
            println!("  export GENAI_API_KEY=\"sk-...\"");
            println!("  export GH_TOKEN=\"ghp_...\"");
            Ok(())
        }
        ConfigAction::Show => show_config(),
    }
}

fn show_config() -> Result<()> {
    let config = UserConfig::load()?;
    let mark = |present: bool| if present { "✓" } else { "(not found)" };

    println!("Config paths:");
    if let Some(user_path) = UserConfig::user_config_path() {
        println!("  User:    {} {}", user_path.display(), mark(user_path.exists()));
    }
    println!(
        "  Project: ./{} {}",
        CONFIG_FILE_NAME,
        mark(Path::new(CONFIG_FILE_NAME).exists())
    );
    println!();

    let backend = config.ai_backend();
    let key_status = if config.has_ai_key() {
        "✓ configured"
    } else {
        "✗ not set (neutral defaults will be used)"
    };
    println!("AI backend: {:?}", backend);
    println!("  {}: {}", backend.env_key(), key_status);
    println!(
        "GitHub token: {}",
        if config.github_token().is_some() { "✓ configured" } else { "✗ not set" }
    );
    Ok(())
}
