//! Output reporters for scorecards
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors and a weight breakdown
//! - `json` - Pretty JSON (object for one artifact, array for several)
//! - `ndjson` - One compact JSON scorecard per line
//! - `markdown` - GitHub-flavored Markdown table

mod json;
mod markdown;
mod text;

use crate::models::Scorecard;
use crate::scoring::WeightTable;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Ndjson,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "ndjson" | "jsonl" => Ok(OutputFormat::Ndjson),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, ndjson, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render scorecards in the given format
pub fn report(cards: &[Scorecard], weights: &WeightTable, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(cards, weights),
        OutputFormat::Json => json::render(cards),
        OutputFormat::Ndjson => json::render_ndjson(cards),
        OutputFormat::Markdown => markdown::render(cards, weights),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Ndjson => "ndjson",
        OutputFormat::Markdown => "md",
    }
}
