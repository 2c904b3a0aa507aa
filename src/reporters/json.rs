//! JSON reporter
//!
//! Flat scorecard objects with every metric key and its `*_latency`.

use crate::models::Scorecard;
use anyhow::Result;

/// A single scorecard as an object, several as an array
pub fn render(cards: &[Scorecard]) -> Result<String> {
    match cards {
        [card] => Ok(serde_json::to_string_pretty(card)?),
        _ => Ok(serde_json::to_string_pretty(cards)?),
    }
}

/// One compact scorecard per line
pub fn render_ndjson(cards: &[Scorecard]) -> Result<String> {
    let mut out = String::new();
    for card in cards {
        out.push_str(&serde_json::to_string(card)?);
        out.push('\n');
    }
    Ok(out)
}
