//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Suitable for pull request comments and registry pages.

use crate::models::{MetricKind, Outcome, Scorecard};
use crate::scoring::WeightTable;
use anyhow::Result;

/// Render scorecards as GitHub-flavored Markdown
pub fn render(cards: &[Scorecard], weights: &WeightTable) -> Result<String> {
    let mut md = String::new();
    md.push_str("# Trust Scorecards\n\n");

    for card in cards {
        md.push_str(&format!("## `{}`\n\n", card.artifact_id()));
        md.push_str(&format!(
            "**Net score:** {:.2} · computed {}\n\n",
            card.net_score().get(),
            card.computed_at().format("%Y-%m-%d %H:%M UTC")
        ));

        md.push_str("| Metric | Value | Weight | Status |\n");
        md.push_str("|--------|------:|-------:|--------|\n");
        for kind in MetricKind::ALL {
            let weight = weights.weight(kind);
            let weight = if weight > 0.0 {
                format!("{:.2}", weight)
            } else {
                "–".to_string()
            };
            let (value, status) = match card.metric(kind) {
                None => ("n/a".to_string(), "missing".to_string()),
                Some(result) => {
                    let status = match &result.outcome {
                        Outcome::Computed => "ok".to_string(),
                        Outcome::Inapplicable => "not applicable".to_string(),
                        Outcome::Fallback { reason } => format!("fallback ({})", escape(reason)),
                    };
                    (result.value.to_string(), status)
                }
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                kind.as_str(),
                value,
                weight,
                status
            ));
        }

        let size = card.size_score();
        md.push_str(&format!(
            "\n**Size:** Raspberry Pi {:.0} · Jetson Nano {:.0} · Desktop {:.0} · AWS {:.0}\n\n",
            size.raspberry_pi, size.jetson_nano, size.desktop_pc, size.aws_server
        ));
    }

    md.push_str("---\n*Generated by trustcard*\n");
    Ok(md)
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
