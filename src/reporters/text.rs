//! Text (terminal) reporter with colors and formatting

use crate::models::{MetricKind, Outcome, Scorecard};
use crate::scoring::{NetScoreAggregator, WeightTable};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

fn score_color(score: f64) -> &'static str {
    if score >= 0.8 {
        "\x1b[32m" // Green
    } else if score >= 0.5 {
        "\x1b[33m" // Yellow
    } else {
        "\x1b[31m" // Red
    }
}

/// Render scorecards as formatted terminal output
pub fn render(cards: &[Scorecard], weights: &WeightTable) -> Result<String> {
    let aggregator = NetScoreAggregator::new(weights.clone());
    let mut out = String::new();
    for card in cards {
        render_card(&mut out, card, &aggregator);
    }
    Ok(out)
}

fn render_card(out: &mut String, card: &Scorecard, aggregator: &NetScoreAggregator) {
    let net = card.net_score().get();
    out.push_str(&format!("\n{BOLD}{}{RESET}\n", card.artifact_id()));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Net score: {}{BOLD}{:.2}{RESET}  {DIM}({}ms){RESET}\n\n",
        score_color(net),
        net,
        card.net_score_latency_ms()
    ));

    out.push_str(&format!(
        "{DIM}  METRIC                  VALUE  WEIGHT  POINTS  LATENCY{RESET}\n"
    ));
    out.push_str(&format!(
        "{DIM}  ───────────────────────────────────────────────────────{RESET}\n"
    ));

    let contributions = aggregator.breakdown(card.results());
    for kind in MetricKind::ALL {
        let Some(result) = card.metric(kind) else {
            out.push_str(&format!("  {:<22}  {DIM}missing{RESET}\n", kind.as_str()));
            continue;
        };
        let contribution = contributions.iter().find(|c| c.kind == kind);
        let (weight, points) = match contribution {
            Some(c) => (format!("{:.2}", c.weight), format!("{:.3}", c.points)),
            None => ("-".to_string(), "-".to_string()),
        };
        let value = match result.value.score() {
            Some(v) => format!("{}{:>5.2}{RESET}", score_color(v), v),
            None => format!("{DIM}  n/a{RESET}"),
        };
        let note = match &result.outcome {
            Outcome::Fallback { reason } => format!("  \x1b[33mfallback: {}{RESET}", reason),
            _ => String::new(),
        };
        out.push_str(&format!(
            "  {:<22}  {}  {:>6}  {:>6}  {DIM}{:>5}ms{RESET}{}\n",
            kind.as_str(),
            value,
            weight,
            points,
            result.latency_ms,
            note
        ));
    }

    let size = card.size_score();
    out.push_str(&format!(
        "\n{BOLD}SIZE{RESET}  raspberry_pi {:.0}  jetson_nano {:.0}  desktop_pc {:.0}  aws_server {:.0}  {DIM}({}ms){RESET}\n",
        size.raspberry_pi,
        size.jetson_nano,
        size.desktop_pc,
        size.aws_server,
        card.size_score_latency_ms()
    ));

    let fallbacks = card.fallbacks().count();
    if fallbacks > 0 {
        out.push_str(&format!(
            "{DIM}{} metric(s) used fallback values; run with --log-level debug for details.{RESET}\n",
            fallbacks
        ));
    }
}
