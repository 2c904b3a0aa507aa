//! CLI contract tests
//!
//! Runs the real binary against the fixtures in `tests/fixtures/`. Every
//! run gets a scratch HOME and working directory so user and project
//! configuration on the host never leak in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn trustcard_bin() -> String {
    env!("CARGO_BIN_EXE_trustcard").to_string()
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run(scratch: &Path, args: &[&str]) -> Output {
    Command::new(trustcard_bin())
        .args(args)
        .current_dir(scratch)
        .env("HOME", scratch)
        .env("XDG_CONFIG_HOME", scratch.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("GENAI_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("TRUSTCARD_CONFIG")
        .output()
        .expect("Failed to run trustcard")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn score_json(scratch: &Path, artifacts: &Path, extra: &[&str]) -> serde_json::Value {
    let path = artifacts.display().to_string();
    let mut args = vec!["score", path.as_str(), "--offline", "--no-exec", "-f", "json"];
    args.extend_from_slice(extra);
    let output = run(scratch, &args);
    assert!(
        output.status.success(),
        "score failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_str(&stdout(&output)).expect("Invalid JSON")
}

// ============================================================================
// score
// ============================================================================

#[test]
fn test_score_single_artifact_json() {
    let scratch = tempfile::tempdir().unwrap();
    let card = score_json(scratch.path(), &fixture("artifact.json"), &[]);

    assert!(card.is_object(), "single artifact renders as an object");
    assert_eq!(card["artifact_id"], "acme/tiny-bert");
    assert_eq!(card["license"], 1.0);
    assert_eq!(card["reviewedness"], -1.0);
    assert_eq!(card["reproducibility"], 0.0);
    assert!(card["bus_factor_latency"].is_u64());
    assert!(card["size_score"]["raspberry_pi"].is_number());

    let net = card["net_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&net), "net score {net} out of range");
}

#[test]
fn test_score_with_registry_sets_treescore() {
    let scratch = tempfile::tempdir().unwrap();
    let registry = fixture("registry.json").display().to_string();
    let card = score_json(
        scratch.path(),
        &fixture("artifact.json"),
        &["--registry", registry.as_str()],
    );
    let tree = card["treescore"].as_f64().unwrap();
    assert!((tree - 0.82).abs() < 1e-9, "treescore {tree}");
}

#[test]
fn test_score_many_keeps_input_order() {
    let scratch = tempfile::tempdir().unwrap();
    let cards = score_json(scratch.path(), &fixture("artifacts.json"), &["-j", "3"]);
    let ids: Vec<&str> = cards
        .as_array()
        .expect("several artifacts render as an array")
        .iter()
        .map(|c| c["artifact_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["acme/tiny-bert", "acme/unlicensed", "acme/squad-mini"]);
    assert_eq!(cards[0]["license"], 1.0);
    assert_eq!(cards[1]["license"], 0.0);
}

#[test]
fn test_score_ndjson_one_line_per_card() {
    let scratch = tempfile::tempdir().unwrap();
    let path = fixture("artifacts.json").display().to_string();
    let output = run(
        scratch.path(),
        &["score", path.as_str(), "--offline", "--no-exec", "-f", "ndjson"],
    );
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let card: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(card["net_score"].is_number());
    }
}

#[test]
fn test_score_writes_output_file() {
    let scratch = tempfile::tempdir().unwrap();
    let out = scratch.path().join("card.md");
    let path = fixture("artifact.json").display().to_string();
    let out_arg = out.display().to_string();
    let output = run(
        scratch.path(),
        &[
            "score",
            path.as_str(),
            "--offline",
            "--no-exec",
            "-f",
            "markdown",
            "-o",
            out_arg.as_str(),
        ],
    );
    assert!(output.status.success());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("acme/tiny-bert"));
    assert!(written.contains('|'));
}

#[test]
fn test_fail_under_exits_nonzero() {
    let scratch = tempfile::tempdir().unwrap();
    let path = fixture("artifact.json").display().to_string();
    let output = run(
        scratch.path(),
        &["score", path.as_str(), "--offline", "--no-exec", "--fail-under", "0.9"],
    );
    assert!(!output.status.success(), "--fail-under 0.9 should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("acme/tiny-bert"));

    let passing = run(
        scratch.path(),
        &["score", path.as_str(), "--offline", "--no-exec", "--fail-under", "0"],
    );
    assert!(passing.status.success());
}

#[test]
fn test_bad_format_rejected() {
    let scratch = tempfile::tempdir().unwrap();
    let path = fixture("artifact.json").display().to_string();
    let output = run(scratch.path(), &["score", path.as_str(), "-f", "sarif"]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_artifacts_file() {
    let scratch = tempfile::tempdir().unwrap();
    let output = run(scratch.path(), &["score", "nope.json", "--offline"]);
    assert!(!output.status.success());
}

// ============================================================================
// weights / init
// ============================================================================

#[test]
fn test_weights_lists_every_weighted_metric() {
    let scratch = tempfile::tempdir().unwrap();
    let output = run(scratch.path(), &["weights"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for metric in [
        "bus_factor",
        "code_quality",
        "license",
        "ramp_up_time",
        "dataset_quality",
        "performance_claims",
        "reproducibility",
        "reviewedness",
        "treescore",
    ] {
        assert!(text.contains(metric), "missing {metric}");
    }
    assert!(text.contains("1.000"));
}

#[test]
fn test_weights_from_explicit_config() {
    let scratch = tempfile::tempdir().unwrap();
    let config = scratch.path().join("custom.toml");
    std::fs::write(&config, "[scoring.weights]\nlicense = 0.30\n").unwrap();
    let config_arg = config.display().to_string();
    let output = run(scratch.path(), &["--config", config_arg.as_str(), "weights"]);
    assert!(output.status.success());
    // Normalised back to 1.0
    assert!(stdout(&output).contains("1.000"));
}

#[test]
fn test_init_creates_project_config() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path().display().to_string();
    let output = run(scratch.path(), &["init", dir.as_str()]);
    assert!(output.status.success());
    let written = std::fs::read_to_string(scratch.path().join("trustcard.toml")).unwrap();
    assert!(written.contains("[engine]"));

    // Second run leaves it alone
    let again = run(scratch.path(), &["init", dir.as_str()]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("Already initialized"));
}
