use super::*;
use crate::models::MetricKind;

#[test]
fn test_default_config() {
    let config = ProjectConfig::default();
    assert_eq!(config.engine.metric_timeout(), Duration::from_secs(30));
    assert_eq!(config.engine.lineage_settings(), LineageSettings::default());
    assert!(config.execution.enabled);
    assert_eq!(config.execution.python, "python3");
    assert_eq!(config.scoring.weight_table(), WeightTable::standard());
}

#[test]
fn test_parse_toml() {
    let toml = r#"
[scoring]
weights = { license = 0.30, reviewedness = 0.0 }

[engine]
metric_timeout_ms = 1500
lineage_depth = 3

[execution]
enabled = false
python = "python3.11"
"#;
    let config: ProjectConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.engine.metric_timeout(), Duration::from_millis(1500));
    assert_eq!(config.engine.lineage_timeout_ms, 5000);
    assert_eq!(config.engine.lineage_settings().depth, 3);
    assert!(!config.execution.enabled);
    assert_eq!(config.execution.max_demo_files, 10);

    let weights = config.scoring.weight_table();
    assert!(weights.is_valid());
    assert_eq!(weights.weight(MetricKind::Reviewedness), 0.0);
    assert!(weights.weight(MetricKind::License) > weights.weight(MetricKind::BusFactor));
}

#[test]
fn test_parse_json() {
    let json = r#"{"engine": {"lineage_timeout_ms": 250}, "execution": {"timeout_secs": 5}}"#;
    let config: ProjectConfig = serde_json::from_str(json).unwrap();
    assert_eq!(
        config.engine.lineage_settings().lookup_timeout,
        Duration::from_millis(250)
    );
    assert_eq!(
        config.execution.repository_options().execution_timeout,
        Duration::from_secs(5)
    );
}

#[test]
fn test_invalid_weights_fall_back() {
    let toml = r#"
[scoring]
weights = { popularity = 0.5 }
"#;
    let config: ProjectConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.scoring.weight_table(), WeightTable::standard());
}

#[test]
fn test_zero_depth_is_clamped() {
    let toml = "[engine]\nlineage_depth = 0\n";
    let config: ProjectConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.engine.lineage_settings().depth, 1);
}

#[test]
fn test_load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_project_config(dir.path()), ProjectConfig::default());

    std::fs::write(
        dir.path().join(JSON_CONFIG_FILE_NAME),
        r#"{"execution": {"max_demo_files": 2}}"#,
    )
    .unwrap();
    assert_eq!(load_project_config(dir.path()).execution.max_demo_files, 2);

    // TOML wins over JSON
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[execution]\nmax_demo_files = 4\n",
    )
    .unwrap();
    assert_eq!(load_project_config(dir.path()).execution.max_demo_files, 4);
}

#[test]
fn test_broken_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "this is [[ not toml").unwrap();
    std::fs::write(
        dir.path().join(JSON_CONFIG_FILE_NAME),
        r#"{"engine": {"lineage_depth": 2}}"#,
    )
    .unwrap();
    assert_eq!(load_project_config(dir.path()).engine.lineage_depth, 2);
}

#[test]
fn test_explicit_file_errors_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[engine]\nmetric_timeout_ms = \"soon\"\n").unwrap();
    let err = load_config_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("custom.toml"));
    assert!(load_config_file(&dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_example_config_parses() {
    let config: ProjectConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
    assert_eq!(config, ProjectConfig::default());
}
