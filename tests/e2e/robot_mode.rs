//! Robot-mode end-to-end tests.

use serde_json::Value;

use crate::common::cli::CliRunner;
use crate::common::init_test_logging;

fn parse_json(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| panic!("Failed to parse JSON:\n{text}"))
}

#[test]
fn robot_quick_start_outputs_json() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run(&["--robot"]);
    result.assert_success();

    let json = parse_json(result.stdout.trim());
    assert_eq!(json.get("tool").and_then(|v| v.as_str()), Some("pf"));
    assert!(json.get("gallery").is_some());
    assert!(json.get("output_modes").is_some());
}

#[test]
fn robot_list_outputs_json_array() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run_robot(&["list"]);
    result.assert_success();

    let json = parse_json(result.stdout.trim());
    assert!(json.is_array(), "Expected JSON array for image list");
}

#[test]
fn robot_version_has_build_fields() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run(&["version", "--format=json"]);
    result.assert_success();

    let json = parse_json(result.stdout.trim());
    assert!(json.get("version").is_some());
    assert!(json.get("git_sha").is_some());
}

#[test]
fn robot_config_reports_defaults() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run_robot(&["config"]);
    result.assert_success();

    let json = result.json();
    assert!(json["config"]["source"].is_null());
    assert_eq!(json["config"]["interval_ms"], 5000);
    assert_eq!(json["config"]["slots"].as_array().map(Vec::len), Some(7));
    assert_eq!(
        json["effective_database"].as_str().map(std::path::PathBuf::from),
        Some(cli.db_path())
    );
}

#[test]
fn robot_error_is_json_on_stderr() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run_robot(&["import", "does-not-exist.json"]);
    result.assert_failure();

    let json = result.error_json();
    assert_eq!(json.get("error").and_then(Value::as_bool), Some(true));
    assert!(json.get("message").is_some());
    assert!(json.get("code").is_some());
    assert!(json.get("recoverable").is_some());
}

#[test]
fn robot_logs_are_json_lines() {
    init_test_logging();
    let cli = CliRunner::new();
    let result = cli.run_robot(&["-v", "list"]);
    result.assert_success();

    let log_lines: Vec<&str> = result.stderr.lines().filter(|l| !l.is_empty()).collect();
    assert!(!log_lines.is_empty(), "Expected debug logs on stderr");
    for line in log_lines {
        let entry = parse_json(line);
        assert!(entry.get("level").is_some(), "Log line without level: {line}");
    }
}
