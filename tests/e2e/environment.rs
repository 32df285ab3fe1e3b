//! Environment variable behavior end-to-end tests.

use crate::common::cli::CliRunner;
use crate::common::fixtures::TestImages;
use crate::common::init_test_logging;

#[test]
fn pf_format_env_sets_json_output() {
    init_test_logging();
    let cli = CliRunner::new()
        .with_env("RUST_LOG", "off")
        .with_env("PF_FORMAT", "json");
    let result = cli.run(&["version"]);
    result.assert_success();

    let json: serde_json::Value = serde_json::from_str(result.stdout.trim())
        .expect("Expected JSON output with PF_FORMAT=json");
    assert!(json.get("version").is_some());
}

#[test]
fn pf_format_env_sets_compact_json() {
    init_test_logging();
    let cli = CliRunner::new()
        .with_env("RUST_LOG", "off")
        .with_env("PF_FORMAT", "json-compact");
    let result = cli.run(&["version"]);
    result.assert_success();

    let stdout = result.stdout.trim_end();
    assert!(serde_json::from_str::<serde_json::Value>(stdout).is_ok());
    assert_eq!(stdout.lines().count(), 1, "Expected compact JSON single line");
}

#[test]
fn cli_format_flag_overrides_env() {
    init_test_logging();
    let cli = CliRunner::new()
        .with_env("RUST_LOG", "off")
        .with_env("PF_FORMAT", "json");
    let result = cli.run(&["version", "--format=text"]);
    result.assert_success();

    assert!(
        serde_json::from_str::<serde_json::Value>(result.stdout.trim()).is_err(),
        "--format=text should override PF_FORMAT=json"
    );
}

#[test]
fn pf_db_env_selects_database() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let images = TestImages::create_batch(1);
    cli.run(&["add", images.paths[0].to_str().unwrap()])
        .assert_success();
    assert!(cli.db_path().exists());

    // Same home, different database: empty gallery.
    let other = cli.home().join("other.db");
    let other_str = other.to_str().unwrap();
    cli.run_robot(&["--db", other_str, "list"])
        .assert_success()
        .assert_json_array_len("", 0);
    assert!(other.exists());
}

#[test]
fn pf_config_env_is_used() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let config = cli.home().join("frame.yaml");
    std::fs::write(&config, "slots: [only]\ninterval_ms: 750\n").unwrap();

    let cli = cli.with_env("PF_CONFIG", config.to_str().unwrap());
    let result = cli.run_robot(&["show"]);
    result.assert_success().assert_json_array_len("", 1);
    assert_eq!(result.json()[0]["slot"], "only");
}
