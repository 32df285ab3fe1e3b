//! Human-mode end-to-end tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::common::cli::CliRunner;
use crate::common::fixtures::TestImages;
use crate::common::init_test_logging;

/// `pf` with an isolated home, plain output and no logs.
fn pf(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pf").expect("pf binary is built");
    cmd.env_clear()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_DATA_HOME", home.path().join(".local/share"))
        .env("PF_DB", home.path().join("gallery.db"))
        .env("RUST_LOG", "off")
        .current_dir(home.path());
    cmd
}

#[test]
fn quick_start_lists_commands() {
    let home = TempDir::new().unwrap();
    pf(&home)
        .assert()
        .success()
        .stdout(predicate::str::contains("QUICK START"))
        .stdout(predicate::str::contains("pf add"));
}

#[test]
fn version_is_plain_text() {
    let home = TempDir::new().unwrap();
    pf(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pf "))
        .stdout(predicate::str::contains("rustc:"));
}

#[test]
fn empty_list_hints_at_add() {
    let home = TempDir::new().unwrap();
    pf(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Gallery is empty"));
}

#[test]
fn errors_show_hint() {
    let home = TempDir::new().unwrap();
    let bad = home.path().join("bad.json");
    std::fs::write(&bad, "{\"not\": \"an array\"}").unwrap();

    pf(&home)
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Invalid gallery document"))
        .stderr(predicate::str::contains("Hint:"));
}

#[test]
fn output_is_uncolored_when_piped() {
    init_test_logging();
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let images = TestImages::create_batch(1);

    let result = cli.run(&["add", images.paths[0].to_str().unwrap()]);
    result.assert_success();
    assert!(!result.stdout.contains('\u{1b}'), "Unexpected ANSI codes");

    let result = cli.run(&["show"]);
    result
        .assert_success()
        .assert_stdout_contains("main")
        .assert_stdout_contains("Primary ID:")
        .assert_stdout_contains("Side ID:");
}

#[test]
fn init_writes_config_once() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("frame.toml");

    pf(&home)
        .args(["--config", path.to_str().unwrap(), "init"])
        .assert()
        .success();
    assert!(path.exists());

    pf(&home)
        .args(["--config", path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    pf(&home)
        .args(["--config", path.to_str().unwrap(), "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slots: main, side-1"));
}
