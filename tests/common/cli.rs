//! CLI test runner with fluent assertions.
//!
//! Provides infrastructure for executing the `pf` binary against an isolated
//! home directory and gallery database, and verifying output, exit codes and
//! JSON responses in robot mode.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;
use tempfile::TempDir;

/// Environment variables the binary reads that must not leak in from the host.
const HOST_VARS: [&str; 5] = ["PF_CONFIG", "PF_DB", "PF_FORMAT", "RUST_LOG", "NO_COLOR"];

/// Test runner for the `pf` CLI binary.
///
/// Each runner owns a temporary home directory. `HOME` and `XDG_*` point
/// into it and `PF_DB` names a database inside it, so runs never touch the
/// real user gallery and commands from one runner share one gallery.
///
/// # Example
///
/// ```ignore
/// let cli = CliRunner::new();
/// cli.run(&["add", "photo.png"]).assert_success();
/// cli.run_robot(&["list"]).assert_json_array_len("", 1);
/// ```
pub struct CliRunner {
    binary_path: PathBuf,
    home: TempDir,
    env_vars: HashMap<String, String>,
    stdin: Option<Vec<u8>>,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRunner {
    /// Create a runner pointing to the compiled `pf` binary.
    #[must_use]
    pub fn new() -> Self {
        let home = TempDir::new().expect("Failed to create temp home");
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_pf")),
            home,
            env_vars: HashMap::new(),
            stdin: None,
        }
    }

    /// The isolated home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// The gallery database every command of this runner uses.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.home.path().join("gallery.db")
    }

    /// Add an environment variable for command execution.
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env_vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Set standard input for the next commands.
    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Execute the command with the given arguments.
    ///
    /// # Panics
    ///
    /// Panics if the command fails to execute.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let start = Instant::now();

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .current_dir(self.home.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for key in HOST_VARS {
            cmd.env_remove(key);
        }
        cmd.env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env("XDG_DATA_HOME", self.home.path().join(".local/share"))
            .env("PF_DB", self.db_path());
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().expect("Failed to execute command");
        {
            let mut stdin = child.stdin.take().expect("stdin is piped");
            if let Some(bytes) = &self.stdin {
                stdin.write_all(bytes).expect("Failed to write stdin");
            }
        }
        let output = child.wait_with_output().expect("Failed to wait for command");

        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Execute with `--robot` flag for JSON output.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let mut full_args = vec!["--robot"];
        full_args.extend(args);
        self.run(&full_args)
    }
}

/// Captured output from CLI execution with fluent assertions.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    pub args: Vec<String>,
}

impl CliResult {
    /// Check if the command succeeded (exit code 0).
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Assert the command succeeded.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "Command {:?} failed with exit code {}: {}",
            self.args,
            self.exit_code,
            self.stderr
        );
        self
    }

    /// Assert the command failed.
    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.success(),
            "Command {:?} unexpectedly succeeded",
            self.args
        );
        self
    }

    /// Assert stdout contains the given text.
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout does not contain \"{text}\"\nActual stdout:\n{}",
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text.
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr does not contain \"{text}\"\nActual stderr:\n{}",
            self.stderr
        );
        self
    }

    /// Parse stdout as JSON.
    ///
    /// # Panics
    ///
    /// Panics if stdout is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|_| panic!("Failed to parse JSON from stdout:\n{}", self.stdout))
    }

    /// Parse the last stderr line as JSON (robot-mode errors).
    #[must_use]
    pub fn error_json(&self) -> Value {
        let line = self.stderr.trim().lines().last().unwrap_or_default();
        serde_json::from_str(line)
            .unwrap_or_else(|_| panic!("Failed to parse JSON from stderr:\n{}", self.stderr))
    }

    /// Assert a JSON field matches an expected value using JSON pointer syntax.
    pub fn assert_json_field(&self, json_pointer: &str, expected: &Value) -> &Self {
        let json = self.json();
        let actual = json
            .pointer(json_pointer)
            .unwrap_or_else(|| panic!("JSON path {json_pointer} not found in:\n{json}"));
        assert_eq!(actual, expected, "JSON field {json_pointer} mismatch");
        self
    }

    /// Assert a JSON array has the expected length.
    pub fn assert_json_array_len(&self, json_pointer: &str, expected_len: usize) -> &Self {
        let json = self.json();
        let arr = json
            .pointer(json_pointer)
            .unwrap_or_else(|| panic!("JSON path {json_pointer} not found"))
            .as_array()
            .unwrap_or_else(|| panic!("JSON path {json_pointer} is not an array"));
        assert_eq!(
            arr.len(),
            expected_len,
            "Array at {json_pointer} has {} elements, expected {expected_len}",
            arr.len()
        );
        self
    }

    /// Assert the command completed within the given duration.
    pub fn assert_duration_under(&self, max: Duration) -> &Self {
        assert!(
            self.duration < max,
            "Command took {:?}, expected under {max:?}",
            self.duration
        );
        self
    }
}
