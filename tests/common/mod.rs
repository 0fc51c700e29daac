//! Common test utilities for flagbind integration tests.
//!
//! Provides `TestEnv` for isolated runs that never read the user's
//! `~/.config/flagbind/` directory or the developer's environment.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an isolated config directory.
///
/// The `flagbind()` method returns a `Command` with a cleared environment
/// and `FLAGBIND_CONFIG_DIR` pointing at `config_dir`, so tests are
/// parallel-safe and variables are set per invocation.
pub struct TestEnv {
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty config directory.
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the flagbind binary.
    pub fn flagbind(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_flagbind"));
        cmd.env_clear();
        cmd.env("FLAGBIND_CONFIG_DIR", self.config_dir.path());
        cmd
    }

    /// Write the default `config.toml` picked up without `--config`.
    pub fn write_default_config(&self, content: &str) -> PathBuf {
        self.write_config("config.toml", content)
    }

    /// Write a config file under the config directory.
    pub fn write_config(&self, name: &str, content: &str) -> PathBuf {
        let path = self.config_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write config file");
        path
    }

    pub fn config_path(&self) -> &Path {
        self.config_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse JSON output from a command.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("Failed to parse JSON output")
}
