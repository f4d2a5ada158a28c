//! Common test utilities for StockPicker integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Variables that would leak the developer's own deployment into a test run
const DEPLOYMENT_VARS: [&str; 9] = [
    "PROJECT_CONNECTION_STRING",
    "AGENTS_MODEL_DEPLOYMENT_NAME",
    "AGENTS_API_KEY",
    "VECTOR_SEARCH_ENDPOINT",
    "VECTOR_SEARCH_API_KEY",
    "CHAOS_ENABLED",
    "CHAOS_INJECT_ERROR_RATE",
    "CHAOS_DELAY_SECONDS_MAX",
    "RUST_LOG",
];

/// Create a test environment with an isolated home directory
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".stockpicker");

        Ok(Self { temp_dir, data_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    /// Command with HOME pointed at the temp dir and deployment variables cleared
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_stockpicker"));
        cmd.env("HOME", self.temp_dir.path());
        for name in DEPLOYMENT_VARS {
            cmd.env_remove(name);
        }
        cmd
    }

    /// Write a config with the given project and model, polling without delay
    pub fn create_config(&self, connection_string: &str, model: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let config = serde_json::json!({
            "project": { "connection_string": connection_string },
            "agent": { "model": model, "poll_interval_ms": 0, "max_polls": 5 },
            "search": { "endpoint": "" }
        });
        std::fs::write(self.config_file(), serde_json::to_string_pretty(&config)?)?;
        Ok(())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
