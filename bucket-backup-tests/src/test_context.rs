//! Test context and assertion helpers

use crate::config_builder::ConfigBuilder;
use anyhow::Result;
use bucket_backup::config::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Owns a temporary directory and, optionally, a configuration written into it
pub struct TestContext {
    temp_dir: TempDir,
    config: Option<Config>,
    config_path: Option<PathBuf>,
}

impl TestContext {
    /// Create a new test context with an empty temporary directory
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            config: None,
            config_path: None,
        }
    }

    /// Create a test context from a ConfigBuilder, writing `config.toml`
    pub fn from_builder(builder: ConfigBuilder) -> Self {
        let (path, config, temp_dir) = builder.write();

        Self {
            temp_dir,
            config: Some(config),
            config_path: Some(path),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// Path of the written `config.toml`
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a subdirectory in the temp dir
    pub fn create_subdir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create subdirectory");
        path
    }

    /// Create a file (and its parents) in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn file_exists(&self, name: &str) -> bool {
        self.temp_dir.path().join(name).exists()
    }

    pub fn read_file(&self, name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.temp_dir.path().join(name))?)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Assertion helpers for `Result`
pub trait ResultAssertions<T> {
    /// Unwrap `Ok`, panicking with the error otherwise
    fn assert_ok(self) -> T;

    /// Expect `Err` whose debug output contains `needle`
    fn assert_err_contains(self, needle: &str);
}

impl<T: std::fmt::Debug, E: std::fmt::Debug> ResultAssertions<T> for std::result::Result<T, E> {
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    }

    fn assert_err_contains(self, needle: &str) {
        match self {
            Ok(v) => panic!("Expected Err containing '{}', got Ok: {:?}", needle, v),
            Err(e) => {
                let err_msg = format!("{:?}", e);
                assert!(
                    err_msg.contains(needle),
                    "Error '{}' does not contain '{}'",
                    err_msg,
                    needle
                );
            }
        }
    }
}

/// Assertion helpers for `Option`
pub trait OptionAssertions<T> {
    fn assert_some(self) -> T;
    fn assert_none(self);
}

impl<T: std::fmt::Debug> OptionAssertions<T> for Option<T> {
    fn assert_some(self) -> T {
        match self {
            Some(v) => v,
            None => panic!("Expected Some, got None"),
        }
    }

    fn assert_none(self) {
        if let Some(v) = self {
            panic!("Expected None, got Some: {:?}", v);
        }
    }
}
