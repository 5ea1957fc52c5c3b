//! Test utilities for bucket-backup
//!
//! Shared builders, fixtures and assertion helpers for the unit and command
//! test suites.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, MockExecutor, MockObjectStore};
//!
//! #[test]
//! fn my_test() {
//!     let (config, temp_dir) = ConfigBuilder::new()
//!         .add_directory_job("n8n")
//!         .persist();
//!     // ... test code
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use test_context::{OptionAssertions, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use bucket_backup::config::{
    Config, DirectoryJob, GlobalConfig, JobConfig, LogSetConfig, MatchMode, MongoJob,
    NotificationConfig, StorageConfig,
};
pub use bucket_backup::utils::dates::PriorDay;

// Re-export mock implementations from the main crate
pub use bucket_backup::utils::executor::mock::{CommandCall, MockExecutor, MockResponse};
pub use bucket_backup::utils::executor::CommandExecutor;
pub use bucket_backup::utils::storage::mock::{MockObjectStore, PutCall};
pub use bucket_backup::utils::storage::ObjectStore;

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
