//! Configuration module for bucket-backup
//!
//! This module handles loading and validating configuration from TOML files.
//!
//! ## Layout
//!
//! - `[global]` working directory, logging, command timeout, cron schedule
//! - `[storage]` target bucket and optional region/endpoint overrides
//! - `[log_sets.<name>]` log subdirectories whose prior-day files are uploaded
//! - `[jobs.<name>]` archive jobs, tagged by `type` (`directory` or `mongodb`)
//!
//! ## Example Usage
//!
//! ```no_run
//! use bucket_backup::config;
//!
//! let config = config::load_config("/etc/bucket-backup/config.toml")?;
//!
//! for (name, job) in &config.jobs {
//!     println!("Job: {} ({}) -> {}", name, job.kind(), job.prefix());
//! }
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{find_job, load_config, parse_config, ConfigError, Result};
pub use types::*;

/// Get the merged exclude patterns for a directory job
/// This combines global default_excludes with job-specific excludes
pub fn get_effective_excludes(job: &DirectoryJob, global: &GlobalConfig) -> Vec<String> {
    let mut excludes = global.default_excludes.clone();
    excludes.extend(job.excludes.iter().cloned());
    excludes
}

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
