//! Bucket Backup Library
//!
//! This library uploads prior-day log files, directory tarballs and MongoDB
//! dumps to S3 object storage.

pub mod config;
pub mod managers;
pub mod strategies;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config, JobConfig, LogSetConfig};
pub use managers::backup::{BackupManager, RunOptions, RunSummary};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::notification::NotificationManager;
