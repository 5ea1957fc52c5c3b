pub mod directory;
pub mod mongodb;

use crate::config::{Config, JobConfig};
use crate::utils::executor::CommandExecutor;
use crate::utils::storage::object_key;
use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use directory::DirectoryStrategy;
pub use mongodb::MongoStrategy;

/// Inputs shared by every archive strategy during one run
pub struct ArchiveContext<'a> {
    /// Per-run backup directory where archives are written
    pub backup_dir: &'a Path,
    /// Wall clock of the run, used for names
    pub now: NaiveDateTime,
    /// Timeout for each external command
    pub timeout: Option<Duration>,
    pub executor: &'a dyn CommandExecutor,
}

/// Trait for backup strategies that turn a job into one local archive
pub trait ArchiveStrategy {
    /// Produce the archive; `None` means there is nothing to upload
    fn create_archive(&self, ctx: &ArchiveContext<'_>) -> Option<PathBuf>;

    /// Destination key for an archive produced by this strategy
    fn object_key(&self, prefix: &str, archive: &Path, _now: NaiveDateTime) -> String {
        object_key(prefix, archive)
    }

    /// Get strategy name (for logging)
    fn name(&self) -> &'static str;
}

/// Build the strategy for a configured job
pub fn strategy_for<'a>(job: &'a JobConfig, config: &Config) -> Result<Box<dyn ArchiveStrategy + 'a>> {
    match job {
        JobConfig::Directory(dir) => Ok(Box::new(DirectoryStrategy::new(dir, &config.global))),
        JobConfig::Mongodb(mongo) => Ok(Box::new(MongoStrategy::new(mongo)?)),
    }
}
