use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub log_sets: BTreeMap<String, LogSetConfig>,
    #[serde(default)]
    pub jobs: BTreeMap<String, JobConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Directory under which the per-run `backup_<timestamp>` directory is created
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Timeout for external commands (none = wait indefinitely)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_seconds: Option<u64>,

    /// Cron schedule used by `setup`
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Logging configuration
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,

    /// Exclusion patterns applied to every directory job
    #[serde(default)]
    pub default_excludes: Vec<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            command_timeout_seconds: None,
            schedule: default_schedule(),
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            log_max_files: default_log_max_files(),
            default_excludes: Vec::new(),
        }
    }
}

/// Object storage settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub bucket: String,

    /// Region override (defaults to the ambient AWS configuration)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Endpoint override for S3-compatible stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub discord_webhook_url: String,

    #[serde(default = "default_notify_on")]
    pub notify_on: Vec<NotifyEvent>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            discord_webhook_url: String::new(),
            notify_on: default_notify_on(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifyEvent {
    Failure,
    Success,
}

/// How a log file is matched against the prior day
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Year and month must be whole path components, day a two-digit file name token
    #[default]
    Structured,
    /// Year/month anywhere in the directory path, `-DD.` or `-DD-` in the file name
    Substring,
}

/// A set of log subdirectories whose prior-day files are uploaded one by one
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSetConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Base log directory (e.g. /var/ossec/logs)
    pub base: PathBuf,

    /// Root that object keys are made relative to (defaults to `base`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<PathBuf>,

    /// Subdirectories of `base` to scan
    pub subdirs: Vec<String>,

    /// Destination key prefix
    pub prefix: String,

    #[serde(default)]
    pub match_mode: MatchMode,
}

impl LogSetConfig {
    /// Root used to compute the relative part of each object key
    pub fn key_root(&self) -> &std::path::Path {
        self.relative_to.as_deref().unwrap_or(&self.base)
    }
}

/// A backup job, tagged by `type`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobConfig {
    Directory(DirectoryJob),
    Mongodb(MongoJob),
}

impl JobConfig {
    pub fn enabled(&self) -> bool {
        match self {
            JobConfig::Directory(j) => j.enabled,
            JobConfig::Mongodb(j) => j.enabled,
        }
    }

    pub fn prefix(&self) -> &str {
        match self {
            JobConfig::Directory(j) => &j.prefix,
            JobConfig::Mongodb(j) => &j.prefix,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            JobConfig::Directory(j) => &j.description,
            JobConfig::Mongodb(j) => &j.description,
        }
    }

    pub fn cleanup(&self) -> CleanupPolicy {
        match self {
            JobConfig::Directory(j) => j.cleanup,
            JobConfig::Mongodb(j) => j.cleanup,
        }
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        match self {
            JobConfig::Directory(j) => j.timeout_seconds,
            JobConfig::Mongodb(j) => j.timeout_seconds,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JobConfig::Directory(_) => "directory",
            JobConfig::Mongodb(_) => "mongodb",
        }
    }
}

/// When the local archive is removed after an upload attempt
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupPolicy {
    #[default]
    OnSuccess,
    Always,
}

/// Archive file naming scheme
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveNaming {
    /// `<name>_backup_<YYYYmmdd_HHMMSS>.tar.gz`
    #[default]
    Timestamped,
    /// `<name>-backup-<YYYY>-<Mon>-<DD>.tar.gz` for the prior day
    PriorDay,
}

/// Object key layout for archives
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyLayout {
    /// `<prefix>/<archive>`
    #[default]
    Flat,
    /// `<prefix>/<name>/<YYYY>/<Mon>/<DD>/<archive>`
    Dated,
}

/// Tarball of a directory
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryJob {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
    pub source: PathBuf,
    #[serde(default)]
    pub excludes: Vec<String>,
    pub prefix: String,
    #[serde(default)]
    pub naming: ArchiveNaming,
    #[serde(default)]
    pub key_layout: KeyLayout,
    #[serde(default)]
    pub cleanup: CleanupPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Dump of every accessible MongoDB database
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MongoJob {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    #[serde(default = "default_auth_database")]
    pub auth_database: String,
    #[serde(default = "default_mongo_host")]
    pub host: String,
    #[serde(default = "default_mongo_port")]
    pub port: u16,
    /// Databases never dumped (e.g. "local")
    #[serde(default)]
    pub skip_databases: Vec<String>,
    pub prefix: String,
    #[serde(default)]
    pub cleanup: CleanupPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

// Default value functions

fn default_work_dir() -> PathBuf { PathBuf::from("~") }
fn default_schedule() -> String { "0 1 * * *".to_string() }
fn default_log_directory() -> PathBuf { PathBuf::from("~/logs") }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
fn default_enabled() -> bool { true }
fn default_notify_on() -> Vec<NotifyEvent> {
    vec![NotifyEvent::Failure]
}
fn default_auth_database() -> String { "admin".to_string() }
fn default_mongo_host() -> String { "localhost".to_string() }
fn default_mongo_port() -> u16 { 27017 }
