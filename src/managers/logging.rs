//! Run logging
//!
//! A run writes to two places: stderr at INFO, and a daily file
//! `bucket-backup.log.YYYY-MM-DD` under `global.log_directory` at the
//! configured level. Dependencies (AWS SDK, hyper, reqwest) stay at WARN in
//! both unless `RUST_LOG` says otherwise.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// File name prefix given to the rolling appender; it appends `.YYYY-MM-DD`
const LOG_FILE_NAME: &str = "bucket-backup.log";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_directory: PathBuf,
    /// Level for this crate's events in the log file
    pub log_level: Level,
    /// Daily files kept, including today's
    pub max_files: u32,
}

impl LoggingConfig {
    /// Build from the `[global]` values; unknown levels mean INFO
    pub fn from_config(log_directory: &Path, log_level: &str, max_files: u32) -> Self {
        let log_level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        Self {
            log_directory: log_directory.to_path_buf(),
            log_level,
            max_files,
        }
    }
}

/// Keeps the non-blocking file writer alive; dropping it flushes the file
pub struct LogGuard {
    file_guard: Option<WorkerGuard>,
}

impl LogGuard {
    /// Whether events are also going to a log file
    pub fn has_file(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Install console and file logging for a run
///
/// A log directory that cannot be created never stops a backup: logging
/// falls back to the console and the problem is reported as a warning.
pub fn init_logging(config: &LoggingConfig) -> LogGuard {
    let log_dir = crate::config::expand_tilde(&config.log_directory);

    if let Err(e) = fs::create_dir_all(&log_dir) {
        init_console_logging();
        tracing::warn!(
            "Cannot create log directory {:?} ({}), logging to console only",
            log_dir,
            e
        );
        return LogGuard { file_guard: None };
    }

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);
    let (writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(crate_filter(config.log_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(crate_filter(Level::INFO));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .ok();

    let removed = prune_old_logs(&log_dir, config.max_files);
    if removed > 0 {
        tracing::debug!("Pruned {} old log file(s) in {:?}", removed, log_dir);
    }

    LogGuard {
        file_guard: Some(file_guard),
    }
}

/// Console-only logging for commands that run without a log directory
pub fn init_console_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(crate_directives(Level::INFO)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}

/// `warn` for everything, `level` for this crate
fn crate_directives(level: Level) -> String {
    format!("warn,bucket_backup={}", level)
}

fn crate_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(crate_directives(level)))
}

/// Daily log files written by this tool, newest first
///
/// The date suffix sorts lexically, so no metadata is needed.
fn rotated_log_files(log_dir: &Path) -> Vec<PathBuf> {
    let prefix = format!("{}.", LOG_FILE_NAME);
    let mut files: Vec<PathBuf> = match fs::read_dir(log_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect(),
        Err(e) => {
            tracing::warn!("Cannot list log directory {:?}: {}", log_dir, e);
            return Vec::new();
        }
    };

    files.sort_unstable_by(|a, b| b.cmp(a));
    files
}

/// Delete daily files beyond the newest `max_files`; returns how many went
fn prune_old_logs(log_dir: &Path, max_files: u32) -> usize {
    let mut removed = 0;
    for path in rotated_log_files(log_dir).into_iter().skip(max_files as usize) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }
    removed
}
