//! Prior-day log file selection
//!
//! Walks the subdirectories of a log set and keeps files that belong to the
//! previous calendar day. Two matching modes exist:
//!
//! - `Structured`: the directory path (relative to the subdirectory) must
//!   contain a component equal to the year and one equal to the month
//!   abbreviation, and the file name's first two-digit `-` token must be the day.
//! - `Substring`: the directory path contains the year and month strings
//!   anywhere, and the file name contains `-DD.` or `-DD-`.

use crate::config::{LogSetConfig, MatchMode};
use crate::utils::dates::PriorDay;
use crate::utils::storage::join_key;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A selected log file and its destination key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogUpload {
    pub local_path: PathBuf,
    pub key: String,
}

/// Decide whether a file belongs to `day`
///
/// `dir` is the directory holding the file; for structured matching it should
/// be relative to the scanned subdirectory so that parent paths cannot match.
pub fn matches_prior_day(dir: &Path, file_name: &str, day: &PriorDay, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Substring => {
            let dir_str = dir.to_string_lossy();
            if !dir_str.contains(&day.year) || !dir_str.contains(&day.month) {
                return false;
            }
            file_name.contains(&format!("-{}.", day.day))
                || file_name.contains(&format!("-{}-", day.day))
        }
        MatchMode::Structured => {
            let components: Vec<_> = dir
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy()),
                    _ => None,
                })
                .collect();

            let has_year = components.iter().any(|c| *c == day.year);
            let has_month = components.iter().any(|c| *c == day.month);
            if !has_year || !has_month {
                return false;
            }

            day_token(file_name) == Some(day.day.as_str())
        }
    }
}

/// First `-`-delimited token of a file name consisting of exactly two digits
fn day_token(file_name: &str) -> Option<&str> {
    file_name
        .split('-')
        .skip(1)
        .map(|segment| segment.split('.').next().unwrap_or(segment))
        .find(|head| head.len() == 2 && head.bytes().all(|b| b.is_ascii_digit()))
}

/// Collect every prior-day file below `root`, sorted by path
pub fn select_prior_day_files(root: &Path, day: &PriorDay, mode: MatchMode) -> Vec<PathBuf> {
    let mut selected = Vec::new();

    for entry in WalkDir::new(root).into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let parent = path.parent().unwrap_or(root);
        let dir = match mode {
            MatchMode::Structured => parent.strip_prefix(root).unwrap_or(parent),
            MatchMode::Substring => parent,
        };
        let file_name = entry.file_name().to_string_lossy();

        if matches_prior_day(dir, &file_name, day, mode) {
            debug!("Selected log file: {:?}", path);
            selected.push(path.to_path_buf());
        }
    }

    selected.sort();
    selected
}

/// Scan all subdirectories of a log set and compute destination keys
///
/// Missing subdirectories are logged and skipped.
pub fn scan_log_set(set: &LogSetConfig, day: &PriorDay) -> Vec<LogUpload> {
    let base = crate::config::expand_tilde(&set.base);
    let key_root = crate::config::expand_tilde(set.key_root());
    let mut uploads = Vec::new();

    for subdir in &set.subdirs {
        let local_dir = base.join(subdir);
        if !local_dir.is_dir() {
            warn!("Skipping missing log directory: {:?}", local_dir);
            continue;
        }

        info!("Scanning log directory: {:?}", local_dir);

        for path in select_prior_day_files(&local_dir, day, set.match_mode) {
            let relative = path.strip_prefix(&key_root).unwrap_or(&path);
            let key = join_key(&set.prefix, &relative.to_string_lossy());
            uploads.push(LogUpload {
                local_path: path,
                key,
            });
        }
    }

    uploads
}
