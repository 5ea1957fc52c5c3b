//! tar invocation helpers

use super::executor::CommandExecutor;
use crate::config::ArchiveNaming;
use crate::utils::dates::{run_timestamp, PriorDay};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::Path;
use std::time::Duration;

/// One `tar czf` invocation
#[derive(Debug, Clone)]
pub struct TarRequest<'a> {
    /// Output archive path
    pub archive: &'a Path,
    /// Directory tar changes into (`-C`)
    pub working_dir: &'a Path,
    /// Entry archived, relative to `working_dir`
    pub entry: &'a str,
    /// Glob patterns, one `--exclude=` flag each
    pub excludes: &'a [String],
    /// Pass `--ignore-failed-read`
    pub ignore_failed_read: bool,
}

/// Build the tar argument list
///
/// Exclude flags precede `-C` and the entry so that they apply to it.
pub fn tar_args(request: &TarRequest<'_>) -> Vec<String> {
    let mut args = vec!["czf".to_string(), request.archive.display().to_string()];

    for pattern in request.excludes {
        args.push(format!("--exclude={}", pattern));
    }

    args.push("-C".to_string());
    args.push(request.working_dir.display().to_string());
    args.push(request.entry.to_string());

    if request.ignore_failed_read {
        args.push("--ignore-failed-read".to_string());
    }
    args.push("--warning=no-file-changed".to_string());

    args
}

/// Run tar for `request`; a non-zero exit is returned as an error
pub fn create_tarball(
    executor: &dyn CommandExecutor,
    request: &TarRequest<'_>,
    timeout: Option<Duration>,
) -> Result<()> {
    let args = tar_args(request);
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    executor.run_command("tar", &arg_refs, None, timeout)?;
    Ok(())
}

/// Archive file name for a source named `source_name`
pub fn archive_file_name(source_name: &str, naming: ArchiveNaming, now: NaiveDateTime) -> String {
    match naming {
        ArchiveNaming::Timestamped => {
            format!("{}_backup_{}.tar.gz", source_name, run_timestamp(now))
        }
        ArchiveNaming::PriorDay => {
            format!("{}-backup-{}.tar.gz", source_name, PriorDay::before(now).dashed())
        }
    }
}
