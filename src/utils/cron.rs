//! Cron job management utilities

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Comment line that precedes the managed crontab entry
const CRON_MARKER: &str = "# bucket-backup - nightly run";

/// Get the path to the bucket-backup binary
pub fn get_binary_path() -> Result<PathBuf> {
    env::current_exe().context("Failed to get current executable path")
}

/// Get the current crontab
pub fn get_crontab() -> Result<String> {
    let output = Command::new("crontab")
        .arg("-l")
        .output()
        .context("Failed to execute crontab -l")?;

    if !output.status.success() {
        // Empty crontab returns non-zero, check stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab") {
            return Ok(String::new());
        }
        anyhow::bail!("Failed to read crontab: {}", stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Set the crontab content
pub fn set_crontab(content: &str) -> Result<()> {
    use std::io::Write;

    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .context("Failed to spawn crontab")?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(content.as_bytes())
            .context("Failed to write to crontab stdin")?;
    } else {
        anyhow::bail!("Failed to open crontab stdin");
    }

    let output = child.wait_with_output()
        .context("Failed to wait for crontab")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Crontab command failed: {}", stderr);
    }

    info!("Crontab updated successfully");
    Ok(())
}

/// Build the two-line crontab entry (marker + job)
pub fn build_cron_entry(schedule: &str, binary: &Path, config_path: &Path, log_dir: &Path) -> String {
    format!(
        "{}\n{} {} --config {} run >> {} 2>&1",
        CRON_MARKER,
        schedule,
        binary.display(),
        config_path.display(),
        log_dir.join("cron.log").display()
    )
}

/// Drop the managed entry (marker line and the line after it) from a crontab
pub fn strip_managed_entry(existing: &str) -> String {
    let mut kept = Vec::new();
    let mut skip_next = false;

    for line in existing.lines() {
        if line.trim() == CRON_MARKER {
            skip_next = true;
            continue;
        }
        if skip_next {
            skip_next = false;
            continue;
        }
        kept.push(line);
    }

    if kept.is_empty() {
        String::new()
    } else {
        kept.join("\n") + "\n"
    }
}

/// Install (or replace) the cron job that runs all backups
pub fn install_cron_job(schedule: &str, config_path: &Path, log_dir: &Path, dry_run: bool) -> Result<()> {
    let binary_path = get_binary_path()?;
    let entry = build_cron_entry(schedule, &binary_path, config_path, log_dir);

    if dry_run {
        println!("  [DRY RUN] Would add cron job:");
        println!("    {}", entry.replace('\n', "\n    "));
        return Ok(());
    }

    let existing = get_crontab()?;
    if existing.contains(CRON_MARKER) {
        warn!("Cron job already exists, updating...");
    }

    let new_content = strip_managed_entry(&existing) + &entry + "\n";
    set_crontab(&new_content)?;

    info!("Installed cron job: {}", schedule);
    Ok(())
}

/// Remove the managed cron job
pub fn remove_cron_job() -> Result<()> {
    let existing = get_crontab()?;

    if !existing.contains(CRON_MARKER) {
        warn!("No bucket-backup cron job found");
        return Ok(());
    }

    set_crontab(&strip_managed_entry(&existing))?;

    info!("Removed bucket-backup cron job");
    Ok(())
}
