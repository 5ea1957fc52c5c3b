//! Backup manager - orchestrates a backup run
//!
//! A run uploads prior-day log files for every enabled log set, then builds,
//! uploads and cleans up one archive per enabled job. Every item is
//! best-effort: a failure is logged, counted and reported, never fatal.

use crate::config::{expand_tilde, find_job, CleanupPolicy, Config, JobConfig, LogSetConfig};
use crate::managers::notification::NotificationManager;
use crate::strategies::{strategy_for, ArchiveContext};
use crate::utils::cleanup::{clean_up, remove_if_empty};
use crate::utils::dates::{run_timestamp, PriorDay};
use crate::utils::executor::CommandExecutor;
use crate::utils::locker;
use crate::utils::scanner::scan_log_set;
use crate::utils::storage::{upload_to_key, ObjectStore};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// What a run should cover
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only this job (log sets are still uploaded unless `skip_logs`)
    pub job: Option<String>,
    /// Do not upload prior-day log files
    pub skip_logs: bool,
    /// Do not run archive jobs
    pub skip_jobs: bool,
}

/// Outcome counts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files uploaded successfully
    pub uploaded: usize,
    /// Items that failed (archive missing or upload rejected)
    pub failed: usize,
    /// Disabled log sets and jobs
    pub skipped: usize,
    /// One line per failure, `<subject>: <reason>`
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    fn record_failure(&mut self, subject: &str, reason: impl Into<String>) {
        self.failed += 1;
        self.failures.push(format!("{}: {}", subject, reason.into()));
    }

    fn merge(&mut self, other: RunSummary) {
        self.uploaded += other.uploaded;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

pub struct BackupManager {
    config: Config,
    executor: Arc<dyn CommandExecutor>,
    store: Arc<dyn ObjectStore>,
    notification_manager: Option<NotificationManager>,
    lock_path: PathBuf,
    clock: Option<NaiveDateTime>,
}

impl BackupManager {
    /// Create new backup manager
    pub fn new(
        config: Config,
        executor: Arc<dyn CommandExecutor>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        // Create notification manager if webhook URL is configured
        let notification_manager = if !config.notifications.discord_webhook_url.is_empty() {
            Some(NotificationManager::new(config.notifications.clone()))
        } else {
            None
        };

        Self {
            config,
            executor,
            store,
            notification_manager,
            lock_path: locker::lock_path("run"),
            clock: None,
        }
    }

    /// Pin the wall clock (archive names, prior day) to `now`
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    /// Use a different run lock file
    pub fn with_lock_path(mut self, path: &Path) -> Self {
        self.lock_path = path.to_path_buf();
        self
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.unwrap_or_else(|| Local::now().naive_local())
    }

    fn bucket(&self) -> &str {
        &self.config.storage.bucket
    }

    /// Send a failure notification (if manager is configured)
    fn notify_failure(&self, subject: &str, error: &str, duration_secs: u64) {
        if let Some(ref manager) = self.notification_manager {
            if let Err(e) = manager.send_failure(subject, error, Some(duration_secs)) {
                warn!("Failed to send failure notification: {}", e);
            }
        }
    }

    /// Send a success notification (if manager is configured)
    fn notify_success(&self, summary: &RunSummary, duration_secs: u64) {
        if let Some(ref manager) = self.notification_manager {
            let message = format!("Backup run complete: {} file(s) uploaded", summary.uploaded);
            if let Err(e) = manager.send_success("run", &message, duration_secs) {
                warn!("Failed to send success notification: {}", e);
            }
        }
    }

    /// Run a full backup while holding the run lock
    pub fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        locker::with_lock_file(&self.lock_path, || self.run_unlocked(options))?
    }

    fn run_unlocked(&self, options: &RunOptions) -> Result<RunSummary> {
        let start_time = Instant::now();
        let now = self.now();

        // Resolve the job selection before doing any work
        let jobs: Vec<(&str, &JobConfig)> = match options.job {
            Some(ref name) => vec![(name.as_str(), find_job(&self.config, name)?)],
            None => self
                .config
                .jobs
                .iter()
                .map(|(name, job)| (name.as_str(), job))
                .collect(),
        };

        info!("Starting backup run to bucket '{}'", self.bucket());

        let mut summary = RunSummary::default();

        if !options.skip_logs {
            summary.merge(self.upload_logs_for(&PriorDay::before(now)));
        }

        if !options.skip_jobs && !jobs.is_empty() {
            summary.merge(self.run_jobs(&jobs, now));
        }

        let duration = start_time.elapsed();
        info!(
            "Backup summary: {} uploaded, {} failed, {} skipped ({:.2}s)",
            summary.uploaded,
            summary.failed,
            summary.skipped,
            duration.as_secs_f64()
        );

        if summary.has_failures() {
            for failure in &summary.failures {
                error!("Failed: {}", failure);
            }
        } else {
            self.notify_success(&summary, duration.as_secs());
        }

        Ok(summary)
    }

    /// Upload prior-day log files of every enabled log set
    fn upload_logs_for(&self, day: &PriorDay) -> RunSummary {
        let mut summary = RunSummary::default();

        info!("Uploading log files for {}", day.dashed());

        for (name, set) in &self.config.log_sets {
            if !set.enabled {
                info!("Log set '{}' is disabled, skipping", name);
                summary.skipped += 1;
                continue;
            }
            summary.merge(self.upload_log_set(name, set, day));
        }

        summary
    }

    /// Upload the prior-day files of one log set
    pub fn upload_log_set(&self, name: &str, set: &LogSetConfig, day: &PriorDay) -> RunSummary {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        let uploads = scan_log_set(set, day);
        info!("Log set '{}': {} file(s) selected", name, uploads.len());

        for upload in uploads {
            if upload_to_key(self.store.as_ref(), &upload.local_path, self.bucket(), &upload.key) {
                summary.uploaded += 1;
            } else {
                summary.record_failure(name, format!("upload of {:?} failed", upload.local_path));
            }
        }

        if summary.has_failures() {
            self.notify_failure(
                name,
                &format!("{} log file(s) failed to upload", summary.failed),
                start_time.elapsed().as_secs(),
            );
        }

        summary
    }

    /// Run the given jobs inside a fresh per-run backup directory
    fn run_jobs(&self, jobs: &[(&str, &JobConfig)], now: NaiveDateTime) -> RunSummary {
        let mut summary = RunSummary::default();

        let backup_dir = expand_tilde(&self.config.global.work_dir)
            .join(format!("backup_{}", run_timestamp(now)));

        if let Err(e) = fs::create_dir_all(&backup_dir) {
            error!("Failed to create backup directory {:?}: {}", backup_dir, e);
            for (name, job) in jobs {
                if job.enabled() {
                    summary.record_failure(name, "backup directory unavailable");
                }
            }
            return summary;
        }

        info!("Using backup directory: {:?}", backup_dir);

        for (name, job) in jobs {
            if !job.enabled() {
                info!("Job '{}' is disabled, skipping", name);
                summary.skipped += 1;
                continue;
            }

            let start_time = Instant::now();
            match self.run_job(name, job, &backup_dir, now) {
                Ok(()) => summary.uploaded += 1,
                Err(e) => {
                    let reason = format!("{:#}", e);
                    error!("Job '{}' failed: {}", name, reason);
                    self.notify_failure(name, &reason, start_time.elapsed().as_secs());
                    summary.record_failure(name, reason);
                }
            }
        }

        remove_if_empty(&backup_dir);
        summary
    }

    /// Build, upload and clean up the archive of one job
    fn run_job(&self, name: &str, job: &JobConfig, backup_dir: &Path, now: NaiveDateTime) -> Result<()> {
        info!("Starting {} job '{}'", job.kind(), name);

        let strategy = strategy_for(job, &self.config)
            .context(format!("Failed to prepare job '{}'", name))?;

        let timeout = job
            .timeout_seconds()
            .or(self.config.global.command_timeout_seconds)
            .map(Duration::from_secs);

        let ctx = ArchiveContext {
            backup_dir,
            now,
            timeout,
            executor: self.executor.as_ref(),
        };

        let archive = strategy
            .create_archive(&ctx)
            .context(format!("{} strategy produced no archive", strategy.name()))?;

        let key = strategy.object_key(job.prefix(), &archive, now);
        let uploaded = upload_to_key(self.store.as_ref(), &archive, self.bucket(), &key);

        if uploaded || job.cleanup() == CleanupPolicy::Always {
            clean_up(&[&archive]);
        } else {
            warn!("Keeping local archive after failed upload: {:?}", archive);
        }

        if !uploaded {
            anyhow::bail!("upload of {:?} to s3://{}/{} failed", archive, self.bucket(), key);
        }

        info!("Job '{}' complete", name);
        Ok(())
    }
}
