//! Fluent API for building test configurations
//!
//! Every builder owns a temporary directory holding the work dir, the log
//! directory and any job sources or password files it creates.

use bucket_backup::config::{
    ArchiveNaming, CleanupPolicy, Config, DirectoryJob, GlobalConfig, JobConfig, KeyLayout,
    LogSetConfig, MatchMode, MongoJob, NotificationConfig, StorageConfig,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    global: GlobalConfig,
    storage: StorageConfig,
    notifications: NotificationConfig,
    log_sets: BTreeMap<String, LogSetConfig>,
    jobs: BTreeMap<String, JobConfig>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder with no log sets or jobs
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let work_dir = temp_dir.path().join("work");
        fs::create_dir_all(&work_dir).expect("Failed to create work_dir");

        let log_directory = temp_dir.path().join("logs");
        fs::create_dir_all(&log_directory).expect("Failed to create log_directory");

        let global = GlobalConfig {
            work_dir,
            command_timeout_seconds: None,
            schedule: "0 1 * * *".to_string(),
            log_directory,
            log_level: "info".to_string(),
            log_max_files: 5,
            default_excludes: vec![],
        };

        Self {
            temp_dir,
            global,
            storage: StorageConfig {
                bucket: "test-bucket".to_string(),
                region: None,
                endpoint_url: None,
            },
            notifications: NotificationConfig::default(),
            log_sets: BTreeMap::new(),
            jobs: BTreeMap::new(),
        }
    }

    /// Create a config with one directory job, valid as-is
    pub fn minimal() -> Self {
        Self::new().add_directory_job("app")
    }

    /// Get the temp directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Set the target bucket
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.storage.bucket = bucket.to_string();
        self
    }

    /// Set the cron schedule
    pub fn with_schedule(mut self, schedule: &str) -> Self {
        self.global.schedule = schedule.to_string();
        self
    }

    /// Set the command timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.global.command_timeout_seconds = Some(seconds);
        self
    }

    /// Set the global exclude patterns
    pub fn with_default_excludes(mut self, excludes: &[&str]) -> Self {
        self.global.default_excludes = excludes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Create `data/<name>` with a file in it and add a directory job for it
    pub fn add_directory_job(self, name: &str) -> Self {
        let source = self.temp_dir.path().join("data").join(format!("{}_data", name));
        fs::create_dir_all(&source).expect("Failed to create job source");
        fs::write(source.join("database.sqlite"), b"sqlite").expect("Failed to write source file");

        self.add_directory_job_for(name, &source)
    }

    /// Add a directory job archiving `source`
    pub fn add_directory_job_for(mut self, name: &str, source: &Path) -> Self {
        self.jobs.insert(
            name.to_string(),
            JobConfig::Directory(DirectoryJob {
                enabled: true,
                description: format!("Test job: {}", name),
                source: source.to_path_buf(),
                excludes: vec![],
                prefix: format!("{}_backups/", name),
                naming: ArchiveNaming::Timestamped,
                key_layout: KeyLayout::Flat,
                cleanup: CleanupPolicy::OnSuccess,
                timeout_seconds: None,
            }),
        );
        self
    }

    /// Add a disabled directory job
    pub fn add_disabled_directory_job(self, name: &str) -> Self {
        let mut builder = self.add_directory_job(name);
        if let Some(JobConfig::Directory(job)) = builder.jobs.get_mut(name) {
            job.enabled = false;
        }
        builder
    }

    /// Add a MongoDB job whose password lives in a file
    pub fn add_mongo_job(mut self, name: &str) -> Self {
        let password_file = self.password_file(name);
        fs::write(&password_file, "mongo-secret\n").expect("Failed to write password file");

        self.jobs.insert(
            name.to_string(),
            JobConfig::Mongodb(MongoJob {
                enabled: true,
                description: String::new(),
                username: "backup".to_string(),
                password: None,
                password_file: Some(password_file),
                auth_database: "admin".to_string(),
                host: "localhost".to_string(),
                port: 27017,
                skip_databases: vec!["local".to_string(), "config".to_string()],
                prefix: "mongo_backups/".to_string(),
                cleanup: CleanupPolicy::OnSuccess,
                timeout_seconds: None,
            }),
        );
        self
    }

    /// Add a job with custom settings
    pub fn add_job(mut self, name: &str, job: JobConfig) -> Self {
        self.jobs.insert(name.to_string(), job);
        self
    }

    /// Add a log set scanning `subdirs` of `base`, keys relative to `base`
    pub fn add_log_set(mut self, name: &str, base: &Path, subdirs: &[&str]) -> Self {
        self.log_sets.insert(
            name.to_string(),
            LogSetConfig {
                enabled: true,
                base: base.to_path_buf(),
                relative_to: None,
                subdirs: subdirs.iter().map(|s| s.to_string()).collect(),
                prefix: "wazuh_logs/".to_string(),
                match_mode: MatchMode::Structured,
            },
        );
        self
    }

    /// Add a log set with custom settings
    pub fn add_log_set_config(mut self, name: &str, set: LogSetConfig) -> Self {
        self.log_sets.insert(name.to_string(), set);
        self
    }

    /// Configure a Discord webhook
    pub fn with_webhook(mut self, url: &str) -> Self {
        self.notifications.discord_webhook_url = url.to_string();
        self
    }

    /// Path of the password file used for MongoDB job `name`
    pub fn password_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(format!("{}-password", name))
    }

    /// Build the configuration, dropping the temp directory
    ///
    /// Paths in the result no longer exist; use `persist` when they must.
    pub fn build(self) -> Config {
        self.persist().0
    }

    /// Build the configuration and keep the temp directory alive
    pub fn persist(self) -> (Config, TempDir) {
        let config = Config {
            global: self.global,
            storage: self.storage,
            notifications: self.notifications,
            log_sets: self.log_sets,
            jobs: self.jobs,
        };
        (config, self.temp_dir)
    }

    /// Persist and write the configuration to `config.toml` in the temp directory
    pub fn write(self) -> (PathBuf, Config, TempDir) {
        let (config, temp_dir) = self.persist();
        let path = temp_dir.path().join("config.toml");
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize config");
        fs::write(&path, toml_str).expect("Failed to write config");
        (path, config, temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
