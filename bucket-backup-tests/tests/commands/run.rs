//! Tests for the 'run' command

use bucket_backup::config::{CleanupPolicy, Config, JobConfig};
use bucket_backup::{BackupManager, RunOptions};
use std::path::Path;
use std::sync::Arc;
use test_utils::{
    fixed_now, wazuh_expected_keys, wazuh_log_tree, ConfigBuilder, MockExecutor, MockObjectStore,
    MockResponse, ResultAssertions,
};

const RUN_DIR: &str = "work/backup_20240108_013000";

fn manager(config: Config, temp: &Path, executor: MockExecutor, store: MockObjectStore) -> BackupManager {
    BackupManager::new(config, Arc::new(executor), Arc::new(store))
        .with_clock(fixed_now())
        .with_lock_path(&temp.join("run.lock"))
}

#[test]
fn test_run_uploads_logs_then_archives() {
    let builder = ConfigBuilder::new();
    let ossec = builder.temp_dir().join("ossec");
    wazuh_log_tree(&ossec);

    let (config, temp) = builder
        .add_log_set("wazuh", &ossec, &["logs/alerts", "logs/archives", "logs/api"])
        .add_directory_job("n8n")
        .add_mongo_job("mongo")
        .persist();

    let executor = MockExecutor::new()
        .expect("mongosh", MockResponse::stdout("admin\nn8n\n"))
        .touching_archives();
    let store = MockObjectStore::new();

    let summary = manager(config, temp.path(), executor.clone(), store.clone())
        .run(&RunOptions::default())
        .assert_ok();

    assert_eq!(summary.uploaded, 4 + 2);
    assert!(!summary.has_failures());

    let keys = store.keys();
    // Log files come first
    let mut log_keys = keys[..4].to_vec();
    log_keys.sort();
    assert_eq!(log_keys, wazuh_expected_keys());
    assert_eq!(keys[4], "mongo_backups/mongo_dump_20240108_013000.tar.gz");
    assert_eq!(keys[5], "n8n_backups/n8n_data_backup_20240108_013000.tar.gz");

    assert!(store.get_calls().iter().all(|c| c.bucket == "test-bucket"));
    assert_eq!(executor.call_count("tar"), 2);

    // Archives and the empty run directory are gone
    assert!(!temp.path().join(RUN_DIR).exists());
}

#[test]
fn test_run_single_job() {
    let (config, temp) = ConfigBuilder::new()
        .add_directory_job("n8n")
        .add_directory_job("grafana")
        .persist();
    let store = MockObjectStore::new();

    let options = RunOptions {
        job: Some("grafana".to_string()),
        skip_logs: true,
        ..Default::default()
    };
    let summary = manager(config, temp.path(), MockExecutor::new().touching_archives(), store.clone())
        .run(&options)
        .assert_ok();

    assert_eq!(summary.uploaded, 1);
    assert_eq!(store.keys(), vec!["grafana_backups/grafana_data_backup_20240108_013000.tar.gz"]);
}

#[test]
fn test_run_unknown_job_does_nothing() {
    let (config, temp) = ConfigBuilder::minimal().persist();
    let executor = MockExecutor::new();
    let store = MockObjectStore::new();

    let options = RunOptions {
        job: Some("postgres".to_string()),
        ..Default::default()
    };
    manager(config, temp.path(), executor.clone(), store.clone())
        .run(&options)
        .assert_err_contains("postgres");

    assert_eq!(store.call_count(), 0);
    assert!(executor.get_calls().is_empty());
}

#[test]
fn test_run_skips_disabled_jobs() {
    let (config, temp) = ConfigBuilder::new()
        .add_directory_job("n8n")
        .add_disabled_directory_job("old")
        .persist();
    let store = MockObjectStore::new();

    let summary = manager(config, temp.path(), MockExecutor::new().touching_archives(), store.clone())
        .run(&RunOptions::default())
        .assert_ok();

    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.skipped, 1);
    assert!(store.keys().iter().all(|k| !k.contains("old")));
}

#[test]
fn test_run_continues_after_job_failure() {
    let (config, temp) = ConfigBuilder::new()
        .add_directory_job("n8n")
        .add_mongo_job("mongo")
        .persist();
    let executor = MockExecutor::new()
        .expect("mongosh", MockResponse::failure("Authentication failed"))
        .touching_archives();
    let store = MockObjectStore::new();

    let summary = manager(config, temp.path(), executor.clone(), store.clone())
        .run(&RunOptions::default())
        .assert_ok();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.uploaded, 1);
    assert!(summary.failures[0].starts_with("mongo:"));
    assert!(!executor.was_called("mongodump"));
    assert_eq!(store.keys(), vec!["n8n_backups/n8n_data_backup_20240108_013000.tar.gz"]);
}

#[test]
fn test_failed_upload_keeps_archive() {
    let (config, temp) = ConfigBuilder::new().add_directory_job("n8n").persist();
    let store = MockObjectStore::new().with_failing_uploads();

    let summary = manager(config, temp.path(), MockExecutor::new().touching_archives(), store)
        .run(&RunOptions::default())
        .assert_ok();

    assert!(summary.has_failures());
    assert!(temp
        .path()
        .join(RUN_DIR)
        .join("n8n_data_backup_20240108_013000.tar.gz")
        .exists());
}

#[test]
fn test_failed_upload_with_always_cleanup_removes_archive() {
    let (mut config, temp) = ConfigBuilder::new().add_directory_job("n8n").persist();
    if let Some(JobConfig::Directory(job)) = config.jobs.get_mut("n8n") {
        job.cleanup = CleanupPolicy::Always;
    }
    let store = MockObjectStore::new().with_failing_uploads();

    let summary = manager(config, temp.path(), MockExecutor::new().touching_archives(), store)
        .run(&RunOptions::default())
        .assert_ok();

    assert_eq!(summary.failed, 1);
    assert!(!temp.path().join(RUN_DIR).exists());
}

#[test]
fn test_tar_warning_still_uploads() {
    let (config, temp) = ConfigBuilder::new().add_directory_job("n8n").persist();

    // tar exits non-zero (file changed while reading) but leaves an archive
    let run_dir = temp.path().join(RUN_DIR);
    std::fs::create_dir_all(&run_dir).unwrap();
    std::fs::write(run_dir.join("n8n_data_backup_20240108_013000.tar.gz"), b"partial").unwrap();

    let executor = MockExecutor::new().expect("tar", MockResponse::failure("file changed as we read it"));
    let store = MockObjectStore::new();

    let summary = manager(config, temp.path(), executor, store.clone())
        .run(&RunOptions::default())
        .assert_ok();

    assert_eq!(summary.uploaded, 1);
    assert_eq!(store.call_count(), 1);
}

#[test]
fn test_missing_archive_is_not_uploaded() {
    let (config, temp) = ConfigBuilder::new().add_directory_job("n8n").persist();
    // tar "succeeds" without writing anything
    let store = MockObjectStore::new();

    let summary = manager(config, temp.path(), MockExecutor::new(), store.clone())
        .run(&RunOptions::default())
        .assert_ok();

    assert_eq!(summary.failed, 1);
    assert_eq!(store.call_count(), 0);
}
