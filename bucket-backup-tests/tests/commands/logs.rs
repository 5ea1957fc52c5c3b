//! Tests for the 'logs' command (prior-day log upload only)

use bucket_backup::config::MatchMode;
use bucket_backup::{BackupManager, RunOptions};
use std::sync::Arc;
use test_utils::{
    fixed_now, wazuh_expected_keys, wazuh_log_tree, ConfigBuilder, LogSetConfig, MockExecutor,
    MockObjectStore, ResultAssertions,
};

fn logs_only() -> RunOptions {
    RunOptions {
        skip_jobs: true,
        ..Default::default()
    }
}

#[test]
fn test_logs_uploads_prior_day_files_only() {
    let builder = ConfigBuilder::new();
    let ossec = builder.temp_dir().join("ossec");
    wazuh_log_tree(&ossec);

    let (config, temp) = builder
        .add_log_set("wazuh", &ossec, &["logs/alerts", "logs/archives", "logs/api", "logs/cluster"])
        .add_directory_job("n8n")
        .persist();

    let executor = MockExecutor::new();
    let store = MockObjectStore::new();
    let summary = BackupManager::new(config, Arc::new(executor.clone()), Arc::new(store.clone()))
        .with_clock(fixed_now())
        .with_lock_path(&temp.path().join("run.lock"))
        .run(&logs_only())
        .assert_ok();

    assert_eq!(summary.uploaded, 4);
    let mut keys = store.keys();
    keys.sort();
    assert_eq!(keys, wazuh_expected_keys());

    // Jobs untouched, source logs left in place
    assert!(executor.get_calls().is_empty());
    assert!(ossec.join("logs/api/2024/Jan/api-07.log.gz").exists());
}

#[test]
fn test_logs_counts_each_failed_file() {
    let builder = ConfigBuilder::new();
    let ossec = builder.temp_dir().join("ossec");
    wazuh_log_tree(&ossec);

    let (config, temp) = builder
        .add_log_set("wazuh", &ossec, &["logs/alerts", "logs/api"])
        .persist();

    let store = MockObjectStore::new().failing_key("alerts");
    let summary = BackupManager::new(config, Arc::new(MockExecutor::new()), Arc::new(store.clone()))
        .with_clock(fixed_now())
        .with_lock_path(&temp.path().join("run.lock"))
        .run(&logs_only())
        .assert_ok();

    // Both alert files attempted and failed, the api file still went up
    assert_eq!(store.call_count(), 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.uploaded, 1);
}

#[test]
fn test_disabled_log_set_is_skipped() {
    let builder = ConfigBuilder::new();
    let ossec = builder.temp_dir().join("ossec");
    wazuh_log_tree(&ossec);

    let set = LogSetConfig {
        enabled: false,
        base: ossec.clone(),
        relative_to: None,
        subdirs: vec!["logs/alerts".to_string()],
        prefix: "wazuh_logs/".to_string(),
        match_mode: MatchMode::Substring,
    };
    let (config, temp) = builder.add_log_set_config("wazuh", set).persist();

    let store = MockObjectStore::new();
    let summary = BackupManager::new(config, Arc::new(MockExecutor::new()), Arc::new(store.clone()))
        .with_clock(fixed_now())
        .with_lock_path(&temp.path().join("run.lock"))
        .run(&logs_only())
        .assert_ok();

    assert_eq!(summary.skipped, 1);
    assert_eq!(store.call_count(), 0);
}
