//! Tests for the run lock that keeps two runs from overlapping

use bucket_backup::utils::locker;
use bucket_backup::{BackupManager, RunOptions};
use serial_test::serial;
use std::sync::Arc;
use test_utils::{fixed_now, ConfigBuilder, MockExecutor, MockObjectStore};

#[test]
fn test_run_refused_while_lock_held() {
    let (config, temp) = ConfigBuilder::minimal().persist();
    let lock = temp.path().join("run.lock");
    let store = MockObjectStore::new();

    let manager = BackupManager::new(config, Arc::new(MockExecutor::new()), Arc::new(store.clone()))
        .with_clock(fixed_now())
        .with_lock_path(&lock);

    let inner = locker::with_lock_file(&lock, || manager.run(&RunOptions::default())).unwrap();

    assert!(inner.is_err());
    assert_eq!(store.call_count(), 0);
}

#[test]
#[serial]
fn test_default_lock_reused_across_runs() {
    let path = locker::lock_path("run");

    for _ in 0..2 {
        let (config, _temp) = ConfigBuilder::minimal().persist();
        let manager = BackupManager::new(config, Arc::new(MockExecutor::new()), Arc::new(MockObjectStore::new()))
            .with_clock(fixed_now());

        // Consecutive runs both get the lock; the file stays for the next one
        assert!(manager.run(&RunOptions { skip_jobs: true, ..Default::default() }).is_ok());
        assert!(path.exists());
    }
}
