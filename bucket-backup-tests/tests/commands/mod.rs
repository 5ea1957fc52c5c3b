//! Command tests for bucket-backup
//!
//! These tests drive `BackupManager` the way the `run` and `logs` commands do,
//! with a mocked command executor and object store.

mod lock;
mod logs;
mod run;
