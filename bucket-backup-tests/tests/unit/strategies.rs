//! Unit tests for archive strategies driven through a job configuration

use bucket_backup::config::{ArchiveNaming, JobConfig, KeyLayout};
use bucket_backup::strategies::{strategy_for, ArchiveContext};
use test_utils::{fixed_now, ConfigBuilder, MockExecutor, MockResponse, OptionAssertions};

#[test]
fn test_directory_job_tar_invocation() {
    let (config, temp) = ConfigBuilder::new()
        .with_default_excludes(&["*.tmp"])
        .add_directory_job("n8n")
        .persist();
    let executor = MockExecutor::new();
    let backup_dir = temp.path().join("work");

    let strategy = strategy_for(&config.jobs["n8n"], &config).unwrap();
    let archive = strategy
        .create_archive(&ArchiveContext {
            backup_dir: &backup_dir,
            now: fixed_now(),
            timeout: None,
            executor: &executor,
        })
        .assert_some();

    assert_eq!(archive, backup_dir.join("n8n_data_backup_20240108_013000.tar.gz"));

    let calls = executor.calls_to("tar");
    assert_eq!(calls.len(), 1);
    let args = &calls[0].args;
    assert_eq!(args[0], "czf");
    assert_eq!(args[1], archive.display().to_string());
    assert_eq!(args[2], "--exclude=*.tmp");

    let c = args.iter().position(|a| a == "-C").unwrap();
    assert_eq!(args[c + 1], temp.path().join("data").display().to_string());
    assert_eq!(args[c + 2], "n8n_data");
}

#[test]
fn test_prior_day_naming_with_dated_keys() {
    let builder = ConfigBuilder::new().add_directory_job("grafana");
    let (mut config, temp) = builder.persist();
    if let Some(JobConfig::Directory(job)) = config.jobs.get_mut("grafana") {
        job.naming = ArchiveNaming::PriorDay;
        job.key_layout = KeyLayout::Dated;
    }

    let executor = MockExecutor::new();
    let backup_dir = temp.path().join("work");
    let strategy = strategy_for(&config.jobs["grafana"], &config).unwrap();

    let archive = strategy
        .create_archive(&ArchiveContext {
            backup_dir: &backup_dir,
            now: fixed_now(),
            timeout: None,
            executor: &executor,
        })
        .assert_some();

    assert_eq!(
        archive.file_name().unwrap().to_string_lossy(),
        "grafana_data-backup-2024-Jan-07.tar.gz"
    );
    assert_eq!(
        strategy.object_key("grafana_backups/", &archive, fixed_now()),
        "grafana_backups/grafana_data/2024/Jan/07/grafana_data-backup-2024-Jan-07.tar.gz"
    );
}

#[test]
fn test_missing_source_produces_nothing() {
    let (config, temp) = ConfigBuilder::new()
        .add_directory_job_for("gone", std::path::Path::new("/nonexistent/gone_data"))
        .persist();
    let executor = MockExecutor::new();
    let backup_dir = temp.path().join("work");

    let strategy = strategy_for(&config.jobs["gone"], &config).unwrap();
    strategy
        .create_archive(&ArchiveContext {
            backup_dir: &backup_dir,
            now: fixed_now(),
            timeout: None,
            executor: &executor,
        })
        .assert_none();

    assert!(!executor.was_called("tar"));
}

#[test]
fn test_mongo_job_uses_password_file_and_skips_databases() {
    let (config, temp) = ConfigBuilder::new().add_mongo_job("mongo").persist();
    let executor = MockExecutor::new()
        .expect("mongosh", MockResponse::stdout("admin\nconfig\nlocal\nn8n\n"));
    let backup_dir = temp.path().join("work");

    let strategy = strategy_for(&config.jobs["mongo"], &config).unwrap();
    let archive = strategy
        .create_archive(&ArchiveContext {
            backup_dir: &backup_dir,
            now: fixed_now(),
            timeout: None,
            executor: &executor,
        })
        .assert_some();

    assert_eq!(archive, backup_dir.join("mongo_dump_20240108_013000.tar.gz"));

    let listing = &executor.calls_to("mongosh")[0];
    assert!(listing.has_arg("mongo-secret"));
    assert!(listing.has_arg("27017"));

    let dumped: Vec<String> = executor
        .calls_to("mongodump")
        .iter()
        .filter_map(|c| {
            let i = c.args.iter().position(|a| a == "--db")?;
            c.args.get(i + 1).cloned()
        })
        .collect();
    assert_eq!(dumped, vec!["admin".to_string(), "n8n".to_string()]);
}

#[test]
fn test_mongo_job_with_unreadable_password_file_fails_to_prepare() {
    let builder = ConfigBuilder::new().add_mongo_job("mongo");
    let password_file = builder.password_file("mongo");
    let (config, _temp) = builder.persist();
    std::fs::remove_file(password_file).unwrap();

    assert!(strategy_for(&config.jobs["mongo"], &config).is_err());
}
