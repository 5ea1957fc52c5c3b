//! Unit tests for configuration loading and validation

use bucket_backup::config::{
    find_job, get_effective_excludes, load_config, parse_config, ArchiveNaming, CleanupPolicy,
    ConfigError, JobConfig, KeyLayout, MatchMode, NotifyEvent,
};
use rstest::rstest;
use test_utils::{
    config_with_unknown_job_type_toml, config_without_storage_toml, render_sample_config,
    ConfigBuilder, ResultAssertions, TestContext,
};

#[test]
fn test_sample_config_parses_every_section() {
    let ctx = TestContext::new();
    let toml = render_sample_config(
        &ctx.create_subdir("work"),
        &ctx.create_subdir("ossec"),
        &ctx.create_subdir("n8n_data"),
    );

    let config = parse_config(&toml).assert_ok();

    assert_eq!(config.storage.bucket, "backup-bucket");
    assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));
    assert_eq!(config.global.log_level, "debug");
    assert_eq!(config.notifications.notify_on, vec![NotifyEvent::Failure]);

    let wazuh = &config.log_sets["wazuh"];
    assert!(wazuh.enabled);
    assert_eq!(wazuh.subdirs.len(), 3);
    assert_eq!(wazuh.match_mode, MatchMode::Structured);

    match &config.jobs["n8n"] {
        JobConfig::Directory(job) => {
            assert_eq!(job.naming, ArchiveNaming::Timestamped);
            assert_eq!(job.key_layout, KeyLayout::Flat);
            assert_eq!(job.cleanup, CleanupPolicy::OnSuccess);
            assert_eq!(
                get_effective_excludes(job, &config.global),
                vec!["*.tmp".to_string(), "*.log".to_string()]
            );
        }
        other => panic!("expected directory job, got {:?}", other),
    }

    match &config.jobs["mongo"] {
        JobConfig::Mongodb(job) => {
            assert_eq!(job.host, "localhost");
            assert_eq!(job.port, 27017);
            assert_eq!(job.auth_database, "admin");
        }
        other => panic!("expected mongodb job, got {:?}", other),
    }
}

#[test]
fn test_missing_storage_table_fails() {
    parse_config(config_without_storage_toml()).assert_err_contains("storage");
}

#[test]
fn test_unknown_job_type_fails() {
    assert!(matches!(
        parse_config(config_with_unknown_job_type_toml()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_nonexistent_file_fails() {
    assert!(matches!(
        load_config("/nonexistent/bucket-backup.toml"),
        Err(ConfigError::ReadError(_))
    ));
}

#[rstest]
#[case::empty_bucket(
    r#"
[storage]
bucket = ""
[jobs.a]
type = "directory"
source = "/srv/a"
prefix = "a/"
"#,
    "bucket"
)]
#[case::short_schedule(
    r#"
[global]
schedule = "0 1 * *"
[storage]
bucket = "b"
[jobs.a]
type = "directory"
source = "/srv/a"
prefix = "a/"
"#,
    "cron"
)]
#[case::nothing_to_do(
    r#"
[storage]
bucket = "b"
"#,
    "No log sets or jobs"
)]
#[case::log_set_without_subdirs(
    r#"
[storage]
bucket = "b"
[log_sets.wazuh]
base = "/var/ossec"
subdirs = []
prefix = "wazuh_logs/"
"#,
    "subdirs"
)]
#[case::job_without_prefix(
    r#"
[storage]
bucket = "b"
[jobs.a]
type = "directory"
source = "/srv/a"
prefix = ""
"#,
    "prefix"
)]
#[case::mongo_without_password(
    r#"
[storage]
bucket = "b"
[jobs.mongo]
type = "mongodb"
username = "admin"
prefix = "mongo_backups/"
"#,
    "password"
)]
#[case::mongo_with_both_passwords(
    r#"
[storage]
bucket = "b"
[jobs.mongo]
type = "mongodb"
username = "admin"
password = "x"
password_file = "/etc/mongo-password"
prefix = "mongo_backups/"
"#,
    "not both"
)]
#[case::mongo_missing_password_file(
    r#"
[storage]
bucket = "b"
[jobs.mongo]
type = "mongodb"
username = "admin"
password_file = "/nonexistent/mongo-password"
prefix = "mongo_backups/"
"#,
    "does not exist"
)]
fn test_validation_errors(#[case] body: &str, #[case] needle: &str) {
    let err = parse_config(body).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)), "got {:?}", err);
    assert!(err.to_string().contains(needle), "'{}' lacks '{}'", err, needle);
}

#[test]
fn test_find_job() {
    let config = ConfigBuilder::minimal().add_mongo_job("mongo").build();

    assert_eq!(find_job(&config, "mongo").assert_ok().kind(), "mongodb");
    assert!(matches!(
        find_job(&config, "postgres"),
        Err(ConfigError::JobNotFound(name)) if name == "postgres"
    ));
}

#[test]
fn test_defaults_applied() {
    let config = parse_config(
        r#"
[storage]
bucket = "b"
[jobs.a]
type = "directory"
source = "/srv/a"
prefix = "a/"
"#,
    )
    .assert_ok();

    assert_eq!(config.global.schedule, "0 1 * * *");
    assert!(config.global.command_timeout_seconds.is_none());
    assert!(config.notifications.discord_webhook_url.is_empty());
    assert!(config.jobs["a"].enabled());
}
