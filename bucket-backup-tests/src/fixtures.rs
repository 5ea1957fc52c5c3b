//! Test fixtures and sample data

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

/// Wall clock used by tests: 2024-01-08 01:30, so the prior day is 2024-Jan-07
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 8)
        .and_then(|d| d.and_hms_opt(1, 30, 0))
        .expect("valid fixed date")
}

/// Wazuh-style log tree under `root/logs`
///
/// Returns the files that belong to 2024-Jan-07; everything else is decoy.
pub fn wazuh_log_tree(root: &Path) -> Vec<PathBuf> {
    let selected = [
        "logs/alerts/2024/Jan/ossec-alerts-07.json.gz",
        "logs/alerts/2024/Jan/ossec-alerts-07.log.gz",
        "logs/archives/2024/Jan/ossec-archive-07.json.gz",
        "logs/api/2024/Jan/api-07.log.gz",
    ];
    let decoys = [
        "logs/alerts/2024/Jan/ossec-alerts-08.json.gz",
        "logs/alerts/2024/Jan/ossec-alerts-17.json.gz",
        "logs/alerts/2024/Feb/ossec-alerts-07.json.gz",
        "logs/alerts/2023/Jan/ossec-alerts-07.json.gz",
        "logs/alerts/alerts.json",
        "logs/firewall/2024/Jan/firewall-07.log.gz",
    ];

    for rel in selected.iter().chain(decoys.iter()) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create log directory");
        }
        fs::write(&path, b"log line\n").expect("Failed to write log file");
    }

    let mut paths: Vec<PathBuf> = selected.iter().map(|rel| root.join(rel)).collect();
    paths.sort();
    paths
}

/// Keys the selected files of `wazuh_log_tree` are uploaded under
/// (log set base `root`, prefix `wazuh_logs/`)
pub fn wazuh_expected_keys() -> Vec<String> {
    let mut keys: Vec<String> = [
        "wazuh_logs/logs/alerts/2024/Jan/ossec-alerts-07.json.gz",
        "wazuh_logs/logs/alerts/2024/Jan/ossec-alerts-07.log.gz",
        "wazuh_logs/logs/archives/2024/Jan/ossec-archive-07.json.gz",
        "wazuh_logs/logs/api/2024/Jan/api-07.log.gz",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    keys.sort();
    keys
}

/// Full sample config TOML; `{work_dir}`, `{ossec}` and `{source}` are placeholders
pub fn sample_config_toml() -> &'static str {
    r#"
[global]
work_dir = "{work_dir}"
log_level = "debug"
default_excludes = ["*.tmp"]

[storage]
bucket = "backup-bucket"
region = "eu-west-1"

[notifications]
discord_webhook_url = ""
notify_on = ["failure"]

[log_sets.wazuh]
base = "{ossec}"
subdirs = ["logs/alerts", "logs/archives", "logs/api"]
prefix = "wazuh_logs/"

[jobs.n8n]
type = "directory"
description = "n8n workflows"
source = "{source}"
excludes = ["*.log"]
prefix = "n8n_backups/"

[jobs.mongo]
type = "mongodb"
username = "admin"
password = "secret"
skip_databases = ["local"]
prefix = "mongo_backups/"
"#
}

/// Render `sample_config_toml` with concrete paths
pub fn render_sample_config(work_dir: &Path, ossec: &Path, source: &Path) -> String {
    sample_config_toml()
        .replace("{work_dir}", &work_dir.display().to_string())
        .replace("{ossec}", &ossec.display().to_string())
        .replace("{source}", &source.display().to_string())
}

/// Config missing the required `[storage]` table
pub fn config_without_storage_toml() -> &'static str {
    r#"
[global]
work_dir = "/tmp"

[jobs.n8n]
type = "directory"
source = "/root/n8n_data"
prefix = "n8n_backups/"
"#
}

/// Config with an unknown job type
pub fn config_with_unknown_job_type_toml() -> &'static str {
    r#"
[storage]
bucket = "backup-bucket"

[jobs.pg]
type = "postgres"
prefix = "pg_backups/"
"#
}
