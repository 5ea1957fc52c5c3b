//! Unit tests for prior-day log selection

use bucket_backup::utils::dates::PriorDay;
use bucket_backup::utils::scanner::{matches_prior_day, scan_log_set, select_prior_day_files};
use rstest::rstest;
use std::path::Path;
use test_utils::{
    fixed_now, wazuh_expected_keys, wazuh_log_tree, LogSetConfig, MatchMode, TestContext,
};

fn jan_07() -> PriorDay {
    PriorDay::before(fixed_now())
}

#[test]
fn test_prior_day_of_fixed_clock() {
    let day = jan_07();
    assert_eq!(day.dashed(), "2024-Jan-07");
    assert_eq!(day.key_path(), "2024/Jan/07");
}

#[test]
fn test_prior_day_across_year_boundary() {
    let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 5, 0)
        .unwrap();
    assert_eq!(PriorDay::before(now).dashed(), "2023-Dec-31");
}

#[rstest]
#[case("2024/Jan", "ossec-alerts-07.json.gz", true)]
#[case("2024/Jan", "ossec-alerts-07.log.gz", true)]
#[case("2024/Jan", "api-07.log", true)]
#[case("2024/Jan", "ossec-alerts-08.json.gz", false)]
#[case("2024/Jan", "ossec-alerts-17.json.gz", false)]
#[case("2024/Feb", "ossec-alerts-07.json.gz", false)]
#[case("2023/Jan", "ossec-alerts-07.json.gz", false)]
#[case("", "alerts.json", false)]
fn test_matches_in_both_modes(#[case] dir: &str, #[case] file: &str, #[case] expected: bool) {
    for mode in [MatchMode::Structured, MatchMode::Substring] {
        assert_eq!(
            matches_prior_day(Path::new(dir), file, &jan_07(), mode),
            expected,
            "{}/{} in {:?}",
            dir,
            file,
            mode
        );
    }
}

#[test]
fn test_select_walks_nested_directories() {
    let ctx = TestContext::new();
    let expected = wazuh_log_tree(ctx.temp_dir());

    let selected = select_prior_day_files(
        &ctx.temp_dir().join("logs/alerts"),
        &jan_07(),
        MatchMode::Structured,
    );

    let alerts: Vec<_> = expected
        .into_iter()
        .filter(|p| p.to_string_lossy().contains("/alerts/"))
        .collect();
    assert_eq!(selected, alerts);
}

#[test]
fn test_scan_log_set_keys_and_missing_subdir() {
    let ctx = TestContext::new();
    let ossec = ctx.create_subdir("ossec");
    wazuh_log_tree(&ossec);

    let set = LogSetConfig {
        enabled: true,
        base: ossec.clone(),
        relative_to: None,
        // "logs/firewall" is not scanned, "logs/cluster" does not exist
        subdirs: vec![
            "logs/alerts".to_string(),
            "logs/archives".to_string(),
            "logs/api".to_string(),
            "logs/cluster".to_string(),
        ],
        prefix: "wazuh_logs/".to_string(),
        match_mode: MatchMode::Structured,
    };

    let mut keys: Vec<String> = scan_log_set(&set, &jan_07()).into_iter().map(|u| u.key).collect();
    keys.sort();

    assert_eq!(keys, wazuh_expected_keys());
}

#[test]
fn test_scan_log_set_relative_to_parent() {
    let ctx = TestContext::new();
    let ossec = ctx.create_subdir("ossec");
    wazuh_log_tree(&ossec);

    let set = LogSetConfig {
        enabled: true,
        base: ossec.join("logs"),
        relative_to: Some(ossec.clone()),
        subdirs: vec!["api".to_string()],
        prefix: "wazuh_logs".to_string(),
        match_mode: MatchMode::Substring,
    };

    let uploads = scan_log_set(&set, &jan_07());
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].key, "wazuh_logs/logs/api/2024/Jan/api-07.log.gz");
}
