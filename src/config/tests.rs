//! Tests for config functionality.

use crate::config::{Config, DrainPolicy};
use serial_test::serial;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.lock_path, ".pollguard/poller.lock");
    assert_eq!(config.stale_threshold_secs, 300);
    assert_eq!(config.heartbeat_interval_secs, 60);
    assert_eq!(config.store_timeout_ms, 5_000);
    assert_eq!(config.api_base_url, "https://api.telegram.org");
    assert_eq!(config.token_env, "TELEGRAM_BOT_TOKEN");
    assert_eq!(config.remote_timeout_secs, 10);
    assert_eq!(config.drain_policy, DrainPolicy::LatestOnly);
    assert_eq!(config.max_drain_batches, 50);
    assert_eq!(config.settle_delay_secs, 0);
    assert_eq!(config.port, 3000);
    assert_eq!(config.competitor_process_name, "node");
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();

    assert_eq!(config.stale_threshold_secs, 300);
    assert_eq!(config.drain_policy, DrainPolicy::LatestOnly);
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
lock_path: /var/run/helpdesk/bot.lock
drain_policy: full
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_path, "/var/run/helpdesk/bot.lock");
    assert_eq!(config.drain_policy, DrainPolicy::Full);

    // Unspecified values should use defaults
    assert_eq!(config.stale_threshold_secs, 300);
    assert_eq!(config.token_env, "TELEGRAM_BOT_TOKEN");
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
lock_path: bot.lock
stale_threshold_secs: 120
heartbeat_interval_secs: 20
store_timeout_ms: 750
api_base_url: http://127.0.0.1:8081
token_env: HELPDESK_BOT_TOKEN
remote_timeout_secs: 3
drain_policy: full
max_drain_batches: 5
settle_delay_secs: 10
port: 8080
competitor_process_name: ""
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_path, "bot.lock");
    assert_eq!(config.stale_threshold(), Duration::from_secs(120));
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(20));
    assert_eq!(config.store_timeout(), Duration::from_millis(750));
    assert_eq!(config.api_base_url, "http://127.0.0.1:8081");
    assert_eq!(config.token_env, "HELPDESK_BOT_TOKEN");
    assert_eq!(config.remote_timeout(), Duration::from_secs(3));
    assert_eq!(config.drain_policy, DrainPolicy::Full);
    assert_eq!(config.max_drain_batches, 5);
    assert_eq!(config.settle_delay(), Duration::from_secs(10));
    assert_eq!(config.port, 8080);
    assert!(config.competitor_process_name.is_empty());
}

#[test]
fn test_parse_yaml_with_unknown_fields() {
    let yaml = r#"
stale_threshold_secs: 600
webhook_secret: "ignored"
future_feature:
  nested: true
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.stale_threshold_secs, 600);
    assert_eq!(config.port, 3000);
}

#[test]
fn test_validate_zero_threshold() {
    let result = Config::from_yaml("stale_threshold_secs: 0");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("stale_threshold_secs"));
    assert!(err.to_string().contains("greater than 0"));
}

#[test]
fn test_validate_zero_store_timeout() {
    let err = Config::from_yaml("store_timeout_ms: 0").unwrap_err();
    assert!(err.to_string().contains("store_timeout_ms"));
}

#[test]
fn test_validate_heartbeat_must_beat_threshold() {
    let yaml = r#"
stale_threshold_secs: 60
heartbeat_interval_secs: 60
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("heartbeat_interval_secs"));
    assert!(err.to_string().contains("less than"));
}

#[test]
fn test_validate_empty_token_env() {
    let err = Config::from_yaml("token_env: \"  \"").unwrap_err();
    assert!(err.to_string().contains("token_env must not be empty"));
}

#[test]
fn test_invalid_drain_policy_is_rejected() {
    let result = Config::from_yaml("drain_policy: everything");
    assert!(result.is_err());
}

#[test]
fn test_drain_policy_names() {
    let config = Config::from_yaml("drain_policy: latest_only").unwrap();
    assert_eq!(config.drain_policy.as_str(), "latest_only");
    let config = Config::from_yaml("drain_policy: full").unwrap();
    assert_eq!(config.drain_policy.as_str(), "full");
}

#[test]
fn test_config_load_from_file() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port: 4000").unwrap();
    writeln!(file, "stale_threshold_secs: 900").unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.port, 4000);
    assert_eq!(config.stale_threshold_secs, 900);
}

#[test]
fn test_config_load_missing_file() {
    let err = Config::load("/nonexistent/path/pollguard.yaml").unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn test_load_or_default_missing_file_uses_defaults() {
    let config = Config::load_or_default("/nonexistent/path/pollguard.yaml").unwrap();
    assert_eq!(config.stale_threshold_secs, 300);
}

#[test]
fn test_load_or_default_invalid_file_is_error() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "stale_threshold_secs: 0").unwrap();

    assert!(Config::load_or_default(file.path()).is_err());
}

#[test]
#[serial]
fn test_credential_reads_configured_env_var() {
    let config = Config {
        token_env: "POLLGUARD_TEST_TOKEN".to_string(),
        ..Config::default()
    };

    // SAFETY: serialized with other env-touching tests.
    unsafe { std::env::set_var("POLLGUARD_TEST_TOKEN", "  123:abc  ") };
    assert_eq!(config.credential().as_deref(), Some("123:abc"));

    unsafe { std::env::set_var("POLLGUARD_TEST_TOKEN", "   ") };
    assert_eq!(config.credential(), None);

    unsafe { std::env::remove_var("POLLGUARD_TEST_TOKEN") };
    assert_eq!(config.credential(), None);
}
