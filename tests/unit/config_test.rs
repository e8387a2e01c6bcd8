//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use sync_scheduler::config::scheduler::ENV_PREFIX;
use sync_scheduler::config::SchedulerConfig;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.max_concurrent_tasks, 5);
    assert_eq!(config.task_timeout(), Duration::from_secs(60));
    assert_eq!(config.retry_delay_ms, 5_000);
    assert_eq!(config.max_retries, 3);
}

#[test]
fn test_invalid_concurrency() {
    let invalid = SchedulerConfig {
        max_concurrent_tasks: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_timeout() {
    let invalid = SchedulerConfig {
        task_timeout_ms: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_backoff_multiplier() {
    let invalid = SchedulerConfig {
        retry_backoff_multiplier: 0.5,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_zero_retries_and_zero_delay_are_valid() {
    let config = SchedulerConfig {
        max_retries: 0,
        retry_delay_ms: 0,
        ..SchedulerConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = SchedulerConfig::from_json_str(r#"{"max_concurrent_tasks": 2}"#).unwrap();
    assert_eq!(config.max_concurrent_tasks, 2);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.max_queue_depth, None);
}

#[test]
fn test_json_validation_failure() {
    let err = SchedulerConfig::from_json_str(r#"{"task_timeout_ms": 0}"#).unwrap_err();
    assert!(err.contains("task_timeout_ms"));
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_lookup_overrides() {
    let config = SchedulerConfig::from_lookup(lookup(&[
        ("MAX_CONCURRENT_TASKS", "8"),
        ("RETRY_DELAY_MS", "250"),
        ("MAX_QUEUE_DEPTH", "1000"),
    ]))
    .unwrap();
    assert_eq!(config.max_concurrent_tasks, 8);
    assert_eq!(config.retry_delay_ms, 250);
    assert_eq!(config.max_queue_depth, Some(1000));
    assert_eq!(config.task_timeout_ms, 60_000);
}

#[test]
fn test_lookup_rejects_garbage() {
    assert!(SchedulerConfig::from_lookup(lookup(&[("MAX_RETRIES", "many")])).is_err());
    assert!(SchedulerConfig::from_lookup(lookup(&[("MAX_CONCURRENT_TASKS", "0")])).is_err());
}

#[test]
fn test_retry_policy_from_config() {
    let config = SchedulerConfig {
        retry_delay_ms: 100,
        max_retries: 2,
        retry_backoff_multiplier: 2.0,
        ..SchedulerConfig::default()
    };
    let policy = config.retry_policy();
    assert_eq!(policy.max_retries, 2);
    assert_eq!(policy.delay_for(0), Duration::from_millis(100));
    assert_eq!(policy.delay_for(1), Duration::from_millis(200));
}
