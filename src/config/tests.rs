//! Tests for config functionality.

use crate::config::{Config, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS};
use crate::error::LockError;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    assert_eq!(config.timeout(), Duration::from_secs(30));
    assert_eq!(config.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
    assert_eq!(config.retry_delay(), Duration::from_millis(5));
    assert!(config.record_holder);
    assert!(config.reclaim_stale);
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();

    // Should use all defaults
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
timeout_ms: 2500
reclaim_stale: false
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.timeout_ms, 2500);
    assert!(!config.reclaim_stale);

    // Unspecified values should use defaults
    assert_eq!(config.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
    assert!(config.record_holder);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
timeout_ms: 100
future_option: "something new"
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.timeout_ms, 100);
}

#[test]
fn test_zero_timeout_is_rejected() {
    let err = Config::from_yaml("timeout_ms: 0").unwrap_err();
    assert!(matches!(err, LockError::InvalidArgument(_)));
    assert!(err.to_string().contains("timeout_ms"));
}

#[test]
fn test_retry_delay_must_stay_below_a_second() {
    let err = Config::from_yaml("retry_delay_ms: 1000").unwrap_err();
    assert!(matches!(err, LockError::InvalidArgument(_)));
    assert!(err.to_string().contains("retry_delay_ms"));

    let config = Config::from_yaml("retry_delay_ms: 999").unwrap();
    assert_eq!(config.retry_delay_ms, 999);
}

#[test]
fn test_malformed_yaml_is_invalid_argument() {
    let err = Config::from_yaml("timeout_ms: [not, a, number]").unwrap_err();
    assert!(matches!(err, LockError::InvalidArgument(_)));
}

#[test]
fn test_yaml_roundtrip_preserves_values() {
    let config = Config {
        timeout_ms: 1234,
        retry_delay_ms: 7,
        record_holder: false,
        reclaim_stale: false,
    };
    let yaml = config.to_yaml().unwrap();
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linklock.yaml");
    std::fs::write(&path, "timeout_ms: 750\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.timeout_ms, 750);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, LockError::Io { .. }));
    assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
}

#[test]
fn test_with_timeout_never_drops_to_zero() {
    let config = Config::default().with_timeout(Duration::from_micros(10));
    assert_eq!(config.timeout_ms, 1);
    assert!(config.validate().is_ok());
}
