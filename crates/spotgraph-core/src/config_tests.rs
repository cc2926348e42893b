//! Tests for engine configuration loading.

use std::io::Write;

use serial_test::serial;

use crate::config::{ConfigError, EngineConfig, LoggingConfig};

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.pool.vertex_chunk, 1024);
    assert_eq!(config.pool.edge_chunk, 1024);
    assert_eq!(config.undo.capacity, 1000);
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_overrides_only_given_values() {
    let config = EngineConfig::from_toml_str("[undo]\ncapacity = 25\n").unwrap();
    assert_eq!(config.undo.capacity, 25);
    assert_eq!(config.pool.vertex_chunk, 1024);
}

#[test]
fn test_zero_capacity_rejected() {
    let err = EngineConfig::from_toml_str("[undo]\ncapacity = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_zero_chunk_rejected() {
    let err = EngineConfig::from_toml_str("[pool]\nedge_chunk = 0\n").unwrap_err();
    assert!(err.to_string().contains("pool.edge_chunk"));
}

#[test]
fn test_wrong_type_is_load_error() {
    let err = EngineConfig::from_toml_str("[undo]\ncapacity = \"lots\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_toml_round_trip() {
    let mut config = EngineConfig::default();
    config.pool.vertex_chunk = 64;
    config.logging.level = "spotgraph_core=debug".to_string();

    let rendered = config.to_toml().unwrap();
    let parsed = EngineConfig::from_toml_str(&rendered).unwrap();
    assert_eq!(parsed, config);
}

#[test]
#[serial]
fn test_load_from_file_and_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[pool]\nvertex_chunk = 16\nedge_chunk = 32").unwrap();

    std::env::set_var("SPOTGRAPH_UNDO__CAPACITY", "7");
    let loaded = EngineConfig::load_from(file.path());
    std::env::remove_var("SPOTGRAPH_UNDO__CAPACITY");

    let config = loaded.unwrap();
    assert_eq!(config.pool.vertex_chunk, 16);
    assert_eq!(config.pool.edge_chunk, 32);
    assert_eq!(config.undo.capacity, 7);
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
#[serial]
fn test_logging_init_is_idempotent() {
    let logging = LoggingConfig {
        level: "spotgraph_core=debug".to_string(),
    };
    logging.init();
    assert!(!logging.init());
}
