//! Configuration loading tests
//!
//! Tests touching LEXFLOW_* / ANTHROPIC_API_KEY are marked #[serial] so
//! they never race on process environment variables.

use std::env;
use std::fs;
use std::path::PathBuf;

use lexflow_common::config::{resolve_config_path, LexflowConfig, CONFIG_ENV_VAR};
use lexflow_common::Error;
use serial_test::serial;
use tempfile::TempDir;

const OVERRIDE_VARS: [&str; 6] = [
    CONFIG_ENV_VAR,
    "LEXFLOW_DATABASE_PATH",
    "LEXFLOW_PORT",
    "ANTHROPIC_API_KEY",
    "LEXFLOW_FROM_EMAIL",
    "LEXFLOW_ATTORNEY_EMAIL",
];

fn clear_env() {
    for var in OVERRIDE_VARS {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_load_from_cli_path() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [server]
        host = "0.0.0.0"
        port = 8088

        [store]
        database_path = "/var/lib/lexflow/intakes.db"
        scan_page_size = 25

        [notifications]
        enabled = false

        [logging]
        level = "debug"
        "#,
    );

    let config = LexflowConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.store.database_path, PathBuf::from("/var/lib/lexflow/intakes.db"));
    assert_eq!(config.store.scan_page_size, 25);
    assert!(!config.notifications.enabled);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let config = LexflowConfig::load(Some(&path)).unwrap();
    assert_eq!(config, LexflowConfig::default());
}

#[test]
#[serial]
fn test_invalid_file_is_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nport = 1");

    let err = LexflowConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_env_var_selects_config_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server]\nport = 7001\n");
    env::set_var(CONFIG_ENV_VAR, &path);

    assert_eq!(resolve_config_path(None), Some(path.clone()));
    let config = LexflowConfig::load(None).unwrap();
    assert_eq!(config.server.port, 7001);

    clear_env();
}

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "[server]\nport = 7002\n");
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/lexflow.toml");

    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));
    assert_eq!(LexflowConfig::load(Some(&cli)).unwrap().server.port, 7002);

    clear_env();
}

#[test]
#[serial]
fn test_env_overrides_apply_after_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [server]
        port = 8088

        [classifier]
        api_key = "from-file"
        "#,
    );
    env::set_var("LEXFLOW_PORT", "9191");
    env::set_var("LEXFLOW_DATABASE_PATH", "/tmp/lexflow-env.db");
    env::set_var("ANTHROPIC_API_KEY", "from-env");
    env::set_var("LEXFLOW_FROM_EMAIL", "intake@firm.test");
    env::set_var("LEXFLOW_ATTORNEY_EMAIL", "attorney@firm.test");

    let config = LexflowConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.port, 9191);
    assert_eq!(config.store.database_path, PathBuf::from("/tmp/lexflow-env.db"));
    assert_eq!(config.classifier.api_key, "from-env");
    assert_eq!(config.notifications.from_email, "intake@firm.test");
    assert_eq!(config.notifications.attorney_email, "attorney@firm.test");
    assert!(config.validate(true).is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_bad_port_override_is_config_error() {
    clear_env();
    env::set_var("LEXFLOW_PORT", "not-a-port");

    let mut config = LexflowConfig::default();
    let err = config.apply_env_overrides().unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("LEXFLOW_PORT")));

    clear_env();
}
