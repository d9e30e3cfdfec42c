//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Config::from_env() also loads a .env file
//! via dotenvy if one is present, so each test sets the variables it checks.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use deepread::config::{Config, LogFormat, DEFAULT_BASE_URL};
use serial_test::serial;
use std::env;

#[test]
#[serial]
fn test_config_loads_without_system_key() {
    env::remove_var("GEMINI_API_KEY");

    let config = Config::from_env().expect("missing system key is not a config error");
    assert!(config.gemini.system_api_key.is_none());
}

#[test]
#[serial]
fn test_config_system_key_is_trimmed() {
    env::set_var("GEMINI_API_KEY", "  sys-key  ");

    let config = Config::from_env().unwrap();
    assert_eq!(config.gemini.system_api_key.as_deref(), Some("sys-key"));

    env::set_var("GEMINI_API_KEY", "   ");
    let config = Config::from_env().unwrap();
    assert!(config.gemini.system_api_key.is_none());

    env::remove_var("GEMINI_API_KEY");
}

#[test]
#[serial]
fn test_config_custom_endpoint_and_model() {
    env::set_var("GEMINI_BASE_URL", "https://custom.api.com");
    env::set_var("GEMINI_MODEL", "gemini-2.5-flash");

    let config = Config::from_env().unwrap();
    assert_eq!(config.gemini.base_url, "https://custom.api.com");
    assert_eq!(config.gemini.default_model, "gemini-2.5-flash");

    // Restore default
    env::set_var("GEMINI_BASE_URL", DEFAULT_BASE_URL);
    env::remove_var("GEMINI_MODEL");
}

#[test]
#[serial]
fn test_config_empty_base_url_rejected() {
    env::set_var("GEMINI_BASE_URL", "  ");

    assert!(Config::from_env().is_err());

    env::set_var("GEMINI_BASE_URL", DEFAULT_BASE_URL);
}

#[test]
#[serial]
fn test_config_custom_database() {
    env::set_var("DATABASE_PATH", "/custom/path.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/path.db");
    assert_eq!(config.database.max_connections, 10);

    // Restore defaults
    env::set_var("DATABASE_PATH", "./data/deepread.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "5");
}

#[test]
#[serial]
fn test_config_json_log_format() {
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    // Restore default
    env::set_var("LOG_FORMAT", "pretty");
}

#[test]
#[serial]
fn test_config_analysis_settings() {
    env::set_var("OUTPUT_LANGUAGE", "English");
    env::set_var("HISTORY_CAPACITY", "10");
    env::set_var("REQUEST_TIMEOUT_MS", "60000");

    let config = Config::from_env().unwrap();
    assert_eq!(config.analysis.output_language, "English");
    assert_eq!(config.analysis.history_capacity, 10);
    assert_eq!(config.request.timeout_ms, 60000);

    env::remove_var("OUTPUT_LANGUAGE");
    env::remove_var("HISTORY_CAPACITY");
    env::remove_var("REQUEST_TIMEOUT_MS");
}

#[test]
#[serial]
fn test_config_invalid_numbers_fall_back() {
    env::set_var("HISTORY_CAPACITY", "0");
    env::set_var("REQUEST_TIMEOUT_MS", "soon");

    let config = Config::from_env().unwrap();
    assert_eq!(config.analysis.history_capacity, 50);
    assert_eq!(config.request.timeout_ms, 120_000);

    env::remove_var("HISTORY_CAPACITY");
    env::remove_var("REQUEST_TIMEOUT_MS");
}
