//! Unit tests for `ConsoleSettings`: env loading, overrides and backend
//! selection. Tests that touch `POLIS_CONSOLE_*` run serially.

#![allow(clippy::expect_used, unsafe_code)]

use std::path::PathBuf;

use polis_console::infra::{AnyBackend, ConsoleSettings};
use serial_test::serial;

const VARS: &[&str] = &[
    "POLIS_CONSOLE_API_URL",
    "POLIS_CONSOLE_API_TOKEN_ENV",
    "POLIS_CONSOLE_DATA_DIR",
    "POLIS_CONSOLE_CACHE",
];

fn clear_env() {
    for var in VARS {
        // SAFETY: callers are #[serial]
        unsafe { std::env::remove_var(var) };
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: callers are #[serial]
    unsafe { std::env::set_var(key, value) };
}

#[test]
#[serial]
fn test_defaults_when_nothing_set() {
    clear_env();
    let settings = ConsoleSettings::from_env().expect("settings");
    assert_eq!(settings, ConsoleSettings::default());
    assert!(settings.cache);
    assert!(settings.api_url.is_none());
}

#[test]
#[serial]
fn test_reads_prefixed_vars() {
    clear_env();
    set_env("POLIS_CONSOLE_API_URL", "https://console.example.com/api");
    set_env("POLIS_CONSOLE_DATA_DIR", "/tmp/polis-console-test");
    set_env("POLIS_CONSOLE_CACHE", "false");

    let settings = ConsoleSettings::from_env().expect("settings");
    clear_env();

    assert_eq!(
        settings.api_url.as_deref(),
        Some("https://console.example.com/api")
    );
    assert_eq!(
        settings.data_dir,
        Some(PathBuf::from("/tmp/polis-console-test"))
    );
    assert!(!settings.cache);
}

#[test]
#[serial]
fn test_malformed_cache_flag_is_error() {
    clear_env();
    set_env("POLIS_CONSOLE_CACHE", "sometimes");
    let result = ConsoleSettings::from_env();
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_api_token_is_read_from_named_var() {
    set_env("POLIS_CONSOLE_TEST_TOKEN", "secret-token");
    let settings = ConsoleSettings {
        api_token_env: Some("POLIS_CONSOLE_TEST_TOKEN".to_string()),
        ..ConsoleSettings::default()
    };
    assert_eq!(settings.api_token().as_deref(), Some("secret-token"));
}

#[test]
fn test_overrides_replace_only_given_values() {
    let settings = ConsoleSettings {
        api_url: Some("https://a.example.com".to_string()),
        data_dir: Some(PathBuf::from("/data")),
        ..ConsoleSettings::default()
    }
    .with_overrides(None, Some(PathBuf::from("/override")));

    assert_eq!(settings.api_url.as_deref(), Some("https://a.example.com"));
    assert_eq!(settings.data_dir, Some(PathBuf::from("/override")));
}

#[test]
fn test_backend_selection() {
    let file = ConsoleSettings {
        data_dir: Some(PathBuf::from("/data")),
        ..ConsoleSettings::default()
    };
    assert!(matches!(file.open_backend().expect("file"), AnyBackend::File(_)));

    let tiered = ConsoleSettings {
        api_url: Some("http://127.0.0.1:9".to_string()),
        data_dir: Some(PathBuf::from("/data")),
        ..ConsoleSettings::default()
    };
    assert!(matches!(
        tiered.open_backend().expect("tiered"),
        AnyBackend::Tiered(_)
    ));

    let http = ConsoleSettings {
        cache: false,
        ..tiered
    };
    assert!(matches!(http.open_backend().expect("http"), AnyBackend::Http(_)));
}
