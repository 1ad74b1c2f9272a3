//! Unit tests for `ConfigRepository`: degrading reads, validated writes and
//! best-effort backups.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;

use polis_common::{AuthMethod, ConsoleConfig, EnvVars, ModelAuth, ModelConnection};
use polis_console::application::ConfigRepository;
use polis_console::domain::catalog::Catalog;
use polis_console::domain::error::ValidationErrors;

use crate::mocks::{MemoryBackend, agent, count, demo_config};

#[tokio::test]
async fn test_read_returns_stored_config() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let repo = ConfigRepository::new(backend);
    assert_eq!(repo.read().await, demo_config());
}

#[tokio::test]
async fn test_read_degrades_to_default_on_backend_failure() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    MemoryBackend::fail(&backend.switches.fail_get_config);
    let repo = ConfigRepository::new(backend);

    let config = repo.read().await;
    assert_eq!(config, ConsoleConfig::default());
    assert_eq!(config.config_version, 1);
    assert!(config.registry_connections.is_empty());
    assert!(config.agents.is_empty());
}

#[tokio::test]
async fn test_read_checked_propagates_backend_failure() {
    let backend = MemoryBackend::default();
    MemoryBackend::fail(&backend.switches.fail_get_config);
    let repo = ConfigRepository::new(backend);
    assert!(repo.read_checked().await.is_err());
}

#[tokio::test]
async fn test_read_env_degrades_to_empty() {
    let env = EnvVars::from([("TOKEN".to_string(), "x".to_string())]);
    let backend = MemoryBackend::with(ConsoleConfig::default(), env);
    MemoryBackend::fail(&backend.switches.fail_get_env);
    let repo = ConfigRepository::new(backend);
    assert!(repo.read_env().await.is_empty());
}

#[tokio::test]
async fn test_write_backs_up_then_writes() {
    let backend = MemoryBackend::default();
    let repo = ConfigRepository::new(backend.clone());

    repo.write(&demo_config()).await.expect("write");

    assert_eq!(count(&backend.calls.backup), 1);
    assert_eq!(count(&backend.calls.put_config), 1);
    assert_eq!(backend.stored_config(), demo_config());
}

#[tokio::test]
async fn test_write_succeeds_when_backup_fails() {
    let backend = MemoryBackend::default();
    MemoryBackend::fail(&backend.switches.fail_backup);
    let repo = ConfigRepository::new(backend.clone());

    repo.write(&demo_config()).await.expect("backup failure must not block");
    assert_eq!(backend.stored_config(), demo_config());
}

#[tokio::test]
async fn test_write_rejects_invalid_config_without_touching_backend() {
    let backend = MemoryBackend::default();
    let repo = ConfigRepository::new(backend.clone());
    let mut config = ConsoleConfig::default();
    config.agents.push(agent("demo", "missing"));

    let err = repo.write(&config).await.expect_err("dangling reference");

    let errors = err.downcast_ref::<ValidationErrors>().expect("validation error");
    assert!(errors.has_referential_error());
    assert!(err.to_string().contains("demo"), "got: {err}");
    assert_eq!(count(&backend.calls.backup), 0);
    assert_eq!(count(&backend.calls.put_config), 0);
}

#[tokio::test]
async fn test_write_rejects_version_zero() {
    let repo = ConfigRepository::new(MemoryBackend::default());
    let config = ConsoleConfig {
        config_version: 0,
        ..ConsoleConfig::default()
    };
    let err = repo.write(&config).await.expect_err("version 0");
    assert!(err.to_string().contains("config_version"), "got: {err}");
}

#[tokio::test]
async fn test_write_accepts_empty_version_one() {
    let repo = ConfigRepository::new(MemoryBackend::default());
    repo.write(&ConsoleConfig::default()).await.expect("empty v1 is valid");
}

#[tokio::test]
async fn test_write_propagates_put_failure() {
    let backend = MemoryBackend::default();
    MemoryBackend::fail(&backend.switches.fail_put_config);
    let repo = ConfigRepository::new(backend);
    let err = repo.write(&demo_config()).await.expect_err("put fails");
    assert!(format!("{err:#}").contains("PUT config"), "got: {err:#}");
}

#[tokio::test]
async fn test_write_env_rejects_bad_key() {
    let backend = MemoryBackend::default();
    let repo = ConfigRepository::new(backend.clone());
    let env = EnvVars::from([("lower_case".to_string(), "x".to_string())]);
    assert!(repo.write_env(&env).await.is_err());
    assert_eq!(count(&backend.calls.put_env), 0);
}

#[tokio::test]
async fn test_write_validates_against_injected_catalog() {
    let mut config = demo_config();
    config.model_connections.insert(
        "anthropic-claude-3-5-sonnet".to_string(),
        ModelConnection {
            model: "claude-3-5-sonnet".to_string(),
            hosting_provider: "anthropic".to_string(),
            enabled: true,
            provider_model_id: "claude-3-5-sonnet-20241022".to_string(),
            auth: ModelAuth {
                method: AuthMethod::ApiKey,
                fields: BTreeMap::from([(
                    "api_key_env".to_string(),
                    "ANTHROPIC_API_KEY".to_string(),
                )]),
            },
            endpoint: None,
        },
    );

    let builtin = ConfigRepository::new(MemoryBackend::default());
    builtin.write(&config).await.expect("known to the builtin catalog");

    let empty: &'static Catalog = Box::leak(Box::new(Catalog::new(Vec::new(), Vec::new())));
    let backend = MemoryBackend::default();
    let repo = ConfigRepository::new(backend.clone()).with_catalog(empty);
    let err = repo.write(&config).await.expect_err("unknown model");
    assert!(err.downcast_ref::<ValidationErrors>().is_some());
    assert_eq!(count(&backend.calls.put_config), 0);
}
