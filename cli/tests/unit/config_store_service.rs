//! Unit tests for the `ConfigStore` state machine and its entity mutators.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use polis_common::{AuthMethod, ConsoleConfig, EnvVars};
use polis_console::application::{ConfigStore, StorePhase, SyncStatus};
use polis_console::domain::catalog::{
    Catalog, HostingProvider, HostingProviderSupport, ModelCategory, ModelDefinition,
};
use polis_console::domain::error::{StoreError, ValidationErrors};
use polis_console::domain::forms::{AgentForm, ModelConnectionForm, RegistryForm};
use tokio::sync::Notify;

use crate::mocks::{MemoryBackend, agent, count, demo_config, registry};

async fn loaded(backend: &MemoryBackend) -> ConfigStore<MemoryBackend> {
    let store = ConfigStore::new(backend.clone());
    store.load_config().await.expect("load");
    store
}

fn ghcr_form() -> RegistryForm {
    RegistryForm {
        name: "GitHub Packages".to_string(),
        url: "https://ghcr.io".to_string(),
        auth_method: AuthMethod::Token,
        token_env: "GHCR_TOKEN".to_string(),
        ..RegistryForm::default()
    }
}

fn agent_form(name: &str, registry: &str) -> AgentForm {
    AgentForm {
        name: name.to_string(),
        repo: format!("acme/{name}"),
        tag: "1.0".to_string(),
        registry_connection: registry.to_string(),
        ..AgentForm::default()
    }
}

fn store_error(err: &anyhow::Error) -> &StoreError {
    err.downcast_ref::<StoreError>().expect("StoreError")
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_store_is_uninitialized_and_rejects_mutation() {
    let store = ConfigStore::new(MemoryBackend::default());
    assert_eq!(store.phase(), StorePhase::Uninitialized);

    let err = store.add_env_var("TOKEN", "x").expect_err("not loaded");
    assert_eq!(store_error(&err), &StoreError::NotLoaded);
}

#[tokio::test]
async fn test_load_moves_to_clean() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Clean));
    assert!(!store.has_unsaved_changes());
    assert_eq!(store.config(), demo_config());
}

#[tokio::test]
async fn test_first_load_failure_falls_back_to_default() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    MemoryBackend::fail(&backend.switches.fail_get_config);
    let store = ConfigStore::new(backend);

    assert!(store.load_config().await.is_err());
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Error));
    assert_eq!(store.config(), ConsoleConfig::default());
    assert!(store.last_error().is_some());
}

#[tokio::test]
async fn test_reload_failure_keeps_prior_state() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;
    store.delete_agent("demo").expect("delete");

    MemoryBackend::fail(&backend.switches.fail_get_env);
    assert!(store.load_config().await.is_err());

    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Error));
    assert!(store.config().agents.is_empty(), "in-memory edit retained");
    assert!(store.has_unsaved_changes());
}

#[tokio::test]
async fn test_mutation_marks_dirty_and_save_cleans() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;

    store.add_agent(&agent_form("worker", "dockerhub")).expect("add");
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Dirty));
    assert!(store.has_unsaved_changes());

    store.save_config().await.expect("save");
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Clean));
    assert!(!store.has_unsaved_changes());
    assert!(store.last_saved().is_some());
    assert_eq!(backend.stored_config().agents.len(), 2);
}

#[tokio::test]
async fn test_save_without_changes_is_noop() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;
    store.save_config().await.expect("save");
    assert_eq!(count(&backend.calls.put_config), 0);
    assert!(store.last_saved().is_none());
}

#[tokio::test]
async fn test_failed_save_retains_changes_and_reports_error() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;
    store.add_agent(&agent_form("worker", "dockerhub")).expect("add");

    MemoryBackend::fail(&backend.switches.fail_put_config);
    assert!(store.save_config().await.is_err());
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Error));
    assert!(store.has_unsaved_changes());
    assert_eq!(store.config().agents.len(), 2);
    assert_eq!(backend.stored_config().agents.len(), 1);

    MemoryBackend::heal(&backend.switches.fail_put_config);
    store.save_config().await.expect("retry");
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Clean));
    assert_eq!(backend.stored_config().agents.len(), 2);
}

#[tokio::test]
async fn test_invalid_document_is_not_written() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;
    store.add_agent(&agent_form("orphan", "nowhere")).expect("add is lazy");

    let err = store.save_config().await.expect_err("dangling reference");
    let errors = err.downcast_ref::<ValidationErrors>().expect("validation");
    assert!(errors.has_referential_error());
    assert_eq!(errors.first().map(|e| e.entity_id()), Some("orphan"));
    assert_eq!(count(&backend.calls.put_config), 0);
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Error));
}

#[tokio::test(flavor = "current_thread")]
async fn test_mutation_during_save_stays_dirty() {
    let gate = Arc::new(Notify::new());
    let backend = MemoryBackend::with(demo_config(), EnvVars::new()).gated(Arc::clone(&gate));
    let store = loaded(&backend).await;
    store.set_env_var("FIRST", "1").expect("set");

    let edit = async {
        tokio::task::yield_now().await;
        assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Saving));
        // Reads see the last committed state while the save is in flight.
        assert_eq!(store.config().agents.len(), 1);
        store.set_env_var("SECOND", "2").expect("set while saving");
        gate.notify_one();
    };
    let (saved, ()) = tokio::join!(store.save_config(), edit);
    saved.expect("save");

    assert!(store.has_unsaved_changes());
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Dirty));
    assert!(!backend.stored_env().contains_key("SECOND"));
}

#[tokio::test(flavor = "current_thread")]
async fn test_reload_during_save_leaves_phase_and_flag_in_agreement() {
    let gate = Arc::new(Notify::new());
    let backend = MemoryBackend::with(demo_config(), EnvVars::new()).gated(Arc::clone(&gate));
    let store = loaded(&backend).await;
    store.set_env_var("FIRST", "1").expect("set");

    let reload = async {
        tokio::task::yield_now().await;
        store.load_config().await.expect("reload");
        gate.notify_one();
    };
    let (saved, ()) = tokio::join!(store.save_config(), reload);
    saved.expect("save");

    assert!(!store.has_unsaved_changes());
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Clean));
}

#[tokio::test]
async fn test_env_write_failure_after_config_write_is_retried_whole() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;
    store.add_agent(&agent_form("worker", "dockerhub")).expect("add");
    store.set_env_var("WORKER_TOKEN", "abc").expect("set");

    MemoryBackend::fail(&backend.switches.fail_put_env);
    assert!(store.save_config().await.is_err());
    // The configuration write already landed; the env write did not.
    assert_eq!(backend.stored_config().agents.len(), 2);
    assert!(!backend.stored_env().contains_key("WORKER_TOKEN"));
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Error));
    assert!(store.has_unsaved_changes());

    MemoryBackend::heal(&backend.switches.fail_put_env);
    store.save_config().await.expect("retry");
    assert_eq!(count(&backend.calls.put_config), 2);
    assert_eq!(backend.stored_env()["WORKER_TOKEN"], "abc");
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Clean));
}

// ── Registries ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_registry_slugifies_name() {
    let store = loaded(&MemoryBackend::default()).await;
    let id = store.add_registry_connection(&ghcr_form()).expect("add");
    assert_eq!(id, "github-packages");
    assert_eq!(store.registry_form(&id), Some(RegistryForm {
        name: id.clone(),
        ..ghcr_form()
    }));
}

#[tokio::test]
async fn test_add_registry_rejects_duplicate_and_bad_method() {
    let store = loaded(&MemoryBackend::default()).await;
    store.add_registry_connection(&ghcr_form()).expect("add");

    let err = store
        .add_registry_connection(&ghcr_form())
        .expect_err("duplicate");
    assert!(matches!(store_error(&err), StoreError::AlreadyExists { .. }));

    let form = RegistryForm {
        name: "other".to_string(),
        auth_method: AuthMethod::AwsCredentials,
        ..ghcr_form()
    };
    let err = store.add_registry_connection(&form).expect_err("bad method");
    assert!(matches!(store_error(&err), StoreError::InvalidAuthMethod { .. }));

    let form = RegistryForm {
        name: "!!!".to_string(),
        ..ghcr_form()
    };
    let err = store.add_registry_connection(&form).expect_err("empty slug");
    assert!(matches!(store_error(&err), StoreError::InvalidName { .. }));
}

#[tokio::test]
async fn test_rename_registry_repoints_agents() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;

    let mut form = store.registry_form("dockerhub").expect("form");
    form.name = "Docker Hub Mirror".to_string();
    let id = store
        .update_registry_connection("dockerhub", &form)
        .expect("rename");

    assert_eq!(id, "docker-hub-mirror");
    let config = store.config();
    assert!(!config.registry_connections.contains_key("dockerhub"));
    assert_eq!(config.agents[0].registry_connection, "docker-hub-mirror");
    store.save_config().await.expect("still valid");
}

#[tokio::test]
async fn test_update_registry_keeps_non_slug_key_when_name_unchanged() {
    let mut config = ConsoleConfig::default();
    config
        .registry_connections
        .insert("docker_hub".to_string(), registry("docker.io"));
    config.agents.push(agent("demo", "docker_hub"));
    let backend = MemoryBackend::with(config, EnvVars::new());
    let store = loaded(&backend).await;

    let mut form = store.registry_form("docker_hub").expect("form");
    form.url = "https://mirror.gcr.io".to_string();
    let id = store
        .update_registry_connection("docker_hub", &form)
        .expect("update url");

    assert_eq!(id, "docker_hub");
    let config = store.config();
    assert_eq!(config.registry_connections.len(), 1);
    assert_eq!(config.registry_connections["docker_hub"].url, "https://mirror.gcr.io");
    assert_eq!(config.agents[0].registry_connection, "docker_hub");
}

#[tokio::test]
async fn test_delete_registry_in_use_is_refused() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;

    let err = store
        .delete_registry_connection("dockerhub")
        .expect_err("in use");
    match store_error(&err) {
        StoreError::RegistryInUse { agents, .. } => assert_eq!(agents, &["demo".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!store.has_unsaved_changes(), "refused mutation is not a change");
}

#[tokio::test]
async fn test_delete_registry_leaves_no_reference() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;
    store.delete_agent("demo").expect("delete agent");
    store
        .delete_registry_connection("dockerhub")
        .expect("delete registry");

    let config = store.config();
    assert!(config.agents_using_registry("dockerhub").is_empty());
    assert!(config.registry_connections.is_empty());
}

// ── Agents ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_agent_crud_round_trip() {
    let backend = MemoryBackend::with(demo_config(), EnvVars::new());
    let store = loaded(&backend).await;

    let mut form = agent_form("worker", "dockerhub");
    form.labels = BTreeMap::from([("team".to_string(), "infra".to_string())]);
    form.expose_ports = vec![8080];
    store.add_agent(&form).expect("add");
    assert_eq!(store.agent_form("worker"), Some(form.clone()));

    form.tag = "2.0".to_string();
    store.update_agent("worker", &form).expect("update");
    assert_eq!(store.agent_form("worker").map(|f| f.tag), Some("2.0".to_string()));

    let names: Vec<String> = store.agent_forms().into_iter().map(|f| f.name).collect();
    assert_eq!(names, ["demo", "worker"], "update keeps position");

    store.delete_agent("worker").expect("delete");
    assert!(store.agent_form("worker").is_none());
}

#[tokio::test]
async fn test_agent_name_rules() {
    let store = loaded(&MemoryBackend::with(demo_config(), EnvVars::new())).await;

    let err = store
        .add_agent(&agent_form("Bad_Name", "dockerhub"))
        .expect_err("invalid");
    assert!(matches!(store_error(&err), StoreError::InvalidName { .. }));

    let err = store
        .add_agent(&agent_form("demo", "dockerhub"))
        .expect_err("duplicate");
    assert!(matches!(store_error(&err), StoreError::AlreadyExists { .. }));

    let err = store
        .update_agent("ghost", &agent_form("ghost", "dockerhub"))
        .expect_err("unknown");
    assert!(matches!(store_error(&err), StoreError::NotFound { .. }));
}

// ── Model connections ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_model_connection_resolves_catalog() {
    let backend = MemoryBackend::default();
    let store = loaded(&backend).await;
    let form = ModelConnectionForm {
        model: "claude-3-5-sonnet".to_string(),
        hosting_provider: "anthropic".to_string(),
        credentials: BTreeMap::from([("api_key_env".to_string(), "ANTHROPIC_API_KEY".to_string())]),
        ..ModelConnectionForm::default()
    };

    let id = store.add_model_connection(&form).expect("add");
    assert_eq!(id, "anthropic-claude-3-5-sonnet");
    let connection = store.config().model_connections[&id].clone();
    assert_eq!(connection.provider_model_id, "claude-3-5-sonnet-20241022");
    assert_eq!(connection.auth.method, AuthMethod::ApiKey);

    // The referenced env var must exist before the save goes through.
    assert!(store.save_config().await.is_err());
    store
        .set_env_var("ANTHROPIC_API_KEY", "sk-ant-0123456789")
        .expect("set");
    store.save_config().await.expect("save");
    assert!(backend.stored_config().model_connections.contains_key(&id));
}

#[tokio::test]
async fn test_add_model_connection_rejects_unknown_pair() {
    let store = loaded(&MemoryBackend::default()).await;
    let form = ModelConnectionForm {
        model: "gpt-4o".to_string(),
        hosting_provider: "anthropic".to_string(),
        ..ModelConnectionForm::default()
    };
    assert!(store.add_model_connection(&form).is_err());
    assert!(!store.has_unsaved_changes());
}

fn house_catalog() -> &'static Catalog {
    Box::leak(Box::new(Catalog::new(
        vec![ModelDefinition {
            id: "house-model".to_string(),
            display_name: "House Model".to_string(),
            vendor: "Acme".to_string(),
            category: ModelCategory::Chat,
            description: "Self-hosted chat model".to_string(),
            providers: vec![HostingProviderSupport {
                provider: "acme".to_string(),
                provider_model_id: "house-model-v1".to_string(),
                auth_method: AuthMethod::ApiKey,
                requires_endpoint: false,
            }],
        }],
        vec![HostingProvider {
            id: "acme".to_string(),
            display_name: "Acme Cloud".to_string(),
        }],
    )))
}

#[tokio::test]
async fn test_custom_catalog_connection_saves() {
    let backend = MemoryBackend::default();
    let store = ConfigStore::new(backend.clone()).with_catalog(house_catalog());
    store.load_config().await.expect("load");
    let form = ModelConnectionForm {
        model: "house-model".to_string(),
        hosting_provider: "acme".to_string(),
        credentials: BTreeMap::from([("api_key_env".to_string(), "ACME_KEY".to_string())]),
        ..ModelConnectionForm::default()
    };

    let id = store.add_model_connection(&form).expect("add");
    store.set_env_var("ACME_KEY", "acme-0123456789").expect("set");
    store.save_config().await.expect("save against custom catalog");

    let stored = backend.stored_config();
    assert_eq!(stored.model_connections[&id].provider_model_id, "house-model-v1");
    assert_eq!(store.phase(), StorePhase::Ready(SyncStatus::Clean));
}

// ── Env vars ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_env_crud() {
    let backend = MemoryBackend::default();
    let store = loaded(&backend).await;

    store.add_env_var("TOKEN", "a").expect("add");
    assert!(store.add_env_var("TOKEN", "b").is_err());
    store.update_env_var("TOKEN", "b").expect("update");
    assert!(store.update_env_var("MISSING", "x").is_err());
    assert!(!store.set_env_var("TOKEN", "c").expect("upsert"));
    assert!(store.set_env_var("OTHER", "d").expect("upsert"));
    store.delete_env_var("OTHER").expect("delete");
    assert!(store.delete_env_var("OTHER").is_err());

    store.save_config().await.expect("save");
    assert_eq!(
        backend.stored_env(),
        EnvVars::from([("TOKEN".to_string(), "c".to_string())])
    );
}

#[tokio::test]
async fn test_deleting_referenced_env_var_fails_at_save() {
    let backend = MemoryBackend::default();
    let store = loaded(&backend).await;
    store.set_env_var("GHCR_TOKEN", "t").expect("set");
    store.add_registry_connection(&ghcr_form()).expect("add");
    store.save_config().await.expect("save");

    store.delete_env_var("GHCR_TOKEN").expect("lazy delete");
    let err = store.save_config().await.expect_err("reference check");
    assert!(err.to_string().contains("GHCR_TOKEN"), "got: {err}");
}
