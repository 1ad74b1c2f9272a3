//! Application service: the in-memory configuration store.
//!
//! Holds the canonical configuration and env set, applies entity-scoped
//! mutations through the form mapper, tracks unsaved changes, and drives the
//! repository on load/save. Imports only from `crate::domain` and
//! `crate::application`.
//!
//! Mutators are synchronous and hold the internal lock only while they touch
//! memory. `load_config`/`save_config` release it across backend calls, so
//! the last committed state stays readable while a save is in flight.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use chrono::{DateTime, Utc};
use polis_common::{ConsoleConfig, EnvVars};

use crate::application::ports::ConfigBackend;
use crate::application::services::repository::ConfigRepository;
use crate::domain::catalog::Catalog;
use crate::domain::error::{EntityKind, StoreError};
use crate::domain::forms::{AgentForm, ModelConnectionForm, RegistryForm};
use crate::domain::validate::{is_valid_agent_name, validate_document};

// ── State machine ─────────────────────────────────────────────────────────────

/// Sync status of a loaded store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// In-memory state matches the last load or save.
    Clean,
    /// Unsaved local changes.
    Dirty,
    /// A save is in flight.
    Saving,
    /// The last load or save failed. Unsaved changes, if any, are retained.
    Error,
}

/// Lifecycle phase of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Uninitialized,
    Loading,
    Ready(SyncStatus),
}

struct StoreState {
    phase: StorePhase,
    config: ConsoleConfig,
    env: EnvVars,
    loaded: bool,
    dirty: bool,
    /// Bumped by every mutation; lets a finished save tell whether edits
    /// landed while it was in flight.
    revision: u64,
    last_saved: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl StoreState {
    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision += 1;
        if self.phase != StorePhase::Ready(SyncStatus::Saving) {
            self.phase = StorePhase::Ready(SyncStatus::Dirty);
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Canonical configuration store for one editing session.
pub struct ConfigStore<B> {
    repository: ConfigRepository<B>,
    catalog: &'static Catalog,
    state: Mutex<StoreState>,
}

impl<B: ConfigBackend> ConfigStore<B> {
    /// Create an uninitialized store backed by `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            repository: ConfigRepository::new(backend),
            catalog: Catalog::builtin(),
            state: Mutex::new(StoreState {
                phase: StorePhase::Uninitialized,
                config: ConsoleConfig::default(),
                env: EnvVars::new(),
                loaded: false,
                dirty: false,
                revision: 0,
                last_saved: None,
                last_error: None,
            }),
        }
    }

    /// Resolve model connections against `catalog` instead of the builtin one.
    #[must_use]
    pub fn with_catalog(self, catalog: &'static Catalog) -> Self {
        Self {
            repository: self.repository.with_catalog(catalog),
            catalog,
            state: self.state,
        }
    }

    pub fn repository(&self) -> &ConfigRepository<B> {
        &self.repository
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Status queries ───────────────────────────────────────────────────────

    pub fn phase(&self) -> StorePhase {
        self.lock().phase
    }

    /// Returns `true` while local changes have not been saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.lock().dirty
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.lock().last_saved
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Snapshot of the in-memory configuration.
    pub fn config(&self) -> ConsoleConfig {
        self.lock().config.clone()
    }

    /// Snapshot of the in-memory env set.
    pub fn env(&self) -> EnvVars {
        self.lock().env.clone()
    }

    // ── Load / save ──────────────────────────────────────────────────────────

    /// Replace in-memory state with the stored documents.
    ///
    /// On failure the store moves to `Ready(Error)`, keeping the previous
    /// in-memory state if one was loaded, or the default document otherwise.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn load_config(&self) -> Result<()> {
        self.lock().phase = StorePhase::Loading;

        let loaded = async {
            let config = self.repository.read_checked().await?;
            let env = self.repository.read_env_checked().await?;
            anyhow::Ok((config, env))
        }
        .await;

        let mut state = self.lock();
        match loaded {
            Ok((config, env)) => {
                tracing::debug!(
                    registries = config.registry_connections.len(),
                    agents = config.agents.len(),
                    "configuration loaded",
                );
                state.config = config;
                state.env = env;
                state.loaded = true;
                state.dirty = false;
                state.last_error = None;
                state.phase = StorePhase::Ready(SyncStatus::Clean);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "configuration load failed");
                if !state.loaded {
                    state.config = ConsoleConfig::default();
                    state.env = EnvVars::new();
                    state.loaded = true;
                }
                state.last_error = Some(format!("{e:#}"));
                state.phase = StorePhase::Ready(SyncStatus::Error);
                Err(e)
            }
        }
    }

    /// Validate and persist the in-memory state.
    ///
    /// Does nothing when there are no unsaved changes. On failure the store
    /// moves to `Ready(Error)` with its unsaved changes intact.
    ///
    /// The configuration is written before the env set and the two writes are
    /// not atomic. If the env write fails the stored configuration is already
    /// replaced; the store stays dirty so a retry writes both again.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` when the document is invalid, or the backend
    /// error when a write fails.
    pub async fn save_config(&self) -> Result<()> {
        let (config, env, revision) = {
            let mut state = self.lock();
            if !state.loaded {
                return Err(StoreError::NotLoaded.into());
            }
            if !state.dirty {
                tracing::debug!("no unsaved changes, skipping save");
                return Ok(());
            }
            state.phase = StorePhase::Ready(SyncStatus::Saving);
            (state.config.clone(), state.env.clone(), state.revision)
        };

        let saved = async {
            validate_document(&config, &env, self.catalog)?;
            self.repository.write(&config).await?;
            self.repository.write_env(&env).await?;
            anyhow::Ok(())
        }
        .await;

        let mut state = self.lock();
        match saved {
            Ok(()) => {
                state.last_saved = Some(Utc::now());
                state.last_error = None;
                if state.revision == revision {
                    state.dirty = false;
                }
                state.phase = StorePhase::Ready(if state.dirty {
                    SyncStatus::Dirty
                } else {
                    SyncStatus::Clean
                });
                Ok(())
            }
            Err(e) => {
                state.last_error = Some(format!("{e:#}"));
                state.phase = StorePhase::Ready(SyncStatus::Error);
                Err(e)
            }
        }
    }

    // ── Mutation plumbing ────────────────────────────────────────────────────

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut state = self.lock();
        if !state.loaded {
            return Err(StoreError::NotLoaded.into());
        }
        let out = f(&mut state)?;
        state.mark_dirty();
        Ok(out)
    }

    // ── Registry connections ─────────────────────────────────────────────────

    /// Add a registry connection; returns its id.
    ///
    /// # Errors
    ///
    /// Fails if the name does not yield an id, the auth method is not a
    /// registry method, or the id is taken.
    pub fn add_registry_connection(&self, form: &RegistryForm) -> Result<String> {
        check_registry_form(form)?;
        self.mutate(|state| {
            let (id, registry) = form.to_canonical();
            if state.config.registry_connections.contains_key(&id) {
                return Err(already_exists(EntityKind::Registry, &id));
            }
            state.config.registry_connections.insert(id.clone(), registry);
            Ok(id)
        })
    }

    /// Replace registry `id`; returns the (possibly new) id. Renaming the
    /// registry re-points every agent that referenced the old id.
    ///
    /// # Errors
    ///
    /// Fails if `id` is unknown, the form is invalid, or the new id is taken.
    pub fn update_registry_connection(&self, id: &str, form: &RegistryForm) -> Result<String> {
        check_registry_form(form)?;
        self.mutate(|state| {
            let registries = &mut state.config.registry_connections;
            if !registries.contains_key(id) {
                return Err(not_found(EntityKind::Registry, id));
            }
            let (slug, registry) = form.to_canonical();
            // An unchanged name keeps the stored key, even one that is not a slug.
            let new_id = if form.name == id { id.to_string() } else { slug };
            if new_id != id && registries.contains_key(&new_id) {
                return Err(already_exists(EntityKind::Registry, &new_id));
            }
            registries.remove(id);
            registries.insert(new_id.clone(), registry);
            if new_id != id {
                for agent in &mut state.config.agents {
                    if agent.registry_connection == id {
                        agent.registry_connection.clone_from(&new_id);
                    }
                }
            }
            Ok(new_id)
        })
    }

    /// Delete registry `id`. Refused while any agent references it.
    ///
    /// # Errors
    ///
    /// Fails with `StoreError::RegistryInUse` if referenced, or `NotFound`.
    pub fn delete_registry_connection(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            if !state.config.registry_connections.contains_key(id) {
                return Err(not_found(EntityKind::Registry, id));
            }
            let agents = state.config.agents_using_registry(id);
            if !agents.is_empty() {
                return Err(StoreError::RegistryInUse {
                    id: id.to_string(),
                    agents,
                }
                .into());
            }
            state.config.registry_connections.remove(id);
            Ok(())
        })
    }

    pub fn registry_form(&self, id: &str) -> Option<RegistryForm> {
        let state = self.lock();
        state
            .config
            .registry_connections
            .get(id)
            .map(|r| RegistryForm::from_canonical(id, r))
    }

    /// Every registry as a form, ordered by id.
    pub fn registry_forms(&self) -> Vec<RegistryForm> {
        let state = self.lock();
        state
            .config
            .registry_connections
            .iter()
            .map(|(id, r)| RegistryForm::from_canonical(id, r))
            .collect()
    }

    // ── Agents ───────────────────────────────────────────────────────────────

    /// Append an agent. The registry reference is not checked here; a
    /// dangling reference is reported by the next save.
    ///
    /// # Errors
    ///
    /// Fails for an invalid or duplicate name.
    pub fn add_agent(&self, form: &AgentForm) -> Result<()> {
        check_agent_name(&form.name)?;
        self.mutate(|state| {
            if state.config.agent(&form.name).is_some() {
                return Err(already_exists(EntityKind::Agent, &form.name));
            }
            state.config.agents.push(form.to_canonical());
            Ok(())
        })
    }

    /// Replace agent `name` in place, keeping its position.
    ///
    /// # Errors
    ///
    /// Fails if `name` is unknown or the new name is invalid or taken.
    pub fn update_agent(&self, name: &str, form: &AgentForm) -> Result<()> {
        check_agent_name(&form.name)?;
        self.mutate(|state| {
            if form.name != name && state.config.agent(&form.name).is_some() {
                return Err(already_exists(EntityKind::Agent, &form.name));
            }
            let slot = state
                .config
                .agents
                .iter_mut()
                .find(|a| a.name == name)
                .ok_or_else(|| not_found(EntityKind::Agent, name))?;
            *slot = form.to_canonical();
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Fails if `name` is unknown.
    pub fn delete_agent(&self, name: &str) -> Result<()> {
        self.mutate(|state| {
            let before = state.config.agents.len();
            state.config.agents.retain(|a| a.name != name);
            if state.config.agents.len() == before {
                return Err(not_found(EntityKind::Agent, name));
            }
            Ok(())
        })
    }

    pub fn agent_form(&self, name: &str) -> Option<AgentForm> {
        self.lock().config.agent(name).map(AgentForm::from_canonical)
    }

    /// Every agent as a form, in configuration order.
    pub fn agent_forms(&self) -> Vec<AgentForm> {
        self.lock()
            .config
            .agents
            .iter()
            .map(AgentForm::from_canonical)
            .collect()
    }

    // ── Model connections ────────────────────────────────────────────────────

    /// Add a model connection resolved through the catalog; returns its id.
    ///
    /// # Errors
    ///
    /// Fails if the catalog does not offer the pair or the id is taken.
    pub fn add_model_connection(&self, form: &ModelConnectionForm) -> Result<String> {
        let (id, connection) = form.to_canonical(self.catalog)?;
        self.mutate(|state| {
            if state.config.model_connections.contains_key(&id) {
                return Err(already_exists(EntityKind::ModelConnection, &id));
            }
            state.config.model_connections.insert(id.clone(), connection);
            Ok(id)
        })
    }

    /// Replace model connection `id`; returns the (possibly new) id.
    ///
    /// # Errors
    ///
    /// Fails if `id` is unknown, the pair is not in the catalog, or the new
    /// id is taken.
    pub fn update_model_connection(&self, id: &str, form: &ModelConnectionForm) -> Result<String> {
        let (new_id, connection) = form.to_canonical(self.catalog)?;
        self.mutate(|state| {
            let connections = &mut state.config.model_connections;
            if !connections.contains_key(id) {
                return Err(not_found(EntityKind::ModelConnection, id));
            }
            if new_id != id && connections.contains_key(&new_id) {
                return Err(already_exists(EntityKind::ModelConnection, &new_id));
            }
            connections.remove(id);
            connections.insert(new_id.clone(), connection);
            Ok(new_id)
        })
    }

    /// # Errors
    ///
    /// Fails if `id` is unknown.
    pub fn delete_model_connection(&self, id: &str) -> Result<()> {
        self.mutate(|state| {
            state
                .config
                .model_connections
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| not_found(EntityKind::ModelConnection, id))
        })
    }

    pub fn model_connection_form(&self, id: &str) -> Option<ModelConnectionForm> {
        self.lock()
            .config
            .model_connections
            .get(id)
            .map(ModelConnectionForm::from_canonical)
    }

    /// Every model connection as `(id, form)`, ordered by id.
    pub fn model_connection_forms(&self) -> Vec<(String, ModelConnectionForm)> {
        self.lock()
            .config
            .model_connections
            .iter()
            .map(|(id, c)| (id.clone(), ModelConnectionForm::from_canonical(c)))
            .collect()
    }

    // ── Env vars ─────────────────────────────────────────────────────────────
    //
    // Keys and values are checked at save time, as are names still referenced
    // after a delete.

    /// # Errors
    ///
    /// Fails if `key` already exists.
    pub fn add_env_var(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|state| {
            if state.env.contains_key(key) {
                return Err(already_exists(EntityKind::EnvVar, key));
            }
            state.env.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Fails if `key` does not exist.
    pub fn update_env_var(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|state| {
            let slot = state
                .env
                .get_mut(key)
                .ok_or_else(|| not_found(EntityKind::EnvVar, key))?;
            *slot = value.to_string();
            Ok(())
        })
    }

    /// Insert or replace `key`; returns `true` if it was new.
    ///
    /// # Errors
    ///
    /// Fails only if the store has not been loaded.
    pub fn set_env_var(&self, key: &str, value: &str) -> Result<bool> {
        self.mutate(|state| Ok(state.env.insert(key.to_string(), value.to_string()).is_none()))
    }

    /// # Errors
    ///
    /// Fails if `key` does not exist.
    pub fn delete_env_var(&self, key: &str) -> Result<()> {
        self.mutate(|state| {
            state
                .env
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| not_found(EntityKind::EnvVar, key))
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn not_found(entity: EntityKind, id: &str) -> anyhow::Error {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
    .into()
}

fn already_exists(entity: EntityKind, id: &str) -> anyhow::Error {
    StoreError::AlreadyExists {
        entity,
        id: id.to_string(),
    }
    .into()
}

fn check_registry_form(form: &RegistryForm) -> Result<()> {
    if form.id().is_empty() {
        return Err(StoreError::InvalidName {
            entity: EntityKind::Registry,
            name: form.name.clone(),
            reason: "must contain at least one letter or digit".to_string(),
        }
        .into());
    }
    if !form.auth_method.is_registry_method() {
        return Err(StoreError::InvalidAuthMethod {
            entity: EntityKind::Registry,
            method: form.auth_method.to_string(),
        }
        .into());
    }
    Ok(())
}

fn check_agent_name(name: &str) -> Result<()> {
    if is_valid_agent_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName {
            entity: EntityKind::Agent,
            name: name.to_string(),
            reason: "must be lowercase alphanumeric with hyphens".to_string(),
        }
        .into())
    }
}
