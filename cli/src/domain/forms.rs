//! Form ↔ canonical mapping: pure functions, no I/O, no async.
//!
//! Forms are the flat shapes an editor works with; the canonical types in
//! `polis_common::config` are what gets persisted. Construction rule for every
//! optional canonical field: it is present only if the form value is
//! non-empty. The reverse direction always yields a fully populated form,
//! with absent fields mapped to empty values.

use std::collections::BTreeMap;

use polis_common::{
    AgentConfig, AgentOverrides, ArtifactPermissions, AuthMethod, ModelAuth, ModelConnection,
    RegistryAuth, RegistryConnection,
};
use serde::{Deserialize, Serialize};

use crate::domain::auth;
use crate::domain::catalog::Catalog;
use crate::domain::error::CatalogError;

// ── Field inclusion helpers ───────────────────────────────────────────────────

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn non_empty_vec<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn non_empty_map(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then(|| map.clone())
}

/// Normalize a display name into an id: lowercase ASCII alphanumerics with
/// single `-` separators, no leading or trailing `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// ── Registry connections ──────────────────────────────────────────────────────

/// Editable view of a registry connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryForm {
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub auth_method: AuthMethod,
    pub username_env: String,
    pub password_env: String,
    pub token_env: String,
}

impl Default for RegistryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            enabled: true,
            auth_method: AuthMethod::None,
            username_env: String::new(),
            password_env: String::new(),
            token_env: String::new(),
        }
    }
}

impl RegistryForm {
    /// Id the connection is stored under.
    #[must_use]
    pub fn id(&self) -> String {
        slugify(&self.name)
    }

    /// Canonical id and entity. Env fields not used by the chosen method are
    /// dropped; methods other than `basic`/`token` map to no auth.
    #[must_use]
    pub fn to_canonical(&self) -> (String, RegistryConnection) {
        let auth = match self.auth_method {
            AuthMethod::Basic => RegistryAuth::Basic {
                username_env: self.username_env.clone(),
                password_env: self.password_env.clone(),
            },
            AuthMethod::Token => RegistryAuth::Token {
                token_env: self.token_env.clone(),
            },
            _ => RegistryAuth::None,
        };
        (
            self.id(),
            RegistryConnection {
                url: self.url.clone(),
                enabled: self.enabled,
                auth,
            },
        )
    }

    #[must_use]
    pub fn from_canonical(id: &str, registry: &RegistryConnection) -> Self {
        let field = |name| registry.auth.field(name).unwrap_or_default().to_string();
        Self {
            name: id.to_string(),
            url: registry.url.clone(),
            enabled: registry.enabled,
            auth_method: registry.auth.method(),
            username_env: field("username_env"),
            password_env: field("password_env"),
            token_env: field("token_env"),
        }
    }
}

// ── Agents ────────────────────────────────────────────────────────────────────

/// Editable, flattened view of an agent config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentForm {
    pub name: String,
    pub repo: String,
    pub tag: String,
    pub registry_connection: String,
    pub egress_allowlist: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub artifacts_read: bool,
    pub artifacts_write: bool,
    pub env_overrides: BTreeMap<String, String>,
    pub expose_ports: Vec<u16>,
}

impl AgentForm {
    #[must_use]
    pub fn to_canonical(&self) -> AgentConfig {
        let artifact_permissions = (self.artifacts_read || self.artifacts_write).then_some(
            ArtifactPermissions {
                read: self.artifacts_read,
                write: self.artifacts_write,
            },
        );
        let env = non_empty_map(&self.env_overrides);
        let expose = non_empty_vec(&self.expose_ports);
        let overrides = (env.is_some() || expose.is_some()).then_some(AgentOverrides { env, expose });

        AgentConfig {
            name: self.name.clone(),
            repo: self.repo.clone(),
            tag: self.tag.clone(),
            registry_connection: self.registry_connection.clone(),
            egress_allowlist: non_empty_vec(&self.egress_allowlist),
            labels: non_empty_map(&self.labels),
            artifact_permissions,
            overrides,
        }
    }

    #[must_use]
    pub fn from_canonical(agent: &AgentConfig) -> Self {
        let perms = agent.artifact_permissions.unwrap_or_default();
        let overrides = agent.overrides.clone().unwrap_or_default();
        Self {
            name: agent.name.clone(),
            repo: agent.repo.clone(),
            tag: agent.tag.clone(),
            registry_connection: agent.registry_connection.clone(),
            egress_allowlist: agent.egress_allowlist.clone().unwrap_or_default(),
            labels: agent.labels.clone().unwrap_or_default(),
            artifacts_read: perms.read,
            artifacts_write: perms.write,
            env_overrides: overrides.env.unwrap_or_default(),
            expose_ports: overrides.expose.unwrap_or_default(),
        }
    }
}

// ── Model connections ─────────────────────────────────────────────────────────

/// Id a model connection is stored under.
#[must_use]
pub fn model_connection_id(hosting_provider: &str, model: &str) -> String {
    slugify(&format!("{hosting_provider}-{model}"))
}

/// Editable view of a model connection. The provider-specific model id and
/// the auth method are not editable; they are resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConnectionForm {
    pub model: String,
    pub hosting_provider: String,
    pub enabled: bool,
    pub credentials: BTreeMap<String, String>,
    pub endpoint: String,
}

impl Default for ModelConnectionForm {
    fn default() -> Self {
        Self {
            model: String::new(),
            hosting_provider: String::new(),
            enabled: true,
            credentials: BTreeMap::new(),
            endpoint: String::new(),
        }
    }
}

impl ModelConnectionForm {
    #[must_use]
    pub fn id(&self) -> String {
        model_connection_id(&self.hosting_provider, &self.model)
    }

    /// Resolve the pair through `catalog` and build the canonical entity.
    /// Only credential fields the resolved auth method defines, and only
    /// non-empty ones, are kept.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` when the catalog does not offer the pair.
    pub fn to_canonical(&self, catalog: &Catalog) -> Result<(String, ModelConnection), CatalogError> {
        let binding = catalog.resolve(&self.model, &self.hosting_provider)?;
        let fields = auth::fields_for(binding.auth_method)
            .iter()
            .filter_map(|f| {
                let value = self.credentials.get(f.name)?;
                non_empty(value).map(|v| (f.name.to_string(), v))
            })
            .collect();
        Ok((
            self.id(),
            ModelConnection {
                model: binding.model,
                hosting_provider: binding.provider,
                enabled: self.enabled,
                provider_model_id: binding.provider_model_id,
                auth: ModelAuth {
                    method: binding.auth_method,
                    fields,
                },
                endpoint: non_empty(&self.endpoint),
            },
        ))
    }

    #[must_use]
    pub fn from_canonical(connection: &ModelConnection) -> Self {
        Self {
            model: connection.model.clone(),
            hosting_provider: connection.hosting_provider.clone(),
            enabled: connection.enabled,
            credentials: connection.auth.fields.clone(),
            endpoint: connection.endpoint.clone().unwrap_or_default(),
        }
    }
}
