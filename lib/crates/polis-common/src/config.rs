// lib/crates/polis-common/src/config.rs

//! Canonical console configuration document.
//!
//! This is the single persisted shape. Form representations used by editors
//! are views over it; optional fields are omitted from the serialized output
//! when absent so the stored document stays minimal.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::AuthMethod;

/// Schema version written by this crate.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Environment-variable set referenced by name from the configuration.
pub type EnvVars = BTreeMap<String, String>;

/// Root aggregate of the console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub registry_connections: BTreeMap<String, RegistryConnection>,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub model_connections: BTreeMap<String, ModelConnection>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION,
            registry_connections: BTreeMap::new(),
            agents: Vec::new(),
            model_connections: BTreeMap::new(),
        }
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_enabled() -> bool {
    true
}

impl ConsoleConfig {
    /// Look up an agent by name.
    #[must_use]
    pub fn agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Names of the agents whose `registry_connection` is `registry_id`.
    #[must_use]
    pub fn agents_using_registry(&self, registry_id: &str) -> Vec<String> {
        self.agents
            .iter()
            .filter(|a| a.registry_connection == registry_id)
            .map(|a| a.name.clone())
            .collect()
    }
}

// ── Registry connections ────────────────────────────────────────────────────

/// A source from which agent container images are pulled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConnection {
    /// Full `http(s)://` URL or a bare hostname such as `docker.io`.
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub auth: RegistryAuth,
}

/// Registry credentials, expressed as names of environment variables.
///
/// Missing fields deserialize as empty strings so that an incomplete
/// document surfaces as a validation error rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum RegistryAuth {
    #[default]
    None,
    Basic {
        #[serde(default)]
        username_env: String,
        #[serde(default)]
        password_env: String,
    },
    Token {
        #[serde(default)]
        token_env: String,
    },
}

impl RegistryAuth {
    #[must_use]
    pub fn method(&self) -> AuthMethod {
        match self {
            RegistryAuth::None => AuthMethod::None,
            RegistryAuth::Basic { .. } => AuthMethod::Basic,
            RegistryAuth::Token { .. } => AuthMethod::Token,
        }
    }

    /// Value of a credential field by its registry field name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match (self, name) {
            (RegistryAuth::Basic { username_env, .. }, "username_env") => Some(username_env),
            (RegistryAuth::Basic { password_env, .. }, "password_env") => Some(password_env),
            (RegistryAuth::Token { token_env }, "token_env") => Some(token_env),
            _ => None,
        }
    }

    /// Names of the environment variables this descriptor points at.
    #[must_use]
    pub fn env_refs(&self) -> Vec<&str> {
        match self {
            RegistryAuth::None => Vec::new(),
            RegistryAuth::Basic {
                username_env,
                password_env,
            } => vec![username_env.as_str(), password_env.as_str()],
            RegistryAuth::Token { token_env } => vec![token_env.as_str()],
        }
    }
}

// ── Agents ──────────────────────────────────────────────────────────────────

/// A named deployment unit pulled from exactly one registry connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub repo: String,
    pub tag: String,
    /// Id of an entry in `ConsoleConfig::registry_connections`.
    pub registry_connection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress_allowlist: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_permissions: Option<ArtifactPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<AgentOverrides>,
}

/// Access an agent has to the workspace artifact store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArtifactPermissions {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

/// Deployment overrides applied on top of the image defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose: Option<Vec<u16>>,
}

// ── Model connections ───────────────────────────────────────────────────────

/// Routing of one model through one hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConnection {
    pub model: String,
    pub hosting_provider: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Identifier the hosting provider uses for `model`.
    pub provider_model_id: String,
    pub auth: ModelAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Auth method plus its method-specific credential fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAuth {
    pub method: AuthMethod,
    /// Unquoted YAML scalars (a numeric GCP project id, say) load as text.
    #[serde(flatten, deserialize_with = "scalar_fields")]
    pub fields: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

fn scalar_fields<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Scalar::Str(s) => s,
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(n) => n.to_string(),
                Scalar::UInt(n) => n.to_string(),
                Scalar::Float(x) => x.to_string(),
            };
            (key, text)
        })
        .collect())
}

impl ModelAuth {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
