//! JSON output helpers.
//!
//! Provides the machine-readable renderer and the error-object formatter
//! used by all `--json` code paths when a command fails.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polis_common::{AuthMethod, ConsoleConfig, EnvVars};
use serde::Serialize;

use crate::domain::auth::CredentialField;
use crate::domain::catalog::{ModelDefinition, ProviderBinding};
use crate::domain::error::{
    CatalogError, PersistenceError, StoreError, ValidationError, ValidationErrors,
};
use crate::domain::forms::{AgentForm, ModelConnectionForm, RegistryForm};
use crate::output::mask_secret;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen in
/// practice: `serde_json` only fails on non-finite floats and maps with
/// non-string keys, neither of which appear here).
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for the error object.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<ValidationErrors>().is_some() {
        return "VALIDATION_FAILED";
    }
    if let Some(e) = err.downcast_ref::<StoreError>() {
        return match e {
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::AlreadyExists { .. } => "ALREADY_EXISTS",
            StoreError::InvalidName { .. } | StoreError::InvalidAuthMethod { .. } => {
                "INVALID_INPUT"
            }
            StoreError::RegistryInUse { .. } => "REGISTRY_IN_USE",
            StoreError::NotLoaded => "NOT_LOADED",
        };
    }
    if err.downcast_ref::<CatalogError>().is_some() {
        return "CATALOG_ERROR";
    }
    if err.downcast_ref::<PersistenceError>().is_some() {
        return "PERSISTENCE_ERROR";
    }
    "ERROR"
}

/// Print `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{out}");
    Ok(())
}

#[derive(Serialize)]
struct ModelConnectionEntry<'a> {
    id: &'a str,
    #[serde(flatten)]
    form: &'a ModelConnectionForm,
}

/// Renders console entities as JSON documents on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_registries(registries: &[RegistryForm]) -> Result<()> {
        print(&serde_json::json!({ "registry_connections": registries }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_agents(agents: &[AgentForm]) -> Result<()> {
        print(&serde_json::json!({ "agents": agents }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_model_connections(connections: &[(String, ModelConnectionForm)]) -> Result<()> {
        let entries: Vec<ModelConnectionEntry<'_>> = connections
            .iter()
            .map(|(id, form)| ModelConnectionEntry { id, form })
            .collect();
        print(&serde_json::json!({ "model_connections": entries }))
    }

    /// Env values are masked.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_env(env: &EnvVars) -> Result<()> {
        let masked: BTreeMap<&str, String> = env
            .iter()
            .map(|(k, v)| (k.as_str(), mask_secret(v)))
            .collect();
        print(&serde_json::json!({ "env": masked }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(config: &ConsoleConfig) -> Result<()> {
        print(config)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_validation(errors: &[ValidationError]) -> Result<()> {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        print(&serde_json::json!({
            "valid": errors.is_empty(),
            "errors": messages,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_catalog_models(models: &[&ModelDefinition]) -> Result<()> {
        print(&serde_json::json!({ "models": models }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_models_by_vendor(grouped: &BTreeMap<&str, Vec<&ModelDefinition>>) -> Result<()> {
        print(&serde_json::json!({ "vendors": grouped }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_providers(model: &ModelDefinition) -> Result<()> {
        print(&serde_json::json!({
            "model": model.id,
            "providers": model.providers,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_auth_fields(method: AuthMethod, fields: &[CredentialField]) -> Result<()> {
        print(&serde_json::json!({ "method": method, "fields": fields }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_binding(binding: &ProviderBinding) -> Result<()> {
        print(binding)
    }

    /// Acknowledge a successful mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_done(action: &str, id: &str) -> Result<()> {
        print(&serde_json::json!({ "ok": true, "action": action, "id": id }))
    }
}
