//! Pure configuration validation: no I/O, no async.
//!
//! Every rule is checked and every violation collected; the first one found
//! is listed first. Required credential fields come from the auth method
//! registry, never from this module.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use polis_common::{AuthMethod, ConsoleConfig, EnvVars, ModelConnection};
use regex::Regex;

use crate::domain::auth::{self, InputKind};
use crate::domain::catalog::Catalog;
use crate::domain::error::{EntityKind, ValidationError, ValidationErrors};

/// Lowercase alphanumeric with interior hyphens, 1–63 characters.
pub static AGENT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid regex")
});

/// Full `http(s)://` URL or a bare hostname.
pub static REGISTRY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(https?://[^\s/]+\S*|[a-zA-Z0-9.-]+)$").expect("valid regex")
});

pub static HTTP_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^https?://").expect("valid regex")
});

pub static ENV_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex")
});

/// Returns `true` if `name` is a valid agent name.
pub fn is_valid_agent_name(name: &str) -> bool {
    AGENT_NAME_RE.is_match(name)
}

/// Returns `true` if `key` is a valid environment variable name.
pub fn is_valid_env_key(key: &str) -> bool {
    ENV_KEY_RE.is_match(key)
}

/// Validate a configuration document against the builtin catalog.
///
/// # Errors
///
/// Returns every violation found.
pub fn validate_config(config: &ConsoleConfig) -> Result<(), ValidationErrors> {
    validate_config_with(config, Catalog::builtin())
}

/// Validate a configuration document against `catalog`.
///
/// # Errors
///
/// Returns every violation found.
pub fn validate_config_with(
    config: &ConsoleConfig,
    catalog: &Catalog,
) -> Result<(), ValidationErrors> {
    into_result(config_errors(config, catalog))
}

/// Validate an environment-variable set.
///
/// # Errors
///
/// Returns every violation found.
pub fn validate_env(env: &EnvVars) -> Result<(), ValidationErrors> {
    into_result(env_errors(env))
}

/// Validate configuration, env set, and the env-var names the configuration
/// refers to, as one pass.
///
/// # Errors
///
/// Returns every violation found, configuration rules first.
pub fn validate_document(
    config: &ConsoleConfig,
    env: &EnvVars,
    catalog: &Catalog,
) -> Result<(), ValidationErrors> {
    let mut errors = config_errors(config, catalog);
    errors.extend(env_errors(env));
    errors.extend(env_reference_errors(config, env));
    into_result(errors)
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// All configuration rule violations, in rule order.
pub fn config_errors(config: &ConsoleConfig, catalog: &Catalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.config_version < 1 {
        errors.push(ValidationError::field(
            EntityKind::Config,
            "config",
            "config_version",
            format!("must be >= 1 (got {})", config.config_version),
        ));
    }

    for (id, registry) in &config.registry_connections {
        if !REGISTRY_URL_RE.is_match(&registry.url) {
            errors.push(ValidationError::field(
                EntityKind::Registry,
                id,
                "url",
                format!("'{}' is neither an http(s):// URL nor a hostname", registry.url),
            ));
        }
        let method = registry.auth.method();
        for field in auth::fields_for(method).iter().filter(|f| f.required) {
            if registry.auth.field(field.name).unwrap_or_default().is_empty() {
                errors.push(ValidationError::field(
                    EntityKind::Registry,
                    id,
                    field.name,
                    format!("is required for {method} auth"),
                ));
            }
        }
    }

    let mut seen = BTreeSet::new();
    for agent in &config.agents {
        let id = agent.name.as_str();
        for (field, value) in [
            ("name", &agent.name),
            ("repo", &agent.repo),
            ("tag", &agent.tag),
            ("registry_connection", &agent.registry_connection),
        ] {
            if value.is_empty() {
                errors.push(ValidationError::field(EntityKind::Agent, id, field, "must not be empty"));
            }
        }
        if !agent.name.is_empty() && !is_valid_agent_name(&agent.name) {
            errors.push(ValidationError::field(
                EntityKind::Agent,
                id,
                "name",
                "must be lowercase alphanumeric with hyphens",
            ));
        }
        if !seen.insert(id) {
            errors.push(ValidationError::field(EntityKind::Agent, id, "name", "is duplicated"));
        }
        if !agent.registry_connection.is_empty()
            && !config
                .registry_connections
                .contains_key(&agent.registry_connection)
        {
            errors.push(ValidationError::ReferentialIntegrity {
                agent: agent.name.clone(),
                registry: agent.registry_connection.clone(),
            });
        }
        for entry in agent.egress_allowlist.iter().flatten() {
            if !HTTP_URL_RE.is_match(entry) {
                errors.push(ValidationError::field(
                    EntityKind::Agent,
                    id,
                    "egress_allowlist",
                    format!("entry '{entry}' must start with http:// or https://"),
                ));
            }
        }
    }

    for (id, connection) in &config.model_connections {
        errors.extend(model_connection_errors(id, connection, catalog));
    }

    errors
}

fn model_connection_errors(
    id: &str,
    connection: &ModelConnection,
    catalog: &Catalog,
) -> Vec<ValidationError> {
    let invalid = |field: &str, reason: String| {
        ValidationError::field(EntityKind::ModelConnection, id, field, reason)
    };

    let binding = match catalog.resolve(&connection.model, &connection.hosting_provider) {
        Ok(binding) => binding,
        Err(e) => return vec![invalid("hosting_provider", e.to_string())],
    };

    let mut errors = Vec::new();
    if connection.provider_model_id != binding.provider_model_id {
        errors.push(invalid(
            "provider_model_id",
            format!("must be '{}'", binding.provider_model_id),
        ));
    }
    let method = connection.auth.method;
    if method != binding.auth_method {
        errors.push(invalid(
            "auth.method",
            format!("must be {} for {}", binding.auth_method, binding.provider),
        ));
    }
    for field in auth::fields_for(method) {
        let value = connection.auth.field(field.name).unwrap_or_default();
        if value.is_empty() {
            if field.required {
                errors.push(invalid(field.name, format!("is required for {method} auth")));
            }
        } else if !field.accepts(value) {
            let reason = match field.kind {
                InputKind::Select(options) => {
                    format!("'{value}' is not one of: {}", options.join(", "))
                }
                _ => format!("'{value}' is not a valid value"),
            };
            errors.push(invalid(field.name, reason));
        }
    }
    match connection.endpoint.as_deref() {
        None | Some("") if binding.requires_endpoint => {
            errors.push(invalid("endpoint", format!("is required for {}", binding.provider)));
        }
        Some(endpoint) if !endpoint.is_empty() && !HTTP_URL_RE.is_match(endpoint) => {
            errors.push(invalid(
                "endpoint",
                format!("'{endpoint}' must start with http:// or https://"),
            ));
        }
        _ => {}
    }
    errors
}

/// All env-set rule violations.
pub fn env_errors(env: &EnvVars) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (key, value) in env {
        if !is_valid_env_key(key) {
            errors.push(ValidationError::field(
                EntityKind::EnvVar,
                key,
                "key",
                "must match ^[A-Z][A-Z0-9_]*$",
            ));
        }
        if value.contains(['\n', '\r']) {
            errors.push(ValidationError::field(
                EntityKind::EnvVar,
                key,
                "value",
                "must not contain newline characters",
            ));
        }
    }
    errors
}

/// Env-var names referenced by registries and model connections that are not
/// declared in `env`.
pub fn env_reference_errors(config: &ConsoleConfig, env: &EnvVars) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (id, registry) in &config.registry_connections {
        let method = registry.auth.method();
        for field in env_fields(method) {
            let name = registry.auth.field(field).unwrap_or_default();
            if !name.is_empty() && !env.contains_key(name) {
                errors.push(ValidationError::field(
                    EntityKind::Registry,
                    id,
                    field,
                    format!("references undeclared env var '{name}'"),
                ));
            }
        }
    }
    for (id, connection) in &config.model_connections {
        for field in env_fields(connection.auth.method) {
            let name = connection.auth.field(field).unwrap_or_default();
            if !name.is_empty() && !env.contains_key(name) {
                errors.push(ValidationError::field(
                    EntityKind::ModelConnection,
                    id,
                    field,
                    format!("references undeclared env var '{name}'"),
                ));
            }
        }
    }
    errors
}

fn env_fields(method: AuthMethod) -> impl Iterator<Item = &'static str> {
    auth::fields_for(method)
        .iter()
        .filter(|f| f.kind == InputKind::EnvVar)
        .map(|f| f.name)
}
