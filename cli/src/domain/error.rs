//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use thiserror::Error;

// ── Entity kinds ──────────────────────────────────────────────────────────────

/// Kind of configuration entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Config,
    Registry,
    Agent,
    ModelConnection,
    EnvVar,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Config => "config",
            EntityKind::Registry => "registry",
            EntityKind::Agent => "agent",
            EntityKind::ModelConnection => "model connection",
            EntityKind::EnvVar => "env var",
        })
    }
}

// ── Validation errors ─────────────────────────────────────────────────────────

/// A single rule violation found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity} '{id}': {field} {reason}")]
    InvalidField {
        entity: EntityKind,
        id: String,
        field: String,
        reason: String,
    },

    #[error("agent '{agent}': registry_connection '{registry}' does not exist")]
    ReferentialIntegrity { agent: String, registry: String },
}

impl ValidationError {
    pub(crate) fn field(
        entity: EntityKind,
        id: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidField {
            entity,
            id: id.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Id of the offending entity.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            ValidationError::InvalidField { id, .. } => id,
            ValidationError::ReferentialIntegrity { agent, .. } => agent,
        }
    }

    #[must_use]
    pub fn entity(&self) -> EntityKind {
        match self {
            ValidationError::InvalidField { entity, .. } => *entity,
            ValidationError::ReferentialIntegrity { .. } => EntityKind::Agent,
        }
    }
}

/// Every violation found in one validation pass, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration validation failed:\n{}", bullet_list(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// The first violation, which is the one reported to the user first.
    #[must_use]
    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Returns `true` if any violation is a dangling agent → registry reference.
    #[must_use]
    pub fn has_referential_error(&self) -> bool {
        self.0
            .iter()
            .any(|e| matches!(e, ValidationError::ReferentialIntegrity { .. }))
    }
}

fn bullet_list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Catalog errors ────────────────────────────────────────────────────────────

/// Lookup failures from the model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown model '{0}'.")]
    UnknownModel(String),

    #[error("Model '{model}' is not offered by hosting provider '{provider}'.")]
    UnsupportedProvider { model: String, provider: String },
}

// ── Store errors ──────────────────────────────────────────────────────────────

/// Errors raised by configuration store mutators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found.")]
    NotFound { entity: EntityKind, id: String },

    #[error("{entity} '{id}' already exists.")]
    AlreadyExists { entity: EntityKind, id: String },

    #[error("Invalid {entity} name '{name}': {reason}")]
    InvalidName {
        entity: EntityKind,
        name: String,
        reason: String,
    },

    #[error("Auth method '{method}' cannot be used for a {entity}.")]
    InvalidAuthMethod { entity: EntityKind, method: String },

    #[error(
        "Registry '{id}' is referenced by agents: {}. Remove or repoint them first.",
        agents.join(", ")
    )]
    RegistryInUse { id: String, agents: Vec<String> },

    #[error("Configuration has not been loaded yet.")]
    NotLoaded,
}

// ── Persistence errors ────────────────────────────────────────────────────────

/// Failures at the external persistence boundary.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{op} failed: {reason}")]
    Io { op: &'static str, reason: String },

    #[error("{op} failed: HTTP {status}")]
    Status { op: &'static str, status: u16 },
}
