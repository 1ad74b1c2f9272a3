//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod forms;
pub mod validate;

pub use catalog::{Catalog, ModelCategory, ModelDefinition, ProviderBinding};
pub use error::{
    CatalogError, EntityKind, PersistenceError, StoreError, ValidationError, ValidationErrors,
};
pub use forms::{AgentForm, ModelConnectionForm, RegistryForm, slugify};
