//! Model catalog: which models are obtainable from which hosting providers.
//!
//! The catalog is immutable reference data. Every query is a pure function of
//! it; unknown ids produce "not found", never a side effect.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use polis_common::AuthMethod;
use serde::Serialize;

use crate::domain::error::CatalogError;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Broad capability class of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelCategory {
    Chat,
    Reasoning,
    Code,
    Embedding,
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelCategory::Chat => "chat",
            ModelCategory::Reasoning => "reasoning",
            ModelCategory::Code => "code",
            ModelCategory::Embedding => "embedding",
        })
    }
}

/// How one hosting provider serves a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostingProviderSupport {
    pub provider: String,
    pub provider_model_id: String,
    pub auth_method: AuthMethod,
    pub requires_endpoint: bool,
}

/// A model and every hosting provider that offers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDefinition {
    pub id: String,
    pub display_name: String,
    pub vendor: String,
    pub category: ModelCategory,
    pub description: String,
    pub providers: Vec<HostingProviderSupport>,
}

/// A hosting provider known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostingProvider {
    pub id: String,
    pub display_name: String,
}

/// Concrete configuration for a (model, hosting provider) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderBinding {
    pub model: String,
    pub provider: String,
    pub provider_model_id: String,
    pub auth_method: AuthMethod,
    pub requires_endpoint: bool,
}

// ── Catalog ───────────────────────────────────────────────────────────────────

static BUILTIN: LazyLock<Catalog> =
    LazyLock::new(|| Catalog::new(builtin::models(), builtin::hosting_providers()));

/// Immutable model catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<ModelDefinition>,
    providers: Vec<HostingProvider>,
}

impl Catalog {
    #[must_use]
    pub fn new(models: Vec<ModelDefinition>, providers: Vec<HostingProvider>) -> Self {
        Self { models, providers }
    }

    /// The catalog compiled into the binary, built on first use.
    #[must_use]
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// All models in catalog order.
    #[must_use]
    pub fn models(&self) -> &[ModelDefinition] {
        &self.models
    }

    #[must_use]
    pub fn model(&self, id: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn hosting_providers(&self) -> &[HostingProvider] {
        &self.providers
    }

    #[must_use]
    pub fn hosting_provider(&self, id: &str) -> Option<&HostingProvider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Hosting providers that serve `model_id`, in catalog order. Empty for an
    /// unknown model.
    #[must_use]
    pub fn list_providers(&self, model_id: &str) -> &[HostingProviderSupport] {
        self.model(model_id)
            .map(|m| m.providers.as_slice())
            .unwrap_or_default()
    }

    /// Provider-specific identifier for the pair, if the provider serves the model.
    #[must_use]
    pub fn provider_model_id(&self, model_id: &str, provider_id: &str) -> Option<&str> {
        self.list_providers(model_id)
            .iter()
            .find(|p| p.provider == provider_id)
            .map(|p| p.provider_model_id.as_str())
    }

    /// Join a model and a hosting provider into a concrete binding.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownModel` or `CatalogError::UnsupportedProvider`.
    pub fn resolve(&self, model_id: &str, provider_id: &str) -> Result<ProviderBinding, CatalogError> {
        let model = self
            .model(model_id)
            .ok_or_else(|| CatalogError::UnknownModel(model_id.to_string()))?;
        let support = model
            .providers
            .iter()
            .find(|p| p.provider == provider_id)
            .ok_or_else(|| CatalogError::UnsupportedProvider {
                model: model_id.to_string(),
                provider: provider_id.to_string(),
            })?;
        Ok(ProviderBinding {
            model: model.id.clone(),
            provider: support.provider.clone(),
            provider_model_id: support.provider_model_id.clone(),
            auth_method: support.auth_method,
            requires_endpoint: support.requires_endpoint,
        })
    }

    /// Models grouped by vendor. Groups iterate in vendor order; within a group
    /// models are sorted by display name.
    #[must_use]
    pub fn models_by_vendor(&self) -> BTreeMap<&str, Vec<&ModelDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&ModelDefinition>> = BTreeMap::new();
        for model in &self.models {
            groups.entry(model.vendor.as_str()).or_default().push(model);
        }
        for models in groups.values_mut() {
            // stable: equal display names keep catalog order
            models.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        }
        groups
    }

    #[must_use]
    pub fn models_in_category(&self, category: ModelCategory) -> Vec<&ModelDefinition> {
        self.models.iter().filter(|m| m.category == category).collect()
    }

    /// Case-insensitive substring search over id, display name and description.
    /// Returns every match in catalog order; an empty query matches all models.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&ModelDefinition> {
        let needle = query.trim().to_lowercase();
        self.models
            .iter()
            .filter(|m| {
                [&m.id, &m.display_name, &m.description]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
