//! Application service: the validated, backup-before-write persistence boundary.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use polis_common::{ConsoleConfig, EnvVars};

use crate::application::ports::ConfigBackend;
use crate::domain::catalog::Catalog;
use crate::domain::validate::{validate_config_with, validate_env};

/// Reads and writes the configuration and env set through a `ConfigBackend`.
pub struct ConfigRepository<B> {
    backend: B,
    catalog: &'static Catalog,
}

impl<B: ConfigBackend> ConfigRepository<B> {
    /// Repository validating model connections against the builtin catalog.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            catalog: Catalog::builtin(),
        }
    }

    /// Validate model connections against `catalog` instead.
    #[must_use]
    pub fn with_catalog(mut self, catalog: &'static Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch the configuration, degrading to the default document (version 1,
    /// no registries, no agents) when the backend fails.
    pub async fn read(&self) -> ConsoleConfig {
        match self.read_checked().await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "falling back to default configuration");
                ConsoleConfig::default()
            }
        }
    }

    /// Fetch the configuration, propagating backend failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    pub async fn read_checked(&self) -> Result<ConsoleConfig> {
        self.backend
            .get_config()
            .await
            .context("reading configuration")
    }

    /// Fetch the env set, degrading to an empty set when the backend fails.
    pub async fn read_env(&self) -> EnvVars {
        match self.read_env_checked().await {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "falling back to empty env set");
                EnvVars::new()
            }
        }
    }

    /// Fetch the env set, propagating backend failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    pub async fn read_env_checked(&self) -> Result<EnvVars> {
        self.backend.get_env().await.context("reading env vars")
    }

    /// Validate, back up, then replace the stored configuration.
    ///
    /// Nothing is sent to the backend when validation fails. A failed backup
    /// is logged and does not stop the write.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` for an invalid document, or the backend
    /// error if the write fails.
    pub async fn write(&self, config: &ConsoleConfig) -> Result<()> {
        validate_config_with(config, self.catalog)?;
        self.backup().await;
        self.backend
            .put_config(config)
            .await
            .context("writing configuration")?;
        tracing::info!(
            registries = config.registry_connections.len(),
            agents = config.agents.len(),
            model_connections = config.model_connections.len(),
            "configuration written",
        );
        Ok(())
    }

    /// Validate, then replace the stored env set.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` for an invalid set, or the backend error if
    /// the write fails.
    pub async fn write_env(&self, env: &EnvVars) -> Result<()> {
        validate_env(env)?;
        self.backend.put_env(env).await.context("writing env vars")?;
        tracing::info!(count = env.len(), "env vars written");
        Ok(())
    }

    /// Ask the backend for a snapshot. Best effort: failures are logged only.
    pub async fn backup(&self) {
        match self.backend.post_backup().await {
            Ok(()) => tracing::debug!("backup created"),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "backup failed, continuing"),
        }
    }
}
