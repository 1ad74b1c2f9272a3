//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `polis_common`, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use anyhow::Result;
use polis_common::{ConsoleConfig, EnvVars};

// ── Persistence Port ──────────────────────────────────────────────────────────

/// The external store holding the configuration document and the env set.
///
/// Both documents are read and replaced whole; there is no partial update and
/// no version check, so the last writer wins.
#[allow(async_fn_in_trait)]
pub trait ConfigBackend {
    /// `GET config`: fetch the configuration document.
    async fn get_config(&self) -> Result<ConsoleConfig>;
    /// `PUT config`: replace the configuration document.
    async fn put_config(&self, config: &ConsoleConfig) -> Result<()>;
    /// `GET env`: fetch the environment-variable set.
    async fn get_env(&self) -> Result<EnvVars>;
    /// `PUT env`: replace the environment-variable set.
    async fn put_env(&self, env: &EnvVars) -> Result<()>;
    /// `POST backup`: snapshot the current state. Any response body is ignored.
    async fn post_backup(&self) -> Result<()>;
}

impl<T: ConfigBackend> ConfigBackend for &T {
    async fn get_config(&self) -> Result<ConsoleConfig> {
        (**self).get_config().await
    }

    async fn put_config(&self, config: &ConsoleConfig) -> Result<()> {
        (**self).put_config(config).await
    }

    async fn get_env(&self) -> Result<EnvVars> {
        (**self).get_env().await
    }

    async fn put_env(&self, env: &EnvVars) -> Result<()> {
        (**self).put_env(env).await
    }

    async fn post_backup(&self) -> Result<()> {
        (**self).post_backup().await
    }
}
