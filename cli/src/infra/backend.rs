//! Runtime-selected `ConfigBackend`.

use anyhow::Result;
use polis_common::{ConsoleConfig, EnvVars};

use super::cache::TieredBackend;
use super::file::FileBackend;
use super::http::HttpBackend;
use crate::application::ports::ConfigBackend;

/// One of the concrete backends, chosen from settings at startup.
pub enum AnyBackend {
    File(FileBackend),
    Http(HttpBackend),
    Tiered(TieredBackend<HttpBackend>),
}

impl AnyBackend {
    /// Short description for status output.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            AnyBackend::File(b) => format!("file ({})", b.dir().display()),
            AnyBackend::Http(b) => format!("api ({})", b.base_url()),
            AnyBackend::Tiered(b) => format!(
                "api ({}, cache {})",
                b.remote().base_url(),
                b.cache().path().display()
            ),
        }
    }
}

impl ConfigBackend for AnyBackend {
    async fn get_config(&self) -> Result<ConsoleConfig> {
        match self {
            AnyBackend::File(b) => b.get_config().await,
            AnyBackend::Http(b) => b.get_config().await,
            AnyBackend::Tiered(b) => b.get_config().await,
        }
    }

    async fn put_config(&self, config: &ConsoleConfig) -> Result<()> {
        match self {
            AnyBackend::File(b) => b.put_config(config).await,
            AnyBackend::Http(b) => b.put_config(config).await,
            AnyBackend::Tiered(b) => b.put_config(config).await,
        }
    }

    async fn get_env(&self) -> Result<EnvVars> {
        match self {
            AnyBackend::File(b) => b.get_env().await,
            AnyBackend::Http(b) => b.get_env().await,
            AnyBackend::Tiered(b) => b.get_env().await,
        }
    }

    async fn put_env(&self, env: &EnvVars) -> Result<()> {
        match self {
            AnyBackend::File(b) => b.put_env(env).await,
            AnyBackend::Http(b) => b.put_env(env).await,
            AnyBackend::Tiered(b) => b.put_env(env).await,
        }
    }

    async fn post_backup(&self) -> Result<()> {
        match self {
            AnyBackend::File(b) => b.post_backup().await,
            AnyBackend::Http(b) => b.post_backup().await,
            AnyBackend::Tiered(b) => b.post_backup().await,
        }
    }
}
