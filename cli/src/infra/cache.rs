//! Two-tier `ConfigBackend`: a remote backend fronted by a local JSON cache.
//!
//! The remote tier is authoritative. Every successful remote read or write
//! refreshes the cache; a failed remote read falls back to the cached copy.
//! Writes and backups always go to the remote, and a cache failure never
//! fails an operation that the remote completed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use polis_common::{ConsoleConfig, EnvVars};
use serde::{Deserialize, Serialize};

use crate::application::ports::ConfigBackend;

pub const CACHE_FILE: &str = "cache.json";

/// On-disk shape of the cache file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<ConsoleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    env: Option<EnvVars>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

/// Local JSON copy of the last documents seen from the remote tier.
#[derive(Debug, Clone)]
pub struct JsonCache {
    path: PathBuf,
}

impl JsonCache {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_sync(&self) -> Result<CacheDocument> {
        if !self.path.exists() {
            return Ok(CacheDocument::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading cache file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing cache file {}", self.path.display()))
    }

    fn update_sync(&self, apply: impl FnOnce(&mut CacheDocument)) -> Result<()> {
        // A corrupt cache is replaced rather than blocking the refresh.
        let mut doc = self.load_sync().unwrap_or_default();
        apply(&mut doc);
        doc.updated_at = Some(Utc::now().to_rfc3339());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&doc).context("serializing cache")?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing cache file {}", self.path.display()))
    }

    async fn load(&self) -> Result<CacheDocument> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.load_sync())
            .await
            .context("cache load task panicked")?
    }

    async fn update(&self, apply: impl FnOnce(&mut CacheDocument) + Send + 'static) -> Result<()> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.update_sync(apply))
            .await
            .context("cache save task panicked")?
    }

    /// Cached configuration, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file exists but cannot be read.
    pub async fn config(&self) -> Result<Option<ConsoleConfig>> {
        Ok(self.load().await?.config)
    }

    /// Cached env set, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file exists but cannot be read.
    pub async fn env(&self) -> Result<Option<EnvVars>> {
        Ok(self.load().await?.env)
    }

    async fn store_config(&self, config: &ConsoleConfig) {
        let config = config.clone();
        if let Err(e) = self.update(move |doc| doc.config = Some(config)).await {
            tracing::warn!(error = %format!("{e:#}"), "failed to refresh config cache");
        }
    }

    async fn store_env(&self, env: &EnvVars) {
        let env = env.clone();
        if let Err(e) = self.update(move |doc| doc.env = Some(env)).await {
            tracing::warn!(error = %format!("{e:#}"), "failed to refresh env cache");
        }
    }
}

/// Remote backend with a local fallback copy.
pub struct TieredBackend<R> {
    remote: R,
    cache: JsonCache,
}

impl<R: ConfigBackend> TieredBackend<R> {
    pub fn new(remote: R, cache: JsonCache) -> Self {
        Self { remote, cache }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &JsonCache {
        &self.cache
    }
}

impl<R: ConfigBackend> ConfigBackend for TieredBackend<R> {
    async fn get_config(&self) -> Result<ConsoleConfig> {
        match self.remote.get_config().await {
            Ok(config) => {
                self.cache.store_config(&config).await;
                Ok(config)
            }
            Err(e) => match self.cache.config().await {
                Ok(Some(cached)) => {
                    tracing::warn!(error = %format!("{e:#}"), "remote unavailable, using cached configuration");
                    Ok(cached)
                }
                _ => Err(e),
            },
        }
    }

    async fn put_config(&self, config: &ConsoleConfig) -> Result<()> {
        self.remote.put_config(config).await?;
        self.cache.store_config(config).await;
        Ok(())
    }

    async fn get_env(&self) -> Result<EnvVars> {
        match self.remote.get_env().await {
            Ok(env) => {
                self.cache.store_env(&env).await;
                Ok(env)
            }
            Err(e) => match self.cache.env().await {
                Ok(Some(cached)) => {
                    tracing::warn!(error = %format!("{e:#}"), "remote unavailable, using cached env vars");
                    Ok(cached)
                }
                _ => Err(e),
            },
        }
    }

    async fn put_env(&self, env: &EnvVars) -> Result<()> {
        self.remote.put_env(env).await?;
        self.cache.store_env(env).await;
        Ok(())
    }

    async fn post_backup(&self) -> Result<()> {
        self.remote.post_backup().await
    }
}
