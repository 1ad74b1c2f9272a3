//! Console settings loaded from `POLIS_CONSOLE_*` environment variables.
//!
//! | Variable                       | Meaning                                    |
//! |--------------------------------|--------------------------------------------|
//! | `POLIS_CONSOLE_API_URL`        | Console API base URL; selects HTTP backend |
//! | `POLIS_CONSOLE_API_TOKEN_ENV`  | Name of the env var holding the API token  |
//! | `POLIS_CONSOLE_DATA_DIR`       | Data directory (default `~/.polis/console`) |
//! | `POLIS_CONSOLE_CACHE`          | Cache API documents locally (default true) |

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::backend::AnyBackend;
use super::cache::{CACHE_FILE, JsonCache, TieredBackend};
use super::file::FileBackend;
use super::http::HttpBackend;

pub const ENV_PREFIX: &str = "POLIS_CONSOLE_";

fn default_cache() -> bool {
    true
}

/// Where and how configuration is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_token_env: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_cache")]
    pub cache: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token_env: None,
            data_dir: None,
            cache: default_cache(),
        }
    }
}

impl ConsoleSettings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed (e.g. a
    /// non-boolean `POLIS_CONSOLE_CACHE`).
    pub fn from_env() -> Result<Self> {
        envy::prefixed(ENV_PREFIX)
            .from_env()
            .with_context(|| format!("failed to load settings from {ENV_PREFIX}* env vars"))
    }

    /// Apply command-line overrides; `None` keeps the current value.
    #[must_use]
    pub fn with_overrides(mut self, api_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        if api_url.is_some() {
            self.api_url = api_url;
        }
        if data_dir.is_some() {
            self.data_dir = data_dir;
        }
        self
    }

    /// Resolved data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home directory
    /// cannot be determined.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".polis").join("console"))
    }

    /// Bearer token read from the variable named by `api_token_env`.
    #[must_use]
    pub fn api_token(&self) -> Option<String> {
        let name = self.api_token_env.as_deref()?;
        match std::env::var(name) {
            Ok(token) if !token.is_empty() => Some(token),
            _ => {
                tracing::warn!(var = name, "API token variable is unset or empty");
                None
            }
        }
    }

    /// Build the backend these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or HTTP client cannot be set up.
    pub fn open_backend(&self) -> Result<AnyBackend> {
        let Some(url) = self.api_url.as_deref() else {
            let dir = self.data_dir()?;
            tracing::debug!(dir = %dir.display(), "using file backend");
            return Ok(AnyBackend::File(FileBackend::new(dir)));
        };
        let http = HttpBackend::new(url, self.api_token())?;
        if !self.cache {
            tracing::debug!(url, "using HTTP backend");
            return Ok(AnyBackend::Http(http));
        }
        let cache = JsonCache::new(self.data_dir()?.join(CACHE_FILE));
        tracing::debug!(url, cache = %cache.path().display(), "using cached HTTP backend");
        Ok(AnyBackend::Tiered(TieredBackend::new(http, cache)))
    }
}
