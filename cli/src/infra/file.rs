//! File implementation of the `ConfigBackend` port.
//!
//! Layout under the data directory:
//!
//! ```text
//! config.yaml                      configuration document
//! env.yaml                         env set (0600)
//! backups/config-<timestamp>.yaml  one per backup
//! backups/env-<timestamp>.yaml     env set at that backup (0600)
//! ```
//!
//! Only the newest `MAX_BACKUPS` snapshots of each file are kept.
//!
//! Writes go through a temp file and rename. Blocking I/O runs on
//! `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use polis_common::{ConsoleConfig, EnvVars};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::ConfigBackend;

const CONFIG_FILE: &str = "config.yaml";
const ENV_FILE: &str = "env.yaml";
const BACKUP_DIR: &str = "backups";

/// Snapshots kept per backed-up file.
pub const MAX_BACKUPS: usize = 20;

/// YAML files in a local data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn env_path(&self) -> PathBuf {
        self.dir.join(ENV_FILE)
    }

    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.dir.join(BACKUP_DIR)
    }

    async fn blocking<T, F>(&self, what: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(FileBackend) -> Result<T> + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(this))
            .await
            .with_context(|| format!("{what} task panicked"))?
    }

    fn backup_sync(&self) -> Result<()> {
        let config = self.config_path();
        if !config.exists() {
            tracing::debug!(path = %config.display(), "nothing to back up yet");
            return Ok(());
        }
        let dir = self.backup_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();

        copy_into(&config, &dir.join(format!("config-{stamp}.yaml")))?;
        prune(&dir, "config-")?;

        let env = self.env_path();
        if env.exists() {
            // std::fs::copy carries the 0600 mode over.
            copy_into(&env, &dir.join(format!("env-{stamp}.yaml")))?;
            prune(&dir, "env-")?;
        }
        Ok(())
    }
}

fn copy_into(source: &Path, target: &Path) -> Result<()> {
    std::fs::copy(source, target)
        .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
    tracing::debug!(path = %target.display(), "backup written");
    Ok(())
}

/// Delete the oldest `<prefix>*.yaml` snapshots beyond `MAX_BACKUPS`.
/// Timestamps sort lexically, so name order is age order.
fn prune(dir: &Path, prefix: &str) -> Result<()> {
    let mut snapshots: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".yaml"))
        })
        .collect();
    if snapshots.len() <= MAX_BACKUPS {
        return Ok(());
    }
    snapshots.sort();
    let excess = snapshots.len() - MAX_BACKUPS;
    for path in &snapshots[..excess] {
        std::fs::remove_file(path)
            .with_context(|| format!("removing old backup {}", path.display()))?;
        tracing::debug!(path = %path.display(), "old backup removed");
    }
    Ok(())
}

/// Read and parse a YAML file; `Ok(None)` if it does not exist.
fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let value =
        serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(value))
}

/// Serialize to YAML and write atomically with owner-only permissions.
fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let content = serde_yaml::to_string(value).context("serializing YAML")?;
    let temp_path = path.with_extension("yaml.tmp");
    std::fs::write(&temp_path, content)
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
    }

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

impl ConfigBackend for FileBackend {
    async fn get_config(&self) -> Result<ConsoleConfig> {
        self.blocking("config load", |this| {
            Ok(read_yaml(&this.config_path())?.unwrap_or_default())
        })
        .await
    }

    async fn put_config(&self, config: &ConsoleConfig) -> Result<()> {
        let config = config.clone();
        self.blocking("config save", move |this| {
            write_yaml(&this.config_path(), &config)
        })
        .await
    }

    async fn get_env(&self) -> Result<EnvVars> {
        self.blocking("env load", |this| {
            Ok(read_yaml(&this.env_path())?.unwrap_or_default())
        })
        .await
    }

    async fn put_env(&self, env: &EnvVars) -> Result<()> {
        let env = env.clone();
        self.blocking("env save", move |this| write_yaml(&this.env_path(), &env))
            .await
    }

    async fn post_backup(&self) -> Result<()> {
        self.blocking("backup", |this| this.backup_sync()).await
    }
}
