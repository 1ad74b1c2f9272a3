//! Shared mock infrastructure for unit tests.
//!
//! [`MemoryBackend`] is an in-memory [`ConfigBackend`] with per-operation
//! failure switches and call counters, so each test file doesn't have to
//! re-define the same boilerplate.

#![allow(clippy::expect_used, dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use polis_common::{
    AgentConfig, ConsoleConfig, EnvVars, RegistryAuth, RegistryConnection,
};
use polis_console::application::ConfigBackend;
use tokio::sync::Notify;

// ── Memory backend ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Switches {
    pub fail_get_config: AtomicBool,
    pub fail_put_config: AtomicBool,
    pub fail_get_env: AtomicBool,
    pub fail_put_env: AtomicBool,
    pub fail_backup: AtomicBool,
}

#[derive(Default)]
pub struct Calls {
    pub get_config: AtomicUsize,
    pub put_config: AtomicUsize,
    pub get_env: AtomicUsize,
    pub put_env: AtomicUsize,
    pub backup: AtomicUsize,
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// In-memory backend. Clones share state, so a test can keep a handle while
/// the store owns another.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub config: Arc<Mutex<ConsoleConfig>>,
    pub env: Arc<Mutex<EnvVars>>,
    pub switches: Arc<Switches>,
    pub calls: Arc<Calls>,
    /// When set, `put_config` waits for a notification before writing.
    pub put_gate: Option<Arc<Notify>>,
}

impl MemoryBackend {
    pub fn with(config: ConsoleConfig, env: EnvVars) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            env: Arc::new(Mutex::new(env)),
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.put_gate = Some(gate);
        self
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn heal(flag: &AtomicBool) {
        flag.store(false, Ordering::SeqCst);
    }

    pub fn stored_config(&self) -> ConsoleConfig {
        self.config.lock().expect("lock").clone()
    }

    pub fn stored_env(&self) -> EnvVars {
        self.env.lock().expect("lock").clone()
    }
}

fn failed(op: &str) -> anyhow::Error {
    anyhow::anyhow!("{op} failed: backend unavailable")
}

impl ConfigBackend for MemoryBackend {
    async fn get_config(&self) -> Result<ConsoleConfig> {
        self.calls.get_config.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_get_config.load(Ordering::SeqCst) {
            return Err(failed("GET config"));
        }
        Ok(self.stored_config())
    }

    async fn put_config(&self, config: &ConsoleConfig) -> Result<()> {
        self.calls.put_config.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.put_gate {
            gate.notified().await;
        }
        if self.switches.fail_put_config.load(Ordering::SeqCst) {
            return Err(failed("PUT config"));
        }
        *self.config.lock().expect("lock") = config.clone();
        Ok(())
    }

    async fn get_env(&self) -> Result<EnvVars> {
        self.calls.get_env.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_get_env.load(Ordering::SeqCst) {
            return Err(failed("GET env"));
        }
        Ok(self.stored_env())
    }

    async fn put_env(&self, env: &EnvVars) -> Result<()> {
        self.calls.put_env.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_put_env.load(Ordering::SeqCst) {
            return Err(failed("PUT env"));
        }
        *self.env.lock().expect("lock") = env.clone();
        Ok(())
    }

    async fn post_backup(&self) -> Result<()> {
        self.calls.backup.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_backup.load(Ordering::SeqCst) {
            return Err(failed("POST backup"));
        }
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn registry(url: &str) -> RegistryConnection {
    RegistryConnection {
        url: url.to_string(),
        enabled: true,
        auth: RegistryAuth::None,
    }
}

pub fn agent(name: &str, registry: &str) -> AgentConfig {
    AgentConfig {
        name: name.to_string(),
        repo: format!("acme/{name}"),
        tag: "latest".to_string(),
        registry_connection: registry.to_string(),
        egress_allowlist: None,
        labels: None,
        artifact_permissions: None,
        overrides: None,
    }
}

/// One public registry (`dockerhub`) and one agent (`demo`) using it.
pub fn demo_config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config
        .registry_connections
        .insert("dockerhub".to_string(), registry("docker.io"));
    config.agents.push(agent("demo", "dockerhub"));
    config
}
