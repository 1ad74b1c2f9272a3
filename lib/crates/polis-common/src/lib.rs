//! Shared types for polis console components.

pub mod auth;
pub mod config;

pub use auth::{AuthMethod, UnknownAuthMethod};
pub use config::{
    AgentConfig, AgentOverrides, ArtifactPermissions, CURRENT_CONFIG_VERSION, ConsoleConfig,
    EnvVars, ModelAuth, ModelConnection, RegistryAuth, RegistryConnection,
};
