//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod styles;

use std::collections::BTreeMap;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
use polis_common::{AuthMethod, ConsoleConfig, EnvVars};
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use styles::Styles;

use crate::domain::auth::CredentialField;
use crate::domain::catalog::{ModelDefinition, ProviderBinding};
use crate::domain::error::ValidationError;
use crate::domain::forms::{AgentForm, ModelConnectionForm, RegistryForm};

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Mask a secret for display. Values of twelve or more characters keep their
/// last four; anything shorter is masked entirely.
#[must_use]
pub fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count < 12 {
        return "********".to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("********{tail}")
}

// ── Renderer ──────────────────────────────────────────────────────────────────

/// Output-mode dispatch: every view renders either for humans or as JSON.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_registries(&self, registries: &[RegistryForm]) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_registries(registries);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_registries(registries),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_agents(&self, agents: &[AgentForm]) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_agents(agents);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_agents(agents),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_model_connections(
        &self,
        connections: &[(String, ModelConnectionForm)],
    ) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_model_connections(connections);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_model_connections(connections),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_env(&self, env: &EnvVars) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_env(env);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_env(env),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &ConsoleConfig, source: &str) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_config(config, source);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_config(config),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_validation(&self, errors: &[ValidationError]) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_validation(errors);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_validation(errors),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_catalog_models(&self, models: &[&ModelDefinition]) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_catalog_models(models);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_catalog_models(models),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_models_by_vendor(
        &self,
        grouped: &BTreeMap<&str, Vec<&ModelDefinition>>,
    ) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_models_by_vendor(grouped);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_models_by_vendor(grouped),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_providers(&self, model: &ModelDefinition) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_providers(model);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_providers(model),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_auth_fields(&self, method: AuthMethod, fields: &[CredentialField]) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_auth_fields(method, fields);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_auth_fields(method, fields),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_binding(&self, binding: &ProviderBinding) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_binding(binding);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_binding(binding),
        }
    }

    /// Confirm a completed mutation: `message` for humans, `{ok, action, id}`
    /// for JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_done(&self, action: &str, id: &str, message: &str) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_done(message);
                Ok(())
            }
            Renderer::Json(_) => JsonRenderer::render_done(action, id),
        }
    }
}
