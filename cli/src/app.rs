//! Application context: unified state passed to every command handler.
//!
//! `AppContext` carries output settings, persistence settings and the
//! non-interactive flag, and builds the configuration store each command
//! works against.

use anyhow::Result;

use crate::application::ConfigStore;
use crate::infra::{AnyBackend, ConsoleSettings};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, progress};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `POLIS_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Where configuration is persisted.
    pub settings: ConsoleSettings,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `POLIS_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags and resolved settings.
    #[must_use]
    pub fn new(flags: &AppFlags, settings: ConsoleSettings) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("POLIS_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            settings,
            non_interactive,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `POLIS_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    /// Build an unloaded store over the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be set up.
    pub fn store(&self) -> Result<ConfigStore<AnyBackend>> {
        Ok(ConfigStore::new(self.settings.open_backend()?))
    }

    /// Build a store and load the current documents into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be set up or read.
    pub async fn load_store(&self) -> Result<ConfigStore<AnyBackend>> {
        let store = self.store()?;
        let pb = self.spinner("Loading configuration...");
        match store.load_config().await {
            Ok(()) => {
                pb.finish_and_clear();
                Ok(store)
            }
            Err(e) => {
                progress::finish_error(&pb);
                Err(e)
            }
        }
    }

    /// Persist `store`, with a spinner on interactive terminals.
    ///
    /// # Errors
    ///
    /// Returns validation or backend errors from the save.
    pub async fn save_store(&self, store: &ConfigStore<AnyBackend>) -> Result<()> {
        let pb = self.spinner("Saving configuration...");
        match store.save_config().await {
            Ok(()) => {
                pb.finish_and_clear();
                Ok(())
            }
            Err(e) => {
                progress::finish_error(&pb);
                Err(e)
            }
        }
    }

    fn spinner(&self, msg: &str) -> indicatif::ProgressBar {
        if self.output.show_progress() && !self.is_json() {
            progress::spinner(msg)
        } else {
            progress::hidden()
        }
    }
}
