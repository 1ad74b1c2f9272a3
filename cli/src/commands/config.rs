//! `polis-console config`: show and validate the stored configuration.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::domain::validate::{config_errors, env_errors, env_reference_errors};

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the stored configuration
    Show,
    /// Check the stored configuration and env vars against every rule
    Validate,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub async fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show(app).await,
        ConfigCommand::Validate => validate(app).await,
    }
}

async fn show(app: &AppContext) -> Result<ExitCode> {
    let store = app.load_store().await?;
    let source = store.repository().backend().describe();
    app.renderer().render_config(&store.config(), &source)?;
    Ok(ExitCode::SUCCESS)
}

async fn validate(app: &AppContext) -> Result<ExitCode> {
    let store = app.load_store().await?;
    let config = store.config();
    let env = store.env();

    let mut errors = config_errors(&config, store.catalog());
    errors.extend(env_errors(&env));
    errors.extend(env_reference_errors(&config, &env));

    app.renderer().render_validation(&errors)?;
    Ok(if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
