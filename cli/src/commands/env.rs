//! `polis-console env`: manage the env vars credentials are read from.
//!
//! Values are write-only from the CLI's point of view: listings mask them.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;

/// Env subcommands.
#[derive(Subcommand)]
pub enum EnvCommand {
    /// List env var names (values masked)
    List,
    /// Create or replace an env var
    Set {
        /// Variable name (e.g. `GHCR_TOKEN`)
        key: String,
        /// Variable value
        value: String,
    },
    /// Remove an env var; references to it are reported on the next save
    Unset {
        /// Variable name
        key: String,
    },
}

/// Run the env command.
///
/// # Errors
///
/// Returns an error if loading, the mutation or the save fails.
pub async fn run(app: &AppContext, cmd: EnvCommand) -> Result<ExitCode> {
    let store = app.load_store().await?;
    match cmd {
        EnvCommand::List => {
            app.renderer().render_env(&store.env())?;
        }
        EnvCommand::Set { key, value } => {
            let created = store.set_env_var(&key, &value)?;
            app.save_store(&store).await?;
            let (action, verb) = if created {
                ("add", "set")
            } else {
                ("update", "updated")
            };
            app.renderer()
                .render_done(action, &key, &format!("Env var '{key}' {verb}"))?;
        }
        EnvCommand::Unset { key } => {
            store.delete_env_var(&key)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("remove", &key, &format!("Env var '{key}' removed"))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
