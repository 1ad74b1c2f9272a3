//! `polis-console registry`: manage container registry connections.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use polis_common::AuthMethod;

use crate::app::AppContext;
use crate::domain::forms::RegistryForm;
use crate::domain::error::{EntityKind, StoreError};

/// Registry subcommands.
#[derive(Subcommand)]
pub enum RegistryCommand {
    /// List registry connections
    List,
    /// Add a registry connection
    Add(RegistryAddArgs),
    /// Change a registry connection (renaming re-points its agents)
    Update(RegistryUpdateArgs),
    /// Remove a registry connection no agent uses
    Remove {
        /// Registry id
        id: String,
    },
}

/// Credential flags shared by `add` and `update`.
#[derive(Args, Default)]
pub struct RegistryAuthArgs {
    /// Auth method (none, basic or token)
    #[arg(long = "auth", value_enum)]
    pub auth_method: Option<AuthMethod>,
    /// Env var holding the username (basic auth)
    #[arg(long)]
    pub username_env: Option<String>,
    /// Env var holding the password (basic auth)
    #[arg(long)]
    pub password_env: Option<String>,
    /// Env var holding the token (token auth)
    #[arg(long)]
    pub token_env: Option<String>,
}

impl RegistryAuthArgs {
    fn apply(self, form: &mut RegistryForm) {
        if let Some(method) = self.auth_method {
            form.auth_method = method;
        }
        if let Some(v) = self.username_env {
            form.username_env = v;
        }
        if let Some(v) = self.password_env {
            form.password_env = v;
        }
        if let Some(v) = self.token_env {
            form.token_env = v;
        }
    }
}

#[derive(Args)]
pub struct RegistryAddArgs {
    /// Display name; the id is derived from it
    #[arg(long)]
    pub name: String,
    /// Registry host or URL (e.g. docker.io, https://ghcr.io)
    #[arg(long)]
    pub url: String,
    /// Add the connection disabled
    #[arg(long)]
    pub disabled: bool,
    #[command(flatten)]
    pub auth: RegistryAuthArgs,
}

#[derive(Args)]
pub struct RegistryUpdateArgs {
    /// Registry id
    pub id: String,
    /// New display name (changes the id)
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub enabled: Option<bool>,
    #[command(flatten)]
    pub auth: RegistryAuthArgs,
}

/// Run the registry command.
///
/// # Errors
///
/// Returns an error if loading, the mutation or the save fails.
pub async fn run(app: &AppContext, cmd: RegistryCommand) -> Result<ExitCode> {
    match cmd {
        RegistryCommand::List => {
            let store = app.load_store().await?;
            app.renderer().render_registries(&store.registry_forms())?;
        }
        RegistryCommand::Add(args) => {
            let mut form = RegistryForm {
                name: args.name,
                url: args.url,
                enabled: !args.disabled,
                ..RegistryForm::default()
            };
            args.auth.apply(&mut form);

            let store = app.load_store().await?;
            let id = store.add_registry_connection(&form)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("add", &id, &format!("Registry '{id}' added"))?;
        }
        RegistryCommand::Update(args) => {
            let store = app.load_store().await?;
            let mut form = store.registry_form(&args.id).ok_or_else(|| StoreError::NotFound {
                entity: EntityKind::Registry,
                id: args.id.clone(),
            })?;
            if let Some(name) = args.name {
                form.name = name;
            }
            if let Some(url) = args.url {
                form.url = url;
            }
            if let Some(enabled) = args.enabled {
                form.enabled = enabled;
            }
            args.auth.apply(&mut form);

            let id = store.update_registry_connection(&args.id, &form)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("update", &id, &format!("Registry '{id}' updated"))?;
        }
        RegistryCommand::Remove { id } => {
            if !app.confirm(&format!("Remove registry '{id}'?"), true)? {
                app.output.info("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            let store = app.load_store().await?;
            store.delete_registry_connection(&id)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("remove", &id, &format!("Registry '{id}' removed"))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
