//! `polis-console model`: manage model connections and resolve catalog pairs.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::parse_key_val;
use crate::app::AppContext;
use crate::domain::catalog::Catalog;
use crate::domain::error::{EntityKind, StoreError};
use crate::domain::forms::ModelConnectionForm;

/// Model subcommands.
#[derive(Subcommand)]
pub enum ModelCommand {
    /// List model connections
    List,
    /// Connect a catalog model through a hosting provider
    Add(ModelAddArgs),
    /// Change a model connection
    Update(ModelUpdateArgs),
    /// Remove a model connection
    Remove {
        /// Connection id
        id: String,
    },
    /// Show how a hosting provider serves a model
    Resolve {
        /// Catalog model id
        model: String,
        /// Hosting provider id
        provider: String,
    },
}

#[derive(Args)]
pub struct ModelAddArgs {
    /// Catalog model id (see `catalog models`)
    #[arg(long)]
    pub model: String,
    /// Hosting provider id (see `catalog providers <model>`)
    #[arg(long)]
    pub provider: String,
    /// Credential field as NAME=VALUE (repeatable; see `catalog auth-fields`)
    #[arg(long = "cred", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub credentials: Vec<(String, String)>,
    /// Provider endpoint URL, where the provider needs one
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Add the connection disabled
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Args)]
pub struct ModelUpdateArgs {
    /// Connection id
    pub id: String,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub provider: Option<String>,
    /// Credential field as NAME=VALUE (repeatable); merged into the stored set
    #[arg(long = "cred", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub credentials: Vec<(String, String)>,
    #[arg(long)]
    pub endpoint: Option<String>,
    #[arg(long)]
    pub enabled: Option<bool>,
}

/// Run the model command.
///
/// # Errors
///
/// Returns an error if loading, catalog resolution, the mutation or the save
/// fails.
pub async fn run(app: &AppContext, cmd: ModelCommand) -> Result<ExitCode> {
    match cmd {
        ModelCommand::List => {
            let store = app.load_store().await?;
            app.renderer()
                .render_model_connections(&store.model_connection_forms())?;
        }
        ModelCommand::Add(args) => {
            let form = ModelConnectionForm {
                model: args.model,
                hosting_provider: args.provider,
                enabled: !args.disabled,
                credentials: args.credentials.into_iter().collect(),
                endpoint: args.endpoint.unwrap_or_default(),
            };
            let store = app.load_store().await?;
            let id = store.add_model_connection(&form)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("add", &id, &format!("Model connection '{id}' added"))?;
        }
        ModelCommand::Update(args) => {
            let store = app.load_store().await?;
            let mut form =
                store
                    .model_connection_form(&args.id)
                    .ok_or_else(|| StoreError::NotFound {
                        entity: EntityKind::ModelConnection,
                        id: args.id.clone(),
                    })?;
            if let Some(model) = args.model {
                form.model = model;
            }
            if let Some(provider) = args.provider {
                form.hosting_provider = provider;
            }
            form.credentials.extend(args.credentials);
            if let Some(endpoint) = args.endpoint {
                form.endpoint = endpoint;
            }
            if let Some(enabled) = args.enabled {
                form.enabled = enabled;
            }

            let id = store.update_model_connection(&args.id, &form)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("update", &id, &format!("Model connection '{id}' updated"))?;
        }
        ModelCommand::Remove { id } => {
            if !app.confirm(&format!("Remove model connection '{id}'?"), true)? {
                app.output.info("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            let store = app.load_store().await?;
            store.delete_model_connection(&id)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("remove", &id, &format!("Model connection '{id}' removed"))?;
        }
        ModelCommand::Resolve { model, provider } => {
            let binding = Catalog::builtin().resolve(&model, &provider)?;
            app.renderer().render_binding(&binding)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
