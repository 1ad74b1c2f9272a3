//! `polis-console catalog`: browse the model catalog. Read-only; never
//! touches the configuration backend.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use polis_common::AuthMethod;

use crate::app::AppContext;
use crate::domain::auth::fields_for;
use crate::domain::catalog::{Catalog, ModelCategory, ModelDefinition};
use crate::domain::error::CatalogError;

/// Catalog subcommands.
#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List models
    Models {
        /// Only models in this category
        #[arg(long, value_enum)]
        category: Option<ModelCategory>,
        /// Group by vendor
        #[arg(long)]
        by_vendor: bool,
    },
    /// Search model ids, names and descriptions
    Search {
        /// Case-insensitive text to look for
        query: String,
    },
    /// List the hosting providers that serve a model
    Providers {
        /// Catalog model id
        model: String,
    },
    /// Show the credential fields an auth method takes
    AuthFields {
        #[arg(value_enum)]
        method: AuthMethod,
    },
}

/// Run the catalog command.
///
/// # Errors
///
/// Returns an error for an unknown model or if rendering fails.
pub fn run(app: &AppContext, cmd: CatalogCommand) -> Result<ExitCode> {
    let catalog = Catalog::builtin();
    match cmd {
        CatalogCommand::Models {
            category,
            by_vendor,
        } => {
            let models: Vec<&ModelDefinition> = match category {
                Some(c) => catalog.models_in_category(c),
                None => catalog.models().iter().collect(),
            };
            if by_vendor {
                let mut grouped = catalog.models_by_vendor();
                for list in grouped.values_mut() {
                    list.retain(|m| models.iter().any(|k| k.id == m.id));
                }
                grouped.retain(|_, list| !list.is_empty());
                app.renderer().render_models_by_vendor(&grouped)?;
            } else {
                app.renderer().render_catalog_models(&models)?;
            }
        }
        CatalogCommand::Search { query } => {
            app.renderer().render_catalog_models(&catalog.search(&query))?;
        }
        CatalogCommand::Providers { model } => {
            let definition = catalog
                .model(&model)
                .ok_or_else(|| CatalogError::UnknownModel(model.clone()))?;
            app.renderer().render_providers(definition)?;
        }
        CatalogCommand::AuthFields { method } => {
            app.renderer().render_auth_fields(method, fields_for(method))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
