//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::infra::ConsoleSettings;

/// Configure registries, agents and model connections for Polis deployments
#[derive(Parser)]
#[command(
    name = "polis-console",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Console API base URL (overrides `POLIS_CONSOLE_API_URL`)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Local data directory (overrides `POLIS_CONSOLE_DATA_DIR`)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show or validate the stored configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Manage container registry connections
    #[command(subcommand)]
    Registry(commands::registry::RegistryCommand),

    /// Manage agents
    #[command(subcommand)]
    Agent(commands::agent::AgentCommand),

    /// Manage model connections
    #[command(subcommand)]
    Model(commands::model::ModelCommand),

    /// Manage env vars referenced by credentials
    #[command(subcommand)]
    Env(commands::env::EnvCommand),

    /// Browse the model catalog
    #[command(subcommand)]
    Catalog(commands::catalog::CatalogCommand),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded or the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            api_url,
            data_dir,
            command,
        } = self;

        let settings = ConsoleSettings::from_env()?.with_overrides(api_url, data_dir);
        let flags = AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        };
        let app = AppContext::new(&flags, settings);

        match command {
            Command::Config(cmd) => commands::config::run(&app, cmd).await,
            Command::Registry(cmd) => commands::registry::run(&app, cmd).await,
            Command::Agent(cmd) => commands::agent::run(&app, cmd).await,
            Command::Model(cmd) => commands::model::run(&app, cmd).await,
            Command::Env(cmd) => commands::env::run(&app, cmd).await,
            Command::Catalog(cmd) => commands::catalog::run(&app, cmd),
        }
    }
}
