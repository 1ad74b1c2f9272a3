//! `polis-console agent`: manage agent deployment configs.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::parse_key_val;
use crate::app::AppContext;
use crate::domain::error::{EntityKind, StoreError};
use crate::domain::forms::AgentForm;

/// Agent subcommands.
#[derive(Subcommand)]
pub enum AgentCommand {
    /// List agents
    List,
    /// Add an agent
    Add(AgentAddArgs),
    /// Change an agent; list flags replace the stored list when given
    Update(AgentUpdateArgs),
    /// Remove an agent
    Remove {
        /// Agent name
        name: String,
    },
}

/// Optional agent settings shared by `add` and `update`.
#[derive(Args, Default)]
pub struct AgentExtraArgs {
    /// URL the agent may reach, `http(s)://` (repeatable)
    #[arg(long = "egress", value_name = "URL")]
    pub egress_allowlist: Vec<String>,
    /// Label as KEY=VALUE (repeatable)
    #[arg(long = "label", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub labels: Vec<(String, String)>,
    /// Grant read access to artifacts
    #[arg(long)]
    pub artifacts_read: Option<bool>,
    /// Grant write access to artifacts
    #[arg(long)]
    pub artifacts_write: Option<bool>,
    /// Env override as KEY=VALUE (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env_overrides: Vec<(String, String)>,
    /// Port to expose (repeatable)
    #[arg(long = "expose", value_name = "PORT")]
    pub expose_ports: Vec<u16>,
    /// Drop egress, labels, artifact permissions and overrides before applying flags
    #[arg(long)]
    pub clear_extras: bool,
}

impl AgentExtraArgs {
    fn apply(self, form: &mut AgentForm) {
        if self.clear_extras {
            form.egress_allowlist.clear();
            form.labels.clear();
            form.artifacts_read = false;
            form.artifacts_write = false;
            form.env_overrides.clear();
            form.expose_ports.clear();
        }
        if !self.egress_allowlist.is_empty() {
            form.egress_allowlist = self.egress_allowlist;
        }
        if !self.labels.is_empty() {
            form.labels = self.labels.into_iter().collect::<BTreeMap<_, _>>();
        }
        if let Some(read) = self.artifacts_read {
            form.artifacts_read = read;
        }
        if let Some(write) = self.artifacts_write {
            form.artifacts_write = write;
        }
        if !self.env_overrides.is_empty() {
            form.env_overrides = self.env_overrides.into_iter().collect();
        }
        if !self.expose_ports.is_empty() {
            form.expose_ports = self.expose_ports;
        }
    }
}

#[derive(Args)]
pub struct AgentAddArgs {
    /// Agent name (lowercase letters, digits and hyphens)
    #[arg(long)]
    pub name: String,
    /// Image repository
    #[arg(long)]
    pub repo: String,
    /// Image tag
    #[arg(long, default_value = "latest")]
    pub tag: String,
    /// Registry connection id
    #[arg(long = "registry")]
    pub registry_connection: String,
    #[command(flatten)]
    pub extra: AgentExtraArgs,
}

#[derive(Args)]
pub struct AgentUpdateArgs {
    /// Agent name
    pub name: String,
    /// New agent name
    #[arg(long = "rename")]
    pub new_name: Option<String>,
    #[arg(long)]
    pub repo: Option<String>,
    #[arg(long)]
    pub tag: Option<String>,
    #[arg(long = "registry")]
    pub registry_connection: Option<String>,
    #[command(flatten)]
    pub extra: AgentExtraArgs,
}

/// Run the agent command.
///
/// # Errors
///
/// Returns an error if loading, the mutation or the save fails.
pub async fn run(app: &AppContext, cmd: AgentCommand) -> Result<ExitCode> {
    match cmd {
        AgentCommand::List => {
            let store = app.load_store().await?;
            app.renderer().render_agents(&store.agent_forms())?;
        }
        AgentCommand::Add(args) => {
            let mut form = AgentForm {
                name: args.name,
                repo: args.repo,
                tag: args.tag,
                registry_connection: args.registry_connection,
                ..AgentForm::default()
            };
            args.extra.apply(&mut form);

            let store = app.load_store().await?;
            if !app.is_json()
                && !store
                    .config()
                    .registry_connections
                    .contains_key(&form.registry_connection)
            {
                app.output.warn(&format!(
                    "Registry '{}' does not exist; the save will be rejected",
                    form.registry_connection
                ));
            }
            store.add_agent(&form)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("add", &form.name, &format!("Agent '{}' added", form.name))?;
        }
        AgentCommand::Update(args) => {
            let store = app.load_store().await?;
            let mut form = store.agent_form(&args.name).ok_or_else(|| StoreError::NotFound {
                entity: EntityKind::Agent,
                id: args.name.clone(),
            })?;
            if let Some(name) = args.new_name {
                form.name = name;
            }
            if let Some(repo) = args.repo {
                form.repo = repo;
            }
            if let Some(tag) = args.tag {
                form.tag = tag;
            }
            if let Some(registry) = args.registry_connection {
                form.registry_connection = registry;
            }
            args.extra.apply(&mut form);

            store.update_agent(&args.name, &form)?;
            app.save_store(&store).await?;
            app.renderer().render_done(
                "update",
                &form.name,
                &format!("Agent '{}' updated", form.name),
            )?;
        }
        AgentCommand::Remove { name } => {
            if !app.confirm(&format!("Remove agent '{name}'?"), true)? {
                app.output.info("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            let store = app.load_store().await?;
            store.delete_agent(&name)?;
            app.save_store(&store).await?;
            app.renderer()
                .render_done("remove", &name, &format!("Agent '{name}' removed"))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
