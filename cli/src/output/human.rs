//! Human-readable terminal renderer.

use std::collections::BTreeMap;

use owo_colors::OwoColorize as _;
use polis_common::{AuthMethod, ConsoleConfig, EnvVars};

use crate::domain::auth::{CredentialField, InputKind};
use crate::domain::catalog::{ModelDefinition, ProviderBinding};
use crate::domain::error::ValidationError;
use crate::domain::forms::{AgentForm, ModelConnectionForm, RegistryForm};
use crate::output::{OutputContext, mask_secret};

/// Renders console entities as human-readable terminal output.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    // ── Configuration entities ───────────────────────────────────────────────

    pub fn render_registries(&self, registries: &[RegistryForm]) {
        if registries.is_empty() {
            self.ctx
                .info("No registry connections. Add one: polis-console registry add --name <name> --url <url>");
            return;
        }
        println!();
        self.ctx.header("Registry connections:");
        println!();
        for r in registries {
            let state = if r.enabled { "" } else { "  [disabled]" };
            println!(
                "  {:<20} {:<36} {}{}",
                r.name.style(self.ctx.styles.bold),
                r.url,
                registry_auth_summary(r).style(self.ctx.styles.dim),
                state.style(self.ctx.styles.disabled),
            );
        }
        println!();
    }

    pub fn render_agents(&self, agents: &[AgentForm]) {
        if agents.is_empty() {
            self.ctx.info("No agents configured. Add one: polis-console agent add --name <name> ...");
            return;
        }
        println!();
        self.ctx.header("Agents:");
        println!();
        for a in agents {
            println!(
                "  {:<20} {}:{}  {}",
                a.name.style(self.ctx.styles.bold),
                a.repo,
                a.tag,
                format!("via {}", a.registry_connection).style(self.ctx.styles.dim),
            );
            if !a.egress_allowlist.is_empty() {
                println!("    {:<12} {}", "egress:", a.egress_allowlist.join(", "));
            }
            if !a.labels.is_empty() {
                println!("    {:<12} {}", "labels:", join_pairs(&a.labels));
            }
            if a.artifacts_read || a.artifacts_write {
                println!(
                    "    {:<12} read={} write={}",
                    "artifacts:", a.artifacts_read, a.artifacts_write
                );
            }
            if !a.env_overrides.is_empty() {
                let keys: Vec<&str> = a.env_overrides.keys().map(String::as_str).collect();
                println!("    {:<12} {}", "env:", keys.join(", "));
            }
            if !a.expose_ports.is_empty() {
                let ports: Vec<String> = a.expose_ports.iter().map(u16::to_string).collect();
                println!("    {:<12} {}", "expose:", ports.join(", "));
            }
        }
        println!();
    }

    pub fn render_model_connections(&self, connections: &[(String, ModelConnectionForm)]) {
        if connections.is_empty() {
            self.ctx.info(
                "No model connections. Add one: polis-console model add --model <id> --provider <id>",
            );
            return;
        }
        println!();
        self.ctx.header("Model connections:");
        println!();
        for (id, c) in connections {
            let state = if c.enabled { "" } else { "  [disabled]" };
            println!(
                "  {:<36} {} on {}{}",
                id.style(self.ctx.styles.bold),
                c.model,
                c.hosting_provider,
                state.style(self.ctx.styles.disabled),
            );
            for (name, value) in &c.credentials {
                println!("    {:<24} {value}", format!("{name}:").style(self.ctx.styles.dim));
            }
            if !c.endpoint.is_empty() {
                println!("    {:<24} {}", "endpoint:".style(self.ctx.styles.dim), c.endpoint);
            }
        }
        println!();
    }

    /// Env values are masked.
    pub fn render_env(&self, env: &EnvVars) {
        if env.is_empty() {
            self.ctx.info("No env vars set.");
            return;
        }
        println!();
        self.ctx.header("Env vars:");
        println!();
        for (key, value) in env {
            println!("  {key:<32} {}", mask_secret(value).style(self.ctx.styles.secret));
        }
        println!();
    }

    pub fn render_config(&self, config: &ConsoleConfig, source: &str) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({source})").style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<24} {}", "config_version:", config.config_version);
        println!(
            "  {:<24} {}",
            "registry_connections:",
            config.registry_connections.len()
        );
        println!("  {:<24} {}", "agents:", config.agents.len());
        println!(
            "  {:<24} {}",
            "model_connections:",
            config.model_connections.len()
        );
        println!();
    }

    pub fn render_validation(&self, errors: &[ValidationError]) {
        if errors.is_empty() {
            self.ctx.success("Configuration is valid");
            return;
        }
        self.ctx
            .error(&format!("Configuration has {} problem(s):", errors.len()));
        for e in errors {
            eprintln!("      {e}");
        }
    }

    // ── Catalog ──────────────────────────────────────────────────────────────

    pub fn render_catalog_models(&self, models: &[&ModelDefinition]) {
        if models.is_empty() {
            self.ctx.info("No matching models.");
            return;
        }
        for m in models {
            self.print_model_line(m);
        }
    }

    pub fn render_models_by_vendor(&self, grouped: &BTreeMap<&str, Vec<&ModelDefinition>>) {
        for (vendor, models) in grouped {
            println!();
            self.ctx.header(vendor);
            for m in models {
                self.print_model_line(m);
            }
        }
        println!();
    }

    pub fn render_providers(&self, model: &ModelDefinition) {
        println!();
        self.ctx.header(&format!("{} ({})", model.display_name, model.id));
        println!();
        for p in &model.providers {
            let endpoint = if p.requires_endpoint {
                "  endpoint required"
            } else {
                ""
            };
            println!(
                "  {:<16} {:<48} {}{}",
                p.provider.style(self.ctx.styles.bold),
                p.provider_model_id,
                p.auth_method.style(self.ctx.styles.dim),
                endpoint.style(self.ctx.styles.warning),
            );
        }
        println!();
    }

    pub fn render_auth_fields(&self, method: AuthMethod, fields: &[CredentialField]) {
        if fields.is_empty() {
            self.ctx.info(&format!("Auth method '{method}' takes no fields."));
            return;
        }
        println!();
        self.ctx.header(&format!("Fields for '{method}':"));
        println!();
        for f in fields {
            let required = if f.required { "required" } else { "optional" };
            println!(
                "  {:<24} {:<28} {:<10} {}",
                f.name.style(self.ctx.styles.bold),
                f.label,
                required.style(self.ctx.styles.dim),
                input_kind_summary(f.kind),
            );
        }
        println!();
    }

    pub fn render_binding(&self, binding: &ProviderBinding) {
        self.ctx.kv("model:", &binding.model);
        self.ctx.kv("provider:", &binding.provider);
        self.ctx.kv("provider_model_id:", &binding.provider_model_id);
        self.ctx.kv("auth_method:", binding.auth_method.as_str());
        if binding.requires_endpoint {
            self.ctx.kv("endpoint:", "required");
        }
    }

    pub fn render_done(&self, message: &str) {
        self.ctx.success(message);
    }

    fn print_model_line(&self, m: &ModelDefinition) {
        println!(
            "  {:<24} {:<28} {:<10} {}",
            m.id.style(self.ctx.styles.bold),
            m.display_name,
            m.category.style(self.ctx.styles.dim),
            m.description,
        );
    }
}

// ── Formatting helpers ────────────────────────────────────────────────────────

/// One-line auth summary naming the env vars, never their values.
#[must_use]
pub fn registry_auth_summary(form: &RegistryForm) -> String {
    match form.auth_method {
        AuthMethod::Basic => format!("basic ({}, {})", form.username_env, form.password_env),
        AuthMethod::Token => format!("token ({})", form.token_env),
        _ => "no auth".to_string(),
    }
}

#[must_use]
pub fn input_kind_summary(kind: InputKind) -> String {
    match kind {
        InputKind::Text => "text".to_string(),
        InputKind::Url => "url".to_string(),
        InputKind::EnvVar => "env var name".to_string(),
        InputKind::Select(options) => format!("one of: {}", options.join(", ")),
    }
}

fn join_pairs(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
