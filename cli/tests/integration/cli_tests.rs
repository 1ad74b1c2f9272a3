//! Integration tests for the polis-console command surface: help, catalog
//! browsing and the JSON error contract.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn console() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("polis-console"));
    cmd.env("NO_COLOR", "1").env_remove("POLIS_CONSOLE_API_URL");
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.output().expect("run polis-console");
    serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

// --- Help and version ---

#[test]
fn test_cli_no_args_shows_help() {
    console().assert().code(2).stderr(predicate::str::contains(
        "Configure registries, agents and model connections",
    ));
}

#[test]
fn test_cli_help_lists_commands() {
    console()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("registry"))
        .stdout(predicate::str::contains("agent"))
        .stdout(predicate::str::contains("model"))
        .stdout(predicate::str::contains("catalog"));
}

#[test]
fn test_cli_version_flag() {
    console()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("polis-console"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    console().arg("deploy").assert().code(2);
}

#[test]
fn test_agent_add_help_names_egress_value_as_url() {
    console()
        .args(["agent", "add", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--egress <URL>"))
        .stdout(predicate::str::contains("http(s)://"));
}

// --- Catalog ---

#[test]
fn test_catalog_models_lists_gpt4o() {
    console()
        .args(["catalog", "models"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gpt-4o"));
}

#[test]
fn test_catalog_models_json() {
    let v = stdout_json(console().args(["catalog", "models", "--json"]));
    let models = v["models"].as_array().expect("models array");
    assert!(models.iter().any(|m| m["id"] == "gpt-4o"));
}

#[test]
fn test_catalog_providers_unknown_model_fails() {
    console()
        .args(["catalog", "providers", "no-such-model"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-model"));
}

#[test]
fn test_catalog_auth_fields_for_basic() {
    console()
        .args(["catalog", "auth-fields", "basic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("username_env"))
        .stdout(predicate::str::contains("password_env"));
}

#[test]
fn test_model_resolve_json_has_provider_model_id() {
    let v = stdout_json(console().args(["model", "resolve", "gpt-4o", "openai", "--json"]));
    assert_eq!(v["provider_model_id"], "gpt-4o-2024-08-06");
}

#[test]
fn test_model_resolve_unsupported_pair_json_error() {
    let out = console()
        .args(["model", "resolve", "gpt-4o", "no-such-provider", "--json"])
        .output()
        .expect("run");
    assert!(!out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("error object");
    assert_eq!(v["error"], true);
    assert_eq!(v["code"], "CATALOG_ERROR");
}
