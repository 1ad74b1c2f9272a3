//! End-to-end configuration flows against the file backend.

#![allow(clippy::expect_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn console(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("polis-console"));
    cmd.env("NO_COLOR", "1")
        .env_remove("POLIS_CONSOLE_API_URL")
        .env("POLIS_CONSOLE_DATA_DIR", data_dir);
    cmd
}

fn add_docker_hub(dir: &Path) {
    console(dir)
        .args(["registry", "add", "--name", "Docker Hub", "--url", "docker.io"])
        .assert()
        .success();
}

// --- Registries ---

#[test]
fn test_registry_add_then_list() {
    let dir = TempDir::new().expect("tempdir");
    add_docker_hub(dir.path());

    console(dir.path())
        .args(["registry", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docker-hub"))
        .stdout(predicate::str::contains("docker.io"));

    let yaml = std::fs::read_to_string(dir.path().join("config.yaml")).expect("config written");
    assert!(yaml.contains("docker-hub"));
}

#[test]
fn test_registry_add_duplicate_fails() {
    let dir = TempDir::new().expect("tempdir");
    add_docker_hub(dir.path());

    console(dir.path())
        .args(["registry", "add", "--name", "docker hub", "--url", "docker.io"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_registry_remove_in_use_is_refused() {
    let dir = TempDir::new().expect("tempdir");
    add_docker_hub(dir.path());
    console(dir.path())
        .args(["agent", "add", "--name", "demo", "--repo", "org/demo", "--registry", "docker-hub"])
        .assert()
        .success();

    console(dir.path())
        .args(["registry", "remove", "docker-hub", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("demo"));

    console(dir.path())
        .args(["registry", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docker-hub"));
}

// --- Agents ---

#[test]
fn test_agent_with_missing_registry_is_rejected_on_save() {
    let dir = TempDir::new().expect("tempdir");

    console(dir.path())
        .args(["agent", "add", "--name", "demo", "--repo", "org/demo", "--registry", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    assert!(!dir.path().join("config.yaml").exists());
}

#[test]
fn test_agent_invalid_name_fails() {
    let dir = TempDir::new().expect("tempdir");
    add_docker_hub(dir.path());

    console(dir.path())
        .args(["agent", "add", "--name", "Bad_Name", "--repo", "org/demo", "--registry", "docker-hub"])
        .assert()
        .failure();
}

#[test]
fn test_agent_list_json() {
    let dir = TempDir::new().expect("tempdir");
    add_docker_hub(dir.path());
    console(dir.path())
        .args([
            "agent", "add", "--name", "demo", "--repo", "org/demo", "--registry", "docker-hub",
            "--label", "team=core",
        ])
        .assert()
        .success();

    let out = console(dir.path())
        .args(["agent", "list", "--json"])
        .output()
        .expect("run");
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["agents"][0]["name"], "demo");
    assert_eq!(v["agents"][0]["tag"], "latest");
    assert_eq!(v["agents"][0]["labels"]["team"], "core");
}

#[test]
fn test_agent_remove_unknown_json_error() {
    let dir = TempDir::new().expect("tempdir");
    let out = console(dir.path())
        .args(["agent", "remove", "ghost", "--yes", "--json"])
        .output()
        .expect("run");
    assert!(!out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("error object");
    assert_eq!(v["code"], "NOT_FOUND");
}

// --- Env vars ---

#[test]
fn test_env_set_then_list_masks_value() {
    let dir = TempDir::new().expect("tempdir");
    console(dir.path())
        .args(["env", "set", "GHCR_TOKEN", "supersecretvalue1234"])
        .assert()
        .success();

    console(dir.path())
        .args(["env", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GHCR_TOKEN"))
        .stdout(predicate::str::contains("********1234"))
        .stdout(predicate::str::contains("supersecret").not());
}

#[test]
fn test_env_set_invalid_key_fails() {
    let dir = TempDir::new().expect("tempdir");
    console(dir.path())
        .args(["env", "set", "lower", "x"])
        .assert()
        .failure();
}

#[test]
fn test_registry_token_auth_requires_declared_env() {
    let dir = TempDir::new().expect("tempdir");
    console(dir.path())
        .args([
            "registry", "add", "--name", "ghcr", "--url", "https://ghcr.io",
            "--auth", "token", "--token-env", "GHCR_TOKEN",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GHCR_TOKEN"));

    console(dir.path())
        .args(["env", "set", "GHCR_TOKEN", "t0ken"])
        .assert()
        .success();
    console(dir.path())
        .args([
            "registry", "add", "--name", "ghcr", "--url", "https://ghcr.io",
            "--auth", "token", "--token-env", "GHCR_TOKEN",
        ])
        .assert()
        .success();
}

// --- Validation ---

#[test]
fn test_config_validate_empty_is_ok() {
    let dir = TempDir::new().expect("tempdir");
    console(dir.path())
        .args(["config", "validate"])
        .assert()
        .success();
}

#[test]
fn test_config_validate_reports_dangling_reference() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("config.yaml"),
        "config_version: 1\n\
         registry_connections: {}\n\
         agents:\n\
         \x20 - name: demo\n\
         \x20   repo: org/demo\n\
         \x20   tag: latest\n\
         \x20   registry_connection: ghost\n",
    )
    .expect("write config");

    console(dir.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    let out = console(dir.path())
        .args(["config", "validate", "--json"])
        .output()
        .expect("run");
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["valid"], false);
}

#[test]
fn test_model_add_and_list() {
    let dir = TempDir::new().expect("tempdir");
    console(dir.path())
        .args(["env", "set", "OPENAI_API_KEY", "sk-test-value-0000"])
        .assert()
        .success();
    console(dir.path())
        .args([
            "model", "add", "--model", "gpt-4o", "--provider", "openai",
            "--cred", "api_key_env=OPENAI_API_KEY",
        ])
        .assert()
        .success();

    let out = console(dir.path())
        .args(["model", "list", "--json"])
        .output()
        .expect("run");
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["model_connections"][0]["id"], "openai-gpt-4o");
}
