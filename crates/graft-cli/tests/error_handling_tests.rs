//! Exit codes and suggestions for failing invocations.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn graft() -> Command {
    let mut cmd = cargo_bin_cmd!("graft");
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("npm_config_user_agent");
    cmd
}

fn solid_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("package.json"),
        "{\n\t\"dependencies\": {\n\t\t\"@solidjs/start\": \"^1.0.6\"\n\t}\n}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("app.config.js"),
        "import { defineConfig } from \"@solidjs/start/config\";\n\nexport default defineConfig({});\n",
    )
    .unwrap();
    dir
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    graft().assert().code(2);
}

#[test]
fn cwd_must_be_a_directory() {
    graft()
        .args(["add", "prettier", "--yes", "--cwd", "/definitely/not/here"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn unknown_addon_is_not_found() {
    let project = solid_project();
    graft()
        .args(["add", "drizzle", "--yes", "--cwd"])
        .arg(project.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unknown addon 'drizzle'"))
        .stderr(predicate::str::contains("graft list"));
}

#[test]
fn malformed_option_is_a_user_error() {
    let project = solid_project();
    graft()
        .args(["add", "prettier", "--option", "prettier", "--cwd"])
        .arg(project.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected addon.key=value"));
}

#[test]
fn invalid_language_tag_stops_before_writing() {
    let project = solid_project();
    graft()
        .args(["add", "paraglide", "--yes", "-o", "paraglide.availableLanguageTags=en,x-y-z", "--cwd"])
        .arg(project.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a valid IETF BCP 47 language tag"));
    assert!(!project.path().join("project.inlang").exists());
}

#[test]
fn lucia_needs_drizzle() {
    let project = solid_project();
    graft()
        .args(["add", "lucia", "--yes", "--cwd"])
        .arg(project.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("requires 'drizzle'"));
}

#[test]
fn project_without_framework_config_is_rejected() {
    let project = solid_project();
    fs::remove_file(project.path().join("app.config.js")).unwrap();
    graft()
        .args(["add", "prettier", "--yes", "--cwd"])
        .arg(project.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid project"));
}

#[test]
fn missing_config_file_is_a_configuration_error() {
    graft()
        .args(["list", "--config", "/definitely/not/here/graft.toml"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn unknown_config_key() {
    graft()
        .args(["config", "get", "defaults.lang"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}
