//! Integration tests for the graft binary.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const APP_CONFIG: &str = "import { defineConfig } from \"@solidjs/start/config\";\n\nexport default defineConfig({});\n";

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
        "{\n\t\"name\": \"app\",\n\t\"dependencies\": {\n\t\t\"@solidjs/start\": \"^1.0.6\"\n\t}\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("app.config.ts"), APP_CONFIG).unwrap();
    fs::write(dir.path().join("tsconfig.json"), "{}\n").unwrap();
    dir
}

fn config_file(dir: &Path, content: &str) -> String {
    let path = dir.join("graft.toml");
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn help_flag() {
    graft()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SolidStart"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_flag() {
    graft()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn list_shows_the_catalog() {
    graft()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available addons:"))
        .stdout(predicate::str::contains("tailwindcss"))
        .stdout(predicate::str::contains("https://lucia-auth.com"));
}

#[test]
fn list_as_plain_ids() {
    graft()
        .args(["list", "--format", "list"])
        .assert()
        .success()
        .stdout("prettier\ntailwindcss\nmdx\nparaglide\nlucia\n");
}

#[test]
fn list_as_json_includes_option_schemas() {
    let output = graft().args(["list", "--format", "json", "--quiet"]).output().unwrap();
    assert!(output.status.success());
    let addons: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let paraglide = addons
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "paraglide")
        .unwrap();
    assert_eq!(paraglide["options"][0]["key"], "availableLanguageTags");
    assert_eq!(paraglide["options"][0]["type"], "string");
}

#[test]
fn add_writes_files_and_prints_next_steps() {
    let project = solid_project();
    graft()
        .args(["add", "prettier", "--yes", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("prettier"))
        .stdout(predicate::str::contains("created prettier.config.js"))
        .stdout(predicate::str::contains("Next steps:"))
        .stdout(predicate::str::contains("npm install"));

    let manifest = fs::read_to_string(project.path().join("package.json")).unwrap();
    assert!(manifest.contains("\"prettier\": \"^3.3.2\""));
    assert!(project.path().join(".prettierignore").is_file());
}

#[test]
fn add_in_the_current_directory() {
    let project = solid_project();
    graft()
        .current_dir(project.path())
        .args(["add", "tailwindcss", "-o", "tailwindcss.plugins=forms", "-y"])
        .assert()
        .success();

    let config = fs::read_to_string(project.path().join("tailwind.config.ts")).unwrap();
    assert!(config.contains("@tailwindcss/forms"));
}

#[test]
fn dry_run_leaves_the_project_untouched() {
    let project = solid_project();
    graft()
        .args(["add", "mdx", "--dry-run", "--yes", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(fs::read_to_string(project.path().join("app.config.ts")).unwrap(), APP_CONFIG);
    assert!(!project.path().join("global.d.ts").exists());
}

#[test]
fn configured_addon_defaults_are_used() {
    let project = solid_project();
    let config = config_file(project.path(), "[addons.tailwindcss]\nplugins = \"typography\"\n");
    graft()
        .args(["add", "tailwindcss", "--yes", "--config", &config, "--cwd"])
        .arg(project.path())
        .assert()
        .success();

    let tailwind = fs::read_to_string(project.path().join("tailwind.config.ts")).unwrap();
    assert!(tailwind.contains("typography"));
}

#[test]
fn quiet_add_prints_nothing() {
    let project = solid_project();
    graft()
        .args(["add", "prettier", "-q", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn config_get_reads_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path(), "[output]\nformat = \"json\"\n");
    graft()
        .args(["config", "get", "output.format", "--config", &config])
        .assert()
        .success()
        .stdout("json\n");
}

#[test]
fn config_list_and_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path(), "[workspace]\ntsconfig_search = \"cwd-only\"\n");
    graft()
        .args(["config", "list", "-c", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("[output]"))
        .stdout(predicate::str::contains("tsconfig_search = \"cwd-only\""));

    graft()
        .args(["config", "path", "-c", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("graft.toml"));
}

#[test]
fn environment_overrides_configuration() {
    graft()
        .env("GRAFT_OUTPUT__FORMAT", "list")
        .args(["config", "get", "output.format"])
        .assert()
        .success()
        .stdout("list\n");
}

#[test]
fn completions_for_bash() {
    graft()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("graft"));
}
