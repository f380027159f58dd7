//! Resolve a project on disk and apply catalog addons to it.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use graft_adapters::{BuiltinCatalog, LocalFilesystem, WorkspaceResolver};
use graft_core::{
    application::{AddonRequest, AddonService, ApplicationError},
    error::GraftError,
};
use tempfile::TempDir;

const APP_CONFIG: &str = "import { defineConfig } from \"@solidjs/start/config\";\n\nexport default defineConfig({});\n";

fn write(dir: &Path, path: &str, content: &str) {
    let path = dir.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn solid_project(typescript: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "package.json",
        "{\n\t\"name\": \"app\",\n\t\"dependencies\": {\n\t\t\"@solidjs/start\": \"^1.0.6\"\n\t}\n}\n",
    );
    write(dir.path(), "pnpm-lock.yaml", "");
    let (config, project) = if typescript {
        ("app.config.ts", "tsconfig.json")
    } else {
        ("app.config.js", "jsconfig.json")
    };
    write(dir.path(), config, APP_CONFIG);
    write(
        dir.path(),
        project,
        "{\n  \"compilerOptions\": {\n    \"paths\": { \"~/*\": [\"./src/*\"] }\n  }\n}\n",
    );
    write(dir.path(), "src/app.css", "body {\n  margin: 0;\n}\n");
    dir
}

fn service() -> AddonService {
    AddonService::new(Box::new(BuiltinCatalog::new()), Arc::new(LocalFilesystem::new()))
}

fn read(dir: &TempDir, path: &str) -> String {
    fs::read_to_string(dir.path().join(path)).unwrap()
}

#[test]
fn tailwind_and_prettier_land_on_disk() {
    let dir = solid_project(true);
    let workspace = WorkspaceResolver::new().resolve(dir.path()).unwrap();
    assert!(workspace.typescript());
    assert_eq!(workspace.kit().unwrap().alias, "~");

    let report = service()
        .apply(
            &workspace,
            &[AddonRequest::new("prettier"), AddonRequest::new("tailwindcss")],
            false,
        )
        .unwrap();
    let ids: Vec<&str> = report.applied().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["prettier", "tailwindcss"]);

    assert!(read(&dir, "tailwind.config.ts").contains("satisfies Config"));
    assert!(read(&dir, "src/app.css").starts_with("@import 'tailwindcss/base';"));
    assert!(read(&dir, "prettier.config.js").contains("prettier-plugin-tailwindcss"));

    let manifest: serde_json::Value = serde_json::from_str(&read(&dir, "package.json")).unwrap();
    assert_eq!(manifest["dependencies"]["@solidjs/start"], "^1.0.6");
    assert_eq!(manifest["devDependencies"]["tailwindcss"], "^3.4.9");
    assert_eq!(manifest["devDependencies"]["prettier"], "^3.3.2");
    assert_eq!(manifest["scripts"]["format"], "prettier --write .");
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = solid_project(false);
    let workspace = WorkspaceResolver::new().resolve(dir.path()).unwrap();
    let report = service()
        .apply(&workspace, &[AddonRequest::new("tailwindcss")], true)
        .unwrap();

    assert!(report.dry_run);
    assert!(!report.addons[0].files.is_empty());
    assert!(!dir.path().join("tailwind.config.js").exists());
    assert_eq!(read(&dir, "app.config.js"), APP_CONFIG);
    assert!(!read(&dir, "package.json").contains("tailwindcss"));
}

#[test]
fn paraglide_in_a_javascript_project() {
    let dir = solid_project(false);
    write(
        dir.path(),
        "src/app.jsx",
        "import { Router } from \"@solidjs/router\";\nimport { FileRoutes } from \"@solidjs/start/router\";\nimport { Suspense } from \"solid-js\";\n\nexport default function App() {\n  return (\n    <Router root={(props) => <Suspense>{props.children}</Suspense>}>\n      <FileRoutes />\n    </Router>\n  );\n}\n",
    );
    let workspace = WorkspaceResolver::new().resolve(dir.path()).unwrap();
    let request = AddonRequest::new("paraglide")
        .option("availableLanguageTags", "en, de")
        .option("demo", "false");
    service().apply(&workspace, &[request], false).unwrap();

    assert!(read(&dir, "project.inlang/settings.json").contains("\"sourceLanguageTag\": \"en\""));
    assert!(read(&dir, "messages/de.json").contains("hello_world"));
    assert!(read(&dir, "app.config.js").contains("paraglide("));
    let app = read(&dir, "src/app.jsx");
    assert!(app.contains("i18n.LanguageTagProvider"));
    assert!(app.contains("import * as i18n from \"~/lib/i18n\";"));
}

#[test]
fn lucia_without_drizzle_stops_before_writing() {
    let dir = solid_project(true);
    let workspace = WorkspaceResolver::new().resolve(dir.path()).unwrap();
    let err = service()
        .apply(&workspace, &[AddonRequest::new("lucia")], false)
        .unwrap_err();

    assert!(matches!(
        err,
        GraftError::Application(ApplicationError::MissingAddon { .. })
    ));
    assert!(!dir.path().join("src/middleware.ts").exists());
}

#[test]
fn missing_framework_config_is_rejected() {
    let dir = solid_project(true);
    fs::remove_file(dir.path().join("app.config.ts")).unwrap();
    let err = WorkspaceResolver::new().resolve(dir.path()).unwrap_err();
    assert!(err.to_string().contains("missing default export"));
}
