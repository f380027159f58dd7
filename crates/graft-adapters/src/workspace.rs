//! Workspace resolution: describe the project at a directory.
//!
//! Probes the disk once and produces an immutable [`Workspace`]:
//!
//! - TypeScript when `app.config.ts` exists or a `tsconfig.json` is found
//! - the monorepo root (`pnpm-workspace.yaml`, or a `workspaces` field)
//! - dependencies merged from every `package.json` from the project up to,
//!   not including, the root; closer manifests first, `dependencies` over
//!   `devDependencies`
//! - SolidStart layout when `@solidjs/start` is a dependency
//! - the package manager (see [`crate::package_manager`])

use std::fs;
use std::path::{Path, PathBuf};

use graft_core::{
    application::ApplicationError,
    domain::{KitInfo, Workspace},
    error::GraftResult,
    tooling::{
        js::{self, ExprKind, StmtKind, variables},
        json,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::package_manager;

/// Where to look for `tsconfig.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TsconfigSearch {
    /// The project directory and every directory above it.
    #[default]
    Upward,
    /// Only the project directory. Keeps a monorepo's root config from
    /// marking a JavaScript package as TypeScript.
    CwdOnly,
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceResolver {
    tsconfig_search: TsconfigSearch,
    user_agent: Option<String>,
}

impl WorkspaceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tsconfig_search(mut self, search: TsconfigSearch) -> Self {
        self.tsconfig_search = search;
        self
    }

    /// Value of `npm_config_user_agent`, consulted when no lock file exists.
    pub fn user_agent(mut self, agent: Option<String>) -> Self {
        self.user_agent = agent;
        self
    }

    #[instrument(skip(self), fields(cwd = %cwd.display()))]
    pub fn resolve(&self, cwd: &Path) -> GraftResult<Workspace> {
        let cwd = absolute(cwd)?;
        if !cwd.is_dir() {
            return Err(invalid(&cwd, "not a directory"));
        }

        let typescript = cwd.join("app.config.ts").is_file()
            || match self.tsconfig_search {
                TsconfigSearch::Upward => cwd.ancestors().any(|dir| dir.join("tsconfig.json").is_file()),
                TsconfigSearch::CwdOnly => cwd.join("tsconfig.json").is_file(),
            };

        let root = find_root(&cwd)?;
        debug!(root = %root.display(), typescript, "project located");

        let mut builder = Workspace::builder(&cwd).typescript(typescript).package_manager(
            package_manager::detect(&cwd, &root, self.user_agent.as_deref()),
        );

        for dir in cwd.ancestors().take_while(|dir| *dir != root) {
            if let Some(manifest) = read_json(&dir.join("package.json"))? {
                for table in ["dependencies", "devDependencies"] {
                    let Some(entries) = manifest.get(table).and_then(Value::as_object) else {
                        continue;
                    };
                    for (name, range) in entries {
                        builder = builder.dependency(name, range.as_str().unwrap_or_default());
                    }
                }
            }
        }

        let probe = builder.build();
        let uses_solid_start = probe
            .dependency_version("@solidjs/start")
            .is_some_and(|v| !v.is_empty());
        if !uses_solid_start {
            return Ok(probe);
        }

        let kit = kit_info(&cwd, typescript)?;
        let mut builder = Workspace::builder(&cwd)
            .typescript(typescript)
            .package_manager(probe.package_manager())
            .kit(kit);
        for (name, version) in probe.dependencies() {
            builder = builder.dependency(name, version);
        }
        Ok(builder.build())
    }
}

fn absolute(cwd: &Path) -> GraftResult<PathBuf> {
    std::path::absolute(cwd).map_err(|e| invalid(cwd, &e.to_string()))
}

fn invalid(path: &Path, reason: &str) -> graft_core::error::GraftError {
    ApplicationError::InvalidWorkspace {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}

/// Parse `path` as (lenient) JSON; `None` when the file does not exist.
fn read_json(path: &Path) -> GraftResult<Option<Value>> {
    let Some(source) = read_optional(path)? else {
        return Ok(None);
    };
    let doc = json::parse_json_lenient(&source).map_err(|e| invalid(path, &e.to_string()))?;
    Ok(Some(doc.data))
}

fn read_optional(path: &Path) -> GraftResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ApplicationError::FilesystemError {
            path: path.to_path_buf(),
            reason: format!("Failed to read file: {e}"),
        }
        .into()),
    }
}

/// Nearest directory at or above `cwd` that is a monorepo root, or the
/// filesystem root when there is none.
fn find_root(cwd: &Path) -> GraftResult<PathBuf> {
    for dir in cwd.ancestors() {
        if dir.join("pnpm-workspace.yaml").is_file() {
            return Ok(dir.to_path_buf());
        }
        if let Some(manifest) = read_json(&dir.join("package.json"))? {
            if manifest.get("workspaces").is_some() {
                return Ok(dir.to_path_buf());
            }
        }
    }
    Ok(cwd.ancestors().last().unwrap_or(cwd).to_path_buf())
}

/// SolidStart layout; the framework config must export a config call.
fn kit_info(cwd: &Path, typescript: bool) -> GraftResult<KitInfo> {
    let project_config = cwd.join(if typescript { "tsconfig.json" } else { "jsconfig.json" });
    let alias = read_json(&project_config)?
        .as_ref()
        .and_then(src_alias)
        .unwrap_or_default();

    let config_name = format!("app.config.{}", if typescript { "ts" } else { "js" });
    let config_path = cwd.join(&config_name);
    let source = read_optional(&config_path)?.unwrap_or_default();
    let mut doc = js::parse_script(&source).map_err(|e| invalid(&config_path, &e.to_string()))?;

    let export = doc.ast.body.iter().find_map(|stmt| match &stmt.kind {
        StmtKind::ExportDefault(expr) => Some(expr.unwrap_ts().clone()),
        _ => None,
    });
    let Some(export) = export else {
        return Err(invalid(&config_path, &format!("missing default export in `{config_name}`")));
    };

    let is_call = match &export.kind {
        ExprKind::Call(_) => true,
        ExprKind::Ident(name) => variables::initializer(&mut doc.ast, name)
            .is_some_and(|init| matches!(init.unwrap_ts().kind, ExprKind::Call(_))),
        _ => false,
    };
    if !is_call {
        return Err(invalid(
            &config_path,
            &format!("unable to find the config call exported from `{config_name}`"),
        ));
    }

    Ok(KitInfo {
        alias,
        ..KitInfo::default()
    })
}

/// The `compilerOptions.paths` entry that maps to `src/*`, without `/*`.
fn src_alias(config: &Value) -> Option<String> {
    let paths = config.get("compilerOptions")?.get("paths")?.as_object()?;
    paths.iter().find_map(|(name, mappings)| {
        mappings
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .any(|m| m.contains("src/*"))
            .then(|| name.replace("/*", ""))
    })
}
