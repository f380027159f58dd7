//! The `Workspace` snapshot addons run against.
//!
//! A `Workspace` is built once per run from what is on disk (see the
//! workspace resolver in `graft-adapters`) and is never mutated. Deriving a
//! variant, e.g. with the option values of one addon, produces a new value.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{
    entities::options::OptionValues,
    value_objects::{strip_version_range, Dependency, PackageManager},
};

/// Where the framework keeps things, for SolidStart projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KitInfo {
    pub routes_directory: String,
    pub lib_directory: String,
    /// Import alias mapped to `src/*`, e.g. `~`; empty when none is set.
    pub alias: String,
}

impl Default for KitInfo {
    fn default() -> Self {
        Self {
            routes_directory: "src/routes".into(),
            lib_directory: "src/lib".into(),
            alias: String::new(),
        }
    }
}

impl KitInfo {
    /// Module specifier for `path` below `src/`, using the alias when set.
    pub fn import_path(&self, path: &str) -> String {
        if self.alias.is_empty() {
            format!("/src/{path}")
        } else {
            format!("{}/{path}", self.alias)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    cwd: PathBuf,
    typescript: bool,
    package_manager: PackageManager,
    /// Package name to version, ranges stripped.
    dependencies: BTreeMap<String, String>,
    kit: Option<KitInfo>,
    options: OptionValues,
}

impl Workspace {
    pub fn builder(cwd: impl Into<PathBuf>) -> WorkspaceBuilder {
        WorkspaceBuilder::new(cwd)
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub const fn typescript(&self) -> bool {
        self.typescript
    }

    pub const fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    pub fn kit(&self) -> Option<&KitInfo> {
        self.kit.as_ref()
    }

    pub fn options(&self) -> &OptionValues {
        &self.options
    }

    /// Installed version of `package`, without its range operator.
    pub fn dependency_version(&self, package: &str) -> Option<&str> {
        self.dependencies.get(package).map(String::as_str)
    }

    pub fn has_dependency(&self, package: &str) -> bool {
        self.dependencies.contains_key(package)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependencies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `ts` or `js`.
    pub const fn script_ext(&self) -> &'static str {
        if self.typescript {
            "ts"
        } else {
            "js"
        }
    }

    /// `tsx` or `jsx`.
    pub const fn jsx_ext(&self) -> &'static str {
        if self.typescript {
            "tsx"
        } else {
            "jsx"
        }
    }

    /// The same project seen with `options` selected.
    pub fn with_options(&self, options: OptionValues) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    /// The same project after `added` were declared by an earlier addon.
    pub fn with_dependencies(&self, added: &[Dependency]) -> Self {
        let mut next = self.clone();
        for dep in added {
            next.dependencies
                .entry(dep.name.clone())
                .or_insert_with(|| strip_version_range(&dep.range));
        }
        next
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}",
            self.cwd.display(),
            if self.typescript { "typescript" } else { "javascript" },
            self.package_manager
        )?;
        if self.kit.is_some() {
            write!(f, ", solid-start")?;
        }
        write!(f, ")")
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

pub struct WorkspaceBuilder {
    cwd: PathBuf,
    typescript: bool,
    package_manager: PackageManager,
    dependencies: BTreeMap<String, String>,
    kit: Option<KitInfo>,
    options: OptionValues,
}

impl WorkspaceBuilder {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            typescript: false,
            package_manager: PackageManager::default(),
            dependencies: BTreeMap::new(),
            kit: None,
            options: OptionValues::default(),
        }
    }

    pub fn typescript(mut self, typescript: bool) -> Self {
        self.typescript = typescript;
        self
    }

    pub fn package_manager(mut self, package_manager: PackageManager) -> Self {
        self.package_manager = package_manager;
        self
    }

    /// Record `package` at `range`; the first record of a package wins.
    pub fn dependency(mut self, package: &str, range: &str) -> Self {
        self.dependencies
            .entry(package.to_owned())
            .or_insert_with(|| strip_version_range(range));
        self
    }

    pub fn kit(mut self, kit: KitInfo) -> Self {
        self.kit = Some(kit);
        self
    }

    pub fn options(mut self, options: OptionValues) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Workspace {
        Workspace {
            cwd: self.cwd,
            typescript: self.typescript,
            package_manager: self.package_manager,
            dependencies: self.dependencies,
            kit: self.kit,
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::DependencyKind;

    #[test]
    fn first_dependency_record_wins() {
        let ws = Workspace::builder("/app")
            .dependency("eslint", "^9.1.0")
            .dependency("eslint", "^8.0.0")
            .build();
        assert_eq!(ws.dependency_version("eslint"), Some("9.1.0"));
        assert!(!ws.has_dependency("prettier"));
    }

    #[test]
    fn derived_workspaces_leave_the_original_alone() {
        let ws = Workspace::builder("/app").typescript(true).build();
        let next = ws.with_dependencies(&[Dependency {
            name: "prettier".into(),
            range: "^3.3.2".into(),
            kind: DependencyKind::DevDependencies,
        }]);
        assert_eq!(next.dependency_version("prettier"), Some("3.3.2"));
        assert!(!ws.has_dependency("prettier"));
        assert_eq!(next.jsx_ext(), "tsx");
    }

    #[test]
    fn kit_import_paths_use_the_alias() {
        let kit = KitInfo {
            alias: "~".into(),
            ..KitInfo::default()
        };
        assert_eq!(kit.import_path("lib/i18n"), "~/lib/i18n");
        assert_eq!(KitInfo::default().import_path("lib/i18n"), "/src/lib/i18n");
    }
}
