//! The addon contract.
//!
//! An addon is one integration (a formatter, a CSS framework, an i18n
//! library) that knows how to wire itself into a project. The orchestrator
//! in [`crate::application::services::addon_service`] drives it through
//! three phases:
//!
//! 1. `options()` is resolved against the user's input before any file is
//!    touched;
//! 2. `setup()` inspects the [`Workspace`] and may mark the addon
//!    unsupported or declare a dependency on another addon;
//! 3. `run()` patches files through the [`RunContext`].

use crate::application::services::patch_service::{PatchService, PatchStatus};
use crate::domain::{Dependency, DependencyKind, OptionSchema, OptionValues, Workspace};
use crate::error::GraftResult;
use crate::tooling::EditResult;

pub trait Addon: Send + Sync {
    /// Catalog identifier, e.g. `tailwindcss`.
    fn id(&self) -> &'static str;

    fn short_description(&self) -> &'static str;

    fn homepage(&self) -> &'static str;

    fn options(&self) -> OptionSchema {
        OptionSchema::new()
    }

    fn setup(&self, _workspace: &Workspace, _cx: &mut SetupContext) {}

    fn run(&self, cx: &mut RunContext<'_>) -> GraftResult<()>;

    /// Follow-up hints printed after a successful run.
    fn next_steps(&self, _workspace: &Workspace) -> Vec<String> {
        Vec::new()
    }
}

/// The set of addons a run can choose from.
pub trait AddonCatalog: Send + Sync {
    /// All addons, in the order they are applied.
    fn list(&self) -> Vec<&dyn Addon>;

    fn get(&self, id: &str) -> Option<&dyn Addon> {
        self.list().into_iter().find(|addon| addon.id() == id)
    }
}

// ── SetupContext ─────────────────────────────────────────────────────────────

/// What an addon's `setup` found out about the project.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetupContext {
    unsupported: Option<String>,
    depends_on: Vec<String>,
}

impl SetupContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The addon cannot run against this project; `reason` is shown to the
    /// user when the addon is skipped.
    pub fn unsupported(&mut self, reason: impl Into<String>) {
        self.unsupported.get_or_insert_with(|| reason.into());
    }

    /// Another addon must be applied first.
    pub fn depends_on(&mut self, addon: &str) {
        if !self.depends_on.iter().any(|id| id == addon) {
            self.depends_on.push(addon.to_owned());
        }
    }

    pub fn unsupported_reason(&self) -> Option<&str> {
        self.unsupported.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

// ── RunContext ───────────────────────────────────────────────────────────────

/// Everything an addon's `run` may touch.
pub struct RunContext<'a> {
    workspace: &'a Workspace,
    patches: &'a mut PatchService,
    dependencies: Vec<Dependency>,
}

impl<'a> RunContext<'a> {
    pub fn new(workspace: &'a Workspace, patches: &'a mut PatchService) -> Self {
        Self {
            workspace,
            patches,
            dependencies: Vec::new(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        self.workspace
    }

    pub fn options(&self) -> &OptionValues {
        self.workspace.options()
    }

    /// Patch `path` (relative to the project root) with `transform`.
    ///
    /// The transform receives the current content, or an empty string when
    /// the file does not exist.
    pub fn file<F>(&mut self, path: &str, transform: F) -> GraftResult<PatchStatus>
    where
        F: FnOnce(&str) -> EditResult<String>,
    {
        self.patches.file(path, transform)
    }

    /// Current content of `path`, as earlier patches of this run left it.
    pub fn read(&self, path: &str) -> GraftResult<Option<String>> {
        self.patches.read(path)
    }

    pub fn dependency(&mut self, name: &str, range: &str) {
        self.record(name, range, DependencyKind::Dependencies);
    }

    pub fn dev_dependency(&mut self, name: &str, range: &str) {
        self.record(name, range, DependencyKind::DevDependencies);
    }

    fn record(&mut self, name: &str, range: &str, kind: DependencyKind) {
        if self.dependencies.iter().any(|dep| dep.name == name) {
            return;
        }
        self.dependencies.push(Dependency {
            name: name.to_owned(),
            range: range.to_owned(),
            kind,
        });
    }

    /// Dependencies recorded so far, in call order.
    pub fn into_dependencies(self) -> Vec<Dependency> {
        self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_keeps_the_first_unsupported_reason() {
        let mut cx = SetupContext::new();
        cx.unsupported("Requires SolidStart");
        cx.unsupported("Requires drizzle");
        cx.depends_on("drizzle");
        cx.depends_on("drizzle");
        assert_eq!(cx.unsupported_reason(), Some("Requires SolidStart"));
        assert_eq!(cx.dependencies(), ["drizzle".to_string()]);
    }
}
