//! The built-in addon catalog.
//!
//! Addons are listed in the order they run: formatting first, so later
//! addons can see that prettier is installed, auth last.

mod common;
mod lucia;
mod mdx;
mod paraglide;
mod prettier;
mod tailwindcss;

use graft_core::application::{Addon, AddonCatalog};

pub use lucia::Lucia;
pub use mdx::Mdx;
pub use paraglide::Paraglide;
pub use prettier::Prettier;
pub use tailwindcss::Tailwindcss;

pub struct BuiltinCatalog {
    addons: Vec<Box<dyn Addon>>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self {
            addons: vec![
                Box::new(Prettier),
                Box::new(Tailwindcss),
                Box::new(Mdx),
                Box::new(Paraglide),
                Box::new(Lucia),
            ],
        }
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl AddonCatalog for BuiltinCatalog {
    fn list(&self) -> Vec<&dyn Addon> {
        self.addons.iter().map(AsRef::as_ref).collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use graft_core::{
        application::{AddonRequest, AddonService, ApplyReport},
        domain::{KitInfo, Workspace, WorkspaceBuilder},
        error::GraftResult,
    };

    use super::BuiltinCatalog;
    use crate::filesystem::MemoryFilesystem;

    pub(crate) const ROOT: &str = "/app";

    /// A SolidStart project at [`ROOT`] with the `~` alias.
    pub(crate) fn kit_project(typescript: bool) -> WorkspaceBuilder {
        Workspace::builder(ROOT)
            .typescript(typescript)
            .dependency("@solidjs/start", "^1.0.0")
            .kit(KitInfo {
                alias: "~".into(),
                ..KitInfo::default()
            })
    }

    pub(crate) fn apply(
        fs: &MemoryFilesystem,
        workspace: &Workspace,
        requests: &[AddonRequest],
    ) -> GraftResult<ApplyReport> {
        AddonService::new(Box::new(BuiltinCatalog::new()), Arc::new(fs.clone()))
            .apply(workspace, requests, false)
    }

    pub(crate) fn read(fs: &MemoryFilesystem, path: &str) -> String {
        fs.get(format!("{ROOT}/{path}"))
            .unwrap_or_else(|| panic!("{path} was not written"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_and_lookup() {
        let catalog = BuiltinCatalog::new();
        let ids: Vec<_> = catalog.list().iter().map(|a| a.id()).collect();
        assert_eq!(ids, ["prettier", "tailwindcss", "mdx", "paraglide", "lucia"]);
        assert_eq!(catalog.get("mdx").map(|a| a.homepage()), Some("https://mdxjs.com"));
        assert!(catalog.get("drizzle").is_none());
    }
}
