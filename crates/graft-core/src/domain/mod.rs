//! Core domain layer for graft.
//!
//! Pure data and rules: the workspace snapshot addons run against, addon
//! option schemas, package managers and dependency records. No I/O; the
//! filesystem is reached through ports in the application layer.
//!
//! - **No I/O**: no filesystem, network, or process calls
//! - **Immutable snapshots**: a [`Workspace`] is never mutated after it is built
pub mod entities;
pub mod error;
pub mod value_objects;

pub use entities::{
    common::RelativePath,
    options::{Choice, OptionDef, OptionKind, OptionSchema, OptionValue, OptionValues, Validator},
    workspace::{KitInfo, Workspace, WorkspaceBuilder},
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{major_version, strip_version_range, Dependency, DependencyKind, PackageManager};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use super::*;

    #[test]
    fn package_manager_parses_and_displays() {
        assert_eq!(PackageManager::from_str("PNPM").unwrap(), PackageManager::Pnpm);
        assert!(PackageManager::from_str("pip").is_err());
        assert_eq!(PackageManager::Bun.to_string(), "bun");
        assert_eq!(PackageManager::Yarn.install_command(), "yarn install");
    }

    #[test]
    fn every_package_manager_has_a_lockfile() {
        for pm in PackageManager::ALL {
            assert!(!pm.lockfiles().is_empty(), "{pm} has no lockfile");
        }
    }

    #[test]
    fn resolved_options_attach_to_a_new_workspace() {
        let schema = OptionSchema::new().boolean("demo", "Include a demo?", true);
        let values = schema.resolve("lucia", &BTreeMap::new()).unwrap();
        let ws = Workspace::builder("/app").build();
        let with = ws.with_options(values);
        assert!(with.options().flag("demo"));
        assert!(!ws.options().flag("demo"));
    }

    #[test]
    fn error_categories() {
        assert_eq!(DomainError::UnknownAddon("x".into()).category(), ErrorCategory::NotFound);
        assert_eq!(
            DomainError::UnsupportedProject {
                addon: "lucia".into(),
                reason: "requires SolidStart".into()
            }
            .category(),
            ErrorCategory::Compatibility
        );
        assert!(!DomainError::MalformedOption("x".into()).suggestions().is_empty());
    }
}
