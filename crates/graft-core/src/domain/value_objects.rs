//! Domain value objects.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── PackageManager ───────────────────────────────────────────────────────────

/// The package manager a project is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
    Deno,
}

impl PackageManager {
    pub const ALL: [PackageManager; 5] = [Self::Npm, Self::Pnpm, Self::Yarn, Self::Bun, Self::Deno];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
            Self::Deno => "deno",
        }
    }

    /// Lock files that identify this package manager.
    pub const fn lockfiles(&self) -> &'static [&'static str] {
        match self {
            Self::Npm => &["package-lock.json", "npm-shrinkwrap.json"],
            Self::Pnpm => &["pnpm-lock.yaml"],
            Self::Yarn => &["yarn.lock"],
            Self::Bun => &["bun.lockb", "bun.lock"],
            Self::Deno => &["deno.lock"],
        }
    }

    /// Command that installs the project's dependencies.
    pub fn install_command(&self) -> String {
        format!("{} install", self.as_str())
    }

    /// Parse the `npm_config_user_agent` value package managers export to
    /// scripts, e.g. `pnpm/9.1.0 npm/? node/v20.11.0 linux x64`.
    pub fn from_user_agent(agent: &str) -> Option<Self> {
        let name = agent.split_whitespace().next()?.split('/').next()?;
        name.parse().ok()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "pnpm" => Ok(Self::Pnpm),
            "yarn" => Ok(Self::Yarn),
            "bun" => Ok(Self::Bun),
            "deno" => Ok(Self::Deno),
            other => Err(DomainError::UnknownPackageManager(other.to_owned())),
        }
    }
}

// ── DependencyKind ───────────────────────────────────────────────────────────

/// Which `package.json` table a dependency goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    Dependencies,
    DevDependencies,
}

impl DependencyKind {
    pub const fn manifest_key(&self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
        }
    }
}

/// A package an addon needs, with its version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub range: String,
    pub kind: DependencyKind,
}

/// Strip a version range down to the version digits, e.g. `^9.1.0` to
/// `9.1.0`; alternatives separated by `|` are kept.
pub fn strip_version_range(range: &str) -> String {
    range
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '|')
        .collect()
}

/// Major version of a stripped version string.
pub fn major_version(version: &str) -> Option<u64> {
    version.split(['.', '|']).next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_the_package_manager() {
        assert_eq!(
            PackageManager::from_user_agent("pnpm/9.1.0 npm/? node/v20.11.0 linux x64"),
            Some(PackageManager::Pnpm)
        );
        assert_eq!(PackageManager::from_user_agent("yarn/1.22.19"), Some(PackageManager::Yarn));
        assert_eq!(PackageManager::from_user_agent("cargo/1"), None);
        assert_eq!(PackageManager::from_user_agent(""), None);
    }

    #[test]
    fn ranges_strip_to_versions() {
        assert_eq!(strip_version_range("^9.1.0"), "9.1.0");
        assert_eq!(strip_version_range(">=1.2 || ^2"), "1.2||2");
        assert_eq!(strip_version_range("workspace:*"), "");
        assert_eq!(major_version("9.1.0"), Some(9));
        assert_eq!(major_version(""), None);
    }
}
