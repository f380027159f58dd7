//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `GRAFT_*` environment variables, `__` between sections
//!    (`GRAFT_OUTPUT__NO_COLOR=true`)
//! 3. Config file (`--config`, or the platform config directory)
//! 4. Built-in defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use graft_adapters::TsconfigSearch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cli::ListFormat;

const ENV_PREFIX: &str = "GRAFT";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output settings.
    pub output: OutputConfig,
    /// How projects are probed.
    pub workspace: WorkspaceConfig,
    /// Default option values per addon:
    ///
    /// ```toml
    /// [addons.paraglide]
    /// availableLanguageTags = "en,de"
    /// ```
    pub addons: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// Default for `graft list --format`.
    pub format: ListFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub tsconfig_search: TsconfigSearch,
}

impl AppConfig {
    /// Load configuration, starting from defaults.
    ///
    /// An explicit `config_file` must exist; the default location is
    /// optional.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = toml::to_string(&Self::default()).context("serialising default configuration")?;
        let mut builder = Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        match config_file {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
                }
            }
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(Config::try_deserialize)
            .context("loading configuration")
    }

    /// Path of the configuration file in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "graft").map(|d| d.config_dir().join("config.toml"))
    }

    /// The file `config_file` or the default location, for display.
    pub fn path(config_file: Option<&Path>) -> PathBuf {
        config_file
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .unwrap_or_else(|| PathBuf::from(".graft.toml"))
    }

    /// Value at a dotted key such as `output.no_color`, rendered as text.
    pub fn get(&self, key: &str) -> Option<String> {
        let root = serde_json::to_value(self).ok()?;
        let value = key.split('.').try_fold(&root, |node, part| node.get(part))?;
        Some(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Configured defaults for `addon`'s options.
    pub fn addon_defaults(&self, addon: &str) -> Option<&BTreeMap<String, String>> {
        self.addons.get(addon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    #[test]
    fn defaults_are_conservative() {
        let cfg = AppConfig::default();
        assert!(!cfg.output.no_color);
        assert_eq!(cfg.output.format, ListFormat::Table);
        assert_eq!(cfg.workspace.tsconfig_search, TsconfigSearch::Upward);
        assert!(cfg.addons.is_empty());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[output]\nformat = \"json\"\n\n[workspace]\ntsconfig_search = \"cwd-only\"\n\n[addons.lucia]\ndemo = false"
        )
        .unwrap();

        let cfg = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.output.format, ListFormat::Json);
        assert!(!cfg.output.no_color);
        assert_eq!(cfg.workspace.tsconfig_search, TsconfigSearch::CwdOnly);
        assert_eq!(cfg.addons["lucia"]["demo"], "false");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn dotted_keys_resolve() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("output.no_color").as_deref(), Some("false"));
        assert_eq!(cfg.get("output.format").as_deref(), Some("table"));
        assert_eq!(cfg.get("workspace.tsconfig_search").as_deref(), Some("upward"));
        assert_eq!(cfg.get("output.missing"), None);
    }

    #[test]
    fn explicit_path_is_reported() {
        assert_eq!(AppConfig::path(Some(Path::new("graft.toml"))), PathBuf::from("graft.toml"));
        assert!(!AppConfig::path(None).as_os_str().is_empty());
    }
}
