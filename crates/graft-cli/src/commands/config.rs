//! `graft config`: inspect configuration values.

use std::path::Path;

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(
    cmd: ConfigCommands,
    config: AppConfig,
    config_file: Option<&Path>,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = config.get(&key).ok_or_else(|| CliError::ConfigError {
                message: format!("Unknown config key: '{key}'"),
                source: None,
            })?;
            output.print(&value)?;
        }

        ConfigCommands::List => {
            let serialised = toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError {
                message: format!("Failed to serialise config: {e}"),
                source: Some(Box::new(e)),
            })?;
            output.print(serialised.trim_end())?;
        }

        ConfigCommands::Path => {
            output.print(&AppConfig::path(config_file).display().to_string())?;
        }
    }

    Ok(())
}
