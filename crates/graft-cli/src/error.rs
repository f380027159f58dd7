//! Error handling for the graft CLI.
//!
//! Provides structured errors with:
//! - User-friendly messages
//! - Actionable suggestions
//! - Exit code mapping

use std::error::Error;

use owo_colors::OwoColorize;
use thiserror::Error;

use graft_core::error::GraftError;

pub use graft_core::error::ErrorCategory as CoreCategory;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input caught before the core runs.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// A configuration file could not be read or a key does not exist.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },

    /// An error propagated from `graft-core` or an adapter.
    #[error("{0}")]
    Core(#[from] GraftError),

    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The user aborted a prompt.
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(feature = "interactive")]
impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => CliError::Cancelled,
            dialoguer::Error::IO(e) => CliError::from(e),
        }
    }
}

impl CliError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { message, .. } => vec![
                format!("Check your input: {message}"),
                "Use --help for usage information".into(),
            ],

            Self::ConfigError { .. } => vec![
                "Show the active configuration with: graft config list".into(),
                "Show the configuration file location with: graft config path".into(),
            ],

            Self::Core(core_err) => core_err.suggestions(),

            Self::IoError { .. } => vec![
                "Check file permissions".into(),
                "Ensure the parent directory exists".into(),
            ],

            Self::Cancelled => vec!["No files were changed".into()],
        }
    }

    /// Get the error category for styling and exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::UserError,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Core(core) => match core.category() {
                CoreCategory::Validation | CoreCategory::Compatibility => ErrorCategory::UserError,
                CoreCategory::NotFound => ErrorCategory::NotFound,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::IoError { .. } => ErrorCategory::Internal,
            Self::Cancelled => ErrorCategory::UserError,
        }
    }

    /// Exit code to pass to the OS.
    ///
    /// | Category      | Code |
    /// |---------------|------|
    /// | User error    |  2   |
    /// | Not found     |  3   |
    /// | Configuration |  4   |
    /// | Internal      |  1   |
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::UserError => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Configuration => 4,
            ErrorCategory::Internal => 1,
        }
    }

    /// Format the error for display with colors and suggestions.
    pub fn format_colored(&self, verbose: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n{} {}\n\n", "✗".red().bold(), "Error:".red().bold()));
        output.push_str(&format!("  {}\n", self.to_string().red()));

        if verbose {
            let mut source = self.source();
            while let Some(err) = source {
                output.push_str(&format!("\n  {} {}\n", "→".dimmed(), err.to_string().dimmed()));
                source = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str(&format!("\n{}\n", "Suggestions:".yellow().bold()));
            for suggestion in suggestions {
                output.push_str(&format!("  {suggestion}\n"));
            }
        }

        if !verbose {
            output.push('\n');
            output.push_str(&format!(
                "{} {}\n",
                "\u{2139}".blue(),
                "Use -v / --verbose for more details.".dimmed(),
            ));
        }

        output
    }

    /// Plain-text version of [`Self::format_colored`], no ANSI codes.
    pub fn format_plain(&self, verbose: bool) -> String {
        let mut out = String::new();
        out.push_str(&format!("\nError: {self}\n"));

        if verbose {
            let mut src = self.source();
            while let Some(err) = src {
                out.push_str(&format!("  Caused by: {err}\n"));
                src = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for s in &suggestions {
                out.push_str(&format!("  {s}\n"));
            }
        }

        if !verbose {
            out.push_str("\nUse -v / --verbose for more details.\n");
        }

        out
    }

    /// Log the error using tracing.
    pub fn log(&self) {
        match self.category() {
            ErrorCategory::UserError => tracing::warn!("User error: {}", self),
            ErrorCategory::NotFound => tracing::warn!("Not found: {}", self),
            ErrorCategory::Configuration => tracing::error!("Configuration error: {}", self),
            ErrorCategory::Internal => tracing::error!("Internal error: {}", self),
        }

        if let Some(source) = self.source() {
            tracing::debug!("Caused by: {}", source);
        }
    }
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// User input error (validation, invalid arguments).
    UserError,
    /// Resource not found.
    NotFound,
    /// Configuration error.
    Configuration,
    /// Internal/system error.
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::{
        application::ApplicationError,
        domain::DomainError,
        tooling::{EditError, MutationError},
    };
    use std::io;

    // ── suggestions ───────────────────────────────────────────────────────

    #[test]
    fn unknown_addon_points_at_list() {
        let err = CliError::from(GraftError::from(DomainError::UnknownAddon("drizzle".into())));
        assert!(err.suggestions().iter().any(|s| s.contains("graft list")));
    }

    #[test]
    fn config_error_points_at_config_commands() {
        let err = CliError::ConfigError {
            message: "unknown key".into(),
            source: None,
        };
        assert!(err.suggestions().iter().any(|s| s.contains("graft config")));
    }

    // ── exit codes ────────────────────────────────────────────────────────

    #[test]
    fn exit_code_user_error() {
        let err = CliError::InvalidInput {
            message: "x".into(),
            source: None,
        };
        assert_eq!(err.exit_code(), 2);

        let invalid_option = CliError::from(GraftError::from(DomainError::InvalidOption {
            addon: "paraglide".into(),
            option: "availableLanguageTags".into(),
            reason: "bad tag".into(),
        }));
        assert_eq!(invalid_option.exit_code(), 2);
    }

    #[test]
    fn exit_code_not_found() {
        let err = CliError::from(GraftError::from(ApplicationError::MissingAddon {
            addon: "lucia".into(),
            requires: "drizzle".into(),
        }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn exit_code_configuration() {
        let err = CliError::ConfigError {
            message: "x".into(),
            source: None,
        };
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn exit_code_internal() {
        let err = CliError::from(io::Error::other("e"));
        assert_eq!(err.exit_code(), 1);
    }

    // ── format ────────────────────────────────────────────────────────────

    #[test]
    fn patch_failure_names_file_and_expectation() {
        let err = CliError::from(GraftError::from(ApplicationError::PatchFailed {
            path: "app.config.ts".into(),
            source: EditError::Mutation(MutationError::expected("a config call")),
        }));
        let s = err.format_plain(false);
        assert!(s.contains("Error: could not update app.config.ts"));
        assert!(s.contains("a config call"));
        assert!(s.contains("Suggestions:"));
    }

    #[test]
    fn format_plain_verbose_omits_hint() {
        let s = CliError::Cancelled.format_plain(true);
        assert!(!s.contains("--verbose"));
    }
}
