//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O. Rule
//! violations are `DomainError` from `crate::domain`; malformed sources and
//! unexpected shapes are `EditError` from `crate::tooling`, wrapped here
//! with the file they happened in.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;
use crate::tooling::EditError;

#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A file transform failed; the file was left untouched.
    #[error("could not update {path}: {source}")]
    PatchFailed { path: String, source: EditError },

    /// The project could not be described (unreadable manifest, unexpected
    /// framework config).
    #[error("invalid project at {path}: {reason}")]
    InvalidWorkspace { path: PathBuf, reason: String },

    /// An addon needs another addon the catalog does not have.
    #[error("addon '{addon}' requires '{requires}', which is not available")]
    MissingAddon { addon: String, requires: String },

    /// Port/Adapter not configured.
    #[error("required adapter not configured: {name}")]
    AdapterNotConfigured { name: &'static str },
}

impl ApplicationError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::PatchFailed { path, source } if source.is_parse() => vec![
                format!("{path} could not be parsed; fix the syntax error and retry"),
                "Files written before this one were kept".into(),
            ],
            Self::PatchFailed { path, .. } => vec![
                format!("{path} has a shape graft does not know how to extend"),
                "Apply this change by hand, or restore the file to the framework default".into(),
                "Files written before this one were kept".into(),
            ],
            Self::InvalidWorkspace { .. } => vec![
                "Run graft from the root of a SolidStart project".into(),
                "Or point it at one with --cwd".into(),
            ],
            Self::MissingAddon { requires, .. } => vec![
                format!("Set up '{requires}' first, then run graft again"),
            ],
            Self::AdapterNotConfigured { name } => vec![
                format!("Required component not configured: {name}"),
                "This is likely a configuration error".into(),
            ],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FilesystemError { .. } => ErrorCategory::Internal,
            Self::PatchFailed { .. } => ErrorCategory::Validation,
            Self::InvalidWorkspace { .. } => ErrorCategory::Validation,
            Self::MissingAddon { .. } => ErrorCategory::NotFound,
            Self::AdapterNotConfigured { .. } => ErrorCategory::Configuration,
        }
    }
}
