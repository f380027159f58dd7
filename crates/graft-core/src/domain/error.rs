use thiserror::Error;

/// Root domain error type.
///
/// Every variant is cloneable, has a category for the CLI, and carries
/// suggestions the user can act on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ── validation ──────────────────────────────────────────────────────────
    #[error("invalid value for option '{addon}.{option}': {reason}")]
    InvalidOption {
        addon: String,
        option: String,
        reason: String,
    },

    #[error("addon '{addon}' has no option '{option}'")]
    UnknownOption { addon: String, option: String },

    #[error("malformed option '{0}', expected addon.key=value")]
    MalformedOption(String),

    #[error("absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("path leaves the project directory: {path}")]
    PathEscapesWorkspace { path: String },

    #[error("unknown package manager: {0}")]
    UnknownPackageManager(String),

    // ── compatibility ───────────────────────────────────────────────────────
    #[error("addon '{addon}' does not support this project: {reason}")]
    UnsupportedProject { addon: String, reason: String },

    // ── not found ───────────────────────────────────────────────────────────
    #[error("unknown addon '{0}'")]
    UnknownAddon(String),
}

impl DomainError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidOption { addon, option, .. } => vec![
                format!("Check the value passed with --option {addon}.{option}=..."),
                "Run without --option to use the default".into(),
            ],
            Self::UnknownOption { addon, .. } => vec![
                format!("See the options of '{addon}' with: graft list --format json"),
            ],
            Self::MalformedOption(_) => vec![
                "Options are written as addon.key=value".into(),
                "Example: --option paraglide.availableLanguageTags=en,de".into(),
            ],
            Self::UnsupportedProject { reason, .. } => vec![
                format!("Requirement: {reason}"),
                "Run graft from the root of a SolidStart project".into(),
            ],
            Self::UnknownAddon(_) => vec!["Try: graft list".into()],
            Self::UnknownPackageManager(_) => {
                vec!["Supported package managers: npm, pnpm, yarn, bun, deno".into()]
            }
            _ => vec!["See documentation for more details".into()],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidOption { .. }
            | Self::UnknownOption { .. }
            | Self::MalformedOption(_)
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesWorkspace { .. }
            | Self::UnknownPackageManager(_) => ErrorCategory::Validation,
            Self::UnsupportedProject { .. } => ErrorCategory::Compatibility,
            Self::UnknownAddon(_) => ErrorCategory::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
