//! Unified error handling for graft core.
//!
//! Wraps domain and application errors in one type with user-actionable
//! suggestions and a category the CLI maps to an exit code.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for graft core operations.
#[derive(Debug, Error, Clone)]
pub enum GraftError {
    /// Errors from the domain layer (rule violations).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Errors from the application layer (orchestration failures).
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl GraftError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec!["This appears to be a bug in graft".into()],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Compatibility => ErrorCategory::Compatibility,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Configuration,
    Internal,
}

pub type GraftResult<T> = Result<T, GraftError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    fn context(self, msg: impl Into<String>) -> GraftResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> GraftResult<T> {
        self.map_err(|e| GraftError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooling::{EditError, MutationError};

    #[test]
    fn patch_failures_name_the_file_and_expectation() {
        let err: GraftError = ApplicationError::PatchFailed {
            path: "prettier.config.js".into(),
            source: EditError::Mutation(MutationError::expected(
                "default export to be an object expression",
            )),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "could not update prettier.config.js: expected default export to be an object expression"
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn domain_categories_carry_over() {
        let err: GraftError = DomainError::UnknownAddon("drizzle".into()).into();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.suggestions(), vec!["Try: graft list".to_string()]);
    }

    #[test]
    fn context_wraps_foreign_errors() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = result.context("reading lockfile").unwrap_err();
        assert!(matches!(err, GraftError::Internal { ref message } if message == "reading lockfile: boom"));
    }
}
