//! Errors raised by the source-mutation engine.
//!
//! Two failure modes are kept apart:
//!
//! - [`ParseError`]: the input is not valid source for its file kind. The
//!   file cannot be edited safely.
//! - [`MutationError`]: the input parsed, but a structural edit found a
//!   shape it does not know how to extend.

use std::fmt;

use thiserror::Error;

/// Which adapter produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Script,
    Json,
    Stylesheet,
    Markup,
}

impl FileKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Json => "json",
            Self::Stylesheet => "stylesheet",
            Self::Markup => "markup",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed or unsupported source text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub kind: FileKind,
    pub message: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl ParseError {
    /// Build an error positioned at byte `offset` of `source`.
    pub fn at(kind: FileKind, source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;
        Self {
            kind,
            message: message.into(),
            line,
            column,
        }
    }
}

/// The tree did not have the shape a structural edit expected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("expected {expected}")]
pub struct MutationError {
    /// The construct that was missing, e.g. "default export to be an object
    /// expression".
    pub expected: String,
}

impl MutationError {
    pub fn expected(what: impl Into<String>) -> Self {
        Self {
            expected: what.into(),
        }
    }
}

/// Any failure a file transform can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

impl EditError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Result of a single file transform.
pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_one_based() {
        let err = ParseError::at(FileKind::Script, "let a;\nlet b = ;", 15, "unexpected token");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 9);
    }

    #[test]
    fn mutation_error_names_expected_construct() {
        let err = MutationError::expected("default export to be an object expression");
        assert_eq!(
            err.to_string(),
            "expected default export to be an object expression"
        );
    }

    #[test]
    fn edit_error_keeps_kind() {
        let err: EditError = ParseError::at(FileKind::Json, "{", 1, "eof").into();
        assert!(err.is_parse());
        let err: EditError = MutationError::expected("x").into();
        assert!(!err.is_parse());
    }
}
