use super::DomainError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A path inside the project directory.
///
/// Invariant: never absolute and never climbs above its root with `..`.
/// Enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    pub fn try_new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.is_absolute() || path.has_root() {
            return Err(DomainError::AbsolutePathNotAllowed {
                path: path.display().to_string(),
            });
        }
        let mut depth = 0usize;
        for component in path.components() {
            match component {
                Component::ParentDir if depth == 0 => {
                    return Err(DomainError::PathEscapesWorkspace {
                        path: path.display().to_string(),
                    })
                }
                Component::ParentDir => depth -= 1,
                Component::Normal(_) => depth += 1,
                _ => {}
            }
        }
        Ok(Self(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Forward-slash form, as written in addon code and reports.
    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or("")
    }

    /// Extension without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.0.extension().and_then(|e| e.to_str())
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_are_accepted() {
        let path = RelativePath::try_new("src/routes/demo/index.tsx").unwrap();
        assert_eq!(path.extension(), Some("tsx"));
        assert!(RelativePath::try_new("src/../app.config.ts").is_ok());
    }

    #[test]
    fn escaping_paths_are_rejected() {
        assert!(matches!(
            RelativePath::try_new("/etc/passwd"),
            Err(DomainError::AbsolutePathNotAllowed { .. })
        ));
        assert!(matches!(
            RelativePath::try_new("src/../../outside"),
            Err(DomainError::PathEscapesWorkspace { .. })
        ));
    }
}
