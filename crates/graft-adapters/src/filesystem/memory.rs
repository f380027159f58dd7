//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use graft_core::{
    application::{ApplicationError, ports::Filesystem},
    error::GraftResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same storage, so a test can hand one clone to a service
/// and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories (testing helper).
    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            let path = path.as_ref();
            if let Some(parent) = path.parent() {
                insert_ancestors(&mut inner.directories, parent);
            }
            inner.files.insert(path.to_path_buf(), content.to_string());
        }
        self
    }

    /// Read a file's content (testing helper).
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path.as_ref()).cloned()
    }

    /// List all files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read_lock(&self, path: &Path) -> GraftResult<RwLockReadGuard<'_, MemoryFilesystemInner>> {
        self.inner.read().map_err(|_| poisoned(path))
    }

    fn write_lock(&self, path: &Path) -> GraftResult<RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner.write().map_err(|_| poisoned(path))
    }
}

fn poisoned(path: &Path) -> graft_core::error::GraftError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: "memory filesystem lock poisoned".into(),
    }
    .into()
}

fn insert_ancestors(directories: &mut HashSet<PathBuf>, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        directories.insert(current.clone());
    }
}

impl Filesystem for MemoryFilesystem {
    fn read_file(&self, path: &Path) -> GraftResult<Option<String>> {
        Ok(self.read_lock(path)?.files.get(path).cloned())
    }

    fn write_file(&self, path: &Path, content: &str) -> GraftResult<()> {
        let mut inner = self.write_lock(path)?;

        // Ensure parent exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> GraftResult<()> {
        let mut inner = self.write_lock(path)?;
        insert_ancestors(&mut inner.directories, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_need_a_parent_directory() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("/app/src/a.ts"), "").is_err());
        fs.create_dir_all(Path::new("/app/src")).unwrap();
        fs.write_file(Path::new("/app/src/a.ts"), "a").unwrap();
        assert_eq!(fs.get("/app/src/a.ts").as_deref(), Some("a"));
        assert!(fs.exists(Path::new("/app")));
    }

    #[test]
    fn clones_share_storage() {
        let fs = MemoryFilesystem::new().with_file("/app/package.json", "{}");
        let other = fs.clone();
        assert_eq!(
            other.read_file(Path::new("/app/package.json")).unwrap().as_deref(),
            Some("{}")
        );
        assert_eq!(fs.list_files(), [PathBuf::from("/app/package.json")]);
    }
}
