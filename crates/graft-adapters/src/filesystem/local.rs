//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use graft_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{GraftError, GraftResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn read_file(&self, path: &Path) -> GraftResult<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io_error(path, e, "read file")),
        }
    }

    fn write_file(&self, path: &Path, content: &str) -> GraftResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn create_dir_all(&self, path: &Path) -> GraftResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> GraftError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
