//! Driven (output) ports - implemented by infrastructure.
//!
//! The `graft-adapters` crate provides the implementations.

use crate::error::GraftResult;
use std::path::Path;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `graft_adapters::filesystem::LocalFilesystem` (production)
/// - `graft_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Paths handed to the port are already joined onto the project root and
/// checked not to leave it.
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Read a file as UTF-8; `None` when it does not exist.
    fn read_file(&self, path: &Path) -> GraftResult<Option<String>>;

    /// Write content to a file, replacing it.
    fn write_file(&self, path: &Path, content: &str) -> GraftResult<()>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> GraftResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}
