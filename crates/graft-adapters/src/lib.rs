//! Infrastructure adapters for Graft.
//!
//! Implements the ports of `graft_core::application::ports`: filesystem
//! access, project probing and the built-in addon catalog.

pub mod catalog;
pub mod filesystem;
pub mod package_manager;
pub mod workspace;

pub use catalog::BuiltinCatalog;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use workspace::{TsconfigSearch, WorkspaceResolver};
