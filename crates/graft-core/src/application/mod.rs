//! Application layer for graft.
//!
//! This layer contains:
//! - **Services**: use case orchestration (`AddonService`, `PatchService`)
//! - **Ports**: interface definitions (traits) for external dependencies
//! - **Errors**: application-specific error types
//!
//! The application layer coordinates the domain layer and the tooling but
//! contains no I/O itself. Files are reached through the `Filesystem` port.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    AddonInfo, AddonOutcome, AddonRequest, AddonService, AddonStatus, ApplyReport, PatchRecord,
    PatchService, PatchStatus,
};

pub use ports::{
    Addon, AddonCatalog, Filesystem,
    addon::{RunContext, SetupContext},
};

pub use error::ApplicationError;
