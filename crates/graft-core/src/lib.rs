//! graft core - source mutation engine and addon orchestration.
//!
//! This crate provides the tooling, domain and application layers for
//! graft, the tool that wires integrations (formatters, CSS frameworks,
//! i18n, auth) into existing SolidStart projects. It follows hexagonal
//! (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            graft-cli (CLI)              │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │      (AddonService, PatchService)       │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Application Ports (Traits)       │
//! │     (Filesystem, Addon, AddonCatalog)   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     graft-adapters (Infrastructure)     │
//! │ (LocalFilesystem, resolver, catalog)    │
//! └─────────────────────────────────────────┘
//!
//!   tooling: parse / edit / generate for script, JSON, CSS and markup
//!   domain:  Workspace, option schemas, package managers
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use graft_core::prelude::*;
//!
//! # fn run(catalog: Box<dyn AddonCatalog>, fs: Arc<dyn Filesystem>, workspace: Workspace) -> GraftResult<()> {
//! let service = AddonService::new(catalog, fs);
//! let report = service.apply(&workspace, &[AddonRequest::new("prettier")], false)?;
//! for addon in report.applied() {
//!     println!("{}: {} file(s)", addon.id, addon.files.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod error;
pub mod tooling;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        Addon, AddonCatalog, AddonRequest, AddonService, ApplyReport, Filesystem, PatchStatus,
        RunContext, SetupContext,
    };
    pub use crate::domain::{
        Choice, KitInfo, OptionSchema, PackageManager, RelativePath, Workspace, WorkspaceBuilder,
    };
    pub use crate::error::{GraftError, GraftResult};
    pub use crate::tooling::{EditError, EditResult, MutationError, ParseError};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
