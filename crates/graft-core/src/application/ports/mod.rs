//! Application ports (traits) for external dependencies.
//!
//! Ports define what the application needs from the outside world.
//! Adapters in `graft-adapters` implement them.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: called by the application, implemented by
//!   infrastructure
//!   - `Filesystem`: file operations below the project root
//!   - `AddonCatalog`: the addons available to a run
//!   - `Addon`: one integration (prettier, tailwindcss, ...)

pub mod addon;
pub mod output;

pub use addon::{Addon, AddonCatalog};
pub use output::Filesystem;
