//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer, the source-mutation tooling and
//! the ports to accomplish "apply these addons to this project".

pub mod addon_service;
pub mod patch_service;

pub use addon_service::{
    AddonInfo, AddonOutcome, AddonRequest, AddonService, AddonStatus, ApplyReport, merge_dependencies,
};
pub use patch_service::{PatchRecord, PatchService, PatchStatus};
