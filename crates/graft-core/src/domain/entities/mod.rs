pub mod common;
pub mod options;
pub mod workspace;

pub use crate::domain::DomainError;
pub use options::{OptionSchema, OptionValues};
pub use workspace::Workspace;
