//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic: overrides, estimation passes,
//! interactive edits and export.

pub mod ancestry;
pub mod error;
pub mod export;
pub mod overrides;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use export::TreeExport;
pub use overrides::DateField;
