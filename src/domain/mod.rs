//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod date;
pub mod entities;
pub mod error;
pub mod estimate;
pub mod queue;
pub mod registry;
pub mod rotation;
pub mod scale;
pub mod source;

pub use builder::{LayoutParams, TreeBuilder};
pub use date::{CalibrationPoint, DateInfo, LifespanAnchor, LifespanModel};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use estimate::{clear_estimates, EstimationParams, Estimator};
pub use queue::{FamilyQueue, FamilyVisit};
pub use registry::{FamilyTree, ScaleParams};
pub use rotation::{apply_rotation, rotation_set, RotationSet};
pub use scale::TimeScale;
pub use source::{
    EventKind, EventRecord, FamilyRecord, GenealogySource, PersonRecord, RootSelector,
    SurnameRecord,
};
