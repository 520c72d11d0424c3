//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services work against the `GenealogySource` boundary and are
//! themselves concrete structs, not traits.

mod tree;

pub use tree::TreeService;
