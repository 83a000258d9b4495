//! Projector element composition
//!
//! - `composition`: pure transitions of one element mapping
//! - `payload`: checks of the raw request bodies
//! - `engine`: the locked read-compute-write operations on stored projectors

pub mod composition;
mod engine;
pub mod payload;

pub use composition::CompositionError;
pub use engine::{ProjectorChanges, ProjectorService};
