//! Shared sigil primitives.
//!
//! The `sigil-model` crate stays small on purpose. It defines the records,
//! per-sigil state, and pressure snapshot that the ring store, admission
//! checks, dispatcher, and reinforcement pass all compile against.

/// Pressure snapshot supplied by the host each tick.
pub mod pressure;
/// Mutable per-sigil lifecycle state and the shared state table.
pub mod state;
/// Identity, priority, and category types.
pub mod types;

pub use crate::pressure::{clamp01, Pressure};
pub use crate::state::{SigilState, SigilStates};
pub use crate::types::{ParseCategoryError, Priority, SigilCategory, SigilRecord};

/// Discrete scheduling time unit.
pub type Tick = u64;
