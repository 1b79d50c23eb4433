//! Admission control for sigil dispatch.
//!
//! Admission has two stages. A global coherence floor (SCUP) comes first. A
//! per-category envelope of pressure bounds comes second. Both stages are
//! pure functions of a sigil's state and the supplied [`Pressure`] snapshot.
//!
//! [`Pressure`]: sigil_model::Pressure

/// SCUP coherence score.
pub mod coherence;
/// Per-category threshold envelopes.
pub mod envelope;
/// Two-stage admission check.
pub mod validator;

pub use crate::coherence::{
    coherence_breakdown, coherence_score, CoherenceBreakdown, DEFAULT_RECENCY_WINDOW,
};
pub use crate::envelope::{BoundDirection, BoundField, BoundViolation, Envelope};
pub use crate::validator::{AdmissionValidator, Rejection, DEFAULT_COHERENCE_FLOOR};
