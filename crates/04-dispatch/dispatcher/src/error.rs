use admission::{BoundViolation, Rejection};
use sigil_audit::RejectionKind;
use sigil_model::{SigilCategory, Tick};
use thiserror::Error;

/// What the tick loop does with a failed dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Requeue at the tail for a later tick.
    Retry,
    /// Terminal for this attempt.
    Drop,
}

/// Error raised by a routing handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RouteError(pub String);

impl RouteError {
    pub fn new(msg: impl Into<String>) -> Self {
        RouteError(msg.into())
    }
}

/// Why a dispatch attempt failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("unknown sigil `{0}`")]
    UnknownSigil(String),

    #[error("sigil `{id}` is stale ({age} ticks since last use)")]
    StaleSigil { id: String, age: Tick },

    #[error("sigil `{id}` coherence too low ({score:.3} < {floor:.3})")]
    LowCoherence { id: String, score: f64, floor: f64 },

    #[error("sigil `{id}` {violation}")]
    BoundViolation {
        id: String,
        violation: BoundViolation,
    },

    #[error("routing `{id}` to {category} failed: {cause}")]
    RoutingFailure {
        id: String,
        category: SigilCategory,
        cause: RouteError,
    },
}

impl DispatchError {
    pub(crate) fn rejected(id: &str, rejection: Rejection) -> Self {
        match rejection {
            Rejection::LowCoherence { score, floor } => DispatchError::LowCoherence {
                id: id.to_owned(),
                score,
                floor,
            },
            Rejection::Bound(violation) => DispatchError::BoundViolation {
                id: id.to_owned(),
                violation,
            },
        }
    }

    /// Soft failures may pass once pressure shifts; the rest are dropped.
    pub fn disposition(&self) -> Disposition {
        match self {
            DispatchError::LowCoherence { .. } | DispatchError::BoundViolation { .. } => {
                Disposition::Retry
            }
            DispatchError::UnknownSigil(_)
            | DispatchError::StaleSigil { .. }
            | DispatchError::RoutingFailure { .. } => Disposition::Drop,
        }
    }

    pub fn kind(&self) -> RejectionKind {
        match self {
            DispatchError::UnknownSigil(_) => RejectionKind::UnknownSigil,
            DispatchError::StaleSigil { .. } => RejectionKind::StaleSigil,
            DispatchError::LowCoherence { .. } => RejectionKind::LowCoherence,
            DispatchError::BoundViolation { .. } => RejectionKind::BoundViolation,
            DispatchError::RoutingFailure { .. } => RejectionKind::RoutingFailure,
        }
    }

    pub fn sigil_id(&self) -> &str {
        match self {
            DispatchError::UnknownSigil(id)
            | DispatchError::StaleSigil { id, .. }
            | DispatchError::LowCoherence { id, .. }
            | DispatchError::BoundViolation { id, .. }
            | DispatchError::RoutingFailure { id, .. } => id,
        }
    }
}

/// Push into the pending queue failed without blocking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("pending queue full; dropped `{0}`")]
    Full(String),
    #[error("pending queue closed; dropped `{0}`")]
    Disconnected(String),
}

impl PushError {
    pub fn into_inner(self) -> String {
        match self {
            PushError::Full(id) | PushError::Disconnected(id) => id,
        }
    }
}
