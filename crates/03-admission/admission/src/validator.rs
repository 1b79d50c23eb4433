use crate::coherence::{coherence_breakdown, CoherenceBreakdown, DEFAULT_RECENCY_WINDOW};
use crate::envelope::{BoundViolation, Envelope};
use log::trace;
use sigil_model::{Pressure, SigilCategory, SigilState, Tick};
use thiserror::Error;

/// SCUP scores below this floor are rejected before any envelope check.
pub const DEFAULT_COHERENCE_FLOOR: f64 = 0.3;

/// Why admission refused a sigil. Both variants are soft: pressure may shift by the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum Rejection {
    #[error("coherence too low ({score:.3} < {floor:.3})")]
    LowCoherence { score: f64, floor: f64 },
    #[error(transparent)]
    Bound(#[from] BoundViolation),
}

/// Two-stage admission check: global SCUP floor, then the category envelope.
#[derive(Clone, Debug)]
pub struct AdmissionValidator {
    coherence_floor: f64,
    recency_window: Tick,
    envelopes: [Envelope; SigilCategory::COUNT],
}

impl Default for AdmissionValidator {
    fn default() -> Self {
        Self::new(DEFAULT_COHERENCE_FLOOR, DEFAULT_RECENCY_WINDOW)
    }
}

impl AdmissionValidator {
    /// Validator using the built-in envelope table.
    pub fn new(coherence_floor: f64, recency_window: Tick) -> Self {
        Self {
            coherence_floor,
            recency_window,
            envelopes: SigilCategory::ALL.map(Envelope::for_category),
        }
    }

    /// Replaces the envelope for one category.
    pub fn with_envelope(mut self, category: SigilCategory, envelope: Envelope) -> Self {
        self.envelopes[category.index()] = envelope;
        self
    }

    pub fn coherence_floor(&self) -> f64 {
        self.coherence_floor
    }

    pub fn recency_window(&self) -> Tick {
        self.recency_window
    }

    pub fn envelope(&self, category: SigilCategory) -> &Envelope {
        &self.envelopes[category.index()]
    }

    /// SCUP factors for `state` without applying any admission rule.
    pub fn score(&self, state: &SigilState, pressure: &Pressure, now: Tick) -> CoherenceBreakdown {
        coherence_breakdown(state, pressure, now, self.recency_window)
    }

    /// Runs both stages. On success returns the SCUP score the sigil was admitted with.
    pub fn validate(
        &self,
        category: SigilCategory,
        state: &SigilState,
        pressure: &Pressure,
        now: Tick,
    ) -> Result<f64, Rejection> {
        let breakdown = self.score(state, pressure, now);
        trace!(
            "admission::validate category={category} score={:.3} pressure_factor={:.3} mood={:.3} recency={:.3}",
            breakdown.score,
            breakdown.pressure_factor,
            breakdown.mood_factor,
            breakdown.recency,
        );

        if breakdown.score < self.coherence_floor {
            return Err(Rejection::LowCoherence {
                score: breakdown.score,
                floor: self.coherence_floor,
            });
        }

        self.envelope(category).check(pressure, breakdown.score)?;
        Ok(breakdown.score)
    }
}
