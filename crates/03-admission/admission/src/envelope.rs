use serde::{Deserialize, Serialize};
use sigil_model::{Pressure, SigilCategory};
use std::fmt;
use thiserror::Error;

/// Input a bound is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundField {
    Entropy,
    Arousal,
    Valence,
    Heat,
    Coherence,
}

impl BoundField {
    pub fn name(self) -> &'static str {
        match self {
            BoundField::Entropy => "entropy",
            BoundField::Arousal => "arousal",
            BoundField::Valence => "valence",
            BoundField::Heat => "heat",
            BoundField::Coherence => "coherence",
        }
    }
}

impl fmt::Display for BoundField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of the envelope was crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundDirection {
    TooLow,
    TooHigh,
}

/// First bound an input failed.
#[derive(Clone, Copy, Debug, PartialEq, Error, Serialize)]
#[error("{field} {} ({value:.3} {} {bound:.3})", describe(.direction), comparator(.direction))]
pub struct BoundViolation {
    pub field: BoundField,
    pub value: f64,
    pub bound: f64,
    pub direction: BoundDirection,
}

fn describe(direction: &BoundDirection) -> &'static str {
    match direction {
        BoundDirection::TooLow => "too low",
        BoundDirection::TooHigh => "too high",
    }
}

fn comparator(direction: &BoundDirection) -> &'static str {
    match direction {
        BoundDirection::TooLow => "<",
        BoundDirection::TooHigh => ">",
    }
}

/// Optional pressure bounds a category must sit inside to fire.
///
/// Any subset of bounds may be present. Bounds are inclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub min_entropy: Option<f64>,
    pub max_entropy: Option<f64>,
    pub min_arousal: Option<f64>,
    pub max_arousal: Option<f64>,
    pub min_valence: Option<f64>,
    pub min_heat: Option<f64>,
    pub max_heat: Option<f64>,
    pub min_coherence: Option<f64>,
}

impl Envelope {
    /// Envelope with no bounds; always passes.
    pub const OPEN: Envelope = Envelope {
        min_entropy: None,
        max_entropy: None,
        min_arousal: None,
        max_arousal: None,
        min_valence: None,
        min_heat: None,
        max_heat: None,
        min_coherence: None,
    };

    /// Built-in envelope for `category`.
    pub fn for_category(category: SigilCategory) -> Self {
        match category {
            // Revival needs room to stir things up and a trustworthy instance.
            SigilCategory::Revive => Envelope {
                max_entropy: Some(0.8),
                min_coherence: Some(0.4),
                ..Envelope::OPEN
            },
            // Pausing only makes sense once entropy has built up.
            SigilCategory::Pause => Envelope {
                min_entropy: Some(0.4),
                ..Envelope::OPEN
            },
            SigilCategory::Reflect => Envelope {
                max_arousal: Some(0.7),
                min_valence: Some(-0.5),
                ..Envelope::OPEN
            },
            SigilCategory::Seal => Envelope {
                max_heat: Some(0.8),
                min_coherence: Some(0.5),
                ..Envelope::OPEN
            },
            SigilCategory::Dream => Envelope {
                max_entropy: Some(0.6),
                max_arousal: Some(0.4),
                ..Envelope::OPEN
            },
            SigilCategory::Pulse => Envelope {
                min_heat: Some(0.2),
                max_heat: Some(0.9),
                ..Envelope::OPEN
            },
            SigilCategory::Whisper => Envelope {
                max_arousal: Some(0.5),
                ..Envelope::OPEN
            },
            SigilCategory::Echo | SigilCategory::Unbound => Envelope::OPEN,
        }
    }

    /// Returns `true` when no bound is configured.
    pub fn is_open(&self) -> bool {
        *self == Envelope::OPEN
    }

    /// Checks every configured bound in declaration order, stopping at the first violation.
    pub fn check(&self, pressure: &Pressure, coherence: f64) -> Result<(), BoundViolation> {
        use BoundDirection::{TooHigh, TooLow};
        let checks = [
            (self.min_entropy, BoundField::Entropy, pressure.entropy, TooLow),
            (self.max_entropy, BoundField::Entropy, pressure.entropy, TooHigh),
            (self.min_arousal, BoundField::Arousal, pressure.mood_arousal, TooLow),
            (self.max_arousal, BoundField::Arousal, pressure.mood_arousal, TooHigh),
            (self.min_valence, BoundField::Valence, pressure.mood_valence, TooLow),
            (self.min_heat, BoundField::Heat, pressure.pulse_heat, TooLow),
            (self.max_heat, BoundField::Heat, pressure.pulse_heat, TooHigh),
            (self.min_coherence, BoundField::Coherence, coherence, TooLow),
        ];

        for (bound, field, value, direction) in checks {
            let Some(bound) = bound else {
                continue;
            };
            let violated = match direction {
                TooLow => value < bound,
                TooHigh => value > bound,
            };
            if violated {
                return Err(BoundViolation {
                    field,
                    value,
                    bound,
                    direction,
                });
            }
        }
        Ok(())
    }
}
