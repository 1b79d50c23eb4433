//! Pressure snapshot read by every admission check during a tick.

use serde::{Deserialize, Serialize};

/// Clamps `value` into `[0, 1]`, mapping NaN to zero.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn clamp_signed(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Host-supplied system pressure.
///
/// `entropy` doubles as the global entropy the dispatcher feeds back into
/// after every admitted execution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pressure {
    /// Global entropy in `[0, 1]`.
    pub entropy: f64,
    /// Mood valence in `[-1, 1]`.
    pub mood_valence: f64,
    /// Mood arousal in `[0, 1]`.
    pub mood_arousal: f64,
    /// Pulse heat in `[0, 1]`.
    pub pulse_heat: f64,
}

impl Pressure {
    /// Builds a snapshot, clamping every input into its declared range.
    pub fn new(entropy: f64, mood_valence: f64, mood_arousal: f64, pulse_heat: f64) -> Self {
        Self {
            entropy: clamp01(entropy),
            mood_valence: clamp_signed(mood_valence),
            mood_arousal: clamp01(mood_arousal),
            pulse_heat: clamp01(pulse_heat),
        }
    }

    /// Mean of entropy and pulse heat.
    pub fn combined(&self) -> f64 {
        (self.entropy + self.pulse_heat) / 2.0
    }

    /// Adds `delta` to entropy, clamped, and returns the change actually applied.
    pub fn apply_entropy_delta(&mut self, delta: f64) -> f64 {
        let before = self.entropy;
        self.entropy = clamp01(before + delta);
        self.entropy - before
    }
}

impl Default for Pressure {
    fn default() -> Self {
        Self {
            entropy: 0.5,
            mood_valence: 0.0,
            mood_arousal: 0.5,
            pulse_heat: 0.5,
        }
    }
}
