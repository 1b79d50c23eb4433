use serde::Serialize;
use sigil_model::{clamp01, Pressure, SigilState, Tick};

/// Default recency window: a sigil regains full recency this many ticks after its last use.
pub const DEFAULT_RECENCY_WINDOW: Tick = 300;

/// Intermediate factors behind a SCUP score, kept for logging and audit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CoherenceBreakdown {
    /// Peaks at 1.0 when combined pressure sits at 0.5.
    pub pressure_factor: f64,
    /// `1 + valence * 0.2`.
    pub mood_factor: f64,
    /// 1.0 for never-used sigils, otherwise ramps up over the recency window.
    pub recency: f64,
    /// `freshness * prior coherence`.
    pub base: f64,
    /// Final clamped score.
    pub score: f64,
}

/// Breaks the SCUP computation for `state` under `pressure` at tick `now` into its factors.
pub fn coherence_breakdown(
    state: &SigilState,
    pressure: &Pressure,
    now: Tick,
    recency_window: Tick,
) -> CoherenceBreakdown {
    let pressure_factor = 1.0 - (pressure.combined() - 0.5).abs() * 0.5;
    let mood_factor = 1.0 + pressure.mood_valence * 0.2;
    let recency = match state.last_used_tick() {
        None => 1.0,
        Some(_) if recency_window == 0 => 1.0,
        Some(last) => (now.saturating_sub(last) as f64 / recency_window as f64).min(1.0),
    };
    let base = state.freshness() * state.coherence_score();
    let score = clamp01(base * pressure_factor * mood_factor * recency);

    CoherenceBreakdown {
        pressure_factor,
        mood_factor,
        recency,
        base,
        score,
    }
}

/// SCUP score in `[0, 1]`.
pub fn coherence_score(
    state: &SigilState,
    pressure: &Pressure,
    now: Tick,
    recency_window: Tick,
) -> f64 {
    coherence_breakdown(state, pressure, now, recency_window).score
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Fresh sigils under moderate pressure score close to one.
    #[test]
    fn fresh_sigil_scores_high() {
        let state = SigilState::new(0);
        let pressure = Pressure::new(0.5, 0.0, 0.3, 0.4);
        let b = coherence_breakdown(&state, &pressure, 0, DEFAULT_RECENCY_WINDOW);
        assert!((b.pressure_factor - 0.975).abs() < 1e-12);
        assert_eq!(b.mood_factor, 1.0);
        assert_eq!(b.recency, 1.0);
        assert!((b.score - 0.975).abs() < 1e-12);
    }

    /// An immediate retry after use has zero recency and therefore zero score.
    #[test]
    fn recency_ramps_after_use() {
        let mut state = SigilState::new(0);
        state.record_activation(100, 0.0, 1.0);
        let pressure = Pressure::new(0.5, 0.0, 0.5, 0.5);
        assert_eq!(coherence_score(&state, &pressure, 100, 300), 0.0);
        assert!((coherence_score(&state, &pressure, 250, 300) - 0.5).abs() < 1e-12);
        assert_eq!(coherence_score(&state, &pressure, 1000, 300), 1.0);
    }

    /// Extreme pressure costs at most a quarter of the score.
    #[test]
    fn pressure_factor_bottoms_at_three_quarters() {
        let state = SigilState::new(0);
        let hot = Pressure::new(1.0, 0.0, 0.5, 1.0);
        let cold = Pressure::new(0.0, 0.0, 0.5, 0.0);
        assert_eq!(coherence_score(&state, &hot, 0, 300), 0.75);
        assert_eq!(coherence_score(&state, &cold, 0, 300), 0.75);
    }

    proptest! {
        /// SCUP stays in `[0, 1]` for any in-range pressure and state.
        #[test]
        fn score_is_bounded(
            entropy in 0.0f64..=1.0,
            valence in -1.0f64..=1.0,
            arousal in 0.0f64..=1.0,
            heat in 0.0f64..=1.0,
            freshness in 0.0f64..=1.0,
            prior in 0.0f64..=1.0,
            last in proptest::option::of(0u64..2_000),
            now in 0u64..4_000,
        ) {
            let mut state = SigilState::new(0);
            if let Some(last) = last {
                state.record_activation(last, 0.0, prior);
            }
            state.set_freshness(freshness);
            state.set_coherence_score(prior);
            let pressure = Pressure::new(entropy, valence, arousal, heat);
            let score = coherence_score(&state, &pressure, now, DEFAULT_RECENCY_WINDOW);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
