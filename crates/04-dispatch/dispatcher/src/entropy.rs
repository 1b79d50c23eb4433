use sigil_model::{Pressure, SigilCategory};

/// Signed base entropy each category adds on execution. Settling categories are negative.
pub fn base_entropy(category: SigilCategory) -> f64 {
    match category {
        SigilCategory::Revive => 0.05,
        SigilCategory::Pause => -0.08,
        SigilCategory::Reflect => -0.03,
        SigilCategory::Seal => -0.05,
        SigilCategory::Dream => 0.04,
        SigilCategory::Pulse => 0.06,
        SigilCategory::Whisper => 0.01,
        SigilCategory::Echo => 0.02,
        SigilCategory::Unbound => 0.0,
    }
}

/// Entropy contributed by one execution, before clamping into global entropy.
///
/// `activation_count` is the count prior to this execution.
pub fn entropy_contribution(
    category: SigilCategory,
    activation_count: u64,
    pressure: &Pressure,
) -> f64 {
    let usage_modifier = (1.0 + activation_count as f64 / 50.0).min(2.0);
    let state_modifier = 1.0 + (pressure.pulse_heat - 0.5) * 0.5;
    base_entropy(category) * usage_modifier * state_modifier
}

/// Batch size for one tick: `max(1, floor(base * (1 - entropy)))`.
pub fn max_per_tick(base_throughput: usize, entropy: f64) -> usize {
    let scaled = (base_throughput as f64 * (1.0 - entropy.clamp(0.0, 1.0))).floor();
    (scaled as usize).max(1)
}
