use admission::{DEFAULT_COHERENCE_FLOOR, DEFAULT_RECENCY_WINDOW};
use serde::{Deserialize, Serialize};
use sigil_model::Tick;

/// Dispatch and decay tunables. Every field has a default, so partial configs deserialise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity of the pending-work queue; pushes beyond it fail fast.
    pub queue_capacity: usize,
    /// Per-tick freshness loss is `decay_rate * 0.1`.
    pub decay_rate: f64,
    /// Freshness lost on every admitted execution.
    pub execution_decay: f64,
    /// Share of the missing freshness and coherence an admitted execution wins back.
    pub use_restore: f64,
    /// Freshness below which an aged sigil is pruned.
    pub prune_freshness: f64,
    /// Ticks since last use after which a sigil is stale.
    pub max_age_ticks: Tick,
    /// Ticks after a use for recency to return to 1.0.
    pub recency_window_ticks: Tick,
    /// SCUP floor for admission.
    pub coherence_floor: f64,
    /// Items processed per tick at zero entropy.
    pub base_throughput: usize,
    /// Execution records retained for inspection.
    pub history_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            decay_rate: 0.01,
            execution_decay: 0.05,
            use_restore: 0.8,
            prune_freshness: 0.1,
            max_age_ticks: 3_600,
            recency_window_ticks: DEFAULT_RECENCY_WINDOW,
            coherence_floor: DEFAULT_COHERENCE_FLOOR,
            base_throughput: 5,
            history_capacity: 100,
        }
    }
}

impl DispatchConfig {
    /// Freshness lost by every known sigil on each tick.
    pub fn per_tick_decay(&self) -> f64 {
        self.decay_rate * 0.1
    }
}
