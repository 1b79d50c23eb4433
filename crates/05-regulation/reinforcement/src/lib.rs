//! Reinforcement of heavily used or emotionally charged sigils.
//!
//! A pass walks the whole state table, boosts saturation for qualifying
//! sigils, and extends their TTL so they survive staleness checks. The caller
//! picks the cadence; nothing here is tied to the dispatch tick.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use sigil_audit::{ReinforcementEvent, ReinforcementReport, TriggerCounts};
use sigil_model::{SigilState, SigilStates, Tick};

pub use sigil_audit::ReinforcementTrigger;

/// Tunables for the reinforcement pass. Independent of the dispatch decay constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinforcementConfig {
    /// Activation count that must be exceeded.
    pub activation_threshold: u64,
    /// Emotional pressure that must be exceeded.
    pub emotional_threshold: f64,
    /// Ticks for the decay factor to halve.
    pub half_life_ticks: Tick,
    /// Saturation added at full decay factor.
    pub base_boost: f64,
    /// TTL ticks granted per reinforcement.
    pub ttl_extension: Tick,
    /// Lower bound of the decay factor.
    pub min_decay: f64,
}

impl Default for ReinforcementConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 10,
            emotional_threshold: 0.7,
            half_life_ticks: 1_000,
            base_boost: 0.1,
            ttl_extension: 250,
            min_decay: 0.1,
        }
    }
}

/// Lifetime tallies across every pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ReinforcementTotals {
    pub passes: u64,
    pub reinforced: u64,
    pub skipped: u64,
    pub per_trigger: TriggerCounts,
    pub saturation_granted: f64,
    pub ttl_granted: Tick,
}

#[derive(Debug, Default)]
pub struct ReinforcementTracker {
    config: ReinforcementConfig,
    totals: ReinforcementTotals,
}

impl ReinforcementTracker {
    pub fn new(config: ReinforcementConfig) -> Self {
        Self {
            config,
            totals: ReinforcementTotals::default(),
        }
    }

    pub fn config(&self) -> &ReinforcementConfig {
        &self.config
    }

    pub fn totals(&self) -> ReinforcementTotals {
        self.totals
    }

    /// Which criterion, if any, qualifies `state` for reinforcement.
    pub fn check_criteria(&self, state: &SigilState) -> Option<ReinforcementTrigger> {
        let active = state.activation_count() > self.config.activation_threshold;
        let emotional = state.emotional_pressure() > self.config.emotional_threshold;
        match (active, emotional) {
            (true, true) => Some(ReinforcementTrigger::Dual),
            (true, false) => Some(ReinforcementTrigger::Activation),
            (false, true) => Some(ReinforcementTrigger::Emotional),
            (false, false) => None,
        }
    }

    /// `0.5 ^ (elapsed / half_life)`, floored at `min_decay`.
    ///
    /// Elapsed time runs from the last use, or from registration for a sigil
    /// that has never executed.
    pub fn decay_factor(&self, state: &SigilState, now: Tick) -> f64 {
        let last = state.last_used_tick().unwrap_or(state.registered_tick());
        let elapsed = now.saturating_sub(last) as f64;
        let exponent = match self.config.half_life_ticks {
            0 if elapsed == 0.0 => 0.0,
            0 => f64::INFINITY,
            half_life => elapsed / half_life as f64,
        };
        0.5f64.powf(exponent).clamp(self.config.min_decay.min(1.0), 1.0)
    }

    /// Reinforces one sigil if it qualifies.
    ///
    /// Saturation gain is scaled by the decay factor; the TTL extension is not.
    pub fn reinforce_state(
        &self,
        id: &str,
        state: &mut SigilState,
        now: Tick,
    ) -> Option<ReinforcementEvent> {
        let trigger = self.check_criteria(state)?;
        let decay_factor = self.decay_factor(state, now);
        let before = state.saturation();
        state.set_saturation(before + self.config.base_boost * decay_factor);
        let ttl_before = state.ttl();
        let ttl_after = state.extend_ttl(now, self.config.ttl_extension);
        trace!(
            "reinforce::state id={id} trigger={trigger} decay={decay_factor:.3} saturation={:.3} ttl={ttl_after}",
            state.saturation()
        );
        Some(ReinforcementEvent {
            sigil_id: id.to_owned(),
            trigger,
            decay_factor,
            saturation_gain: state.saturation() - before,
            ttl_before,
            ttl_after,
        })
    }

    /// Runs one pass over every known sigil, in id order.
    pub fn reinforce(&mut self, states: &mut SigilStates, now: Tick) -> ReinforcementReport {
        let mut report = ReinforcementReport::new(now);
        for (id, state) in states.iter_mut() {
            match self.reinforce_state(id, state, now) {
                Some(event) => report.push(event, self.config.ttl_extension),
                None => report.skipped.push(id.clone()),
            }
        }

        self.totals.passes += 1;
        self.totals.reinforced += report.reinforced.len() as u64;
        self.totals.skipped += report.skipped.len() as u64;
        self.totals.per_trigger.activation += report.per_trigger.activation;
        self.totals.per_trigger.emotional += report.per_trigger.emotional;
        self.totals.per_trigger.dual += report.per_trigger.dual;
        self.totals.saturation_granted += report.total_saturation;
        self.totals.ttl_granted = self.totals.ttl_granted.saturating_add(report.total_ttl);

        debug!(
            "reinforce::pass tick={now} reinforced={} skipped={} dual={} activation={} emotional={}",
            report.reinforced.len(),
            report.skipped.len(),
            report.per_trigger.dual,
            report.per_trigger.activation,
            report.per_trigger.emotional,
        );
        report
    }
}
