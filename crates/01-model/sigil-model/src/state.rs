//! Mutable per-sigil lifecycle state.

use crate::pressure::clamp01;
use crate::Tick;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Lifecycle state the dispatcher and reinforcement pass mutate.
///
/// Scalar fields are private so every write goes through a clamping setter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigilState {
    activation_count: u64,
    saturation: f64,
    emotional_pressure: f64,
    last_used_tick: Option<Tick>,
    registered_tick: Tick,
    #[serde(default)]
    refreshed_tick: Option<Tick>,
    ttl: Option<Tick>,
    freshness: f64,
    coherence_score: f64,
}

impl SigilState {
    /// Fresh state for a sigil first seen at `now`.
    pub fn new(now: Tick) -> Self {
        Self {
            activation_count: 0,
            saturation: 0.0,
            emotional_pressure: 0.0,
            last_used_tick: None,
            registered_tick: now,
            refreshed_tick: None,
            ttl: None,
            freshness: 1.0,
            coherence_score: 1.0,
        }
    }

    pub fn activation_count(&self) -> u64 {
        self.activation_count
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    pub fn emotional_pressure(&self) -> f64 {
        self.emotional_pressure
    }

    pub fn last_used_tick(&self) -> Option<Tick> {
        self.last_used_tick
    }

    pub fn registered_tick(&self) -> Tick {
        self.registered_tick
    }

    pub fn ttl(&self) -> Option<Tick> {
        self.ttl
    }

    pub fn freshness(&self) -> f64 {
        self.freshness
    }

    pub fn coherence_score(&self) -> f64 {
        self.coherence_score
    }

    pub fn refreshed_tick(&self) -> Option<Tick> {
        self.refreshed_tick
    }

    /// Tick the age is measured from: the later of last use and last refresh,
    /// or registration if neither happened.
    pub fn reference_tick(&self) -> Tick {
        self.last_used_tick
            .max(self.refreshed_tick)
            .unwrap_or(self.registered_tick)
    }

    /// Ticks elapsed since [`SigilState::reference_tick`].
    pub fn age(&self, now: Tick) -> Tick {
        now.saturating_sub(self.reference_tick())
    }

    /// Whether a TTL deadline is set and has not passed yet.
    pub fn ttl_active(&self, now: Tick) -> bool {
        self.ttl.is_some_and(|deadline| now <= deadline)
    }

    /// Older than `max_age` and not protected by a live TTL.
    pub fn is_stale(&self, now: Tick, max_age: Tick) -> bool {
        self.age(now) > max_age && !self.ttl_active(now)
    }

    pub fn set_saturation(&mut self, value: f64) {
        self.saturation = clamp01(value);
    }

    pub fn set_emotional_pressure(&mut self, value: f64) {
        self.emotional_pressure = clamp01(value);
    }

    pub fn set_freshness(&mut self, value: f64) {
        self.freshness = clamp01(value);
    }

    pub fn set_coherence_score(&mut self, value: f64) {
        self.coherence_score = clamp01(value);
    }

    pub fn set_ttl(&mut self, ttl: Option<Tick>) {
        self.ttl = ttl;
    }

    /// Extends the TTL by `ticks`, starting from `now` when none is set.
    pub fn extend_ttl(&mut self, now: Tick, ticks: Tick) -> Tick {
        let deadline = self.ttl.unwrap_or(now).saturating_add(ticks);
        self.ttl = Some(deadline);
        deadline
    }

    /// Lowers freshness by `amount`, clamped at zero.
    pub fn decay_freshness(&mut self, amount: f64) {
        self.set_freshness(self.freshness - amount);
    }

    /// Records a successful execution at `now`.
    pub fn record_activation(&mut self, now: Tick, freshness_cost: f64, coherence: f64) {
        self.activation_count = self.activation_count.saturating_add(1);
        self.last_used_tick = Some(now);
        self.decay_freshness(freshness_cost);
        self.set_coherence_score(coherence);
    }

    /// Wins back `share` of the freshness and coherence still missing from 1.0.
    pub fn restore_by_use(&mut self, share: f64) {
        let share = clamp01(share);
        self.set_freshness(self.freshness + share * (1.0 - self.freshness));
        self.set_coherence_score(self.coherence_score + share * (1.0 - self.coherence_score));
    }

    /// Restores full freshness and coherence and restarts the age clock at `now`.
    ///
    /// The last-use tick is left alone, so recency is unaffected.
    pub fn refresh(&mut self, now: Tick) {
        self.freshness = 1.0;
        self.coherence_score = 1.0;
        self.refreshed_tick = Some(now);
    }

    /// Overrides the usage counter. Smaller values are ignored so the count never decreases.
    pub fn raise_activation_count(&mut self, count: u64) {
        self.activation_count = self.activation_count.max(count);
    }
}

/// Sigil state table keyed by id.
///
/// Ordered by id so that passes over the table are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SigilStates {
    inner: BTreeMap<String, SigilState>,
}

impl SigilStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SigilState> {
        self.inner.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SigilState> {
        self.inner.get_mut(id)
    }

    /// Returns the state for `id`, creating a default entry stamped with `now`.
    pub fn get_or_create(&mut self, id: &str, now: Tick) -> &mut SigilState {
        self.inner
            .entry(id.to_owned())
            .or_insert_with(|| SigilState::new(now))
    }

    pub fn insert(&mut self, id: impl Into<String>, state: SigilState) -> Option<SigilState> {
        self.inner.insert(id.into(), state)
    }

    pub fn remove(&mut self, id: &str) -> Option<SigilState> {
        self.inner.remove(id)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, SigilState> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, SigilState> {
        self.inner.iter_mut()
    }

    /// Removes every entry for which `keep` returns `false`, returning the removed ids.
    pub fn retain_collect(&mut self, mut keep: impl FnMut(&str, &SigilState) -> bool) -> Vec<String> {
        let doomed: Vec<String> = self
            .inner
            .iter()
            .filter(|(id, state)| !keep(id, state))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &doomed {
            self.inner.remove(id);
        }
        doomed
    }
}
