//! Priority-tiered sigil storage.
//!
//! Records live in one of four unsorted rings. Order within a ring is
//! insertion order and carries no meaning; only ring membership does. Ring
//! populations stay in the tens, so lookups are linear scans.

use serde::Serialize;
use sigil_model::{Priority, SigilCategory, SigilRecord};

const RING_COUNT: usize = 4;

/// Fixed set of rings (0 ≻ 1 ≻ 2 ≻ 3) holding sigil records.
#[derive(Debug, Default, Clone)]
pub struct PriorityRingStore {
    rings: [Vec<SigilRecord>; RING_COUNT],
}

/// Temperature summary across every stored record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TemperatureSummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Population snapshot returned by [`PriorityRingStore::stats`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RingStats {
    /// Total records across all rings.
    pub total: usize,
    /// Record count per ring ordered `[0, 1, 2, 3]`.
    pub per_ring: [usize; RING_COUNT],
    /// `None` when the store is empty.
    pub temperature: Option<TemperatureSummary>,
}

impl PriorityRingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with an initial capacity per ring.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rings: std::array::from_fn(|_| Vec::with_capacity(capacity)),
        }
    }

    /// Appends a new record at the tail of `priority`'s ring.
    ///
    /// Re-inserting an existing id is not deduplicated; check [`Self::contains`] first.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        temperature: f64,
        category: SigilCategory,
        priority: Priority,
    ) {
        self.insert(SigilRecord::new(id, temperature, category, priority));
    }

    /// Appends a prepared record at the tail of the ring named by `record.priority`.
    pub fn insert(&mut self, record: SigilRecord) {
        self.rings[record.priority.index()].push(record);
    }

    /// Returns `true` when any ring holds `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// First record matching `id`, scanning from ring 0 outwards.
    pub fn find(&self, id: &str) -> Option<&SigilRecord> {
        self.position(id)
            .map(|(ring, slot)| &self.rings[ring][slot])
    }

    /// Ring currently holding `id`.
    pub fn ring_of(&self, id: &str) -> Option<Priority> {
        self.position(id).map(|(ring, _)| Priority::ALL[ring])
    }

    /// Removes `id` from whichever ring holds it.
    pub fn remove(&mut self, id: &str) -> bool {
        self.take(id).is_some()
    }

    /// Removes and returns the record for `id`.
    pub fn take(&mut self, id: &str) -> Option<SigilRecord> {
        let (ring, slot) = self.position(id)?;
        Some(self.rings[ring].remove(slot))
    }

    /// Moves `id` to the adjacent lower-numbered ring. No-op at ring 0.
    pub fn promote(&mut self, id: &str) -> bool {
        self.shift(id, Priority::promoted)
    }

    /// Moves `id` to the adjacent higher-numbered ring. No-op at ring 3.
    pub fn demote(&mut self, id: &str) -> bool {
        self.shift(id, Priority::demoted)
    }

    /// Records in `priority`'s ring, in insertion order.
    pub fn ring(&self, priority: Priority) -> &[SigilRecord] {
        &self.rings[priority.index()]
    }

    /// Iterates every record, ring 0 first.
    pub fn iter(&self) -> impl Iterator<Item = &SigilRecord> {
        self.rings.iter().flatten()
    }

    /// Returns the number of records in each ring ordered `[0, 1, 2, 3]`.
    pub fn len_per_ring(&self) -> [usize; RING_COUNT] {
        std::array::from_fn(|ring| self.rings[ring].len())
    }

    pub fn len(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(Vec::is_empty)
    }

    /// Population counts and temperature spread.
    pub fn stats(&self) -> RingStats {
        let total = self.len();
        let temperature = if total == 0 {
            None
        } else {
            let (sum, min, max) = self.iter().fold(
                (0.0, f64::INFINITY, f64::NEG_INFINITY),
                |(sum, min, max), record| {
                    (
                        sum + record.temperature,
                        min.min(record.temperature),
                        max.max(record.temperature),
                    )
                },
            );
            Some(TemperatureSummary {
                avg: sum / total as f64,
                min,
                max,
            })
        };

        RingStats {
            total,
            per_ring: self.len_per_ring(),
            temperature,
        }
    }

    /// Empties one ring, returning the removed records.
    pub fn drain_ring(&mut self, priority: Priority) -> Vec<SigilRecord> {
        std::mem::take(&mut self.rings[priority.index()])
    }

    /// Empties one ring, returning how many records it held.
    pub fn clear_ring(&mut self, priority: Priority) -> usize {
        self.drain_ring(priority).len()
    }

    /// Empties every ring, returning how many records were removed.
    pub fn clear_all(&mut self) -> usize {
        Priority::ALL
            .into_iter()
            .map(|priority| self.clear_ring(priority))
            .sum()
    }

    fn position(&self, id: &str) -> Option<(usize, usize)> {
        self.rings.iter().enumerate().find_map(|(ring, records)| {
            records
                .iter()
                .position(|record| record.id == id)
                .map(|slot| (ring, slot))
        })
    }

    fn shift(&mut self, id: &str, step: fn(Priority) -> Option<Priority>) -> bool {
        let Some((ring, slot)) = self.position(id) else {
            return false;
        };
        let Some(target) = step(Priority::ALL[ring]) else {
            return false;
        };
        let mut record = self.rings[ring].remove(slot);
        record.priority = target;
        self.rings[target.index()].push(record);
        true
    }
}
