use crate::config::DispatchConfig;
use crate::entropy::{entropy_contribution, max_per_tick};
use crate::error::{DispatchError, Disposition, PushError};
use crate::queue::{PendingSender, PendingWork};
use crate::route::{Invocation, SigilRouter};
use admission::AdmissionValidator;
use log::{debug, trace, warn};
use ring_store::PriorityRingStore;
use serde::Serialize;
use sigil_audit::{AuditSink, ExecutionRecord, RejectionKind, RejectionRecord};
use sigil_model::{
    Pressure, Priority, SigilCategory, SigilRecord, SigilState, SigilStates, Tick,
};
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Running counters across the dispatcher's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub ticks: u64,
    pub attempts: u64,
    pub executed: u64,
    pub unknown: u64,
    pub stale: u64,
    pub low_coherence: u64,
    pub bound_violations: u64,
    pub routing_failures: u64,
    pub requeued: u64,
    /// Soft rejections lost because the queue was full at requeue time.
    pub requeue_overflow: u64,
    pub pruned: u64,
}

impl DispatchStats {
    fn record_failure(&mut self, kind: RejectionKind) {
        match kind {
            RejectionKind::UnknownSigil => self.unknown += 1,
            RejectionKind::StaleSigil => self.stale += 1,
            RejectionKind::LowCoherence => self.low_coherence += 1,
            RejectionKind::BoundViolation => self.bound_violations += 1,
            RejectionKind::RoutingFailure => self.routing_failures += 1,
            RejectionKind::QueueFull => self.requeue_overflow += 1,
        }
    }
}

/// Result of one queued dispatch within a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Executed(ExecutionRecord),
    /// Soft rejection appended back to the queue tail.
    Requeued(DispatchError),
    /// Terminal rejection, or a soft one that found the queue full.
    Dropped(DispatchError),
}

/// Summary of a single [`Dispatcher::tick`].
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub tick: Tick,
    /// Batch size allowed by global entropy at the start of the tick.
    pub max_per_tick: usize,
    /// Number of sigil states decayed.
    pub decayed: usize,
    pub pruned: Vec<String>,
    pub outcomes: SmallVec<[DispatchOutcome; 8]>,
}

impl TickReport {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn executed(&self) -> impl Iterator<Item = &ExecutionRecord> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            DispatchOutcome::Executed(record) => Some(record),
            _ => None,
        })
    }

    pub fn requeued(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, DispatchOutcome::Requeued(_)))
            .count()
    }

    pub fn dropped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, DispatchOutcome::Dropped(_)))
            .count()
    }
}

/// Owns the pending queue, the sigil store, and the pressure snapshot.
pub struct Dispatcher {
    config: DispatchConfig,
    validator: AdmissionValidator,
    rings: PriorityRingStore,
    states: SigilStates,
    pending: PendingWork,
    pressure: Pressure,
    router: Box<dyn SigilRouter>,
    audit: Box<dyn AuditSink>,
    history: VecDeque<ExecutionRecord>,
    stats: DispatchStats,
    tick: Tick,
}

impl Dispatcher {
    /// Creates a dispatcher using the built-in envelope table.
    pub fn new(
        config: DispatchConfig,
        router: impl SigilRouter + 'static,
        audit: impl AuditSink + 'static,
    ) -> Self {
        let validator =
            AdmissionValidator::new(config.coherence_floor, config.recency_window_ticks);
        Self::with_validator(config, validator, router, audit)
    }

    /// Creates a dispatcher with a caller-supplied validator.
    pub fn with_validator(
        config: DispatchConfig,
        validator: AdmissionValidator,
        router: impl SigilRouter + 'static,
        audit: impl AuditSink + 'static,
    ) -> Self {
        Self {
            pending: PendingWork::with_capacity(config.queue_capacity),
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            validator,
            rings: PriorityRingStore::new(),
            states: SigilStates::new(),
            pressure: Pressure::default(),
            router: Box::new(router),
            audit: Box::new(audit),
            stats: DispatchStats::default(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn validator(&self) -> &AdmissionValidator {
        &self.validator
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn pressure(&self) -> &Pressure {
        &self.pressure
    }

    /// Global entropy, fed back by every admitted execution.
    pub fn entropy(&self) -> f64 {
        self.pressure.entropy
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// The most recent executions, oldest first.
    pub fn history(&self) -> &VecDeque<ExecutionRecord> {
        &self.history
    }

    pub fn rings(&self) -> &PriorityRingStore {
        &self.rings
    }

    /// Direct ring access. Records added here get default state on first dispatch.
    pub fn rings_mut(&mut self) -> &mut PriorityRingStore {
        &mut self.rings
    }

    pub fn states(&self) -> &SigilStates {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut SigilStates {
        &mut self.states
    }

    pub fn audit_mut(&mut self) -> &mut dyn AuditSink {
        self.audit.as_mut()
    }

    pub fn record(&self, id: &str) -> Option<&SigilRecord> {
        self.rings.find(id)
    }

    pub fn state(&self, id: &str) -> Option<&SigilState> {
        self.states.get(id)
    }

    /// Producer handle for pushing ids from other threads.
    pub fn pending_sender(&self) -> PendingSender {
        self.pending.sender()
    }

    pub fn enqueue(&self, id: impl Into<String>) -> Result<(), PushError> {
        self.pending.try_push(id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Replaces the routing boundary for later dispatches.
    pub fn set_router(&mut self, router: impl SigilRouter + 'static) {
        self.router = Box::new(router);
    }

    /// Replaces the pressure snapshot read by every later validation.
    pub fn update_pressure(&mut self, entropy: f64, valence: f64, arousal: f64, heat: f64) {
        self.set_pressure(Pressure::new(entropy, valence, arousal, heat));
    }

    /// Stores `pressure` with every field clamped into its range.
    pub fn set_pressure(&mut self, pressure: Pressure) {
        self.pressure = Pressure::new(
            pressure.entropy,
            pressure.mood_valence,
            pressure.mood_arousal,
            pressure.pulse_heat,
        );
    }

    /// Registers a new sigil. Returns `false` if the id is already registered.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        temperature: f64,
        category: SigilCategory,
        priority: Priority,
    ) -> bool {
        self.register_record(SigilRecord::new(id, temperature, category, priority))
    }

    pub fn register_record(&mut self, record: SigilRecord) -> bool {
        if self.rings.contains(&record.id) {
            return false;
        }
        self.states.get_or_create(&record.id, self.tick);
        trace!(
            "dispatch::register id={} category={} ring={}",
            record.id,
            record.category,
            record.priority.index()
        );
        self.rings.insert(record);
        true
    }

    /// Deletes a sigil from the rings and the state table.
    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.rings.remove(id);
        self.states.remove(id);
        removed
    }

    pub fn promote(&mut self, id: &str) -> bool {
        self.rings.promote(id)
    }

    pub fn demote(&mut self, id: &str) -> bool {
        self.rings.demote(id)
    }

    /// Empties one ring along with the state of every sigil it held.
    pub fn clear_ring(&mut self, priority: Priority) -> usize {
        let drained = self.rings.drain_ring(priority);
        for record in &drained {
            self.states.remove(&record.id);
        }
        drained.len()
    }

    pub fn clear_all(&mut self) -> usize {
        self.states.clear();
        self.rings.clear_all()
    }

    /// Restores a stale or decayed sigil to full freshness and coherence.
    pub fn refresh(&mut self, id: &str) -> Result<(), DispatchError> {
        if !self.rings.contains(id) {
            return Err(DispatchError::UnknownSigil(id.to_owned()));
        }
        self.states.get_or_create(id, self.tick).refresh(self.tick);
        Ok(())
    }

    /// Sets the externally supplied emotional intensity of a sigil.
    pub fn set_emotional_pressure(&mut self, id: &str, value: f64) -> Result<(), DispatchError> {
        if !self.rings.contains(id) {
            return Err(DispatchError::UnknownSigil(id.to_owned()));
        }
        self.states
            .get_or_create(id, self.tick)
            .set_emotional_pressure(value);
        Ok(())
    }

    /// Validates, routes, and executes one sigil.
    ///
    /// Admission and execution form one transaction: when routing fails no
    /// usage or entropy change is committed. Every failure is handed to the
    /// audit sink before it is returned.
    pub fn dispatch(&mut self, id: &str) -> Result<ExecutionRecord, DispatchError> {
        self.stats.attempts += 1;
        let result = self.execute(id);
        match &result {
            Ok(record) => {
                self.stats.executed += 1;
                self.audit.record_execution(record);
                if self.config.history_capacity > 0 {
                    if self.history.len() == self.config.history_capacity {
                        self.history.pop_front();
                    }
                    self.history.push_back(record.clone());
                }
            }
            Err(err) => {
                self.stats.record_failure(err.kind());
                let rejection = self.rejection_record(
                    err.sigil_id(),
                    err.kind(),
                    err.to_string(),
                    err.disposition() == Disposition::Retry,
                );
                self.audit.record_rejection(&rejection);
            }
        }
        result
    }

    fn execute(&mut self, id: &str) -> Result<ExecutionRecord, DispatchError> {
        let now = self.tick;
        let Some(record) = self.rings.find(id) else {
            trace!("dispatch::execute id={id} unknown");
            return Err(DispatchError::UnknownSigil(id.to_owned()));
        };
        let category = record.category;
        let state = self.states.get_or_create(id, now);

        if state.is_stale(now, self.config.max_age_ticks) {
            return Err(DispatchError::StaleSigil {
                id: id.to_owned(),
                age: state.age(now),
            });
        }

        let score = self
            .validator
            .validate(category, state, &self.pressure, now)
            .map_err(|rejection| DispatchError::rejected(id, rejection))?;
        let contribution = entropy_contribution(category, state.activation_count(), &self.pressure);

        let invocation = Invocation {
            sigil_id: id,
            category,
            house: &record.house,
            tick: now,
            coherence_score: score,
            pressure: &self.pressure,
        };
        if let Err(cause) = self.router.route(&invocation) {
            warn!("dispatch::execute id={id} category={category} routing failed: {cause}");
            return Err(DispatchError::RoutingFailure {
                id: id.to_owned(),
                category,
                cause,
            });
        }

        let snapshot = self.pressure;
        state.record_activation(now, self.config.execution_decay, score);
        state.restore_by_use(self.config.use_restore);
        let entropy_delta = self.pressure.apply_entropy_delta(contribution);
        trace!(
            "dispatch::execute id={id} category={category} scup={score:.3} activations={} entropy={:.3} ({entropy_delta:+.4})",
            state.activation_count(),
            self.pressure.entropy,
        );

        Ok(ExecutionRecord {
            sigil_id: id.to_owned(),
            category,
            tick: now,
            coherence_score: score,
            entropy_delta,
            pressure: snapshot,
        })
    }

    /// Advances one tick: decay and prune, then dispatch an entropy-sized batch.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        self.stats.ticks += 1;
        let now = self.tick;

        let decay = self.config.per_tick_decay();
        for (_, state) in self.states.iter_mut() {
            state.decay_freshness(decay);
        }
        let decayed = self.states.len();

        let prune_floor = self.config.prune_freshness;
        let max_age = self.config.max_age_ticks;
        let pruned = self.states.retain_collect(|_, state| {
            !(state.freshness() < prune_floor && state.is_stale(now, max_age))
        });
        for id in &pruned {
            self.rings.remove(id);
        }
        self.stats.pruned += pruned.len() as u64;

        let max_per_tick = max_per_tick(self.config.base_throughput, self.pressure.entropy);
        let batch = self.pending.pop_batch(max_per_tick);
        let mut outcomes = SmallVec::new();

        for id in batch {
            let outcome = match self.dispatch(&id) {
                Ok(record) => DispatchOutcome::Executed(record),
                Err(err) => match err.disposition() {
                    Disposition::Retry => self.requeue(id, err),
                    Disposition::Drop => {
                        warn!("dispatch::tick dropping `{id}`: {err}");
                        DispatchOutcome::Dropped(err)
                    }
                },
            };
            outcomes.push(outcome);
        }

        let report = TickReport {
            tick: now,
            max_per_tick,
            decayed,
            pruned,
            outcomes,
        };
        debug!(
            "dispatch::tick tick={now} max_per_tick={max_per_tick} processed={} executed={} requeued={} dropped={} pruned={} pending={} entropy={:.3}",
            report.processed(),
            report.executed().count(),
            report.requeued(),
            report.dropped(),
            report.pruned.len(),
            self.pending.len(),
            self.pressure.entropy,
        );
        report
    }

    fn requeue(&mut self, id: String, err: DispatchError) -> DispatchOutcome {
        match self.pending.try_push(id) {
            Ok(()) => {
                self.stats.requeued += 1;
                DispatchOutcome::Requeued(err)
            }
            Err(push_err) => {
                let reason = push_err.to_string();
                warn!("dispatch::tick requeue failed: {reason}");
                self.stats.record_failure(RejectionKind::QueueFull);
                let id = push_err.into_inner();
                let rejection = self.rejection_record(&id, RejectionKind::QueueFull, reason, false);
                self.audit.record_rejection(&rejection);
                DispatchOutcome::Dropped(err)
            }
        }
    }

    fn rejection_record(
        &self,
        id: &str,
        kind: RejectionKind,
        reason: String,
        retry: bool,
    ) -> RejectionRecord {
        RejectionRecord {
            sigil_id: id.to_owned(),
            tick: self.tick,
            kind,
            reason,
            retry,
            pressure: self.pressure,
        }
    }
}
