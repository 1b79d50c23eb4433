use crate::config::EngineConfig;
use admission::AdmissionValidator;
use anyhow::{anyhow, ensure, Result};
use dispatcher::{
    DispatchError, DispatchStats, Dispatcher, PendingSender, PushError, SigilRouter, TickReport,
};
use log::debug;
use reinforcement::{ReinforcementTotals, ReinforcementTracker};
use ring_store::RingStats;
use serde::Serialize;
use sigil_audit::{AuditSink, ExecutionRecord, LogAudit, ReinforcementReport};
use sigil_model::{Pressure, Priority, SigilCategory, Tick};

/// Everything one engine tick produced.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineTick {
    pub dispatch: TickReport,
    /// Present when the reinforcement cadence fell on this tick.
    pub reinforcement: Option<ReinforcementReport>,
}

/// Serialisable view of engine health for hosts and debug front-ends.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub tick: Tick,
    pub pressure: Pressure,
    pub pending: usize,
    pub rings: RingStats,
    pub dispatch: DispatchStats,
    pub reinforcement: ReinforcementTotals,
}

/// Dispatcher and reinforcement tracker driven from one tick clock.
pub struct Engine {
    dispatcher: Dispatcher,
    tracker: ReinforcementTracker,
    reinforce_every: u64,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn new(
        config: EngineConfig,
        router: impl SigilRouter + 'static,
        audit: impl AuditSink + 'static,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(config.dispatch, router, audit),
            tracker: ReinforcementTracker::new(config.reinforcement),
            reinforce_every: config.reinforce_every,
        }
    }

    fn from_parts(
        dispatcher: Dispatcher,
        tracker: ReinforcementTracker,
        reinforce_every: u64,
    ) -> Self {
        Self {
            dispatcher,
            tracker,
            reinforce_every,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn tracker(&self) -> &ReinforcementTracker {
        &self.tracker
    }

    pub fn current_tick(&self) -> Tick {
        self.dispatcher.current_tick()
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        temperature: f64,
        category: SigilCategory,
        priority: Priority,
    ) -> bool {
        self.dispatcher.register(id, temperature, category, priority)
    }

    pub fn update_pressure(&mut self, entropy: f64, valence: f64, arousal: f64, heat: f64) {
        self.dispatcher.update_pressure(entropy, valence, arousal, heat);
    }

    pub fn dispatch(&mut self, id: &str) -> Result<ExecutionRecord, DispatchError> {
        self.dispatcher.dispatch(id)
    }

    pub fn enqueue(&self, id: impl Into<String>) -> Result<(), PushError> {
        self.dispatcher.enqueue(id)
    }

    pub fn pending_sender(&self) -> PendingSender {
        self.dispatcher.pending_sender()
    }

    /// Advances one tick, running reinforcement when the cadence is due.
    pub fn tick(&mut self) -> EngineTick {
        let dispatch = self.dispatcher.tick();
        let due = self.reinforce_every > 0 && dispatch.tick % self.reinforce_every == 0;
        let reinforcement = due.then(|| self.reinforce());
        EngineTick {
            dispatch,
            reinforcement,
        }
    }

    /// Runs a reinforcement pass at the current tick and audits the report.
    pub fn reinforce(&mut self) -> ReinforcementReport {
        let now = self.dispatcher.current_tick();
        let report = self.tracker.reinforce(self.dispatcher.states_mut(), now);
        self.dispatcher.audit_mut().record_reinforcement(&report);
        report
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            tick: self.dispatcher.current_tick(),
            pressure: *self.dispatcher.pressure(),
            pending: self.dispatcher.pending_len(),
            rings: self.dispatcher.rings().stats(),
            dispatch: self.dispatcher.stats(),
            reinforcement: self.tracker.totals(),
        }
    }
}

/// Builder for an [`Engine`]. A router is mandatory; audit defaults to [`LogAudit`].
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    router: Option<Box<dyn SigilRouter>>,
    audit: Option<Box<dyn AuditSink>>,
    validator: Option<AdmissionValidator>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn router(mut self, router: impl SigilRouter + 'static) -> Self {
        self.router = Some(Box::new(router));
        self
    }

    pub fn audit(mut self, audit: impl AuditSink + 'static) -> Self {
        self.audit = Some(Box::new(audit));
        self
    }

    /// Overrides the validator derived from the dispatch config.
    pub fn validator(mut self, validator: AdmissionValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Builds the engine, rejecting a missing router or out-of-range tunables.
    pub fn build(self) -> Result<Engine> {
        let EngineConfig {
            dispatch,
            reinforcement,
            reinforce_every,
        } = self.config;

        ensure!(dispatch.queue_capacity > 0, "queue capacity must be positive");
        ensure!(
            (0.0..=1.0).contains(&dispatch.coherence_floor),
            "coherence floor {} outside [0, 1]",
            dispatch.coherence_floor
        );
        ensure!(
            (0.0..=1.0).contains(&dispatch.prune_freshness),
            "prune freshness {} outside [0, 1]",
            dispatch.prune_freshness
        );
        ensure!(
            (0.0..=1.0).contains(&dispatch.use_restore),
            "use restore {} outside [0, 1]",
            dispatch.use_restore
        );
        ensure!(
            reinforcement.min_decay > 0.0 && reinforcement.min_decay <= 1.0,
            "reinforcement decay floor {} outside (0, 1]",
            reinforcement.min_decay
        );

        let router = self.router.ok_or_else(|| anyhow!("missing sigil router"))?;
        let audit = self.audit.unwrap_or_else(|| Box::new(LogAudit));
        let validator = self.validator.unwrap_or_else(|| {
            AdmissionValidator::new(dispatch.coherence_floor, dispatch.recency_window_ticks)
        });

        debug!(
            "engine::build queue_capacity={} reinforce_every={reinforce_every} coherence_floor={:.2}",
            dispatch.queue_capacity,
            validator.coherence_floor(),
        );
        let dispatcher = Dispatcher::with_validator(dispatch, validator, router, audit);
        Ok(Engine::from_parts(
            dispatcher,
            ReinforcementTracker::new(reinforcement),
            reinforce_every,
        ))
    }
}
