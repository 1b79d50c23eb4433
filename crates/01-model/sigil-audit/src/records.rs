use serde::Serialize;
use sigil_model::{Pressure, SigilCategory, Tick};
use std::fmt;

/// One admitted and executed dispatch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub sigil_id: String,
    pub category: SigilCategory,
    pub tick: Tick,
    /// SCUP score the sigil was admitted with.
    pub coherence_score: f64,
    /// Change applied to global entropy after clamping.
    pub entropy_delta: f64,
    /// Pressure as it stood when the sigil was admitted.
    pub pressure: Pressure,
}

/// Coarse classification of a failed dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    UnknownSigil,
    StaleSigil,
    LowCoherence,
    BoundViolation,
    RoutingFailure,
    /// A soft rejection could not be requeued because the pending queue was full.
    QueueFull,
}

impl RejectionKind {
    pub fn name(self) -> &'static str {
        match self {
            RejectionKind::UnknownSigil => "unknown_sigil",
            RejectionKind::StaleSigil => "stale_sigil",
            RejectionKind::LowCoherence => "low_coherence",
            RejectionKind::BoundViolation => "bound_violation",
            RejectionKind::RoutingFailure => "routing_failure",
            RejectionKind::QueueFull => "queue_full",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One failed dispatch attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RejectionRecord {
    pub sigil_id: String,
    pub tick: Tick,
    pub kind: RejectionKind,
    /// Human-readable reason, e.g. `"entropy too high (0.850 > 0.800)"`.
    pub reason: String,
    /// Whether the attempt is eligible for a retry on a later tick.
    pub retry: bool,
    pub pressure: Pressure,
}

/// Criterion that qualified a sigil for reinforcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReinforcementTrigger {
    /// Activation count above threshold.
    Activation,
    /// Emotional pressure above threshold.
    Emotional,
    /// Both criteria met.
    Dual,
}

impl ReinforcementTrigger {
    pub fn label(self) -> &'static str {
        match self {
            ReinforcementTrigger::Activation => "activation",
            ReinforcementTrigger::Emotional => "emotional",
            ReinforcementTrigger::Dual => "dual",
        }
    }
}

impl fmt::Display for ReinforcementTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-trigger tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TriggerCounts {
    pub activation: usize,
    pub emotional: usize,
    pub dual: usize,
}

impl TriggerCounts {
    pub fn bump(&mut self, trigger: ReinforcementTrigger) {
        match trigger {
            ReinforcementTrigger::Activation => self.activation += 1,
            ReinforcementTrigger::Emotional => self.emotional += 1,
            ReinforcementTrigger::Dual => self.dual += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.activation + self.emotional + self.dual
    }
}

/// A single sigil boosted during a reinforcement pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReinforcementEvent {
    pub sigil_id: String,
    pub trigger: ReinforcementTrigger,
    pub decay_factor: f64,
    /// Saturation actually gained after clamping.
    pub saturation_gain: f64,
    pub ttl_before: Option<Tick>,
    pub ttl_after: Tick,
}

/// Summary of one reinforcement pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReinforcementReport {
    pub tick: Tick,
    pub reinforced: Vec<ReinforcementEvent>,
    pub skipped: Vec<String>,
    pub per_trigger: TriggerCounts,
    pub total_saturation: f64,
    pub total_ttl: Tick,
}

impl ReinforcementReport {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn reinforced_ids(&self) -> impl Iterator<Item = &str> {
        self.reinforced.iter().map(|event| event.sigil_id.as_str())
    }

    /// Folds one event into the report totals.
    pub fn push(&mut self, event: ReinforcementEvent, ttl_granted: Tick) {
        self.per_trigger.bump(event.trigger);
        self.total_saturation += event.saturation_gain;
        self.total_ttl = self.total_ttl.saturating_add(ttl_granted);
        self.reinforced.push(event);
    }
}

/// Tagged union used by sinks that keep or serialise a single stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEntry {
    Execution(ExecutionRecord),
    Rejection(RejectionRecord),
    Reinforcement(ReinforcementReport),
}

impl AuditEntry {
    /// Serialises the entry to a single NDJSON line.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
