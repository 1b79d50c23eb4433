//! Host-facing engine tying dispatch and reinforcement to one tick clock.
//!
//! Hosts build an [`Engine`] through [`EngineBuilder`], register sigils, feed
//! pressure each tick, and call [`Engine::tick`]. Reinforcement runs on the
//! configured cadence or on demand. [`SharedEngine`] wraps the engine in a
//! mutex for hosts that tick from one thread and produce from others.

pub mod config;
pub mod engine;
pub mod shared;

pub use crate::config::EngineConfig;
pub use crate::engine::{Engine, EngineBuilder, EngineSnapshot, EngineTick};
pub use crate::shared::SharedEngine;

pub use dispatcher::{
    DispatchConfig, DispatchError, DispatchOutcome, DispatchStats, Disposition, FnRoute,
    Invocation, NullRouter, PendingSender, PushError, RouteError, RouteTable, SigilRouter,
    TickReport,
};
pub use reinforcement::{ReinforcementConfig, ReinforcementTotals, ReinforcementTrigger};
pub use sigil_audit::{
    AuditEntry, AuditSink, ExecutionRecord, LogAudit, MemoryAudit, NdjsonAudit, NullAudit,
    ReinforcementReport, RejectionKind, RejectionRecord,
};
pub use sigil_model::{Pressure, Priority, SigilCategory, SigilRecord, SigilState, Tick};
