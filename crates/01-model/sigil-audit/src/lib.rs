//! Audit records and sinks shared by the dispatcher and reinforcement pass.
//!
//! The engine never owns a persistence format. It hands records to an
//! [`AuditSink`] and the host decides what to do with them. [`LogAudit`]
//! forwards to the `log` facade and [`MemoryAudit`] keeps entries in-process.
//! [`NdjsonAudit`] writes one JSON object per line. [`NullAudit`] discards.

/// Audit record shapes.
pub mod records;
/// Sink trait and the bundled implementations.
pub mod sink;

pub use crate::records::{
    AuditEntry, ExecutionRecord, ReinforcementEvent, ReinforcementReport, ReinforcementTrigger,
    RejectionKind, RejectionRecord, TriggerCounts,
};
pub use crate::sink::{AuditSink, LogAudit, MemoryAudit, NdjsonAudit, NullAudit};
