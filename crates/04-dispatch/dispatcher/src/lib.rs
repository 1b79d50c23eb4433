//! Sigil dispatch and the per-tick regulation loop.
//!
//! Producers push sigil ids into a bounded [`PendingWork`] queue. Each call
//! to [`Dispatcher::tick`] decays and prunes known sigils, sizes a batch from
//! global entropy, and dispatches that batch. Admitted sigils are routed to
//! their category handler and feed an entropy contribution back into the
//! pressure snapshot, so a busy system throttles itself.

/// Tunable constants for dispatch and decay.
pub mod config;
/// Dispatch state machine and tick loop.
pub mod dispatch;
/// Per-category base entropy and the contribution formula.
pub mod entropy;
/// Dispatch error taxonomy.
pub mod error;
/// Bounded pending-work queue.
pub mod queue;
/// Category routing seam.
pub mod route;

pub use crate::config::DispatchConfig;
pub use crate::dispatch::{DispatchOutcome, DispatchStats, Dispatcher, TickReport};
pub use crate::entropy::{base_entropy, entropy_contribution, max_per_tick};
pub use crate::error::{DispatchError, Disposition, PushError, RouteError};
pub use crate::queue::{PendingSender, PendingWork};
pub use crate::route::{FnRoute, Invocation, NullRouter, RouteTable, SigilRouter};
