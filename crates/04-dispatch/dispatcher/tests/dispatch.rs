//! Integration tests for dispatch, the tick loop, and entropy feedback.

use dispatcher::{
    DispatchConfig, DispatchError, DispatchOutcome, Dispatcher, NullRouter, RouteError, RouteTable,
};
use proptest::prelude::*;
use sigil_audit::{MemoryAudit, NullAudit, RejectionKind};
use sigil_model::{Pressure, Priority, SigilCategory};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn calm_dispatcher(config: DispatchConfig) -> (Dispatcher, MemoryAudit) {
    init_logger();
    let audit = MemoryAudit::new();
    let mut dispatcher = Dispatcher::new(config, NullRouter, audit.clone());
    dispatcher.update_pressure(0.5, 0.0, 0.3, 0.4);
    (dispatcher, audit)
}

/// A fresh unbound sigil under calm pressure executes and records one use.
#[test]
fn trusted_sigil_executes_once() {
    let (mut dispatcher, audit) = calm_dispatcher(DispatchConfig::default());
    assert!(dispatcher.register("sigil_trust_001", 0.5, SigilCategory::Unbound, Priority::Core));

    let record = dispatcher.dispatch("sigil_trust_001").expect("admitted");
    assert!((record.coherence_score - 0.975).abs() < 1e-12);
    assert_eq!(record.entropy_delta, 0.0);

    let state = dispatcher.state("sigil_trust_001").expect("state");
    assert_eq!(state.activation_count(), 1);
    assert_eq!(state.last_used_tick(), Some(0));
    assert_eq!(dispatcher.entropy(), 0.5);
    assert_eq!(dispatcher.history().len(), 1);
    assert_eq!(audit.executions().len(), 1);
    assert_eq!(dispatcher.stats().executed, 1);
}

/// Raw pressure snapshots are clamped before validation sees them.
#[test]
fn set_pressure_clamps_fields() {
    let (mut dispatcher, _) = calm_dispatcher(DispatchConfig::default());
    dispatcher.set_pressure(Pressure {
        entropy: 1.7,
        mood_valence: -4.0,
        mood_arousal: -0.2,
        pulse_heat: f64::NAN,
    });
    assert_eq!(*dispatcher.pressure(), Pressure::new(1.0, -1.0, 0.0, 0.0));
    assert_eq!(dispatcher.entropy(), 1.0);
}

/// Steady reuse keeps a sigil admissible once recency recovers.
#[test]
fn steady_use_stays_admissible() {
    let (mut dispatcher, _) = calm_dispatcher(DispatchConfig::default());
    dispatcher.register("steady", 0.5, SigilCategory::Unbound, Priority::Inner);
    dispatcher.enqueue("steady").expect("room");

    let mut runs = Vec::new();
    for _ in 0..2_000 {
        let report = dispatcher.tick();
        if report.executed().count() == 1 {
            runs.push(report.tick);
            dispatcher.enqueue("steady").expect("room");
        }
    }
    assert!(runs.len() >= 12, "runs at ticks {runs:?}");
    let gaps: Vec<u64> = runs.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(gaps.iter().all(|&gap| gap <= 150), "gaps {gaps:?}");
    let state = dispatcher.state("steady").expect("state");
    assert!(state.freshness() > 0.5);
    assert!(state.coherence_score() > 0.5);
}

/// Unknown ids are rejected without touching global entropy.
#[test]
fn unknown_sigil_is_rejected() {
    let (mut dispatcher, audit) = calm_dispatcher(DispatchConfig::default());
    let err = dispatcher.dispatch("ghost").expect_err("not registered");
    assert_eq!(err, DispatchError::UnknownSigil("ghost".into()));
    assert_eq!(dispatcher.entropy(), 0.5);
    assert!(dispatcher.states().is_empty(), "no state is created for unknown ids");

    let rejections = audit.rejections();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].kind, RejectionKind::UnknownSigil);
    assert!(!rejections[0].retry);
}

/// Registration is idempotent per id.
#[test]
fn duplicate_registration_is_ignored() {
    let (mut dispatcher, _) = calm_dispatcher(DispatchConfig::default());
    assert!(dispatcher.register("a", 0.1, SigilCategory::Echo, Priority::Inner));
    assert!(!dispatcher.register("a", 0.9, SigilCategory::Seal, Priority::Core));
    assert_eq!(dispatcher.rings().len(), 1);
    assert_eq!(dispatcher.record("a").map(|r| r.category), Some(SigilCategory::Echo));
}

/// Records placed directly in the rings get default state on first dispatch.
#[test]
fn ring_only_record_gets_lazy_state() {
    let (mut dispatcher, _) = calm_dispatcher(DispatchConfig::default());
    dispatcher
        .rings_mut()
        .add("lazy", 0.3, SigilCategory::Whisper, Priority::Middle);
    assert!(dispatcher.state("lazy").is_none());
    dispatcher.dispatch("lazy").expect("admitted");
    assert_eq!(dispatcher.state("lazy").map(|s| s.activation_count()), Some(1));
}

/// Sigils idle past the age window are stale until refreshed.
#[test]
fn stale_sigil_needs_refresh() {
    let config = DispatchConfig {
        max_age_ticks: 5,
        ..DispatchConfig::default()
    };
    let (mut dispatcher, _) = calm_dispatcher(config);
    dispatcher.register("old", 0.5, SigilCategory::Echo, Priority::Outer);
    for _ in 0..6 {
        dispatcher.tick();
    }

    match dispatcher.dispatch("old") {
        Err(DispatchError::StaleSigil { id, age }) => {
            assert_eq!(id, "old");
            assert_eq!(age, 6);
        }
        other => panic!("expected stale, got {other:?}"),
    }
    assert_eq!(dispatcher.stats().stale, 1);

    dispatcher.refresh("old").expect("registered");
    dispatcher.dispatch("old").expect("refreshed sigil is admitted");
}

/// Batch size shrinks as entropy rises.
#[test]
fn tick_respects_entropy_throughput() {
    let (mut dispatcher, _) = calm_dispatcher(DispatchConfig::default());
    for n in 0..6 {
        let id = format!("u{n}");
        dispatcher.register(id.clone(), 0.5, SigilCategory::Unbound, Priority::Inner);
        dispatcher.enqueue(id).expect("room");
    }

    let report = dispatcher.tick();
    assert_eq!(report.tick, 1);
    assert_eq!(report.max_per_tick, 2);
    assert_eq!(report.executed().count(), 2);
    assert_eq!(dispatcher.pending_len(), 4);
    let ids: Vec<&str> = report.executed().map(|r| r.sigil_id.as_str()).collect();
    assert_eq!(ids, ["u0", "u1"]);
}

/// Soft rejections go back on the queue and pass once pressure shifts.
#[test]
fn bound_violation_is_requeued() {
    let (mut dispatcher, audit) = calm_dispatcher(DispatchConfig::default());
    dispatcher.update_pressure(0.2, 0.0, 0.3, 0.4);
    dispatcher.register("hold", 0.5, SigilCategory::Pause, Priority::Core);
    dispatcher.enqueue("hold").expect("room");

    let report = dispatcher.tick();
    assert_eq!(report.requeued(), 1);
    assert!(matches!(
        report.outcomes[0],
        DispatchOutcome::Requeued(DispatchError::BoundViolation { .. })
    ));
    assert_eq!(dispatcher.pending_len(), 1);
    assert!(audit.rejections()[0].retry);

    dispatcher.update_pressure(0.5, 0.0, 0.3, 0.4);
    let report = dispatcher.tick();
    assert_eq!(report.executed().count(), 1);
    assert!(dispatcher.pending_is_empty());
    // Pause settles the system: -0.08 scaled by the 0.4 heat.
    assert!((dispatcher.entropy() - 0.424).abs() < 1e-9);
}

/// A soft rejection that finds the queue full is dropped and audited.
#[test]
fn requeue_into_full_queue_drops() {
    let config = DispatchConfig {
        queue_capacity: 2,
        ..DispatchConfig::default()
    };
    let (mut dispatcher, audit) = calm_dispatcher(config);
    dispatcher.update_pressure(0.2, 0.0, 0.3, 0.4);
    // The echo handler fills the queue while the batch is in flight.
    let sender = dispatcher.pending_sender();
    dispatcher.set_router(RouteTable::new().on_fn(SigilCategory::Echo, move |_| {
        let _ = sender.try_push("x");
        let _ = sender.try_push("y");
        Ok(())
    }));
    dispatcher.register("echo", 0.5, SigilCategory::Echo, Priority::Inner);
    dispatcher.register("hold", 0.5, SigilCategory::Pause, Priority::Core);
    dispatcher.enqueue("echo").expect("room");
    dispatcher.enqueue("hold").expect("room");

    let report = dispatcher.tick();
    assert_eq!(report.executed().count(), 1);
    assert_eq!(report.dropped(), 1);
    assert_eq!(report.requeued(), 0);
    assert_eq!(dispatcher.stats().requeue_overflow, 1);

    let kinds: Vec<RejectionKind> = audit.rejections().iter().map(|r| r.kind).collect();
    assert_eq!(kinds, [RejectionKind::BoundViolation, RejectionKind::QueueFull]);
    assert_eq!(dispatcher.pending_len(), 2);
}

/// Routing failures commit nothing.
#[test]
fn routing_failure_leaves_state_untouched() {
    init_logger();
    let audit = MemoryAudit::new();
    let mut dispatcher = Dispatcher::new(DispatchConfig::default(), RouteTable::new(), audit.clone());
    dispatcher.register("e", 0.5, SigilCategory::Echo, Priority::Inner);

    match dispatcher.dispatch("e") {
        Err(DispatchError::RoutingFailure { category, cause, .. }) => {
            assert_eq!(category, SigilCategory::Echo);
            assert_eq!(cause, RouteError::new("no handler registered for echo"));
        }
        other => panic!("expected routing failure, got {other:?}"),
    }
    let state = dispatcher.state("e").expect("state");
    assert_eq!(state.activation_count(), 0);
    assert_eq!(state.last_used_tick(), None);
    assert_eq!(state.freshness(), 1.0);
    assert_eq!(dispatcher.entropy(), 0.5);
    assert!(dispatcher.history().is_empty());
    assert_eq!(dispatcher.stats().routing_failures, 1);
    assert_eq!(audit.rejections()[0].kind, RejectionKind::RoutingFailure);
}

/// Decayed sigils past the age window are removed from state and rings.
#[test]
fn exhausted_sigils_are_pruned() {
    let config = DispatchConfig {
        max_age_ticks: 5,
        decay_rate: 10.0,
        ..DispatchConfig::default()
    };
    let (mut dispatcher, _) = calm_dispatcher(config);
    dispatcher.register("spent", 0.5, SigilCategory::Dream, Priority::Outer);
    dispatcher.register("kept", 0.5, SigilCategory::Dream, Priority::Outer);
    dispatcher
        .states_mut()
        .get_mut("kept")
        .expect("registered")
        .extend_ttl(0, 100);

    for _ in 0..5 {
        assert!(dispatcher.tick().pruned.is_empty());
    }
    assert_eq!(dispatcher.state("spent").map(|s| s.freshness()), Some(0.0));

    let report = dispatcher.tick();
    assert_eq!(report.pruned, vec!["spent".to_owned()]);
    assert!(!dispatcher.rings().contains("spent"));
    assert!(dispatcher.rings().contains("kept"), "live TTL shields from pruning");
    assert_eq!(dispatcher.stats().pruned, 1);
}

/// Only the newest executions are retained.
#[test]
fn history_is_capped() {
    let config = DispatchConfig {
        history_capacity: 2,
        ..DispatchConfig::default()
    };
    let (mut dispatcher, _) = calm_dispatcher(config);
    for id in ["a", "b", "c"] {
        dispatcher.register(id, 0.5, SigilCategory::Unbound, Priority::Core);
        dispatcher.dispatch(id).expect("admitted");
    }
    let ids: Vec<&str> = dispatcher
        .history()
        .iter()
        .map(|r| r.sigil_id.as_str())
        .collect();
    assert_eq!(ids, ["b", "c"]);
}

/// Clearing a ring also forgets the state of its sigils.
#[test]
fn clear_ring_drops_state() {
    let (mut dispatcher, _) = calm_dispatcher(DispatchConfig::default());
    dispatcher.register("c", 0.5, SigilCategory::Seal, Priority::Core);
    dispatcher.register("o", 0.5, SigilCategory::Seal, Priority::Outer);
    assert_eq!(dispatcher.clear_ring(Priority::Core), 1);
    assert!(dispatcher.state("c").is_none());
    assert!(dispatcher.state("o").is_some());
    assert!(dispatcher.unregister("o"));
    assert!(dispatcher.states().is_empty());
}

fn category() -> impl Strategy<Value = SigilCategory> {
    prop::sample::select(SigilCategory::ALL.to_vec())
}

proptest! {
    /// Global entropy stays in [0, 1] whatever mix of sigils runs.
    #[test]
    fn entropy_stays_bounded(
        categories in prop::collection::vec(category(), 1..24),
        entropy in 0.0f64..=1.0,
        heat in 0.0f64..=1.0,
        ticks in 1usize..12,
    ) {
        let mut dispatcher = Dispatcher::new(DispatchConfig::default(), NullRouter, NullAudit);
        dispatcher.update_pressure(entropy, 0.0, 0.3, heat);
        for (n, category) in categories.iter().enumerate() {
            let id = format!("s{n}");
            dispatcher.register(id.clone(), 0.5, *category, Priority::Middle);
            dispatcher.enqueue(id).expect("room");
        }
        for _ in 0..ticks {
            let report = dispatcher.tick();
            prop_assert!(report.max_per_tick >= 1);
            prop_assert!(report.processed() <= report.max_per_tick);
            prop_assert!((0.0..=1.0).contains(&dispatcher.entropy()));
        }
    }
}
