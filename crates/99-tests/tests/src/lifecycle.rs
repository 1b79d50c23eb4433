use crate::init_logger;
use sigil_engine::{
    DispatchError, DispatchOutcome, Engine, EngineConfig, MemoryAudit, Priority, RejectionKind,
    ReinforcementTrigger, RouteTable, SigilCategory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_table(categories: &[SigilCategory]) -> (RouteTable, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let table = categories.iter().fold(RouteTable::new(), |table, &category| {
        let hits = Arc::clone(&hits);
        table.on_fn(category, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });
    (table, hits)
}

fn build(config: EngineConfig, table: RouteTable) -> (Engine, MemoryAudit) {
    init_logger();
    let audit = MemoryAudit::new();
    let engine = Engine::builder()
        .config(config)
        .router(table)
        .audit(audit.clone())
        .build()
        .expect("valid engine");
    (engine, audit)
}

/// Registering and dispatching a trusted sigil routes it exactly once.
#[test]
fn trusted_sigil_round_trip() {
    let (table, hits) = counting_table(&[SigilCategory::Unbound]);
    let (mut engine, audit) = build(EngineConfig::default(), table);
    assert!(engine.register(
        "sigil_trust_001",
        0.5,
        SigilCategory::Unbound,
        Priority::from_level(0)
    ));
    engine.update_pressure(0.5, 0.0, 0.3, 0.4);

    let record = engine.dispatch("sigil_trust_001").expect("admitted");
    assert!(record.coherence_score >= 0.3);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let state = engine
        .dispatcher()
        .state("sigil_trust_001")
        .expect("state");
    assert_eq!(state.activation_count(), 1);
    assert_eq!(audit.executions().len(), 1);
}

/// An immediate re-run is held back by recency and admitted once it recovers.
#[test]
fn recency_defers_back_to_back_runs() {
    let (table, hits) = counting_table(&[SigilCategory::Unbound]);
    let (mut engine, _) = build(EngineConfig::default(), table);
    engine.register("loop", 0.5, SigilCategory::Unbound, Priority::Inner);
    engine.update_pressure(0.5, 0.0, 0.3, 0.4);
    engine.enqueue("loop").expect("room");
    engine.enqueue("loop").expect("room");

    let first = engine.tick();
    assert_eq!(first.dispatch.executed().count(), 1);
    assert!(matches!(
        first.dispatch.outcomes[1],
        DispatchOutcome::Requeued(DispatchError::LowCoherence { .. })
    ));

    let mut second_run = None;
    for _ in 0..200 {
        let tick = engine.tick();
        if tick.dispatch.executed().count() == 1 {
            second_run = Some(tick.dispatch.tick);
            break;
        }
        assert_eq!(tick.dispatch.requeued(), 1);
    }
    let second_run = second_run.expect("recency recovers within the window");
    assert!((100..=130).contains(&second_run), "second run at tick {second_run}");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(
        engine.dispatcher().state("loop").map(|s| s.activation_count()),
        Some(2)
    );
}

/// Energising sigils raise entropy, which in turn throttles the batch size.
#[test]
fn entropy_feedback_throttles_throughput() {
    let (table, _) = counting_table(&[SigilCategory::Pulse]);
    let (mut engine, _) = build(EngineConfig::default(), table);
    engine.update_pressure(0.5, 0.0, 0.3, 0.5);
    for n in 0..10 {
        let id = format!("pulse-{n}");
        engine.register(id.clone(), 0.8, SigilCategory::Pulse, Priority::Outer);
        engine.enqueue(id).expect("room");
    }

    let mut last_entropy = engine.dispatcher().entropy();
    let mut last_batch = usize::MAX;
    for _ in 0..5 {
        let tick = engine.tick();
        assert!(tick.dispatch.max_per_tick <= last_batch);
        assert!(engine.dispatcher().entropy() > last_entropy);
        last_batch = tick.dispatch.max_per_tick;
        last_entropy = engine.dispatcher().entropy();
    }
    assert_eq!(last_batch, 1);
    assert!(last_entropy <= 1.0);
}

/// Terminal rejections from the queue are dropped and audited.
#[test]
fn queued_unknown_and_stale_are_dropped() {
    let mut config = EngineConfig::default();
    config.dispatch.max_age_ticks = 5;
    let (table, _) = counting_table(&[SigilCategory::Echo]);
    let (mut engine, audit) = build(config, table);
    engine.update_pressure(0.5, 0.0, 0.3, 0.4);
    engine.register("old", 0.5, SigilCategory::Echo, Priority::Middle);
    for _ in 0..6 {
        engine.tick();
    }

    engine.enqueue("ghost").expect("room");
    engine.enqueue("old").expect("room");
    let tick = engine.tick();
    assert_eq!(tick.dispatch.dropped(), 2);
    assert!(engine.dispatcher().pending_is_empty());

    let kinds: Vec<RejectionKind> = audit.rejections().iter().map(|r| r.kind).collect();
    assert_eq!(kinds, [RejectionKind::UnknownSigil, RejectionKind::StaleSigil]);
    assert!(audit.rejections().iter().all(|r| !r.retry));

    engine.dispatcher_mut().refresh("old").expect("registered");
    engine.enqueue("old").expect("room");
    assert_eq!(engine.tick().dispatch.executed().count(), 1);
}

/// Periodic reinforcement keeps a used sigil alive past the age window.
#[test]
fn reinforcement_outlives_max_age() {
    let mut config = EngineConfig::default();
    config.dispatch.max_age_ticks = 50;
    config.reinforcement.activation_threshold = 0;
    let (table, _) = counting_table(&[SigilCategory::Seal]);
    let (mut engine, _) = build(config, table);
    engine.update_pressure(0.5, 0.0, 0.3, 0.4);
    engine.register("veteran", 0.5, SigilCategory::Seal, Priority::Core);
    engine.register("idle", 0.5, SigilCategory::Seal, Priority::Core);
    engine.dispatch("veteran").expect("admitted");

    let passes = (0..60)
        .filter_map(|_| engine.tick().reinforcement)
        .inspect(|report| assert_eq!(report.skipped, ["idle"]))
        .count();
    assert_eq!(passes, 6);

    let veteran = engine.dispatcher().state("veteran").expect("veteran");
    assert!(veteran.ttl_active(60));
    assert!(!veteran.is_stale(60, 50));
    assert!(matches!(
        engine.dispatch("idle"),
        Err(DispatchError::StaleSigil { age: 60, .. })
    ));
    assert_eq!(engine.tracker().totals().reinforced, 6);
}

/// A sigil fired steadily passes the activation threshold and is reinforced for it.
#[test]
fn steady_use_earns_activation_reinforcement() {
    let (table, hits) = counting_table(&[SigilCategory::Unbound]);
    let (mut engine, audit) = build(EngineConfig::default(), table);
    engine.register("habit", 0.5, SigilCategory::Unbound, Priority::Middle);
    engine.enqueue("habit").expect("room");

    let mut reinforced_at = None;
    for _ in 0..2_000 {
        engine.update_pressure(0.5, 0.0, 0.3, 0.4);
        let tick = engine.tick();
        if tick.dispatch.executed().count() == 1 {
            engine.enqueue("habit").expect("room");
        }
        let activation = tick.reinforcement.iter().flat_map(|r| &r.reinforced).find(|event| {
            event.sigil_id == "habit" && event.trigger == ReinforcementTrigger::Activation
        });
        if activation.is_some() {
            reinforced_at = Some(tick.dispatch.tick);
            break;
        }
    }

    let reinforced_at = reinforced_at.expect("activation reinforcement within 2000 ticks");
    let state = engine.dispatcher().state("habit").expect("state");
    assert!(state.activation_count() > 10, "reinforced at tick {reinforced_at}");
    assert_eq!(hits.load(Ordering::SeqCst) as u64, state.activation_count());
    let labels: Vec<&str> = audit
        .reinforcements()
        .iter()
        .flat_map(|report| report.reinforced.iter().map(|event| event.trigger.label()))
        .collect();
    assert_eq!(labels, ["activation"]);
}
