//! Aspect gating and incident rules.

mod common;

use tickgate_core::{aspect::Aspect, config::GateConfig, world::MemoryWorld, SimulationGate};

/// Observer at settlement 1; settlement 2 suspended.
fn setup(config: GateConfig) -> (MemoryWorld, SimulationGate) {
    let mut world = common::settlements(2);
    let mut gate = common::gate(config);
    gate.set_observer(Some(1), &world.registry, &mut world.scheduler);
    gate.on_tick(1, &world.registry, &mut world.scheduler);
    (world, gate)
}

#[test]
fn every_aspect_stops_on_a_suspended_unit_by_default() {
    let (world, mut gate) = setup(common::config());
    for aspect in Aspect::ALL {
        assert!(!gate.should_advance(&world.registry, 2, aspect), "{aspect:?} advanced while suspended");
        assert!(gate.should_advance(&world.registry, 1, aspect));
    }
}

#[test]
fn disabled_toggle_lets_the_aspect_run() {
    let (world, mut gate) = setup(common::config_with(|c| {
        c.pause_health = false;
        c.pause_ageing = false;
    }));
    assert!(gate.should_advance(&world.registry, 2, Aspect::Health));
    assert!(gate.should_advance(&world.registry, 2, Aspect::Ageing));
    assert!(!gate.should_advance(&world.registry, 2, Aspect::Jobs));
}

#[test]
fn needs_and_learning_always_follow_the_gate() {
    let config = common::config_with(|c| {
        c.pause_jobs = false;
        c.pause_health = false;
        c.pause_weather = false;
        c.pause_mental_state = false;
        c.pause_ageing = false;
    });
    assert!(Aspect::Needs.is_gated(&config));
    assert!(Aspect::Learning.is_gated(&config));
}

#[test]
fn incidents_skip_suspended_targets() {
    let (world, mut gate) = setup(common::config());
    assert!(gate.allow_incident(&world.registry, None), "world incidents always fire");
    assert!(gate.allow_incident(&world.registry, Some(1)));
    assert!(!gate.allow_incident(&world.registry, Some(2)));
    assert!(gate.allow_incident(&world.registry, Some(404)), "unknown targets fail open");
}

#[test]
fn incident_queue_holds_only_when_every_target_is_suspended() {
    let (world, mut gate) = setup(common::config());
    assert!(gate.should_tick_incident_queue(&world.registry, &[]));
    assert!(!gate.should_tick_incident_queue(&world.registry, &[Some(2)]));
    assert!(gate.should_tick_incident_queue(&world.registry, &[Some(2), None]));
    assert!(gate.should_tick_incident_queue(&world.registry, &[Some(2), Some(1)]));
}

#[test]
fn weather_toggle_off_lets_incidents_through() {
    let (world, mut gate) = setup(common::config_with(|c| c.pause_weather = false));
    assert!(gate.allow_incident(&world.registry, Some(2)));
    assert!(gate.should_tick_incident_queue(&world.registry, &[Some(2)]));
}
