//! Local time: effective ticks, world time, calendar and seasons.

mod common;

use tickgate_core::{
    clock::{CalendarDate, Season, WorldClock, TICKS_PER_DAY, TICKS_PER_HOUR, TICKS_PER_SEASON, TICKS_PER_YEAR},
    config::GateConfig,
    world::MemoryWorld,
    SimulationGate,
};

const GAME_START: u64 = 15_000;

/// Settlement 2 suspended over [1000, 1400), settlement 1 over
/// [0, 1000) and from 1400. The clock stands at 2000.
fn scenario_c(config: GateConfig) -> (MemoryWorld, SimulationGate) {
    let mut world = common::settlements(2);
    let mut gate = common::gate(config).with_clock(WorldClock::new(GAME_START));

    gate.set_observer(Some(2), &world.registry, &mut world.scheduler);
    gate.on_tick(1000, &world.registry, &mut world.scheduler);
    gate.set_observer(Some(1), &world.registry, &mut world.scheduler);
    gate.on_tick(1400, &world.registry, &mut world.scheduler);
    gate.set_observer(Some(2), &world.registry, &mut world.scheduler);
    gate.on_tick(2000, &world.registry, &mut world.scheduler);
    (world, gate)
}

#[test]
fn effective_ticks_subtract_suspended_time() {
    let (_world, gate) = scenario_c(common::config());
    assert_eq!(gate.ledger().record(2).unwrap().cumulative_suspended, 400);
    assert_eq!(gate.global_ticks_effective(2), 1600);
    assert_eq!(gate.global_ticks_effective(1), 2000 - 1000 - 600);
    assert_eq!(gate.local_ticks_abs(2), GAME_START + 1600);
}

#[test]
fn world_time_follows_the_most_advanced_owned_unit() {
    let (world, gate) = scenario_c(common::config());
    assert_eq!(gate.world_ticks_abs(&world.registry), GAME_START + 1600);
}

#[test]
fn world_time_without_owned_units_is_global() {
    let world = MemoryWorld::new();
    let gate = common::gate(common::config()).with_clock(WorldClock::new(GAME_START));
    assert_eq!(gate.world_ticks_abs(&world.registry), GAME_START);
}

#[test]
fn local_time_off_reports_global_ticks() {
    let (world, gate) = scenario_c(common::config_with(|c| c.local_time = false));
    assert_eq!(gate.global_ticks_effective(2), 2000);
    assert_eq!(gate.world_ticks_abs(&world.registry), GAME_START + 2000);
    // The ledger still keeps score.
    assert_eq!(gate.ledger().record(2).unwrap().cumulative_suspended, 400);
}

#[test]
fn calendar_arithmetic() {
    let start = CalendarDate::from_abs_ticks(0);
    assert_eq!((start.year, start.season, start.day_of_season, start.hour), (5500, Season::Spring, 1, 0));

    let date = CalendarDate::from_abs_ticks(TICKS_PER_SEASON + 2 * TICKS_PER_DAY + 3 * TICKS_PER_HOUR);
    assert_eq!((date.season, date.day_of_season, date.hour), (Season::Summer, 3, 3));

    let later = CalendarDate::from_abs_ticks(2 * TICKS_PER_YEAR + 3 * TICKS_PER_SEASON);
    assert_eq!((later.year, later.season), (5502, Season::Winter));
}

#[test]
fn calendar_date_per_unit_lags_behind_when_suspended() {
    let mut world = common::settlements(2);
    let mut gate = common::gate(common::config());
    gate.set_observer(Some(1), &world.registry, &mut world.scheduler);
    gate.on_tick(TICKS_PER_DAY * 2, &world.registry, &mut world.scheduler);

    assert_eq!(gate.calendar_date(&world.registry, Some(1)).day_of_season, 3);
    assert_eq!(gate.calendar_date(&world.registry, Some(2)).day_of_season, 1);
    assert_eq!(gate.calendar_date(&world.registry, None).day_of_season, 3);
}

#[test]
fn seasonal_lookup_shifts_only_present_queries_for_known_tiles() {
    let (world, gate) = scenario_c(common::config());
    let now = gate.clock().ticks_abs();

    assert_eq!(gate.seasonal_tick_for(&world.registry, 20, now), now - 400);
    assert_eq!(gate.seasonal_tick_for(&world.registry, 20, 100), 100, "far from now");
    assert_eq!(gate.seasonal_tick_for(&world.registry, 999, now), now, "no unit on that tile");
}
