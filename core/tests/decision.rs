//! Gate decision tests: rule order, sync, overrides, edge cases.

mod common;

use tickgate_core::{
    config::GateConfig,
    decision::{decide, DecisionContext},
    hierarchy::resolve,
    host::{Counterparts, FixedCounterparts, UnitRegistry},
    overrides::{OverrideKey, OverrideStore},
    types::{Classification, ObserverFocus, UnitId},
    world::MemoryWorld,
};

fn classify(
    world: &MemoryWorld,
    observer: Option<UnitId>,
    overrides: &OverrideStore,
    config: &GateConfig,
    unit_id: UnitId,
) -> Classification {
    classify_with(world, &Counterparts::default(), observer, overrides, config, unit_id)
}

fn classify_with(
    world: &MemoryWorld,
    counterparts: &Counterparts,
    observer: Option<UnitId>,
    overrides: &OverrideStore,
    config: &GateConfig,
    unit_id: UnitId,
) -> Classification {
    let registry = &world.registry;
    let grouping = resolve(&registry.units(), registry, counterparts);
    let focus = observer.and_then(|id| registry.unit(id)).map(|u| ObserverFocus::on(&u));
    let ctx = DecisionContext::new(focus, &grouping, overrides, config, registry);
    decide(&registry.unit(unit_id).expect("unit exists"), &ctx)
}

#[test]
fn scenario_a_strict_suspends_the_sub_layer() {
    let world = common::settlement_with_sub_layer();
    let config = common::config();
    assert_eq!(
        classify(&world, Some(1), &OverrideStore::new(), &config, 2),
        Classification::Suspended
    );
}

#[test]
fn scenario_a_sync_activates_the_sub_layer() {
    let world = common::settlement_with_sub_layer();
    let config = common::config_with(|c| c.sync_sub_layers = true);
    assert_eq!(
        classify(&world, Some(1), &OverrideStore::new(), &config, 2),
        Classification::Active
    );
}

#[test]
fn sync_reports_the_source_active_while_observer_is_in_the_sub_layer() {
    let world = common::settlement_with_sub_layer();
    let config = common::config_with(|c| c.sync_sub_layers = true);
    assert_eq!(
        classify(&world, Some(2), &OverrideStore::new(), &config, 1),
        Classification::Active
    );

    // Without sync the settlement gets no credit.
    let strict = common::config();
    assert_eq!(
        classify(&world, Some(2), &OverrideStore::new(), &strict, 1),
        Classification::Suspended
    );
}

#[test]
fn sync_suspends_sub_layer_of_an_unobserved_source() {
    let mut world = common::settlement_with_sub_layer();
    world.settlement(3, 30);
    let config = common::config_with(|c| c.sync_sub_layers = true);
    assert_eq!(
        classify(&world, Some(3), &OverrideStore::new(), &config, 2),
        Classification::Suspended
    );
}

#[test]
fn occupied_unit_is_active_under_every_configuration() {
    let world = common::mixed_world();
    let mut overrides = OverrideStore::new();
    for id in world.registry.ids() {
        let unit = world.registry.unit(id).unwrap();
        overrides.set(OverrideKey::for_unit(&unit), true);
    }

    for bits in 0u8..32 {
        let config = common::config_with(|c| {
            c.enabled = bits & 1 != 0;
            c.auto_gate_settlements = bits & 2 != 0;
            c.auto_gate_sub_layers = bits & 4 != 0;
            c.sync_sub_layers = bits & 8 != 0;
            c.default_settlement_paused = bits & 16 != 0;
            c.default_sub_layer_paused = bits & 16 != 0;
        });
        for id in world.registry.ids() {
            assert_eq!(
                classify(&world, Some(id), &overrides, &config, id),
                Classification::Active,
                "unit {id} occupied but not active under config bits {bits:05b}"
            );
        }
    }
}

#[test]
fn override_decides_when_auto_gate_is_off_for_the_category() {
    let world = common::settlements(3);
    let config = common::config_with(|c| c.auto_gate_settlements = false);
    let mut overrides = OverrideStore::new();
    overrides.set(OverrideKey::Root(20), true);

    assert_eq!(classify(&world, Some(1), &overrides, &config, 2), Classification::Suspended);
    assert_eq!(classify(&world, Some(1), &overrides, &config, 3), Classification::Active);
}

#[test]
fn override_is_ignored_while_auto_gate_is_on() {
    let world = common::settlements(2);
    let config = common::config();
    let mut overrides = OverrideStore::new();
    overrides.set(OverrideKey::Root(20), false);

    assert_eq!(classify(&world, Some(1), &overrides, &config, 2), Classification::Suspended);
}

#[test]
fn category_default_applies_without_an_override() {
    let world = common::settlement_with_sub_layer();
    let config = common::config_with(|c| {
        c.auto_gate_sub_layers = false;
        c.default_sub_layer_paused = true;
    });
    assert_eq!(
        classify(&world, Some(1), &OverrideStore::new(), &config, 2),
        Classification::Suspended
    );
}

#[test]
fn excluded_unit_follows_its_override_only() {
    let world = common::mixed_world();
    let config = common::config();
    let mut overrides = OverrideStore::new();

    assert_eq!(classify(&world, Some(1), &overrides, &config, 50), Classification::Active);

    overrides.set(OverrideKey::Unit(50), true);
    assert_eq!(classify(&world, Some(1), &overrides, &config, 50), Classification::Suspended);
}

#[test]
fn no_observer_suspends_gated_units_and_honours_overrides() {
    let world = common::mixed_world();
    let config = common::config();
    let overrides = OverrideStore::new();

    for id in [1, 2, 3, 11, 21, 40] {
        assert_eq!(
            classify(&world, None, &overrides, &config, id),
            Classification::Suspended,
            "unit {id} should be suspended with nobody watching"
        );
    }
    assert_eq!(classify(&world, None, &overrides, &config, 50), Classification::Active);

    let manual = common::config_with(|c| c.auto_gate_settlements = false);
    assert_eq!(classify(&world, None, &overrides, &manual, 1), Classification::Active);
}

#[test]
fn disabled_gate_runs_everything() {
    let world = common::mixed_world();
    let config = common::config_with(|c| c.enabled = false);
    for id in world.registry.ids() {
        assert_eq!(classify(&world, Some(1), &OverrideStore::new(), &config, id), Classification::Active);
    }
}

#[test]
fn colocated_battle_and_settlement_occupy_each_other() {
    let world = common::mixed_world();
    let config = common::config_with(|c| c.sync_sub_layers = true);

    // Same tile as settlement 3, so it is occupied outright.
    assert_eq!(classify(&world, Some(3), &OverrideStore::new(), &config, 40), Classification::Active);
    // Sharing the tile, the observer in the battle occupies settlement 3 too.
    assert_eq!(classify(&world, Some(40), &OverrideStore::new(), &config, 3), Classification::Active);
    // Elsewhere, the battle is suspended.
    assert_eq!(classify(&world, Some(1), &OverrideStore::new(), &config, 40), Classification::Suspended);
}

#[test]
fn sync_gives_no_credit_between_a_settlement_and_a_distant_battle() {
    let mut world = MemoryWorld::new();
    world.settlement(1, 5).battle(40, 9);
    let counterparts = Counterparts::from_resolver(FixedCounterparts::new().with_link(40, 1));
    let config = common::config_with(|c| c.sync_sub_layers = true);
    let overrides = OverrideStore::new();

    assert_eq!(
        classify_with(&world, &counterparts, Some(40), &overrides, &config, 1),
        Classification::Suspended,
        "observer in the battle must not keep the settlement running"
    );
    assert_eq!(
        classify_with(&world, &counterparts, Some(1), &overrides, &config, 40),
        Classification::Suspended,
        "observer at home must not keep the battle running"
    );
}

#[test]
fn sync_credits_the_settlement_only_from_its_own_sub_layer() {
    let mut world = common::settlement_with_sub_layer();
    world.settlement(3, 30).sub_layer(4, 130, Some(3));
    let config = common::config_with(|c| c.sync_sub_layers = true);
    let overrides = OverrideStore::new();

    assert_eq!(classify(&world, Some(2), &overrides, &config, 1), Classification::Active);
    assert_eq!(classify(&world, Some(2), &overrides, &config, 3), Classification::Suspended);
    assert_eq!(classify(&world, Some(2), &overrides, &config, 4), Classification::Suspended);
}

#[test]
fn sync_is_inert_while_sub_layer_auto_gate_is_off() {
    let world = common::settlement_with_sub_layer();
    let config = common::config_with(|c| {
        c.auto_gate_sub_layers = false;
        c.sync_sub_layers = true;
    });
    assert_eq!(
        classify(&world, Some(2), &OverrideStore::new(), &config, 1),
        Classification::Suspended,
        "no credit for the settlement without sync mode"
    );
}
