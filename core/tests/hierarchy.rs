//! Hierarchy resolver tests: rule priority, stale links, capabilities.

mod common;

use tickgate_core::{
    hierarchy::resolve,
    host::{Counterparts, FixedCounterparts, UnitRegistry},
    types::{synthetic_group_key, Unit, UnitKind},
    world::MemoryWorld,
};

fn grouping_of(world: &MemoryWorld, counterparts: &Counterparts) -> tickgate_core::hierarchy::Grouping {
    resolve(&world.registry.units(), &world.registry, counterparts)
}

#[test]
fn sub_layer_of_owned_source_groups_under_source_tile() {
    let world = common::settlement_with_sub_layer();
    let grouping = grouping_of(&world, &Counterparts::default());

    let sub_layer = world.registry.unit(2).unwrap();
    assert_eq!(grouping.group_of(&sub_layer), Some(5));
    assert_eq!(grouping.children_of(5), &[2]);
}

#[test]
fn owned_settlement_is_a_root_not_a_child() {
    let world = common::settlement_with_sub_layer();
    let grouping = grouping_of(&world, &Counterparts::default());

    let settlement = world.registry.unit(1).unwrap();
    assert_eq!(grouping.group_of(&settlement), Some(5));
    assert_eq!(grouping.root_at(5), Some(1));
    assert!(
        !grouping.group_keys().any(|k| grouping.children_of(k).contains(&1)),
        "a root must never appear in a child list"
    );
}

#[test]
fn colocated_battle_groups_under_the_settlement() {
    let world = common::mixed_world();
    let grouping = grouping_of(&world, &Counterparts::default());

    let battle = world.registry.unit(40).unwrap();
    assert_eq!(grouping.group_of(&battle), Some(30));
    assert_eq!(grouping.children_of(30), &[40]);
}

#[test]
fn battle_without_counterpart_capability_gets_a_singleton_key() {
    let world = common::mixed_world();
    let grouping = grouping_of(&world, &Counterparts::Unavailable);

    let battle = world.registry.unit(40).unwrap();
    assert_eq!(grouping.group_of(&battle), Some(synthetic_group_key(40)));
    assert!(grouping.group_of(&battle).unwrap() < 0);
}

#[test]
fn explicit_counterpart_link_wins_over_location() {
    let mut world = common::settlements(2);
    // A battle far from either settlement, engaged with settlement 2.
    world.battle(70, 999);
    let counterparts = Counterparts::from_resolver(FixedCounterparts::new().with_link(70, 2));

    let grouping = grouping_of(&world, &counterparts);
    assert_eq!(grouping.group_of(&world.registry.unit(70).unwrap()), Some(20));
}

#[test]
fn stale_counterpart_is_treated_as_absent() {
    let mut world = common::settlements(2);
    world.battle(70, 999);
    let counterparts = Counterparts::from_resolver(FixedCounterparts::new().with_link(70, 2));
    world.registry.destroy(2);

    let grouping = grouping_of(&world, &counterparts);
    assert_eq!(grouping.group_of(&world.registry.unit(70).unwrap()), Some(synthetic_group_key(70)));
}

#[test]
fn stale_source_leaves_an_unowned_sub_layer_excluded() {
    let mut world = common::settlement_with_sub_layer();
    world.registry.destroy(1);

    let grouping = grouping_of(&world, &Counterparts::default());
    assert!(grouping.is_excluded(&world.registry.unit(2).unwrap()));
}

#[test]
fn sub_layer_of_foreign_source_with_observer_actors_is_a_singleton() {
    let mut world = MemoryWorld::new();
    world.add(Unit::new(8, 80, UnitKind::Settlement));
    world.add(Unit::new(9, 900, UnitKind::SubLayer).with_observer_actors());
    world.registry.link_source(9, 8);

    let grouping = grouping_of(&world, &Counterparts::default());
    assert_eq!(grouping.group_of(&world.registry.unit(9).unwrap()), Some(synthetic_group_key(9)));
    assert!(grouping.is_excluded(&world.registry.unit(8).unwrap()));
}

#[test]
fn owned_sub_layer_with_owned_source_takes_rule_one() {
    let mut world = MemoryWorld::new();
    world.settlement(1, 5);
    world.add(Unit::new(2, 105, UnitKind::SubLayer).owned().with_observer_actors());
    world.registry.link_source(2, 1);

    let grouping = grouping_of(&world, &Counterparts::default());
    assert_eq!(grouping.group_of(&world.registry.unit(2).unwrap()), Some(5));
}

#[test]
fn uninvolved_foreign_unit_is_excluded() {
    let world = common::mixed_world();
    let grouping = grouping_of(&world, &Counterparts::default());
    assert!(grouping.is_excluded(&world.registry.unit(50).unwrap()));
}

#[test]
fn synthetic_keys_never_collide_with_tiles() {
    assert_eq!(synthetic_group_key(0), -1);
    assert_eq!(synthetic_group_key(41), -42);
    assert!(synthetic_group_key(i64::MAX) < 0);
}

#[test]
fn grouping_knows_which_unit_set_it_covers() {
    let mut world = common::settlement_with_sub_layer();
    let grouping = grouping_of(&world, &Counterparts::default());
    assert!(grouping.covers(&world.registry.units()));

    world.settlement(3, 7);
    assert!(!grouping.covers(&world.registry.units()));
}
