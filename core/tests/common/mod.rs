//! Shared world builders for the integration tests.
#![allow(dead_code)]

use tickgate_core::{
    config::GateConfig,
    host::Counterparts,
    types::{Unit, UnitKind},
    world::MemoryWorld,
    SimulationGate,
};

pub fn gate(config: GateConfig) -> SimulationGate {
    let _ = env_logger::builder().is_test(true).try_init();
    SimulationGate::new(config, Counterparts::default())
}

pub fn config() -> GateConfig {
    GateConfig::default_test()
}

pub fn config_with(edit: impl FnOnce(&mut GateConfig)) -> GateConfig {
    let mut config = GateConfig::default_test();
    edit(&mut config);
    config
}

/// Settlement 1 on tile 5 with sub-layer 2 (tile 105) linked to it.
pub fn settlement_with_sub_layer() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    world.settlement(1, 5).sub_layer(2, 105, Some(1));
    world
}

/// Settlements 1..=n on tiles 10, 20, 30, ...
pub fn settlements(n: i64) -> MemoryWorld {
    let mut world = MemoryWorld::new();
    for id in 1..=n {
        world.settlement(id, id * 10);
    }
    world
}

/// Two settlements with sub-layers, a raid on settlement 3's tile and an
/// uninvolved foreign settlement.
///
///   1 (tile 10)  <- sub-layer 11 (tile 1010)
///   2 (tile 20)  <- sub-layer 21 (tile 1020)
///   3 (tile 30)  <- battle 40 (tile 30)
///   50 foreign settlement (tile 50)
pub fn mixed_world() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    world
        .settlement(1, 10)
        .settlement(2, 20)
        .settlement(3, 30)
        .sub_layer(11, 1010, Some(1))
        .sub_layer(21, 1020, Some(2))
        .battle(40, 30)
        .add(Unit::new(50, 50, UnitKind::Settlement));
    world
}
