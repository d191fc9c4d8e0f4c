//! In-memory host world: a reference implementation of the host
//! collaborators, backed by plain maps.
//!
//! The registry and the scheduler are separate values so a caller can
//! hand the gate `&world.registry` and `&mut world.scheduler` at once.

use crate::{
    host::{SchedulerBinding, UnitRegistry},
    types::{LocationKey, Unit, UnitId, UnitKind},
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    units:   BTreeMap<UnitId, Unit>,
    sources: HashMap<UnitId, UnitId>,
    actors:  BTreeMap<UnitId, u32>,
}

impl MemoryRegistry {
    pub fn insert(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Link a sub-layer to its source. The source need not exist.
    pub fn link_source(&mut self, sub_layer: UnitId, source: UnitId) {
        self.sources.insert(sub_layer, source);
    }

    /// Remove a unit. Links pointing at it are left dangling, as a host
    /// would leave them.
    pub fn destroy(&mut self, id: UnitId) -> Option<Unit> {
        self.sources.remove(&id);
        self.actors.remove(&id);
        self.units.remove(&id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn set_actors(&mut self, id: UnitId, count: u32) {
        self.actors.insert(id, count);
    }

    pub fn actors_on(&self, id: UnitId) -> u32 {
        self.actors.get(&id).copied().unwrap_or(0)
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl UnitRegistry for MemoryRegistry {
    fn units(&self) -> Vec<Unit> {
        self.units.values().cloned().collect()
    }

    fn unit(&self, id: UnitId) -> Option<Unit> {
        self.units.get(&id).cloned()
    }

    fn source_of(&self, sub_layer: UnitId) -> Option<UnitId> {
        self.sources.get(&sub_layer).copied()
    }
}

/// Scheduler that records which units are removed and how many times
/// each side effect was requested.
#[derive(Debug, Clone, Default)]
pub struct MemoryScheduler {
    removed:  BTreeSet<UnitId>,
    suspends: BTreeMap<UnitId, u32>,
    resumes:  BTreeMap<UnitId, u32>,
}

impl MemoryScheduler {
    pub fn is_scheduled(&self, id: UnitId) -> bool {
        !self.removed.contains(&id)
    }

    pub fn suspend_calls(&self, id: UnitId) -> u32 {
        self.suspends.get(&id).copied().unwrap_or(0)
    }

    pub fn resume_calls(&self, id: UnitId) -> u32 {
        self.resumes.get(&id).copied().unwrap_or(0)
    }

    pub fn removed(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.removed.iter().copied()
    }
}

impl SchedulerBinding for MemoryScheduler {
    fn suspend(&mut self, unit_id: UnitId) {
        *self.suspends.entry(unit_id).or_default() += 1;
        self.removed.insert(unit_id);
    }

    fn resume(&mut self, unit_id: UnitId) {
        *self.resumes.entry(unit_id).or_default() += 1;
        self.removed.remove(&unit_id);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    pub registry:  MemoryRegistry,
    pub scheduler: MemoryScheduler,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer-owned settlement.
    pub fn settlement(&mut self, id: UnitId, location: LocationKey) -> &mut Self {
        self.registry.insert(Unit::new(id, location, UnitKind::Settlement).owned());
        self
    }

    /// Add a sub-layer linked to `source`.
    pub fn sub_layer(&mut self, id: UnitId, location: LocationKey, source: Option<UnitId>) -> &mut Self {
        self.registry.insert(Unit::new(id, location, UnitKind::SubLayer));
        if let Some(source) = source {
            self.registry.link_source(id, source);
        }
        self
    }

    /// Add a transient unit with observer actors on it.
    pub fn battle(&mut self, id: UnitId, location: LocationKey) -> &mut Self {
        self.registry
            .insert(Unit::new(id, location, UnitKind::Transient).with_observer_actors());
        self
    }

    pub fn add(&mut self, unit: Unit) -> &mut Self {
        self.registry.insert(unit);
        self
    }
}
