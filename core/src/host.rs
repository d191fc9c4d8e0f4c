//! Host collaborator traits.
//!
//! RULE: The gate never creates or destroys units and never reaches into
//! host state directly. Everything it knows about the world arrives
//! through these traits, and every side effect it causes leaves through
//! `SchedulerBinding`.

use crate::types::{Unit, UnitId, UnitKind};
use std::collections::HashMap;

/// Read access to the host's live units and their declared links.
pub trait UnitRegistry {
    /// Every live unit, in a stable order.
    fn units(&self) -> Vec<Unit>;

    /// Resolve a unit by id. `None` for destroyed or unknown ids.
    fn unit(&self, id: UnitId) -> Option<Unit>;

    /// The source unit a sub-layer is linked to, if any. The id may be
    /// stale; callers resolve it through `unit()` before trusting it.
    fn source_of(&self, sub_layer: UnitId) -> Option<UnitId>;
}

/// Removes and restores a unit's actors from per-tick advancement.
/// Implementations should tolerate redundant calls.
pub trait SchedulerBinding {
    fn suspend(&mut self, unit_id: UnitId);
    fn resume(&mut self, unit_id: UnitId);
}

/// Reports which owned unit a transient unit is engaged with.
pub trait CounterpartResolver {
    fn counterpart_of(&self, registry: &dyn UnitRegistry, transient: &Unit) -> Option<UnitId>;
}

/// The optional battle-counterpart capability, resolved once when the
/// gate is built.
pub enum Counterparts {
    Unavailable,
    Available(Box<dyn CounterpartResolver>),
}

impl Counterparts {
    pub fn from_resolver(resolver: impl CounterpartResolver + 'static) -> Self {
        Self::Available(Box::new(resolver))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn counterpart_of(&self, registry: &dyn UnitRegistry, transient: &Unit) -> Option<UnitId> {
        match self {
            Self::Unavailable          => None,
            Self::Available(resolver)  => resolver.counterpart_of(registry, transient),
        }
    }
}

impl Default for Counterparts {
    fn default() -> Self {
        Self::from_resolver(ColocatedCounterparts)
    }
}

/// Treats a transient unit with observer actors on it as engaged with
/// the owned root on the same tile (an ambush or raid at a settlement).
pub struct ColocatedCounterparts;

impl CounterpartResolver for ColocatedCounterparts {
    fn counterpart_of(&self, registry: &dyn UnitRegistry, transient: &Unit) -> Option<UnitId> {
        if transient.kind != UnitKind::Transient || !transient.observer_actors_present {
            return None;
        }
        registry
            .units()
            .into_iter()
            .find(|u| u.id != transient.id && u.is_owned_root() && u.location_key == transient.location_key)
            .map(|u| u.id)
    }
}

/// Explicit transient → owned unit engagements, as an external battle
/// integration would report them.
#[derive(Debug, Clone, Default)]
pub struct FixedCounterparts {
    links: HashMap<UnitId, UnitId>,
}

impl FixedCounterparts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(mut self, transient: UnitId, counterpart: UnitId) -> Self {
        self.links.insert(transient, counterpart);
        self
    }
}

impl CounterpartResolver for FixedCounterparts {
    fn counterpart_of(&self, _registry: &dyn UnitRegistry, transient: &Unit) -> Option<UnitId> {
        self.links.get(&transient.id).copied()
    }
}
