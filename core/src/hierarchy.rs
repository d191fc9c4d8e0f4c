//! Hierarchy resolver: groups live units under owned roots.
//!
//! Rules, strict priority per unit:
//!   1. A sub-layer whose source resolves to an observer-owned unit is
//!      grouped under the source's location key.
//!   2. An owned top-level unit is a root. It is keyed by its own
//!      location and never placed in another root's child list.
//!   3. A transient unit engaged with an owned root is grouped under
//!      that root's location key.
//!   4. A unit with observer actors on it, or otherwise owned, gets a
//!      synthetic singleton key (negative, derived from its id).
//!   5. Anything else is excluded from grouping and never auto-gated.
//!
//! A stale link (destroyed source or counterpart) counts as absent.

use crate::{
    host::{Counterparts, UnitRegistry},
    types::{synthetic_group_key, GroupKey, LocationKey, Unit, UnitId, UnitKind},
};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct Grouping {
    keys:     HashMap<UnitId, GroupKey>,
    roots:    HashMap<LocationKey, UnitId>,
    children: BTreeMap<GroupKey, Vec<UnitId>>,
    /// Sorted ids of the unit set this grouping was computed from.
    unit_set: Vec<UnitId>,
}

impl Grouping {
    /// Group key of a unit, or `None` if it is excluded.
    pub fn group_of(&self, unit: &Unit) -> Option<GroupKey> {
        if unit.is_owned_root() {
            return Some(unit.location_key);
        }
        self.keys.get(&unit.id).copied()
    }

    pub fn is_excluded(&self, unit: &Unit) -> bool {
        self.group_of(unit).is_none()
    }

    /// Non-root members of a group, in unit-id order.
    pub fn children_of(&self, key: GroupKey) -> &[UnitId] {
        self.children.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every group key that has at least one child, ascending.
    pub fn group_keys(&self) -> impl Iterator<Item = GroupKey> + '_ {
        self.children.keys().copied()
    }

    /// The owned root at `location`, if one is live.
    pub fn root_at(&self, location: LocationKey) -> Option<UnitId> {
        self.roots.get(&location).copied()
    }

    /// Whether this grouping was computed from exactly this unit set.
    pub fn covers(&self, units: &[Unit]) -> bool {
        self.unit_set == sorted_ids(units)
    }
}

/// Compute the grouping for the given live units.
pub fn resolve(units: &[Unit], registry: &dyn UnitRegistry, counterparts: &Counterparts) -> Grouping {
    let mut grouping = Grouping { unit_set: sorted_ids(units), ..Grouping::default() };

    for unit in units.iter().filter(|u| u.is_owned_root()) {
        // Two owned roots on one tile: the lower id wins the lookup.
        grouping
            .roots
            .entry(unit.location_key)
            .and_modify(|id| *id = (*id).min(unit.id))
            .or_insert(unit.id);
    }

    for unit in units {
        if let Some(key) = classify(unit, registry, counterparts) {
            grouping.keys.insert(unit.id, key);
            grouping.children.entry(key).or_default().push(unit.id);
        }
    }

    for members in grouping.children.values_mut() {
        members.sort_unstable();
    }

    log::trace!(
        "hierarchy resolved: {} units, {} roots, {} groups",
        units.len(),
        grouping.roots.len(),
        grouping.children.len()
    );
    grouping
}

/// Group key for a non-root unit, or `None` for roots and excluded units.
fn classify(unit: &Unit, registry: &dyn UnitRegistry, counterparts: &Counterparts) -> Option<GroupKey> {
    // Rule 1
    if unit.kind == UnitKind::SubLayer {
        let owned_source = registry
            .source_of(unit.id)
            .and_then(|id| registry.unit(id))
            .filter(|source| source.owner_is_observer);
        if let Some(source) = owned_source {
            return Some(source.location_key);
        }
    }

    // Rule 2
    if unit.is_owned_root() {
        return None;
    }

    // Rule 3
    if unit.kind == UnitKind::Transient {
        let engaged = counterparts
            .counterpart_of(registry, unit)
            .and_then(|id| registry.unit(id))
            .filter(Unit::is_owned_root);
        if let Some(root) = engaged {
            return Some(root.location_key);
        }
    }

    // Rule 4
    if unit.observer_actors_present || unit.owner_is_observer {
        return Some(synthetic_group_key(unit.id));
    }

    // Rule 5
    None
}

fn sorted_ids(units: &[Unit]) -> Vec<UnitId> {
    let mut ids: Vec<UnitId> = units.iter().map(|u| u.id).collect();
    ids.sort_unstable();
    ids
}
