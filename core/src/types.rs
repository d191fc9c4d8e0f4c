//! Shared primitive types used across the entire gate.

use serde::{Deserialize, Serialize};

/// A global simulation tick, as counted by the host.
pub type Tick = u64;

/// Stable unique identifier the host assigns to a unit.
pub type UnitId = i64;

/// Position of a unit in the overworld (a tile index).
pub type LocationKey = i64;

/// Identifier clustering units considered "together" for gating.
/// Non-negative keys are real location keys of owned roots; negative
/// keys are synthetic singletons derived from a unit id.
pub type GroupKey = i64;

/// Identifier of a caravan travelling the overworld. Caravans are not
/// units: they belong to no group and are paused only by hand.
pub type CaravanId = i64;

/// The canonical persisted session identifier.
pub type SessionId = String;

/// Synthetic singleton group key for a unit with no owned root.
pub fn synthetic_group_key(unit_id: UnitId) -> GroupKey {
    -unit_id.saturating_abs() - 1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Settlement,
    SubLayer,
    Transient,
}

/// A simulation container as seen by the gate. The host owns its
/// lifecycle; the gate only observes and classifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id:           UnitId,
    pub location_key: LocationKey,
    pub kind:         UnitKind,
    /// Owned by the observer's faction.
    pub owner_is_observer: bool,
    /// Observer-controlled actors are currently present on the unit.
    pub observer_actors_present: bool,
}

impl Unit {
    pub fn new(id: UnitId, location_key: LocationKey, kind: UnitKind) -> Self {
        Self {
            id,
            location_key,
            kind,
            owner_is_observer: false,
            observer_actors_present: false,
        }
    }

    pub fn owned(mut self) -> Self {
        self.owner_is_observer = true;
        self
    }

    pub fn with_observer_actors(mut self) -> Self {
        self.observer_actors_present = true;
        self
    }

    /// An observer-owned unit that is not a sub-layer. These are the
    /// roots every other unit may be grouped under.
    pub fn is_owned_root(&self) -> bool {
        self.owner_is_observer && self.kind != UnitKind::SubLayer
    }

    /// Which configuration category governs auto-gating of this unit.
    pub fn category(&self) -> Category {
        if self.is_owned_root() {
            Category::Settlement
        } else {
            Category::SubLayer
        }
    }
}

/// Configuration category. Owned top-level units fall under
/// `Settlement`; sub-layers and every non-owned unit under `SubLayer`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Settlement,
    SubLayer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Active,
    Suspended,
}

impl Classification {
    pub fn from_paused(paused: bool) -> Self {
        if paused { Self::Suspended } else { Self::Active }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Where the observer currently is. `None` at the gate level means no
/// unit is focused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObserverFocus {
    pub unit_id:      UnitId,
    pub location_key: LocationKey,
}

impl ObserverFocus {
    pub fn on(unit: &Unit) -> Self {
        Self { unit_id: unit.id, location_key: unit.location_key }
    }
}
