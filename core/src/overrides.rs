//! Override state: explicit user-set pause flags.
//!
//! Owned roots are keyed by location (one flag per settlement tile);
//! everything else by unit id. A flag only decides a unit's fate when
//! automatic gating is off for its category, or when the unit is
//! excluded from grouping.
//!
//! Caravans carry their own flag under `Caravan(id)`. It is never
//! suppressed; only the master switch overrides it.
//!
//! A force-resume suppresses the effect of every flag without deleting
//! any of them. Flags written after the suppression take effect again
//! immediately; the rest stay suppressed until gating is re-enabled.

use crate::types::{CaravanId, LocationKey, Unit, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(tag = "scope", content = "key", rename_all = "snake_case")]
pub enum OverrideKey {
    Root(LocationKey),
    Unit(UnitId),
    Caravan(CaravanId),
}

impl OverrideKey {
    pub fn for_unit(unit: &Unit) -> Self {
        if unit.is_owned_root() {
            Self::Root(unit.location_key)
        } else {
            Self::Unit(unit.id)
        }
    }

    /// Stable (scope, key) pair for key→value persistence.
    pub fn to_parts(self) -> (&'static str, i64) {
        match self {
            Self::Root(location) => ("root", location),
            Self::Unit(id)       => ("unit", id),
            Self::Caravan(id)    => ("caravan", id),
        }
    }

    pub fn from_parts(scope: &str, key: i64) -> Option<Self> {
        match scope {
            "root" => Some(Self::Root(key)),
            "unit" => Some(Self::Unit(key)),
            "caravan" => Some(Self::Caravan(key)),
            _      => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    forced_paused: BTreeMap<OverrideKey, bool>,
    suppressed:    bool,
    reinstated:    BTreeSet<OverrideKey>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a flag. Returns the previous stored value.
    pub fn set(&mut self, key: OverrideKey, paused: bool) -> Option<bool> {
        if self.suppressed {
            self.reinstated.insert(key);
        }
        self.forced_paused.insert(key, paused)
    }

    /// The stored flag, ignoring suppression.
    pub fn stored(&self, key: OverrideKey) -> Option<bool> {
        self.forced_paused.get(&key).copied()
    }

    /// The flag in effect for `key`, falling back to `default`.
    pub fn forced_paused(&self, key: OverrideKey, default: bool) -> bool {
        if self.suppressed && !self.reinstated.contains(&key) {
            return false;
        }
        self.stored(key).unwrap_or(default)
    }

    /// Suppress the effect of every flag (and every category default).
    pub fn suppress_all(&mut self) {
        self.suppressed = true;
        self.reinstated.clear();
    }

    /// Lift suppression; stored flags take effect again.
    pub fn lift_suppression(&mut self) {
        self.suppressed = false;
        self.reinstated.clear();
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn is_reinstated(&self, key: OverrideKey) -> bool {
        self.reinstated.contains(&key)
    }

    /// Restore suppression state (used when loading a session).
    pub fn restore_suppression(&mut self, suppressed: bool, reinstated: impl IntoIterator<Item = OverrideKey>) {
        self.suppressed = suppressed;
        self.reinstated = if suppressed { reinstated.into_iter().collect() } else { BTreeSet::new() };
    }

    pub fn iter(&self) -> impl Iterator<Item = (OverrideKey, bool)> + '_ {
        self.forced_paused.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.forced_paused.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forced_paused.is_empty()
    }
}
