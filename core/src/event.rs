//! Gate events: a record of every state change the gate makes.
//!
//! Variants are append-only; persisted logs depend on the tag names.

use crate::{
    overrides::OverrideKey,
    types::{CaravanId, Classification, SessionId, Tick, UnitId, UnitKind},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateEvent {
    UnitSuspended {
        tick:    Tick,
        unit_id: UnitId,
        kind:    UnitKind,
    },
    UnitResumed {
        tick:          Tick,
        unit_id:       UnitId,
        kind:          UnitKind,
        suspended_for: Tick,
    },
    ObserverMoved {
        tick: Tick,
        from: Option<UnitId>,
        to:   Option<UnitId>,
    },
    OverrideSet {
        tick:    Tick,
        unit_id: UnitId,
        key:     OverrideKey,
        paused:  bool,
        outcome: Classification,
    },
    ForceResumed {
        tick:  Tick,
        count: usize,
    },
    SweepCompleted {
        tick:      Tick,
        active:    usize,
        suspended: usize,
    },
    CaravanPaused {
        tick:       Tick,
        caravan_id: CaravanId,
        paused:     bool,
    },
}

impl GateEvent {
    /// Stable name for the `event_type` column of the event log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::UnitSuspended { .. }  => "unit_suspended",
            Self::UnitResumed { .. }    => "unit_resumed",
            Self::ObserverMoved { .. }  => "observer_moved",
            Self::OverrideSet { .. }    => "override_set",
            Self::ForceResumed { .. }   => "force_resumed",
            Self::SweepCompleted { .. } => "sweep_completed",
            Self::CaravanPaused { .. }  => "caravan_paused",
        }
    }

    pub fn tick(&self) -> Tick {
        match self {
            Self::UnitSuspended { tick, .. }
            | Self::UnitResumed { tick, .. }
            | Self::ObserverMoved { tick, .. }
            | Self::OverrideSet { tick, .. }
            | Self::ForceResumed { tick, .. }
            | Self::SweepCompleted { tick, .. }
            | Self::CaravanPaused { tick, .. } => *tick,
        }
    }
}

/// Persisted row in the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub session_id: SessionId,
    pub tick:       Tick,
    pub event_type: String,
    pub payload:    String, // JSON
}
