//! World clock and calendar arithmetic.
//!
//! The host owns global time; the gate mirrors it here so effective
//! (per-unit) times can be turned into absolute ticks and dates.

use crate::types::Tick;
use serde::{Deserialize, Serialize};

pub const TICKS_PER_HOUR:   Tick = 2_500;
pub const HOURS_PER_DAY:    Tick = 24;
pub const TICKS_PER_DAY:    Tick = TICKS_PER_HOUR * HOURS_PER_DAY;
pub const DAYS_PER_SEASON:  Tick = 15;
pub const SEASONS_PER_YEAR: Tick = 4;
pub const TICKS_PER_SEASON: Tick = TICKS_PER_DAY * DAYS_PER_SEASON;
pub const TICKS_PER_YEAR:   Tick = TICKS_PER_SEASON * SEASONS_PER_YEAR;

/// Year number of absolute tick 0.
pub const START_YEAR: u64 = 5500;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldClock {
    pub current_tick:        Tick,
    /// Absolute tick at which the session started.
    pub game_start_abs_tick: Tick,
}

impl WorldClock {
    pub fn new(game_start_abs_tick: Tick) -> Self {
        Self { current_tick: 0, game_start_abs_tick }
    }

    /// Move to `tick`. The host may skip ticks; it never goes back.
    pub fn advance_to(&mut self, tick: Tick) {
        if tick < self.current_tick {
            log::warn!("clock asked to go back from {} to {tick}; ignoring", self.current_tick);
            return;
        }
        self.current_tick = tick;
    }

    pub fn ticks_abs(&self) -> Tick {
        self.current_tick.saturating_add(self.game_start_abs_tick)
    }

    /// Convert a game-relative tick to an absolute one.
    pub fn to_abs(&self, tick: Tick) -> Tick {
        tick.saturating_add(self.game_start_abs_tick)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    fn from_index(index: Tick) -> Self {
        match index % SEASONS_PER_YEAR {
            0 => Self::Spring,
            1 => Self::Summer,
            2 => Self::Fall,
            _ => Self::Winter,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarDate {
    pub year:          u64,
    pub season:        Season,
    /// 1-based.
    pub day_of_season: u64,
    pub hour:          u64,
}

impl CalendarDate {
    pub fn from_abs_ticks(ticks: Tick) -> Self {
        Self {
            year:          START_YEAR + ticks / TICKS_PER_YEAR,
            season:        Season::from_index(ticks / TICKS_PER_SEASON),
            day_of_season: (ticks % TICKS_PER_SEASON) / TICKS_PER_DAY + 1,
            hour:          (ticks % TICKS_PER_DAY) / TICKS_PER_HOUR,
        }
    }
}

impl std::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}, {} ({}h)", self.season, self.day_of_season, self.year, self.hour)
    }
}
