//! Fine-grained aspects of unit simulation a host may gate separately.

use crate::config::GateConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Jobs,
    Health,
    /// Weather, temperature and incidents.
    Weather,
    MentalState,
    Ageing,
    Needs,
    Learning,
}

impl Aspect {
    pub const ALL: [Aspect; 7] = [
        Aspect::Jobs,
        Aspect::Health,
        Aspect::Weather,
        Aspect::MentalState,
        Aspect::Ageing,
        Aspect::Needs,
        Aspect::Learning,
    ];

    /// Whether this aspect stops on suspended units under `config`.
    /// Needs and learning have no toggle and always stop.
    pub fn is_gated(self, config: &GateConfig) -> bool {
        match self {
            Aspect::Jobs        => config.pause_jobs,
            Aspect::Health      => config.pause_health,
            Aspect::Weather     => config.pause_weather,
            Aspect::MentalState => config.pause_mental_state,
            Aspect::Ageing      => config.pause_ageing,
            Aspect::Needs | Aspect::Learning => true,
        }
    }
}
