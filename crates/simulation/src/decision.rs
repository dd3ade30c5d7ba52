//! Typed advisor decisions.

use portfolio::ReallocationPreset;
use serde::{Deserialize, Serialize};
use types::{CommunicationChoice, WeightMap};

/// What to do with the allocation this turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reallocation {
    /// Keep the current weights.
    #[default]
    Hold,
    /// Replace the weights outright. Missing classes weigh zero.
    Target(WeightMap),
    /// Shift the current weights by a canned move.
    Preset(ReallocationPreset),
}

/// The advisor's move for one turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Decision {
    pub reallocation: Reallocation,
    pub communication: CommunicationChoice,
}

impl Decision {
    pub fn new(reallocation: Reallocation, communication: CommunicationChoice) -> Self {
        Self {
            reallocation,
            communication,
        }
    }

    /// Keep the allocation and talk to the client.
    pub fn hold(communication: CommunicationChoice) -> Self {
        Self::new(Reallocation::Hold, communication)
    }

    pub fn target(weights: WeightMap, communication: CommunicationChoice) -> Self {
        Self::new(Reallocation::Target(weights), communication)
    }

    pub fn preset(preset: ReallocationPreset, communication: CommunicationChoice) -> Self {
        Self::new(Reallocation::Preset(preset), communication)
    }
}
