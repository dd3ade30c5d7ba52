//! Core types for the Advisor Gym simulation.
//!
//! This crate provides the vocabulary shared by every other crate: asset
//! classes and validated allocations, bounded emotional levels, turn numbers,
//! the client's stated risk tolerance and the advisor's communication choices.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

pub mod allocation;
pub mod decision;
pub mod profile;

pub use allocation::{Allocation, AllocationError, AssetClass, WeightMap};
pub use decision::CommunicationChoice;
pub use profile::RiskTolerance;

// =============================================================================
// Constants
// =============================================================================

/// Lower bound of every emotional level (anxiety, trust, ...).
pub const LEVEL_MIN: f64 = 0.0;

/// Upper bound of every emotional level.
pub const LEVEL_MAX: f64 = 100.0;

/// Allowed deviation from 1.0 when summing allocation weights or
/// transition likelihoods.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Clamp a level into `[LEVEL_MIN, LEVEL_MAX]`.
#[inline]
pub fn clamp_level(value: f64) -> f64 {
    value.clamp(LEVEL_MIN, LEVEL_MAX)
}

// =============================================================================
// Turn Number
// =============================================================================

/// One-based turn counter. Turn 1 is the first advisory period.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Into,
)]
#[display("Turn {_0}")]
pub struct TurnNumber(pub u32);

impl TurnNumber {
    pub const FIRST: TurnNumber = TurnNumber(1);

    /// Get raw value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The turn after this one.
    #[inline]
    pub fn next(self) -> Self {
        TurnNumber(self.0 + 1)
    }
}

impl Default for TurnNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

// =============================================================================
// Formatting helpers
// =============================================================================

/// Format a decimal return as a signed percentage: `0.12 -> "+12.0%"`.
pub fn fmt_pct(decimal: f64) -> String {
    let sign = if decimal >= 0.0 { "+" } else { "" };
    format!("{}{:.1}%", sign, decimal * 100.0)
}
