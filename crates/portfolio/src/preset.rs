//! Preset reallocation recommendations.
//!
//! Presets express common advisor moves as shifts to the current weights
//! rather than absolute targets. Shifted weights are clamped to `[0, 1]` and
//! rescaled, so a preset is always applicable.

use std::fmt;

use serde::{Deserialize, Serialize};
use types::Allocation;

/// A canned reallocation move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReallocationPreset {
    /// No allocation change.
    StayTheCourse,
    /// Move 10 points from equity to bonds.
    SmallDeRisk,
    /// Move 20 points out of equity into bonds and cash.
    LargerDeRisk,
    /// Move heavily into cash.
    MoveToCash,
    /// Add 15 points of equity.
    IncreaseRisk,
}

impl ReallocationPreset {
    pub const ALL: [ReallocationPreset; 5] = [
        ReallocationPreset::StayTheCourse,
        ReallocationPreset::SmallDeRisk,
        ReallocationPreset::LargerDeRisk,
        ReallocationPreset::MoveToCash,
        ReallocationPreset::IncreaseRisk,
    ];

    /// `(equity, bond, cash)` weight shifts.
    pub fn shifts(self) -> (f64, f64, f64) {
        match self {
            ReallocationPreset::StayTheCourse => (0.0, 0.0, 0.0),
            ReallocationPreset::SmallDeRisk => (-0.10, 0.10, 0.0),
            ReallocationPreset::LargerDeRisk => (-0.20, 0.12, 0.08),
            ReallocationPreset::MoveToCash => (-0.35, -0.05, 0.40),
            ReallocationPreset::IncreaseRisk => (0.15, -0.10, -0.05),
        }
    }

    /// Allocation that results from applying this preset to `current`.
    pub fn apply(self, current: &Allocation) -> Allocation {
        if self == ReallocationPreset::StayTheCourse {
            return *current;
        }
        let (e, b, c) = self.shifts();
        current.shifted(e, b, c)
    }

    /// A panic move that locks in losses.
    pub fn is_panic_move(self) -> bool {
        self == ReallocationPreset::MoveToCash
    }

    pub fn label(self) -> &'static str {
        match self {
            ReallocationPreset::StayTheCourse => "Stay the course (no change)",
            ReallocationPreset::SmallDeRisk => "Small de-risk (-10% equity -> bonds)",
            ReallocationPreset::LargerDeRisk => "Larger de-risk (-20% equity -> bonds/cash)",
            ReallocationPreset::MoveToCash => "Move heavily to cash (defensive)",
            ReallocationPreset::IncreaseRisk => "Increase risk (more equity)",
        }
    }
}

impl fmt::Display for ReallocationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_keep_valid_allocation() {
        let starts = [
            Allocation::new(0.7, 0.25, 0.05).unwrap(),
            Allocation::new(0.05, 0.05, 0.9).unwrap(),
            Allocation::new(1.0, 0.0, 0.0).unwrap(),
            Allocation::all_cash(),
        ];
        for start in starts {
            for preset in ReallocationPreset::ALL {
                let result = preset.apply(&start);
                assert!((result.sum() - 1.0).abs() < 1e-9, "{preset:?} on {start}");
                assert!(Allocation::new(result.equity(), result.bond(), result.cash()).is_ok());
            }
        }
    }

    #[test]
    fn test_de_risk_lowers_equity() {
        let start = Allocation::new(0.7, 0.25, 0.05).unwrap();
        let small = ReallocationPreset::SmallDeRisk.apply(&start);
        let large = ReallocationPreset::LargerDeRisk.apply(&start);
        let cash = ReallocationPreset::MoveToCash.apply(&start);
        assert!(small.equity() < start.equity());
        assert!(large.equity() < small.equity());
        assert!(cash.equity() < large.equity());
        assert!((small.equity() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_increase_risk_raises_equity() {
        let start = Allocation::new(0.5, 0.4, 0.1).unwrap();
        let result = ReallocationPreset::IncreaseRisk.apply(&start);
        assert!((result.equity() - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_stay_is_identity() {
        let start = Allocation::new(0.6, 0.3, 0.1).unwrap();
        assert_eq!(ReallocationPreset::StayTheCourse.apply(&start), start);
    }
}
