//! Asset classes and validated allocation weights.
//!
//! An [`Allocation`] can only be built through validation, so every value of
//! the type holds weights in `[0, 1]` that sum to one within
//! [`WEIGHT_TOLERANCE`](crate::WEIGHT_TOLERANCE).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WEIGHT_TOLERANCE;

// =============================================================================
// AssetClass
// =============================================================================

/// The coarse asset classes a portfolio is split across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Bond,
    Cash,
}

impl AssetClass {
    pub const ALL: [AssetClass; 3] = [AssetClass::Equity, AssetClass::Bond, AssetClass::Cash];

    pub fn label(self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Bond => "bond",
            AssetClass::Cash => "cash",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw weight mapping as submitted by the presentation layer.
pub type WeightMap = BTreeMap<AssetClass, f64>;

// =============================================================================
// AllocationError
// =============================================================================

/// Reasons a weight mapping is not a valid allocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("{0} weight is not finite")]
    NonFinite(AssetClass),

    #[error("{class} weight {weight} is negative")]
    Negative { class: AssetClass, weight: f64 },

    #[error("{class} weight {weight} exceeds 1")]
    AboveOne { class: AssetClass, weight: f64 },

    #[error("weights sum to {0} instead of 1")]
    BadSum(f64),
}

// =============================================================================
// Allocation
// =============================================================================

/// Portfolio weights across equity, bond and cash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightMap", into = "WeightMap")]
pub struct Allocation {
    equity: f64,
    bond: f64,
    cash: f64,
}

impl Allocation {
    /// Validate and build an allocation.
    pub fn new(equity: f64, bond: f64, cash: f64) -> Result<Self, AllocationError> {
        let candidate = Self { equity, bond, cash };
        candidate.validate()?;
        Ok(candidate)
    }

    /// Build from a weight mapping. Classes absent from the map weigh zero.
    pub fn from_weights(weights: &WeightMap) -> Result<Self, AllocationError> {
        let get = |class| weights.get(&class).copied().unwrap_or(0.0);
        Self::new(
            get(AssetClass::Equity),
            get(AssetClass::Bond),
            get(AssetClass::Cash),
        )
    }

    /// Everything in cash.
    pub fn all_cash() -> Self {
        Self {
            equity: 0.0,
            bond: 0.0,
            cash: 1.0,
        }
    }

    /// 60% equity, 30% bond, 10% cash.
    pub fn balanced() -> Self {
        Self {
            equity: 0.6,
            bond: 0.3,
            cash: 0.1,
        }
    }

    /// Shift weights by the given deltas, clamp each to `[0, 1]` and rescale
    /// so they sum to one. Falls back to all-cash if everything clamps to zero.
    pub fn shifted(&self, d_equity: f64, d_bond: f64, d_cash: f64) -> Self {
        let equity = (self.equity + d_equity).clamp(0.0, 1.0);
        let bond = (self.bond + d_bond).clamp(0.0, 1.0);
        let cash = (self.cash + d_cash).clamp(0.0, 1.0);
        let total = equity + bond + cash;
        if total <= 0.0 {
            return Self::all_cash();
        }
        Self {
            equity: equity / total,
            bond: bond / total,
            cash: cash / total,
        }
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn bond(&self) -> f64 {
        self.bond
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Weight for a single class.
    pub fn weight(&self, class: AssetClass) -> f64 {
        match class {
            AssetClass::Equity => self.equity,
            AssetClass::Bond => self.bond,
            AssetClass::Cash => self.cash,
        }
    }

    pub fn sum(&self) -> f64 {
        self.equity + self.bond + self.cash
    }

    pub fn to_weights(&self) -> WeightMap {
        AssetClass::ALL
            .iter()
            .map(|&class| (class, self.weight(class)))
            .collect()
    }

    /// Whole-number percentages for display, e.g. `(60, 30, 10)`.
    pub fn percentages(&self) -> (u32, u32, u32) {
        let pct = |w: f64| (w * 100.0).round() as u32;
        (pct(self.equity), pct(self.bond), pct(self.cash))
    }

    fn validate(&self) -> Result<(), AllocationError> {
        for class in AssetClass::ALL {
            let weight = self.weight(class);
            if !weight.is_finite() {
                return Err(AllocationError::NonFinite(class));
            }
            if weight < 0.0 {
                return Err(AllocationError::Negative { class, weight });
            }
            if weight > 1.0 + WEIGHT_TOLERANCE {
                return Err(AllocationError::AboveOne { class, weight });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AllocationError::BadSum(sum));
        }
        Ok(())
    }
}

impl TryFrom<WeightMap> for Allocation {
    type Error = AllocationError;

    fn try_from(weights: WeightMap) -> Result<Self, Self::Error> {
        Self::from_weights(&weights)
    }
}

impl From<Allocation> for WeightMap {
    fn from(allocation: Allocation) -> Self {
        allocation.to_weights()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (e, b, c) = self.percentages();
        write!(f, "{}% equity / {}% bond / {}% cash", e, b, c)
    }
}
