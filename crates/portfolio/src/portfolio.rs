//! Portfolio valuation.
//!
//! A [`Portfolio`] holds the current allocation, the starting value and the
//! per-turn realized returns. The current value is always the starting value
//! compounded through the return history, so every read-only query
//! (drawdown, peak, total return) is recomputed from that history.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::{Allocation, AssetClass, WeightMap};

use market::RegimeReturn;

use crate::error::{PortfolioError, Result};

/// Value floor. A total-loss draw leaves the client with this much cash.
pub const MIN_VALUE: f64 = 0.01;

/// Outcome of applying one period's returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedReturn {
    /// Weighted blend of the per-asset returns.
    pub blended: f64,
    /// Return actually recorded after the value floor.
    pub effective: f64,
    pub value_before: f64,
    pub value_after: f64,
    /// Whether the value floor kicked in.
    pub floored: bool,
}

/// Allocation, value and return history for one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PortfolioRecord", into = "PortfolioRecord")]
pub struct Portfolio {
    allocation: Allocation,
    initial_value: f64,
    value: f64,
    returns: Vec<f64>,
}

impl Portfolio {
    /// Create a portfolio at `initial_value` with the given allocation.
    pub fn new(initial_value: f64, allocation: Allocation) -> Result<Self> {
        if !initial_value.is_finite() || initial_value <= 0.0 {
            return Err(PortfolioError::InvalidValue(initial_value));
        }
        Ok(Self {
            allocation,
            initial_value,
            value: initial_value,
            returns: Vec::new(),
        })
    }

    /// Rebuild a portfolio from its starting value and return history.
    pub fn from_history(
        initial_value: f64,
        allocation: Allocation,
        returns: Vec<f64>,
    ) -> Result<Self> {
        let mut portfolio = Self::new(initial_value, allocation)?;
        for (index, &r) in returns.iter().enumerate() {
            let next = portfolio.value * (1.0 + r);
            if !r.is_finite() || !next.is_finite() || next <= 0.0 {
                return Err(PortfolioError::InvalidReturn { index, value: r });
            }
            portfolio.value = next;
        }
        portfolio.returns = returns;
        Ok(portfolio)
    }

    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Effective per-turn returns, oldest first.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn last_return(&self) -> Option<f64> {
        self.returns.last().copied()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the allocation with `weights`.
    ///
    /// Classes missing from the map weigh zero. On error the current
    /// allocation is untouched.
    pub fn reallocate(&mut self, weights: &WeightMap) -> Result<Allocation> {
        let allocation = Allocation::from_weights(weights)?;
        self.set_allocation(allocation);
        Ok(allocation)
    }

    /// Replace the allocation with an already validated one.
    pub fn set_allocation(&mut self, allocation: Allocation) {
        if allocation != self.allocation {
            debug!(from = %self.allocation, to = %allocation, "reallocated");
        }
        self.allocation = allocation;
    }

    /// Weighted blend of `regime_return` under the current allocation.
    pub fn blended_return(&self, regime_return: &RegimeReturn) -> f64 {
        AssetClass::ALL
            .iter()
            .map(|&class| self.allocation.weight(class) * regime_return.get(class))
            .sum()
    }

    /// Apply one period of returns and record it.
    ///
    /// The value never drops below [`MIN_VALUE`]; when the floor applies the
    /// recorded return is the effective one, so the value stays traceable
    /// through the history.
    pub fn apply_return(&mut self, regime_return: &RegimeReturn) -> AppliedReturn {
        let blended = self.blended_return(regime_return);
        let value_before = self.value;

        let raw_after = value_before * (1.0 + blended);
        let floored = !raw_after.is_finite() || raw_after < MIN_VALUE;
        let effective = if floored {
            MIN_VALUE / value_before - 1.0
        } else {
            blended
        };
        if floored {
            warn!(blended, value_before, "portfolio value floored");
        }

        self.value = value_before * (1.0 + effective);
        self.returns.push(effective);

        AppliedReturn {
            blended,
            effective,
            value_before,
            value_after: self.value,
            floored,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Value after each turn, starting with the initial value.
    pub fn value_history(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.returns.len() + 1);
        let mut value = self.initial_value;
        values.push(value);
        for &r in &self.returns {
            value *= 1.0 + r;
            values.push(value);
        }
        values
    }

    /// Highest value reached so far.
    pub fn peak_value(&self) -> f64 {
        self.value_history()
            .into_iter()
            .fold(self.initial_value, f64::max)
    }

    /// Current shortfall from the historical peak, in `[0, 1)`.
    pub fn drawdown_from_peak(&self) -> f64 {
        let peak = self.peak_value();
        let current = self.value_history().last().copied().unwrap_or(self.initial_value);
        if peak > 0.0 {
            ((peak - current) / peak).max(0.0)
        } else {
            0.0
        }
    }

    /// Largest peak-to-trough decline over the whole history.
    pub fn max_drawdown(&self) -> f64 {
        let mut max_dd: f64 = 0.0;
        let mut peak = self.initial_value;
        for value in self.value_history() {
            if value > peak {
                peak = value;
            }
            let dd = if peak > 0.0 { (peak - value) / peak } else { 0.0 };
            max_dd = max_dd.max(dd);
        }
        max_dd
    }

    /// Cumulative return since the start.
    pub fn total_return(&self) -> f64 {
        self.value / self.initial_value - 1.0
    }
}

// =============================================================================
// Serialized form
// =============================================================================

/// Wire form of a [`Portfolio`]. `value` is informational; deserialization
/// recomputes it from the history and rejects records that disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PortfolioRecord {
    allocation: Allocation,
    initial_value: f64,
    #[serde(default)]
    value: Option<f64>,
    returns: Vec<f64>,
}

impl From<Portfolio> for PortfolioRecord {
    fn from(p: Portfolio) -> Self {
        Self {
            allocation: p.allocation,
            initial_value: p.initial_value,
            value: Some(p.value),
            returns: p.returns,
        }
    }
}

impl TryFrom<PortfolioRecord> for Portfolio {
    type Error = PortfolioError;

    fn try_from(record: PortfolioRecord) -> Result<Self> {
        let portfolio = Portfolio::from_history(
            record.initial_value,
            record.allocation,
            record.returns,
        )?;
        if let Some(stated) = record.value {
            let traced = portfolio.value;
            if (stated - traced).abs() > 1e-9 * traced.abs().max(1.0) {
                return Err(PortfolioError::UntracedValue { stated, traced });
            }
        }
        Ok(portfolio)
    }
}
