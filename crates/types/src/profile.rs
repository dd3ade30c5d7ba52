//! Client risk tolerance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The client's stated appetite for risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskTolerance {
    pub const ALL: [RiskTolerance; 3] = [RiskTolerance::Low, RiskTolerance::Medium, RiskTolerance::High];

    /// Equity weight range considered suitable for this tolerance.
    pub fn equity_range(self) -> (f64, f64) {
        match self {
            RiskTolerance::Low => (0.10, 0.40),
            RiskTolerance::Medium => (0.40, 0.70),
            RiskTolerance::High => (0.70, 0.95),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTolerance::Low => "low",
            RiskTolerance::Medium => "medium",
            RiskTolerance::High => "high",
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
