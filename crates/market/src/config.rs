//! Declarative regime table.
//!
//! A [`RegimeTable`] is pure data: each [`RegimeSpec`] names a market
//! condition, the per-asset-class return distribution it produces and the
//! likelihood of moving to every other regime. Validation happens when a
//! [`MarketRegimeProcess`](crate::MarketRegimeProcess) is built from it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use types::AssetClass;

use crate::error::ConfigurationError;

/// Default per-period sanity clamp on any realized asset return (±60%).
pub const DEFAULT_RETURN_CLAMP: f64 = 0.60;

// =============================================================================
// ReturnDistribution
// =============================================================================

/// How realized returns are spread around the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnShape {
    /// Uniform over `[mean - spread, mean + spread]`.
    #[default]
    Uniform,
    /// Gaussian with standard deviation `spread`.
    Normal,
}

/// Return distribution of one asset class within one regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnDistribution {
    /// Expected per-period return (0.05 = +5%).
    pub mean: f64,
    /// Half-width (uniform) or standard deviation (normal).
    pub spread: f64,
    #[serde(default)]
    pub shape: ReturnShape,
}

impl ReturnDistribution {
    pub fn uniform(mean: f64, spread: f64) -> Self {
        Self {
            mean,
            spread,
            shape: ReturnShape::Uniform,
        }
    }

    pub fn normal(mean: f64, std_dev: f64) -> Self {
        Self {
            mean,
            spread: std_dev,
            shape: ReturnShape::Normal,
        }
    }

    /// A deterministic return.
    pub fn fixed(value: f64) -> Self {
        Self::uniform(value, 0.0)
    }
}

/// Return distributions for every asset class.
///
/// Equities carry the regime's swing; bonds and cash dampen it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetReturns {
    pub equity: ReturnDistribution,
    pub bond: ReturnDistribution,
    pub cash: ReturnDistribution,
}

impl AssetReturns {
    pub fn get(&self, class: AssetClass) -> &ReturnDistribution {
        match class {
            AssetClass::Equity => &self.equity,
            AssetClass::Bond => &self.bond,
            AssetClass::Cash => &self.cash,
        }
    }
}

// =============================================================================
// RegimeSpec
// =============================================================================

/// One market regime as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSpec {
    /// Unique name, e.g. "calm-growth".
    pub name: String,
    /// One-line description handed to the narrative collaborator.
    pub description: String,
    /// Signed anxiety pressure this regime puts on a client
    /// (negative calms, positive alarms).
    pub severity: f64,
    /// Whether the regime counts as a crisis for advisor evaluation.
    #[serde(default)]
    pub crisis: bool,
    /// A falling market. Adding risk here counts against the advisor.
    /// Every downturn is also a crisis.
    #[serde(default)]
    pub downturn: bool,
    pub returns: AssetReturns,
    /// Likelihood of moving to each regime next period, keyed by name.
    /// Regimes missing from the row have likelihood zero.
    pub transitions: BTreeMap<String, f64>,
}

impl RegimeSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        severity: f64,
        returns: AssetReturns,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            severity,
            crisis: false,
            downturn: false,
            returns,
            transitions: BTreeMap::new(),
        }
    }

    /// Mark the regime as a crisis.
    pub fn as_crisis(mut self) -> Self {
        self.crisis = true;
        self
    }

    /// Mark the regime as a falling-market crisis.
    pub fn as_downturn(mut self) -> Self {
        self.crisis = true;
        self.downturn = true;
        self
    }

    /// Add a transition likelihood.
    pub fn to(mut self, regime: impl Into<String>, likelihood: f64) -> Self {
        self.transitions.insert(regime.into(), likelihood);
        self
    }
}

// =============================================================================
// RegimeTable
// =============================================================================

/// The closed set of regimes a market process moves between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeTable {
    pub regimes: Vec<RegimeSpec>,
    /// Realized returns are clamped to `±return_clamp`.
    #[serde(default = "default_return_clamp")]
    pub return_clamp: f64,
}

fn default_return_clamp() -> f64 {
    DEFAULT_RETURN_CLAMP
}

impl RegimeTable {
    pub fn new(regimes: Vec<RegimeSpec>) -> Self {
        Self {
            regimes,
            return_clamp: DEFAULT_RETURN_CLAMP,
        }
    }

    /// Set the sanity clamp on realized returns.
    pub fn with_return_clamp(mut self, clamp: f64) -> Self {
        self.return_clamp = clamp;
        self
    }

    /// Parse a table from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Read and parse a JSON table from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regimes.iter().map(|r| r.name.as_str())
    }
}

impl Default for RegimeTable {
    /// Six regimes with roughly half-year return ranges.
    fn default() -> Self {
        let cash = ReturnDistribution::fixed(0.005);

        let calm_growth = RegimeSpec::new(
            "calm-growth",
            "Strong economic growth and steadily rising stock prices.",
            -5.0,
            AssetReturns {
                equity: ReturnDistribution::uniform(0.125, 0.055),
                bond: ReturnDistribution::uniform(0.015, 0.025),
                cash,
            },
        )
        .to("calm-growth", 0.55)
        .to("correction", 0.15)
        .to("crash", 0.03)
        .to("volatile-sideways", 0.17)
        .to("rate-shock", 0.10);

        let correction = RegimeSpec::new(
            "correction",
            "Broad market decline and spreading investor pessimism.",
            12.0,
            AssetReturns {
                equity: ReturnDistribution::uniform(-0.10, 0.05),
                bond: ReturnDistribution::uniform(0.02, 0.04),
                cash,
            },
        )
        .as_downturn()
        .to("calm-growth", 0.10)
        .to("correction", 0.30)
        .to("crash", 0.15)
        .to("recovery", 0.25)
        .to("volatile-sideways", 0.15)
        .to("rate-shock", 0.05);

        let crash = RegimeSpec::new(
            "crash",
            "Severe selloff. Fear and uncertainty dominate.",
            25.0,
            AssetReturns {
                equity: ReturnDistribution::uniform(-0.225, 0.075),
                bond: ReturnDistribution::uniform(0.015, 0.065),
                cash,
            },
        )
        .as_downturn()
        .to("correction", 0.20)
        .to("crash", 0.20)
        .to("recovery", 0.50)
        .to("volatile-sideways", 0.10);

        let recovery = RegimeSpec::new(
            "recovery",
            "Bounce-back after a downturn. Cautious optimism returns.",
            -8.0,
            AssetReturns {
                equity: ReturnDistribution::uniform(0.15, 0.07),
                bond: ReturnDistribution::uniform(0.015, 0.035),
                cash,
            },
        )
        .to("calm-growth", 0.45)
        .to("correction", 0.10)
        .to("crash", 0.02)
        .to("recovery", 0.25)
        .to("volatile-sideways", 0.15)
        .to("rate-shock", 0.03);

        let sideways = RegimeSpec::new(
            "volatile-sideways",
            "Choppy, range-bound trading with no clear direction.",
            3.0,
            AssetReturns {
                equity: ReturnDistribution::uniform(0.0, 0.06),
                bond: ReturnDistribution::uniform(0.01, 0.02),
                cash,
            },
        )
        .to("calm-growth", 0.25)
        .to("correction", 0.20)
        .to("crash", 0.05)
        .to("recovery", 0.10)
        .to("volatile-sideways", 0.30)
        .to("rate-shock", 0.10);

        let rate_shock = RegimeSpec::new(
            "rate-shock",
            "Rising interest rates hurt bonds and growth stocks.",
            10.0,
            AssetReturns {
                equity: ReturnDistribution::uniform(-0.04, 0.06),
                bond: ReturnDistribution::uniform(-0.08, 0.04),
                cash: ReturnDistribution::uniform(0.015, 0.005),
            },
        )
        .as_crisis()
        .to("calm-growth", 0.15)
        .to("correction", 0.25)
        .to("crash", 0.05)
        .to("recovery", 0.10)
        .to("volatile-sideways", 0.25)
        .to("rate-shock", 0.20);

        Self::new(vec![
            calm_growth,
            correction,
            crash,
            recovery,
            sideways,
            rate_shock,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rows_sum_to_one() {
        let table = RegimeTable::default();
        assert_eq!(table.regimes.len(), 6);
        for regime in &table.regimes {
            let sum: f64 = regime.transitions.values().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{} sums to {}", regime.name, sum);
        }
    }

    #[test]
    fn test_default_severity_ordering() {
        let table = RegimeTable::default();
        let severity = |name: &str| {
            table
                .regimes
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.severity)
                .unwrap()
        };
        assert!(severity("crash") > severity("correction"));
        assert!(severity("correction") > severity("calm-growth"));
        assert!(severity("recovery") < 0.0);
    }

    #[test]
    fn test_default_downturns() {
        let table = RegimeTable::default();
        let flags = |name: &str| {
            table
                .regimes
                .iter()
                .find(|r| r.name == name)
                .map(|r| (r.crisis, r.downturn))
                .unwrap()
        };
        assert_eq!(flags("crash"), (true, true));
        assert_eq!(flags("correction"), (true, true));
        assert_eq!(flags("rate-shock"), (true, false));
        assert_eq!(flags("calm-growth"), (false, false));
    }

    #[test]
    fn test_json_round_trip() {
        let table = RegimeTable::default();
        let json = serde_json::to_string(&table).unwrap();
        let parsed = RegimeTable::from_json(&json).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "regimes": [{
                "name": "flat",
                "description": "Nothing happens.",
                "severity": 0.0,
                "returns": {
                    "equity": {"mean": 0.0, "spread": 0.01},
                    "bond": {"mean": 0.0, "spread": 0.0},
                    "cash": {"mean": 0.0, "spread": 0.0, "shape": "normal"}
                },
                "transitions": {"flat": 1.0}
            }]
        }"#;
        let table = RegimeTable::from_json(json).unwrap();
        assert_eq!(table.return_clamp, DEFAULT_RETURN_CLAMP);
        assert!(!table.regimes[0].crisis);
        assert!(!table.regimes[0].downturn);
        assert_eq!(table.regimes[0].returns.equity.shape, ReturnShape::Uniform);
        assert_eq!(table.regimes[0].returns.cash.shape, ReturnShape::Normal);
    }

    #[test]
    fn test_from_json_reports_parse_errors() {
        let err = RegimeTable::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }
}
