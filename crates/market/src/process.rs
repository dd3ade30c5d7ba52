//! Markov regime process.
//!
//! [`MarketRegimeProcess`] is a discrete-time Markov chain over a validated
//! regime table. Each draw picks the next regime from the current regime's
//! transition row, then realizes one return per asset class from the new
//! regime's distributions.
//!
//! The process is deterministic given the same seed, enabling reproducible
//! sessions for testing and debugging. It keeps no memory beyond its table
//! and RNG; the current regime is owned by the caller.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::{AssetClass, WEIGHT_TOLERANCE};

use crate::config::{RegimeTable, ReturnDistribution, ReturnShape};
use crate::error::{ConfigurationError, MarketError};

// =============================================================================
// Identifiers and draws
// =============================================================================

/// Index of a regime within its process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegimeId(pub usize);

/// Realized per-asset-class returns for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegimeReturn {
    pub equity: f64,
    pub bond: f64,
    pub cash: f64,
}

impl RegimeReturn {
    pub fn new(equity: f64, bond: f64, cash: f64) -> Self {
        Self { equity, bond, cash }
    }

    /// The same return for every asset class.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn get(&self, class: AssetClass) -> f64 {
        match class {
            AssetClass::Equity => self.equity,
            AssetClass::Bond => self.bond,
            AssetClass::Cash => self.cash,
        }
    }
}

/// Result of one step of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeDraw {
    pub regime: RegimeId,
    pub returns: RegimeReturn,
}

// =============================================================================
// MarketRegime
// =============================================================================

/// A validated regime with its transition row resolved to ids.
#[derive(Debug, Clone)]
pub struct MarketRegime {
    pub id: RegimeId,
    pub name: String,
    pub description: String,
    pub severity: f64,
    pub crisis: bool,
    pub downturn: bool,
    /// `transitions[j]` is the likelihood of moving to `RegimeId(j)`.
    transitions: Vec<f64>,
    samplers: [Sampler; 3],
}

impl MarketRegime {
    pub fn transition_likelihood(&self, to: RegimeId) -> f64 {
        self.transitions.get(to.0).copied().unwrap_or(0.0)
    }
}

/// Pre-built sampler so sampling can never fail.
#[derive(Debug, Clone)]
enum Sampler {
    Fixed(f64),
    Uniform { low: f64, high: f64 },
    Normal(Normal<f64>),
}

impl Sampler {
    fn build(
        regime: &str,
        class: AssetClass,
        dist: &ReturnDistribution,
    ) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidDistribution {
            regime: regime.to_string(),
            class,
            reason: reason.to_string(),
        };

        if !dist.mean.is_finite() || !dist.spread.is_finite() {
            return Err(invalid("mean and spread must be finite"));
        }
        if dist.spread < 0.0 {
            return Err(invalid("spread must be non-negative"));
        }
        if dist.spread == 0.0 {
            return Ok(Sampler::Fixed(dist.mean));
        }

        let (low, high) = (dist.mean - dist.spread, dist.mean + dist.spread);
        if !low.is_finite() || !high.is_finite() {
            return Err(invalid("mean ± spread overflows"));
        }

        match dist.shape {
            ReturnShape::Uniform => Ok(Sampler::Uniform { low, high }),
            ReturnShape::Normal => Normal::new(dist.mean, dist.spread)
                .map(Sampler::Normal)
                .map_err(|e| invalid(&e.to_string())),
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Sampler::Fixed(value) => *value,
            Sampler::Uniform { low, high } => rng.random_range(*low..=*high),
            Sampler::Normal(normal) => normal.sample(rng),
        }
    }
}

// =============================================================================
// MarketRegimeProcess
// =============================================================================

/// Markov chain over market regimes.
pub struct MarketRegimeProcess {
    regimes: Vec<MarketRegime>,
    by_name: HashMap<String, RegimeId>,
    return_clamp: f64,
    rng: StdRng,
}

impl MarketRegimeProcess {
    /// Validate `table` and build a process seeded with `seed`.
    ///
    /// Fails if any transition row is malformed: negative or non-finite
    /// likelihoods, targets outside the table, or a row that does not sum to
    /// one within tolerance. Rows are never renormalized.
    pub fn new(table: &RegimeTable, seed: u64) -> Result<Self, ConfigurationError> {
        if table.regimes.is_empty() {
            return Err(ConfigurationError::EmptyTable);
        }
        if !table.return_clamp.is_finite() || table.return_clamp <= 0.0 || table.return_clamp > 1.0
        {
            return Err(ConfigurationError::InvalidReturnClamp(table.return_clamp));
        }

        let mut by_name = HashMap::with_capacity(table.regimes.len());
        for (idx, spec) in table.regimes.iter().enumerate() {
            if by_name.insert(spec.name.clone(), RegimeId(idx)).is_some() {
                return Err(ConfigurationError::DuplicateRegime(spec.name.clone()));
            }
        }

        let mut regimes = Vec::with_capacity(table.regimes.len());
        for (idx, spec) in table.regimes.iter().enumerate() {
            let mut row = vec![0.0; table.regimes.len()];
            for (target, &likelihood) in &spec.transitions {
                let Some(&RegimeId(j)) = by_name.get(target) else {
                    return Err(ConfigurationError::UnknownTransitionTarget {
                        from: spec.name.clone(),
                        to: target.clone(),
                    });
                };
                if !likelihood.is_finite() || likelihood < 0.0 {
                    return Err(ConfigurationError::InvalidLikelihood {
                        from: spec.name.clone(),
                        to: target.clone(),
                        value: likelihood,
                    });
                }
                row[j] = likelihood;
            }

            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(ConfigurationError::RowSum {
                    regime: spec.name.clone(),
                    sum,
                });
            }

            let samplers = [
                Sampler::build(&spec.name, AssetClass::Equity, &spec.returns.equity)?,
                Sampler::build(&spec.name, AssetClass::Bond, &spec.returns.bond)?,
                Sampler::build(&spec.name, AssetClass::Cash, &spec.returns.cash)?,
            ];

            regimes.push(MarketRegime {
                id: RegimeId(idx),
                name: spec.name.clone(),
                description: spec.description.clone(),
                severity: spec.severity,
                crisis: spec.crisis,
                downturn: spec.downturn,
                transitions: row,
                samplers,
            });
        }

        Ok(Self {
            regimes,
            by_name,
            return_clamp: table.return_clamp,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// All regimes, indexed by `RegimeId`.
    pub fn regimes(&self) -> &[MarketRegime] {
        &self.regimes
    }

    pub fn regime(&self, id: RegimeId) -> Option<&MarketRegime> {
        self.regimes.get(id.0)
    }

    /// Find a regime by name.
    pub fn lookup(&self, name: &str) -> Option<RegimeId> {
        self.by_name.get(name).copied()
    }

    /// Like [`lookup`](Self::lookup) but reports a configuration error.
    pub fn require(&self, name: &str) -> Result<RegimeId, ConfigurationError> {
        self.lookup(name)
            .ok_or_else(|| ConfigurationError::UnknownRegime(name.to_string()))
    }

    pub fn return_clamp(&self) -> f64 {
        self.return_clamp
    }

    /// Advance the chain one period from `current`.
    ///
    /// The returned regime always belongs to this process and every realized
    /// return is finite and within `±return_clamp`.
    pub fn sample_next(&mut self, current: RegimeId) -> Result<RegimeDraw, MarketError> {
        let from = self
            .regimes
            .get(current.0)
            .ok_or(MarketError::UnknownRegime(current.0))?;

        let next = Self::pick_transition(&from.transitions, &mut self.rng);
        let regime = &self.regimes[next.0];

        let mut realized = [0.0; 3];
        for (slot, sampler) in realized.iter_mut().zip(regime.samplers.iter()) {
            *slot = Self::sanitize(sampler.sample(&mut self.rng), self.return_clamp);
        }
        let returns = RegimeReturn::new(realized[0], realized[1], realized[2]);

        debug!(
            from = %from.name,
            to = %regime.name,
            equity = returns.equity,
            bond = returns.bond,
            cash = returns.cash,
            "regime transition"
        );

        Ok(RegimeDraw {
            regime: next,
            returns,
        })
    }

    /// Walk the cumulative row. Falls back to the last reachable regime when
    /// floating-point rounding leaves the roll just above the final bucket.
    fn pick_transition(row: &[f64], rng: &mut StdRng) -> RegimeId {
        let roll: f64 = rng.random();
        let mut cumulative = 0.0;
        let mut last_reachable = 0;
        for (j, &likelihood) in row.iter().enumerate() {
            if likelihood <= 0.0 {
                continue;
            }
            last_reachable = j;
            cumulative += likelihood;
            if roll < cumulative {
                return RegimeId(j);
            }
        }
        RegimeId(last_reachable)
    }

    fn sanitize(value: f64, clamp: f64) -> f64 {
        if value.is_finite() {
            value.clamp(-clamp, clamp)
        } else {
            0.0
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetReturns, DEFAULT_RETURN_CLAMP, RegimeSpec};

    fn flat_returns() -> AssetReturns {
        AssetReturns {
            equity: ReturnDistribution::uniform(0.0, 0.01),
            bond: ReturnDistribution::fixed(0.0),
            cash: ReturnDistribution::fixed(0.0),
        }
    }

    fn two_state_table(a_to_a: f64, a_to_b: f64) -> RegimeTable {
        RegimeTable::new(vec![
            RegimeSpec::new("a", "A", 0.0, flat_returns())
                .to("a", a_to_a)
                .to("b", a_to_b),
            RegimeSpec::new("b", "B", 0.0, flat_returns()).to("a", 1.0),
        ])
    }

    #[test]
    fn test_default_table_is_valid() {
        let process = MarketRegimeProcess::new(&RegimeTable::default(), 42).unwrap();
        assert_eq!(process.regimes().len(), 6);
        assert!(process.lookup("crash").is_some());
        assert!(process.lookup("moonshot").is_none());
    }

    #[test]
    fn test_row_sum_rejected_at_construction() {
        let err = MarketRegimeProcess::new(&two_state_table(0.5, 0.4), 1)
            .err()
            .unwrap();
        match err {
            ConfigurationError::RowSum { regime, sum } => {
                assert_eq!(regime, "a");
                assert!((sum - 0.9).abs() < 1e-12);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Over-full rows are not normalized either.
        assert!(MarketRegimeProcess::new(&two_state_table(0.7, 0.4), 1).is_err());
    }

    #[test]
    fn test_row_within_tolerance_accepted() {
        assert!(MarketRegimeProcess::new(&two_state_table(0.5, 0.5 + 1e-9), 1).is_ok());
    }

    #[test]
    fn test_negative_likelihood_rejected() {
        let err = MarketRegimeProcess::new(&two_state_table(1.2, -0.2), 1)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigurationError::InvalidLikelihood { .. }));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let table = RegimeTable::new(vec![
            RegimeSpec::new("a", "A", 0.0, flat_returns())
                .to("a", 0.5)
                .to("ghost", 0.5),
        ]);
        let err = MarketRegimeProcess::new(&table, 1).err().unwrap();
        assert!(matches!(
            err,
            ConfigurationError::UnknownTransitionTarget { .. }
        ));
    }

    #[test]
    fn test_missing_row_rejected() {
        // "b" has no outgoing row at all: the set is not closed.
        let table = RegimeTable::new(vec![
            RegimeSpec::new("a", "A", 0.0, flat_returns()).to("b", 1.0),
            RegimeSpec::new("b", "B", 0.0, flat_returns()),
        ]);
        let err = MarketRegimeProcess::new(&table, 1).err().unwrap();
        assert!(matches!(err, ConfigurationError::RowSum { sum, .. } if sum == 0.0));
    }

    #[test]
    fn test_duplicate_and_empty_rejected() {
        assert_eq!(
            MarketRegimeProcess::new(&RegimeTable::new(vec![]), 1)
                .err()
                .unwrap(),
            ConfigurationError::EmptyTable
        );

        let table = RegimeTable::new(vec![
            RegimeSpec::new("a", "A", 0.0, flat_returns()).to("a", 1.0),
            RegimeSpec::new("a", "A again", 0.0, flat_returns()).to("a", 1.0),
        ]);
        assert!(matches!(
            MarketRegimeProcess::new(&table, 1).err().unwrap(),
            ConfigurationError::DuplicateRegime(_)
        ));
    }

    #[test]
    fn test_invalid_distribution_rejected() {
        let mut returns = flat_returns();
        returns.bond = ReturnDistribution::normal(0.0, -0.1);
        let table =
            RegimeTable::new(vec![RegimeSpec::new("a", "A", 0.0, returns).to("a", 1.0)]);
        assert!(matches!(
            MarketRegimeProcess::new(&table, 1).err().unwrap(),
            ConfigurationError::InvalidDistribution {
                class: AssetClass::Bond,
                ..
            }
        ));
    }

    #[test]
    fn test_overflowing_bounds_rejected() {
        for shape in [ReturnShape::Uniform, ReturnShape::Normal] {
            let mut returns = flat_returns();
            returns.equity = ReturnDistribution {
                mean: 1e308,
                spread: 1e308,
                shape,
            };
            let table =
                RegimeTable::new(vec![RegimeSpec::new("a", "A", 0.0, returns).to("a", 1.0)]);
            assert!(matches!(
                MarketRegimeProcess::new(&table, 1).err().unwrap(),
                ConfigurationError::InvalidDistribution {
                    class: AssetClass::Equity,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_invalid_clamp_rejected() {
        let table = two_state_table(0.5, 0.5).with_return_clamp(0.0);
        assert!(matches!(
            MarketRegimeProcess::new(&table, 1).err().unwrap(),
            ConfigurationError::InvalidReturnClamp(_)
        ));
    }

    #[test]
    fn test_same_seed_same_path() {
        let table = RegimeTable::default();
        let mut a = MarketRegimeProcess::new(&table, 7).unwrap();
        let mut b = MarketRegimeProcess::new(&table, 7).unwrap();
        let mut cur_a = a.require("calm-growth").unwrap();
        let mut cur_b = cur_a;
        for _ in 0..50 {
            let da = a.sample_next(cur_a).unwrap();
            let db = b.sample_next(cur_b).unwrap();
            assert_eq!(da, db);
            cur_a = da.regime;
            cur_b = db.regime;
        }
    }

    #[test]
    fn test_draws_stay_in_set_and_bounds() {
        let table = RegimeTable::default();
        let mut process = MarketRegimeProcess::new(&table, 99).unwrap();
        let mut current = process.require("calm-growth").unwrap();
        for _ in 0..1000 {
            let draw = process.sample_next(current).unwrap();
            assert!(process.regime(draw.regime).is_some());
            for class in AssetClass::ALL {
                let r = draw.returns.get(class);
                assert!(r.is_finite());
                assert!(r.abs() <= DEFAULT_RETURN_CLAMP);
            }
            current = draw.regime;
        }
    }

    #[test]
    fn test_extreme_normal_draw_is_clamped() {
        let returns = AssetReturns {
            equity: ReturnDistribution::normal(-5.0, 0.5),
            bond: ReturnDistribution::fixed(3.0),
            cash: ReturnDistribution::fixed(0.0),
        };
        let table =
            RegimeTable::new(vec![RegimeSpec::new("doom", "D", 50.0, returns).to("doom", 1.0)]);
        let mut process = MarketRegimeProcess::new(&table, 3).unwrap();
        let draw = process.sample_next(RegimeId(0)).unwrap();
        assert_eq!(draw.returns.equity, -DEFAULT_RETURN_CLAMP);
        assert_eq!(draw.returns.bond, DEFAULT_RETURN_CLAMP);
    }

    #[test]
    fn test_absorbing_regime() {
        let mut process = MarketRegimeProcess::new(&two_state_table(1.0, 0.0), 5).unwrap();
        for _ in 0..100 {
            assert_eq!(process.sample_next(RegimeId(0)).unwrap().regime, RegimeId(0));
        }
        // "b" always returns to "a".
        assert_eq!(process.sample_next(RegimeId(1)).unwrap().regime, RegimeId(0));
    }

    #[test]
    fn test_transition_frequencies_follow_row() {
        let mut process = MarketRegimeProcess::new(&two_state_table(0.8, 0.2), 11).unwrap();
        let trials = 10_000;
        let stays = (0..trials)
            .filter(|_| process.sample_next(RegimeId(0)).unwrap().regime == RegimeId(0))
            .count();
        let freq = stays as f64 / trials as f64;
        assert!((freq - 0.8).abs() < 0.03, "stay frequency {}", freq);
    }

    #[test]
    fn test_unknown_current_regime() {
        let mut process = MarketRegimeProcess::new(&two_state_table(0.5, 0.5), 1).unwrap();
        assert_eq!(
            process.sample_next(RegimeId(9)).unwrap_err(),
            MarketError::UnknownRegime(9)
        );
    }

    #[test]
    fn test_uniform_draw_within_range() {
        let returns = AssetReturns {
            equity: ReturnDistribution::uniform(0.10, 0.02),
            bond: ReturnDistribution::fixed(0.01),
            cash: ReturnDistribution::fixed(0.005),
        };
        let table =
            RegimeTable::new(vec![RegimeSpec::new("up", "U", -5.0, returns).to("up", 1.0)]);
        let mut process = MarketRegimeProcess::new(&table, 21).unwrap();
        for _ in 0..500 {
            let draw = process.sample_next(RegimeId(0)).unwrap();
            assert!((0.08..=0.12).contains(&draw.returns.equity));
            assert_eq!(draw.returns.bond, 0.01);
            assert_eq!(draw.returns.cash, 0.005);
        }
    }
}
