//! Market regimes for the Advisor Gym.
//!
//! This crate provides:
//! - **Config**: a declarative [`RegimeTable`] of named regimes, their
//!   per-asset-class return distributions and transition likelihoods
//! - **Process**: [`MarketRegimeProcess`], a seeded Markov chain that yields one
//!   regime and one set of realized returns per turn
//! - **Errors**: [`ConfigurationError`] for malformed tables (raised at
//!   construction) and [`MarketError`] for draws against unknown regimes
//!
//! # Usage
//!
//! ```ignore
//! use market::{MarketRegimeProcess, RegimeTable};
//!
//! let mut process = MarketRegimeProcess::new(&RegimeTable::default(), 42)?;
//! let mut current = process.require("calm-growth")?;
//!
//! // Each turn
//! let draw = process.sample_next(current)?;
//! current = draw.regime;
//! ```

pub mod config;
pub mod error;
pub mod process;

pub use config::{
    AssetReturns, DEFAULT_RETURN_CLAMP, RegimeSpec, RegimeTable, ReturnDistribution, ReturnShape,
};
pub use error::{ConfigurationError, MarketError};
pub use process::{MarketRegime, MarketRegimeProcess, RegimeDraw, RegimeId, RegimeReturn};
