//! Portfolio state for the Advisor Gym.
//!
//! This crate provides:
//! - [`Portfolio`]: allocation weights, value and per-turn return history
//! - [`ReallocationPreset`]: canned advisor moves expressed as weight shifts
//! - [`PortfolioError`]: rejected reallocations and invalid histories
//!
//! The portfolio is mutated only by a reallocation at the start of a turn
//! and by the realized regime return at its end.

mod error;
mod portfolio;
mod preset;

pub use error::{PortfolioError, Result};
pub use portfolio::{AppliedReturn, MIN_VALUE, Portfolio};
pub use preset::ReallocationPreset;
