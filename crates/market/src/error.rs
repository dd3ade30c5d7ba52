//! Error types for regime configuration and sampling.

use thiserror::Error;

/// Malformed configuration. Raised while building a component, never while
/// running one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("regime table is empty")]
    EmptyTable,

    #[error("regime `{0}` is defined more than once")]
    DuplicateRegime(String),

    #[error("unknown regime `{0}`")]
    UnknownRegime(String),

    #[error("regime `{from}` has a transition to undefined regime `{to}`")]
    UnknownTransitionTarget { from: String, to: String },

    #[error("regime `{from}` has invalid likelihood {value} for `{to}`")]
    InvalidLikelihood { from: String, to: String, value: f64 },

    #[error("transition likelihoods of `{regime}` sum to {sum}, expected 1")]
    RowSum { regime: String, sum: f64 },

    #[error("regime `{regime}` has an invalid {class} return distribution: {reason}")]
    InvalidDistribution {
        regime: String,
        class: types::AssetClass,
        reason: String,
    },

    #[error("return clamp must be finite and in (0, 1], got {0}")]
    InvalidReturnClamp(f64),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to parse regime table: {0}")]
    Parse(String),
}

/// Errors raised while drawing from a valid process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    #[error("regime id {0} is not part of this process")]
    UnknownRegime(usize),
}
