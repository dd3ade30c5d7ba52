//! Error types for portfolio operations.

use thiserror::Error;
use types::AllocationError;

/// Result type for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Errors that can occur while building or mutating a portfolio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    /// The requested weights are not a valid allocation.
    #[error("invalid allocation: {0}")]
    InvalidAllocation(#[from] AllocationError),

    /// Starting value must be finite and strictly positive.
    #[error("initial value must be finite and positive, got {0}")]
    InvalidValue(f64),

    /// A recorded return would make the value non-positive or non-finite.
    #[error("invalid recorded return {value} at index {index}")]
    InvalidReturn { index: usize, value: f64 },

    /// A restored value does not follow from the initial value and returns.
    #[error("stated value {stated} does not match traced value {traced}")]
    UntracedValue { stated: f64, traced: f64 },
}
