//! Error types for session operations.

use market::{ConfigurationError, MarketError};
use portfolio::PortfolioError;
use thiserror::Error;

use crate::session::SessionPhase;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors returned by [`SimulationSession`](crate::SimulationSession).
///
/// Every failing operation leaves the session exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Operation called out of order.
    #[error("cannot {operation} while session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// A snapshot does not describe a consistent session.
    #[error("inconsistent snapshot: {0}")]
    InvalidSnapshot(String),
}
