//! Session orchestration for the Advisor Gym.
//!
//! This crate provides:
//! - [`SimulationSession`]: the turn loop tying market, portfolio and client together
//! - [`Decision`]: the advisor's typed move for a turn
//! - [`Turn`]: an immutable record of one resolved turn
//! - [`SessionSnapshot`]: serializable state for save and restore
//! - [`scoring`]: end-of-session career evaluation
//!
//! # Usage
//!
//! ```ignore
//! use narrative::FallbackNarrator;
//! use simulation::{Decision, SessionConfig, SimulationSession};
//! use types::CommunicationChoice;
//!
//! let mut session = SimulationSession::with_random_client(SessionConfig::default(), 42)?;
//! while !session.is_over() {
//!     let turn = session
//!         .advance_turn(Decision::hold(CommunicationChoice::Empathize), &FallbackNarrator)
//!         .await?;
//!     println!("{}: {:+.1}%", turn.number(), turn.portfolio_return() * 100.0);
//! }
//! let report = session.end_session();
//! ```

mod config;
mod decision;
mod error;
pub mod scoring;
mod session;
mod snapshot;
mod turn;

pub use config::{
    DEFAULT_INITIAL_VALUE, DEFAULT_MAX_TURNS, DEFAULT_NARRATIVE_TIMEOUT, DepartureThresholds,
    SessionConfig,
};
pub use decision::{Decision, Reallocation};
pub use error::{Result, SessionError};
pub use scoring::{CareerReport, CareerTitle, Feedback, ScoreBreakdown};
pub use session::{
    EndReason, PendingDecision, SessionId, SessionPhase, SimulationSession, TurnResolution,
};
pub use snapshot::SessionSnapshot;
pub use turn::{RegimeOutcome, Turn};
