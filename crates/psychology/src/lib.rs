//! Client psychology for the Advisor Gym.
//!
//! This crate provides:
//! - [`Client`]: profile, personality traits and emotional state
//! - [`ClientPsychologyModel`]: the pure per-turn emotional update
//! - [`ClientIntent`]: how the client approaches the advisor next turn
//! - [`PsychologyConfig`]: every behavioral constant, validated
//!
//! # Usage
//!
//! ```ignore
//! use psychology::{AdvisorAction, ClientPsychologyModel, PsychologyConfig, PsychologyInput};
//!
//! let model = ClientPsychologyModel::new(PsychologyConfig::default())?;
//! let outcome = model.update(&client.profile, &PsychologyInput {
//!     state: client.state(),
//!     latest_return: -0.04,
//!     return_history: &[0.02, -0.04],
//!     drawdown: 0.04,
//!     regime_severity: 12.0,
//!     equity_weight: 0.6,
//!     action: AdvisorAction::new(CommunicationChoice::Empathize),
//!     turns_since_last_contact: 0,
//! });
//! client.set_state(outcome.next);
//! ```

mod client;
mod config;
mod intent;
mod model;

pub use client::{
    Client, ClientProfile, EmotionDelta, EmotionalState, PersonalityTraits, RelationshipStatus,
};
pub use config::{CommunicationEffects, FitPenalties, PsychologyConfig};
pub use intent::{ClientIntent, ClientRequest};
pub use model::{AdvisorAction, ClientPsychologyModel, PsychologyInput, PsychologyOutcome};
