//! Serializable session state.

use narrative::NarrativeContext;
use portfolio::Portfolio;
use psychology::{Client, ClientRequest};
use serde::{Deserialize, Serialize};
use types::TurnNumber;

use crate::error::{Result, SessionError};
use crate::session::{EndReason, PendingDecision, SessionId, SessionPhase};
use crate::turn::Turn;

/// Owned copy of everything needed to resume a session.
///
/// The market RNG is not captured; a restored session draws from a fresh seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub phase: SessionPhase,
    pub client: Client,
    pub portfolio: Portfolio,
    /// Name of the regime the market is in.
    pub current_regime: String,
    pub turns: Vec<Turn>,
    pub pending_decision: Option<PendingDecision>,
    pub pending_context: Option<NarrativeContext>,
    pub pending_request: ClientRequest,
    pub turns_without_contact: u32,
    #[serde(default)]
    pub end_reason: Option<EndReason>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Check that the parts describe one consistent session.
    pub fn check_consistency(&self) -> Result<()> {
        for (idx, turn) in self.turns.iter().enumerate() {
            let expected = TurnNumber(idx as u32 + 1);
            if turn.number() != expected {
                return Err(SessionError::InvalidSnapshot(format!(
                    "turn at position {idx} is numbered {}, expected {expected}",
                    turn.number()
                )));
            }
        }

        if self.portfolio.returns().len() != self.turns.len() {
            return Err(SessionError::InvalidSnapshot(format!(
                "portfolio has {} returns but there are {} turns",
                self.portfolio.returns().len(),
                self.turns.len()
            )));
        }

        let resolving = self.phase == SessionPhase::Resolving;
        if resolving != self.pending_decision.is_some() {
            return Err(SessionError::InvalidSnapshot(
                "pending decision must be present exactly while resolving".into(),
            ));
        }

        let narrating = self.phase == SessionPhase::TurnComplete;
        if narrating && (self.pending_context.is_none() || self.turns.is_empty()) {
            return Err(SessionError::InvalidSnapshot(
                "a completed turn is missing its narrative context".into(),
            ));
        }
        if !narrating && self.pending_context.is_some() {
            return Err(SessionError::InvalidSnapshot(
                "narrative context present outside turn completion".into(),
            ));
        }

        if self.end_reason.is_some() && !narrating && self.phase != SessionPhase::Ended {
            return Err(SessionError::InvalidSnapshot(format!(
                "end reason recorded while {}",
                self.phase
            )));
        }
        Ok(())
    }
}
