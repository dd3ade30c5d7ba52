//! What the client wants going into the next turn.

use std::fmt;

use serde::{Deserialize, Serialize};
use types::CommunicationChoice;

use crate::client::{EmotionalState, PersonalityTraits};

/// A demand the client places on the advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRequest {
    #[default]
    None,
    /// Reduce equity exposure.
    DeRisk,
    /// Add equity exposure.
    AddRisk,
}

impl ClientRequest {
    pub fn is_pending(self) -> bool {
        self != ClientRequest::None
    }

    /// Whether a decision overrides this request.
    ///
    /// `equity_weight` is the equity left in force and `equity_shift` the
    /// change the decision made. A de-risk request is overridden unless equity
    /// goes down or there is none left; an add-risk request unless equity goes
    /// up or is already at 100%. Dismissing the client overrides any request.
    pub fn is_overridden_by(
        self,
        equity_weight: f64,
        equity_shift: f64,
        communication: CommunicationChoice,
    ) -> bool {
        const EPS: f64 = 1e-9;
        match self {
            ClientRequest::None => false,
            _ if communication.is_dismissive() => true,
            ClientRequest::DeRisk => equity_shift > -EPS && equity_weight > EPS,
            ClientRequest::AddRisk => equity_shift < EPS && equity_weight < 1.0 - EPS,
        }
    }
}

/// How the client comes across at the start of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientIntent {
    OverrideThreat,
    Panic,
    Concerned,
    Greedy,
    ConfidentCheckin,
    NeutralCheckin,
}

impl ClientIntent {
    /// Classify from the client's state and the latest portfolio return.
    pub fn classify(state: &EmotionalState, traits: &PersonalityTraits, latest_return: f64) -> Self {
        if state.anxiety >= 80.0 || state.trust < 20.0 {
            ClientIntent::OverrideThreat
        } else if state.anxiety >= 65.0 && latest_return < -0.05 {
            ClientIntent::Panic
        } else if state.anxiety >= 55.0 || latest_return < -0.03 {
            ClientIntent::Concerned
        } else if latest_return > 0.08 && traits.recency_bias > 65.0 {
            ClientIntent::Greedy
        } else if state.trust > 70.0 && state.satisfaction > 65.0 {
            ClientIntent::ConfidentCheckin
        } else {
            ClientIntent::NeutralCheckin
        }
    }

    /// The demand this intent implies.
    pub fn request(self) -> ClientRequest {
        match self {
            ClientIntent::OverrideThreat | ClientIntent::Panic => ClientRequest::DeRisk,
            ClientIntent::Greedy => ClientRequest::AddRisk,
            _ => ClientRequest::None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ClientIntent::OverrideThreat => {
                "Client is extremely anxious and may threaten to move money elsewhere or override your decisions."
            }
            ClientIntent::Panic => {
                "Client is panicking about losses and wants to sell everything immediately."
            }
            ClientIntent::Concerned => {
                "Client is worried about recent performance and wants reassurance."
            }
            ClientIntent::Greedy => {
                "Client is excited about recent gains and wants to take on more risk."
            }
            ClientIntent::ConfidentCheckin => {
                "Client is calm and confident, checking in to stay informed."
            }
            ClientIntent::NeutralCheckin => "Client is checking in with a routine question.",
        }
    }
}

impl fmt::Display for ClientIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClientIntent::OverrideThreat => "override_threat",
            ClientIntent::Panic => "panic",
            ClientIntent::Concerned => "concerned",
            ClientIntent::Greedy => "greedy",
            ClientIntent::ConfidentCheckin => "confident_checkin",
            ClientIntent::NeutralCheckin => "neutral_checkin",
        })
    }
}
