//! Advisor communication choices.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the advisor responds to the client this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationChoice {
    /// Acknowledge feelings and explain the reasoning calmly.
    Empathize,
    /// Reassure with facts and historical data.
    DataReassurance,
    /// Stick to the agreed plan.
    #[default]
    HoldFirm,
    /// Agree with the client's concern and act quickly.
    Accommodate,
    /// Minimize the client's concern.
    Dismiss,
    /// No contact this period.
    NoContact,
}

impl CommunicationChoice {
    pub const ALL: [CommunicationChoice; 6] = [
        CommunicationChoice::Empathize,
        CommunicationChoice::DataReassurance,
        CommunicationChoice::HoldFirm,
        CommunicationChoice::Accommodate,
        CommunicationChoice::Dismiss,
        CommunicationChoice::NoContact,
    ];

    /// Whether the advisor actually reached out to the client.
    pub fn is_contact(self) -> bool {
        !matches!(self, CommunicationChoice::NoContact)
    }

    pub fn is_dismissive(self) -> bool {
        matches!(self, CommunicationChoice::Dismiss)
    }

    /// Communication styles that hold up well during a crisis.
    pub fn is_crisis_appropriate(self) -> bool {
        matches!(
            self,
            CommunicationChoice::Empathize
                | CommunicationChoice::DataReassurance
                | CommunicationChoice::HoldFirm
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            CommunicationChoice::Empathize => "Empathize and explain calmly",
            CommunicationChoice::DataReassurance => "Data-focused reassurance",
            CommunicationChoice::HoldFirm => "Firm boundary (stick to the plan)",
            CommunicationChoice::Accommodate => "Agree and act quickly",
            CommunicationChoice::Dismiss => "Dismissive / minimize concern",
            CommunicationChoice::NoContact => "No contact",
        }
    }
}

impl fmt::Display for CommunicationChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
