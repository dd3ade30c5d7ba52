//! Finalized turn records.

use market::RegimeReturn;
use narrative::NarrativeText;
use psychology::{ClientIntent, ClientRequest, EmotionDelta, EmotionalState};
use serde::{Deserialize, Serialize};
use types::{Allocation, TurnNumber};

use crate::decision::Decision;

/// Regime facts captured at resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeOutcome {
    /// Regime in force when the decision was made.
    pub from: String,
    pub from_crisis: bool,
    #[serde(default)]
    pub from_downturn: bool,
    /// Regime realized this turn.
    pub to: String,
    pub to_crisis: bool,
    #[serde(default)]
    pub to_downturn: bool,
    pub returns: RegimeReturn,
}

/// One resolved turn. Immutable apart from a single narrative attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    number: TurnNumber,
    decision: Decision,
    allocation: Allocation,
    equity_shift: f64,
    regime: RegimeOutcome,
    portfolio_return: f64,
    value_after: f64,
    drawdown: f64,
    raw_delta: EmotionDelta,
    applied_delta: EmotionDelta,
    state_after: EmotionalState,
    request_faced: ClientRequest,
    overrode_request: bool,
    intent_after: ClientIntent,
    narrative: Option<NarrativeText>,
}

/// Everything a turn records, gathered before it is finalized.
pub(crate) struct TurnRecord {
    pub number: TurnNumber,
    pub decision: Decision,
    pub allocation: Allocation,
    pub equity_shift: f64,
    pub regime: RegimeOutcome,
    pub portfolio_return: f64,
    pub value_after: f64,
    pub drawdown: f64,
    pub raw_delta: EmotionDelta,
    pub applied_delta: EmotionDelta,
    pub state_after: EmotionalState,
    pub request_faced: ClientRequest,
    pub overrode_request: bool,
    pub intent_after: ClientIntent,
}

impl Turn {
    pub(crate) fn finalize(record: TurnRecord) -> Self {
        Self {
            number: record.number,
            decision: record.decision,
            allocation: record.allocation,
            equity_shift: record.equity_shift,
            regime: record.regime,
            portfolio_return: record.portfolio_return,
            value_after: record.value_after,
            drawdown: record.drawdown,
            raw_delta: record.raw_delta,
            applied_delta: record.applied_delta,
            state_after: record.state_after,
            request_faced: record.request_faced,
            overrode_request: record.overrode_request,
            intent_after: record.intent_after,
            narrative: None,
        }
    }

    /// Attach narrative text. Only the first attachment sticks.
    pub(crate) fn attach_narrative(&mut self, text: NarrativeText) -> bool {
        if self.narrative.is_some() {
            return false;
        }
        self.narrative = Some(text);
        true
    }

    pub fn number(&self) -> TurnNumber {
        self.number
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    /// Allocation in force during the turn.
    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    /// Equity weight change made by the decision.
    pub fn equity_shift(&self) -> f64 {
        self.equity_shift
    }

    pub fn regime(&self) -> &RegimeOutcome {
        &self.regime
    }

    pub fn regime_return(&self) -> &RegimeReturn {
        &self.regime.returns
    }

    /// Effective blended return applied to the portfolio.
    pub fn portfolio_return(&self) -> f64 {
        self.portfolio_return
    }

    pub fn value_after(&self) -> f64 {
        self.value_after
    }

    pub fn drawdown(&self) -> f64 {
        self.drawdown
    }

    /// Psychology deltas before caps and clamping.
    pub fn raw_delta(&self) -> &EmotionDelta {
        &self.raw_delta
    }

    pub fn applied_delta(&self) -> &EmotionDelta {
        &self.applied_delta
    }

    pub fn state_after(&self) -> &EmotionalState {
        &self.state_after
    }

    /// The client's request going into the turn.
    pub fn request_faced(&self) -> ClientRequest {
        self.request_faced
    }

    pub fn overrode_request(&self) -> bool {
        self.overrode_request
    }

    /// How the client approaches the next turn.
    pub fn intent_after(&self) -> ClientIntent {
        self.intent_after
    }

    pub fn narrative(&self) -> Option<&NarrativeText> {
        self.narrative.as_ref()
    }
}
