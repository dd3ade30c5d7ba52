//! The turn summary handed to a narrator, and the text it returns.

use std::fmt;

use psychology::ClientIntent;
use serde::{Deserialize, Serialize};
use types::{RiskTolerance, TurnNumber, fmt_pct};

/// Whether the portfolio rose or fell this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDirection {
    Gained,
    Lost,
}

impl ValueDirection {
    pub fn of(portfolio_return: f64) -> Self {
        if portfolio_return >= 0.0 {
            ValueDirection::Gained
        } else {
            ValueDirection::Lost
        }
    }
}

impl fmt::Display for ValueDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueDirection::Gained => "gained",
            ValueDirection::Lost => "lost",
        })
    }
}

/// Read-only summary of a finalized turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeContext {
    pub turn: TurnNumber,
    pub client_name: String,
    pub client_goal: String,
    pub risk_tolerance: RiskTolerance,
    pub loss_aversion: f64,
    pub anxiety: f64,
    pub trust: f64,
    pub satisfaction: f64,
    pub intent: ClientIntent,
    pub intent_description: String,
    pub regime: String,
    pub regime_description: String,
    /// Blended portfolio return this turn.
    pub portfolio_return: f64,
    pub drawdown: f64,
    pub value_direction: ValueDirection,
    pub equity_pct: u32,
    pub bond_pct: u32,
    pub cash_pct: u32,
}

impl NarrativeContext {
    /// `"+3.2%"` style return for prompts.
    pub fn return_pct(&self) -> String {
        fmt_pct(self.portfolio_return)
    }
}

/// Where a piece of narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Fallback,
}

/// Client message and market commentary for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeText {
    pub client_message: String,
    pub market_commentary: String,
    pub source: NarrativeSource,
}

impl NarrativeText {
    pub fn generated(client_message: impl Into<String>, market_commentary: impl Into<String>) -> Self {
        Self {
            client_message: client_message.into(),
            market_commentary: market_commentary.into(),
            source: NarrativeSource::Generated,
        }
    }

    /// Canned text for `context`, marked as fallback.
    pub fn fallback(context: &NarrativeContext) -> Self {
        let name = &context.client_name;
        let goal = &context.client_goal;
        let ret = context.return_pct();

        let client_message = match context.intent {
            ClientIntent::OverrideThreat => format!(
                "{name}: I've had enough. The portfolio is down and I want to move everything to cash right now. I don't care what the plan says."
            ),
            ClientIntent::Panic => format!(
                "{name}: We're down {ret} and I'm seeing terrible news everywhere. I'm seriously questioning whether we should change our approach. My {goal} is at risk."
            ),
            ClientIntent::Concerned => format!(
                "{name}: I noticed we're at {ret} this period. Can you help me understand what's happening and whether our strategy for {goal} still makes sense?"
            ),
            ClientIntent::Greedy => format!(
                "{name}: Great period! We're up {ret}. The market looks really strong right now. Should we be putting more into stocks?"
            ),
            ClientIntent::ConfidentCheckin => format!(
                "{name}: Just checking in. Things have been looking solid. Are we still on track for {goal}?"
            ),
            ClientIntent::NeutralCheckin => {
                format!("{name}: How are we doing this period? Any updates I should know about?")
            }
        };
        let market_commentary = format!(
            "{} conditions resulted in a {ret} portfolio return this period.",
            context.regime
        );

        Self {
            client_message,
            market_commentary,
            source: NarrativeSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == NarrativeSource::Fallback
    }
}

impl fmt::Display for NarrativeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fallback() {
            write!(f, "[offline] ")?;
        }
        write!(f, "{}\n{}", self.client_message, self.market_commentary)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_context(intent: ClientIntent, portfolio_return: f64) -> NarrativeContext {
        NarrativeContext {
            turn: TurnNumber(3),
            client_name: "Maya".into(),
            client_goal: "buying a home in 5 years".into(),
            risk_tolerance: RiskTolerance::Medium,
            loss_aversion: 70.0,
            anxiety: 62.0,
            trust: 48.0,
            satisfaction: 50.0,
            intent,
            intent_description: intent.description().into(),
            regime: "correction".into(),
            regime_description: "Stocks pulled back after a strong run.".into(),
            portfolio_return,
            drawdown: 0.06,
            value_direction: ValueDirection::of(portfolio_return),
            equity_pct: 60,
            bond_pct: 30,
            cash_pct: 10,
        }
    }

    #[test]
    fn test_fallback_is_marked() {
        let ctx = sample_context(ClientIntent::Panic, -0.072);
        let text = NarrativeText::fallback(&ctx);
        assert!(text.is_fallback());
        assert!(text.client_message.starts_with("Maya:"));
        assert!(text.client_message.contains("-7.2%"));
        assert!(text.market_commentary.contains("correction"));
        assert!(text.to_string().starts_with("[offline]"));
    }

    #[test]
    fn test_fallback_covers_every_intent() {
        for intent in [
            ClientIntent::OverrideThreat,
            ClientIntent::Panic,
            ClientIntent::Concerned,
            ClientIntent::Greedy,
            ClientIntent::ConfidentCheckin,
            ClientIntent::NeutralCheckin,
        ] {
            let text = NarrativeText::fallback(&sample_context(intent, 0.01));
            assert!(!text.client_message.is_empty());
        }
    }

    #[test]
    fn test_value_direction() {
        assert_eq!(ValueDirection::of(0.0), ValueDirection::Gained);
        assert_eq!(ValueDirection::of(-0.01), ValueDirection::Lost);
    }
}
