//! Behavioral constants for the psychology model.
//!
//! Every number the update rules use lives here so sessions can be tuned
//! without touching the rules themselves. Defaults reproduce the classic
//! advisor-training behavior.

use market::ConfigurationError;
use serde::{Deserialize, Serialize};
use types::CommunicationChoice;

use crate::client::EmotionDelta;

// =============================================================================
// Communication effects
// =============================================================================

/// Emotional effect of each communication style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationEffects {
    pub empathize: EmotionDelta,
    pub data_reassurance: EmotionDelta,
    pub hold_firm: EmotionDelta,
    pub accommodate: EmotionDelta,
    pub dismiss: EmotionDelta,
    pub no_contact: EmotionDelta,
}

impl Default for CommunicationEffects {
    fn default() -> Self {
        // (anxiety, trust, satisfaction, engagement)
        Self {
            empathize: EmotionDelta::new(-10.0, 8.0, 5.0, 3.0),
            data_reassurance: EmotionDelta::new(-5.0, 4.0, 3.0, 2.0),
            hold_firm: EmotionDelta::new(-3.0, 2.0, 1.0, 1.0),
            accommodate: EmotionDelta::new(-6.0, 3.0, 4.0, 2.0),
            dismiss: EmotionDelta::new(8.0, -10.0, -8.0, -6.0),
            no_contact: EmotionDelta::default(),
        }
    }
}

impl CommunicationEffects {
    pub fn get(&self, choice: CommunicationChoice) -> &EmotionDelta {
        match choice {
            CommunicationChoice::Empathize => &self.empathize,
            CommunicationChoice::DataReassurance => &self.data_reassurance,
            CommunicationChoice::HoldFirm => &self.hold_firm,
            CommunicationChoice::Accommodate => &self.accommodate,
            CommunicationChoice::Dismiss => &self.dismiss,
            CommunicationChoice::NoContact => &self.no_contact,
        }
    }
}

// =============================================================================
// Allocation fit
// =============================================================================

/// Penalties per unit of equity weight outside the client's risk-tolerance range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitPenalties {
    /// Anxiety added when the portfolio is too aggressive.
    pub aggressive_anxiety: f64,
    /// Trust lost when too aggressive and the client is already anxious.
    pub aggressive_trust: f64,
    pub aggressive_satisfaction: f64,
    /// Anxiety level above which an aggressive portfolio also costs trust.
    pub aggressive_trust_anxiety: f64,
    pub conservative_satisfaction: f64,
    pub conservative_engagement: f64,
}

impl Default for FitPenalties {
    fn default() -> Self {
        Self {
            aggressive_anxiety: 40.0,
            aggressive_trust: 25.0,
            aggressive_satisfaction: 15.0,
            aggressive_trust_anxiety: 60.0,
            conservative_satisfaction: 30.0,
            conservative_engagement: 20.0,
        }
    }
}

// =============================================================================
// PsychologyConfig
// =============================================================================

/// Tunable constants for [`ClientPsychologyModel`](crate::ClientPsychologyModel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsychologyConfig {
    // ─── Market reaction ────────────────────────────────────────────────
    /// Anxiety points per 1% portfolio move in the latest turn.
    pub anxiety_per_return_pct: f64,
    /// Multiplier on loss-driven anxiety. Must exceed 1.
    pub loss_aversion_ratio: f64,
    /// Trust points per 1% of mean realized return.
    pub trust_per_return_pct: f64,
    /// Satisfaction points per 1% portfolio move in the latest turn.
    pub satisfaction_per_return_pct: f64,
    /// Anxiety added at a 100% drawdown from peak, linear below.
    pub drawdown_anxiety: f64,
    /// Multiplier on regime severity.
    pub severity_weight: f64,

    // ─── Contact ────────────────────────────────────────────────────────
    /// Fraction of gain-driven calming kept while the client goes without contact.
    pub unreassured_calm_factor: f64,
    /// Anxiety added per consecutive turn without contact.
    pub neglect_anxiety_per_turn: f64,
    /// Engagement lost per consecutive turn without contact.
    pub neglect_engagement_per_turn: f64,
    pub communication: CommunicationEffects,

    // ─── Reallocation ───────────────────────────────────────────────────
    /// Anxiety change per percentage point of equity shift.
    pub equity_shift_anxiety_per_pct: f64,
    /// Trust bonus for acting on a pending client request.
    pub honored_request_trust: f64,
    /// Base trust penalty for overriding a client request, scaled by control preference.
    pub override_trust_penalty: f64,
    /// Slack around the risk-tolerance equity range before fit penalties apply.
    pub fit_slack: f64,
    pub fit: FitPenalties,

    // ─── Per-turn caps ──────────────────────────────────────────────────
    pub max_anxiety_step: f64,
    pub max_trust_step: f64,
    pub max_satisfaction_step: f64,
    pub max_engagement_step: f64,
}

impl Default for PsychologyConfig {
    fn default() -> Self {
        Self {
            anxiety_per_return_pct: 1.5,
            loss_aversion_ratio: 2.0,
            trust_per_return_pct: 0.5,
            satisfaction_per_return_pct: 0.5,
            drawdown_anxiety: 30.0,
            severity_weight: 1.0,
            unreassured_calm_factor: 0.5,
            neglect_anxiety_per_turn: 1.5,
            neglect_engagement_per_turn: 2.0,
            communication: CommunicationEffects::default(),
            equity_shift_anxiety_per_pct: 0.35,
            honored_request_trust: 3.0,
            override_trust_penalty: 6.0,
            fit_slack: 0.05,
            fit: FitPenalties::default(),
            max_anxiety_step: 25.0,
            max_trust_step: 20.0,
            max_satisfaction_step: 15.0,
            max_engagement_step: 12.0,
        }
    }
}

impl PsychologyConfig {
    pub fn with_loss_aversion_ratio(mut self, ratio: f64) -> Self {
        self.loss_aversion_ratio = ratio;
        self
    }

    pub fn with_anxiety_per_return_pct(mut self, points: f64) -> Self {
        self.anxiety_per_return_pct = points;
        self
    }

    pub fn with_override_trust_penalty(mut self, penalty: f64) -> Self {
        self.override_trust_penalty = penalty;
        self
    }

    pub fn with_communication(mut self, effects: CommunicationEffects) -> Self {
        self.communication = effects;
        self
    }

    /// Set all four per-turn caps at once: `(anxiety, trust, satisfaction, engagement)`.
    pub fn with_step_caps(mut self, caps: (f64, f64, f64, f64)) -> Self {
        self.max_anxiety_step = caps.0;
        self.max_trust_step = caps.1;
        self.max_satisfaction_step = caps.2;
        self.max_engagement_step = caps.3;
        self
    }

    /// Check every constant; the first offending field is reported.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.loss_aversion_ratio.is_finite() || self.loss_aversion_ratio <= 1.0 {
            return Err(invalid(
                "loss_aversion_ratio",
                format!("must be finite and greater than 1, got {}", self.loss_aversion_ratio),
            ));
        }
        if !self.override_trust_penalty.is_finite() || self.override_trust_penalty <= 0.0 {
            return Err(invalid(
                "override_trust_penalty",
                format!("must be finite and positive, got {}", self.override_trust_penalty),
            ));
        }
        if !(0.0..=1.0).contains(&self.unreassured_calm_factor) {
            return Err(invalid(
                "unreassured_calm_factor",
                format!("must be in [0, 1], got {}", self.unreassured_calm_factor),
            ));
        }

        let rates = [
            ("anxiety_per_return_pct", self.anxiety_per_return_pct),
            ("trust_per_return_pct", self.trust_per_return_pct),
            ("satisfaction_per_return_pct", self.satisfaction_per_return_pct),
            ("drawdown_anxiety", self.drawdown_anxiety),
            ("severity_weight", self.severity_weight),
            ("neglect_anxiety_per_turn", self.neglect_anxiety_per_turn),
            ("neglect_engagement_per_turn", self.neglect_engagement_per_turn),
            ("equity_shift_anxiety_per_pct", self.equity_shift_anxiety_per_pct),
            ("honored_request_trust", self.honored_request_trust),
            ("fit_slack", self.fit_slack),
            ("fit.aggressive_anxiety", self.fit.aggressive_anxiety),
            ("fit.aggressive_trust", self.fit.aggressive_trust),
            ("fit.aggressive_satisfaction", self.fit.aggressive_satisfaction),
            ("fit.aggressive_trust_anxiety", self.fit.aggressive_trust_anxiety),
            ("fit.conservative_satisfaction", self.fit.conservative_satisfaction),
            ("fit.conservative_engagement", self.fit.conservative_engagement),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("must be finite and non-negative, got {value}")));
            }
        }

        let caps = [
            ("max_anxiety_step", self.max_anxiety_step),
            ("max_trust_step", self.max_trust_step),
            ("max_satisfaction_step", self.max_satisfaction_step),
            ("max_engagement_step", self.max_engagement_step),
        ];
        for (name, value) in caps {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(name, format!("must be finite and positive, got {value}")));
            }
        }

        for choice in CommunicationChoice::ALL {
            let effect = self.communication.get(choice);
            let finite = [effect.anxiety, effect.trust, effect.satisfaction, effect.engagement]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(invalid("communication", format!("non-finite effect for {choice}")));
            }
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidParameter { name, reason }
}
