//! The per-turn emotional update.
//!
//! [`ClientPsychologyModel::update`] is a pure function of the client's
//! profile, their current state and what happened this turn. It never
//! touches the session; the caller decides whether to commit the result.
//!
//! # Rules
//!
//! - **Loss aversion**: the latest portfolio move drives anxiety, and losses
//!   weigh `loss_aversion_ratio` times as much as gains of the same size.
//!   Against an otherwise identical turn with a flat portfolio, a loss moves
//!   anxiety further than an equal gain, whatever the regime or reply.
//! - **Recency bias**: anxiety reacts to the latest return only, while trust
//!   follows the mean of every realized return.
//! - **Control preference**: overriding a pending client request discards all
//!   positive trust and subtracts a penalty.
//!
//! Raw deltas are capped per turn, then the resulting levels are clamped.

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::CommunicationChoice;

use market::ConfigurationError;

use crate::client::{ClientProfile, EmotionDelta, EmotionalState, PersonalityTraits};
use crate::config::PsychologyConfig;
use crate::intent::ClientRequest;

// =============================================================================
// Inputs
// =============================================================================

/// What the advisor did this turn, as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvisorAction {
    pub communication: CommunicationChoice,
    /// Equity weight after the decision minus equity weight before.
    pub equity_shift: f64,
    /// What the client asked for going into the turn.
    pub pending_request: ClientRequest,
}

impl AdvisorAction {
    pub fn new(communication: CommunicationChoice) -> Self {
        Self {
            communication,
            equity_shift: 0.0,
            pending_request: ClientRequest::None,
        }
    }

    pub fn with_equity_shift(mut self, shift: f64) -> Self {
        self.equity_shift = shift;
        self
    }

    pub fn with_pending_request(mut self, request: ClientRequest) -> Self {
        self.pending_request = request;
        self
    }

    /// Whether this action overrides the pending request, given the equity
    /// weight it leaves in force.
    pub fn overrides_request(&self, equity_weight: f64) -> bool {
        self.pending_request
            .is_overridden_by(equity_weight, self.equity_shift, self.communication)
    }

    /// A pending request was acted on or is already satisfied.
    pub fn honors_request(&self, equity_weight: f64) -> bool {
        self.pending_request.is_pending() && !self.overrides_request(equity_weight)
    }
}

/// Everything the model needs for one update.
#[derive(Debug, Clone, Copy)]
pub struct PsychologyInput<'a> {
    pub state: EmotionalState,
    /// Blended portfolio return realized this turn.
    pub latest_return: f64,
    /// Every realized return so far, this turn's included.
    pub return_history: &'a [f64],
    /// Drawdown from peak in `[0, 1]` after this turn's return.
    pub drawdown: f64,
    pub regime_severity: f64,
    /// Equity weight in force during the turn.
    pub equity_weight: f64,
    pub action: AdvisorAction,
    /// Consecutive turns without contact, this one included. Zero when the
    /// advisor reached out this turn.
    pub turns_since_last_contact: u32,
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of one update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychologyOutcome {
    /// Deltas before per-turn caps and bound clamping.
    pub raw: EmotionDelta,
    /// Deltas actually applied: `next - current`.
    pub applied: EmotionDelta,
    pub next: EmotionalState,
    pub overrode_request: bool,
    /// Human-readable contributions, for logging and debriefs.
    pub breakdown: Vec<String>,
}

impl PsychologyOutcome {
    pub fn anxiety_delta(&self) -> f64 {
        self.applied.anxiety
    }

    pub fn trust_delta(&self) -> f64 {
        self.applied.trust
    }
}

// =============================================================================
// ClientPsychologyModel
// =============================================================================

/// Applies behavioral update rules to a client's emotional state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPsychologyModel {
    config: PsychologyConfig,
}

impl ClientPsychologyModel {
    /// Build a model. Fails if any constant is out of range.
    pub fn new(config: PsychologyConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PsychologyConfig {
        &self.config
    }

    /// Compute the client's next emotional state.
    pub fn update(&self, profile: &ClientProfile, input: &PsychologyInput<'_>) -> PsychologyOutcome {
        let cfg = &self.config;
        let traits = &profile.traits;
        let mut raw = EmotionDelta::default();
        let mut breakdown = Vec::new();

        // ─── Market: latest move, drawdown, regime ──────────────────────

        let performance = self.performance_anxiety(traits, input);
        raw.anxiety += performance;
        if performance != 0.0 {
            breakdown.push(format!("portfolio move: anxiety {performance:+.1}"));
        }

        let drawdown = input.drawdown.clamp(0.0, 1.0) * cfg.drawdown_anxiety;
        raw.anxiety += drawdown;
        if drawdown > 0.0 {
            breakdown.push(format!("drawdown from peak: anxiety {drawdown:+.1}"));
        }

        let mut situational = input.regime_severity * cfg.severity_weight * traits.loss_aversion / 100.0;

        // ─── Advisor: communication and reallocation ────────────────────

        let comm = cfg.communication.get(input.action.communication);
        situational += comm.anxiety;
        situational += input.action.equity_shift * 100.0 * cfg.equity_shift_anxiety_per_pct;

        // Fear lands harder and calms slower for loss-averse clients.
        let sensitivity = loss_sensitivity(traits);
        situational = if situational > 0.0 {
            situational * sensitivity
        } else {
            situational / sensitivity
        };
        raw.anxiety += situational;
        breakdown.push(format!(
            "regime and {}: anxiety {situational:+.1}",
            input.action.communication
        ));

        let mean_return = mean(input.return_history);
        raw.trust += comm.trust + mean_return * 100.0 * cfg.trust_per_return_pct;
        if input.action.honors_request(input.equity_weight) {
            raw.trust += cfg.honored_request_trust;
            breakdown.push(format!("honored {:?} request", input.action.pending_request));
        }
        if raw.trust > 0.0 {
            raw.trust *= 0.75 + traits.trust_propensity / 100.0 * 0.5;
        }

        raw.satisfaction += comm.satisfaction + input.latest_return * 100.0 * cfg.satisfaction_per_return_pct;
        raw.engagement += comm.engagement;

        // ─── Neglect ────────────────────────────────────────────────────

        if input.turns_since_last_contact > 0 {
            let turns = input.turns_since_last_contact as f64;
            raw.anxiety += cfg.neglect_anxiety_per_turn * turns;
            raw.engagement -= cfg.neglect_engagement_per_turn * turns;
            breakdown.push(format!("{turns} turn(s) without contact"));
        }

        // ─── Allocation fit ─────────────────────────────────────────────

        let fit = self.allocation_fit(profile, input);
        raw.anxiety += fit.anxiety;
        raw.trust += fit.trust;
        raw.satisfaction += fit.satisfaction;
        raw.engagement += fit.engagement;
        if fit != EmotionDelta::default() {
            breakdown.push(format!(
                "equity {:.0}% outside {} tolerance",
                input.equity_weight * 100.0,
                profile.risk_tolerance
            ));
        }

        // ─── Control preference ─────────────────────────────────────────

        let overrode_request = input.action.overrides_request(input.equity_weight);
        if overrode_request {
            let penalty =
                cfg.override_trust_penalty * (0.5 + traits.control_preference / 100.0);
            raw.trust = raw.trust.min(0.0) - penalty;
            breakdown.push(format!(
                "overrode {:?} request: trust penalty {penalty:.1}",
                input.action.pending_request
            ));
        }

        let capped = EmotionDelta::new(
            raw.anxiety.clamp(-cfg.max_anxiety_step, cfg.max_anxiety_step),
            raw.trust.clamp(-cfg.max_trust_step, cfg.max_trust_step),
            raw.satisfaction
                .clamp(-cfg.max_satisfaction_step, cfg.max_satisfaction_step),
            raw.engagement
                .clamp(-cfg.max_engagement_step, cfg.max_engagement_step),
        );
        let next = input.state.after(&capped);
        let applied = next.delta_from(&input.state);

        debug!(
            client = %profile.name,
            raw_anxiety = raw.anxiety,
            raw_trust = raw.trust,
            anxiety = next.anxiety,
            trust = next.trust,
            overrode_request,
            "Psychology update"
        );

        PsychologyOutcome {
            raw,
            applied,
            next,
            overrode_request,
            breakdown,
        }
    }

    /// Anxiety from the latest portfolio move alone.
    fn performance_anxiety(&self, traits: &PersonalityTraits, input: &PsychologyInput<'_>) -> f64 {
        let cfg = &self.config;
        let r = input.latest_return;
        if !r.is_finite() || r == 0.0 {
            return 0.0;
        }
        let recency = 0.75 + traits.recency_bias / 100.0 * 0.5;
        let magnitude =
            cfg.anxiety_per_return_pct * r.abs() * 100.0 * loss_sensitivity(traits) * recency;
        if r < 0.0 {
            magnitude * cfg.loss_aversion_ratio
        } else if input.turns_since_last_contact > 0 {
            -magnitude * cfg.unreassured_calm_factor
        } else {
            -magnitude
        }
    }

    /// Penalties for an allocation outside the client's comfort zone.
    fn allocation_fit(&self, profile: &ClientProfile, input: &PsychologyInput<'_>) -> EmotionDelta {
        let cfg = &self.config;
        let (low, high) = profile.risk_tolerance.equity_range();
        let equity = input.equity_weight;

        if equity > high + cfg.fit_slack {
            let gap = equity - high;
            let trust = if input.state.anxiety > cfg.fit.aggressive_trust_anxiety {
                -gap * cfg.fit.aggressive_trust
            } else {
                0.0
            };
            EmotionDelta::new(
                gap * cfg.fit.aggressive_anxiety,
                trust,
                -gap * cfg.fit.aggressive_satisfaction,
                0.0,
            )
        } else if equity < low - cfg.fit_slack {
            let gap = low - equity;
            EmotionDelta::new(
                0.0,
                0.0,
                -gap * cfg.fit.conservative_satisfaction,
                -gap * cfg.fit.conservative_engagement,
            )
        } else {
            EmotionDelta::default()
        }
    }
}

/// 0.75 at no loss aversion, 1.35 at full.
fn loss_sensitivity(traits: &PersonalityTraits) -> f64 {
    0.75 + traits.loss_aversion / 100.0 * 0.6
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
