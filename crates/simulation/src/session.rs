//! The turn-based session state machine.
//!
//! ```text
//!   AwaitingDecision --submit_decision--> Resolving
//!          ^                                  |
//!          |                             resolve_turn
//!   attach_narrative                          |
//!          |                                  v
//!          +--------------------------- TurnComplete
//!
//!   end_session: any phase --> Ended
//! ```
//!
//! The session also ends on its own. When a resolved turn reaches the turn
//! limit or drops the client below the departure thresholds, the end reason
//! is recorded and the session moves to `Ended` as soon as that turn's
//! narrative is attached.
//!
//! Each turn resolves in a fixed order: sample the next regime, apply the
//! blended return to the portfolio, then update the client's psychology.
//! Everything is computed before anything is committed, so a failed
//! operation leaves the session untouched.

use std::fmt;
use std::time::Duration;

use market::{MarketRegime, MarketRegimeProcess, RegimeId};
use narrative::{NarrativeContext, NarrativeError, NarrativeText, Narrator, ValueDirection};
use portfolio::Portfolio;
use psychology::{
    AdvisorAction, Client, ClientIntent, ClientPsychologyModel, ClientRequest, EmotionalState,
    PsychologyInput,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use types::{Allocation, TurnNumber};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::decision::{Decision, Reallocation};
use crate::error::{Result, SessionError};
use crate::scoring::{self, CareerReport};
use crate::snapshot::SessionSnapshot;
use crate::turn::{RegimeOutcome, Turn, TurnRecord};

/// Salt mixed into the seed for client generation so clients and market
/// draws come from independent streams.
const CLIENT_SEED_SALT: u64 = 0x5eed_c11e_47a1_0001;

// =============================================================================
// Identity and phase
// =============================================================================

/// Unique session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingDecision,
    Resolving,
    TurnComplete,
    Ended,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::AwaitingDecision => "awaiting a decision",
            SessionPhase::Resolving => "resolving",
            SessionPhase::TurnComplete => "awaiting narrative",
            SessionPhase::Ended => "ended",
        })
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The configured number of turns was played.
    TurnLimit,
    /// Trust fell below the departure threshold.
    TrustLost,
    /// Engagement fell below the departure threshold.
    Disengaged,
    /// [`SimulationSession::end_session`] was called.
    Closed,
}

impl EndReason {
    /// Whether the client walked away.
    pub fn is_departure(self) -> bool {
        matches!(self, EndReason::TrustLost | EndReason::Disengaged)
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndReason::TurnLimit => "turn limit reached",
            EndReason::TrustLost => "client lost trust and left",
            EndReason::Disengaged => "client disengaged and left",
            EndReason::Closed => "ended by the advisor",
        })
    }
}

/// A submitted decision waiting to be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDecision {
    pub decision: Decision,
    /// Allocation before the decision was applied.
    pub previous_allocation: Allocation,
}

/// Output of [`SimulationSession::resolve_turn`].
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResolution {
    pub turn: Turn,
    pub context: NarrativeContext,
}

// =============================================================================
// SimulationSession
// =============================================================================

/// One advisor, one client, one portfolio, one market.
pub struct SimulationSession {
    id: SessionId,
    config: SessionConfig,
    client: Client,
    portfolio: Portfolio,
    market: MarketRegimeProcess,
    model: ClientPsychologyModel,
    current_regime: RegimeId,
    phase: SessionPhase,
    turns: Vec<Turn>,
    pending_decision: Option<PendingDecision>,
    pending_context: Option<NarrativeContext>,
    pending_request: ClientRequest,
    turns_without_contact: u32,
    end_reason: Option<EndReason>,
}

impl SimulationSession {
    /// Start a session for `client`. The market is seeded with `seed`.
    pub fn new(config: SessionConfig, client: Client, seed: u64) -> Result<Self> {
        let market = MarketRegimeProcess::new(&config.regimes, seed)?;
        let model = ClientPsychologyModel::new(config.psychology.clone())?;
        let current_regime = market.require(&config.initial_regime)?;
        let portfolio = Portfolio::new(config.initial_value, config.initial_allocation)?;

        let session = Self {
            id: SessionId::new(),
            config,
            client,
            portfolio,
            market,
            model,
            current_regime,
            phase: SessionPhase::AwaitingDecision,
            turns: Vec::new(),
            pending_decision: None,
            pending_context: None,
            pending_request: ClientRequest::None,
            turns_without_contact: 0,
            end_reason: None,
        };

        info!(
            session = %session.id,
            client = %session.client.profile.name,
            risk_tolerance = %session.client.profile.risk_tolerance,
            regime = %session.config.initial_regime,
            value = session.portfolio.value(),
            "Session started"
        );
        Ok(session)
    }

    /// Start a session with a client generated from `seed`.
    pub fn with_random_client(config: SessionConfig, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed ^ CLIENT_SEED_SALT);
        let client = Client::random(&mut rng);
        Self::new(config, client, seed)
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn current_regime(&self) -> &MarketRegime {
        // The cursor only ever holds ids issued by this process.
        &self.market.regimes()[self.current_regime.0]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number the next turn will carry.
    pub fn next_turn_number(&self) -> TurnNumber {
        TurnNumber(self.turns.len() as u32 + 1)
    }

    /// Why the session ended, or is about to once the latest narrative lands.
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// No further decisions will be accepted.
    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::Ended || self.end_reason.is_some()
    }

    /// What the client is asking for right now.
    pub fn pending_request(&self) -> ClientRequest {
        self.pending_request
    }

    /// How the client approaches the advisor right now.
    pub fn client_intent(&self) -> ClientIntent {
        let latest = self.portfolio.last_return().unwrap_or(0.0);
        ClientIntent::classify(&self.client.state(), &self.client.profile.traits, latest)
    }

    // ─── Turn loop ──────────────────────────────────────────────────────

    /// Apply the advisor's decision. The turn is resolved separately.
    pub fn submit_decision(&mut self, decision: Decision) -> Result<()> {
        self.expect_phase("submit a decision", SessionPhase::AwaitingDecision)?;

        let previous_allocation = self.portfolio.allocation();
        match &decision.reallocation {
            Reallocation::Hold => {}
            Reallocation::Target(weights) => {
                self.portfolio.reallocate(weights)?;
            }
            Reallocation::Preset(preset) => {
                self.portfolio.set_allocation(preset.apply(&previous_allocation));
            }
        }

        debug!(
            session = %self.id,
            turn = %self.next_turn_number(),
            allocation = %self.portfolio.allocation(),
            communication = %decision.communication,
            "Decision submitted"
        );

        self.pending_decision = Some(PendingDecision {
            decision,
            previous_allocation,
        });
        self.phase = SessionPhase::Resolving;
        Ok(())
    }

    /// Sample the market, apply the return and update the client.
    pub fn resolve_turn(&mut self) -> Result<TurnResolution> {
        self.expect_phase("resolve a turn", SessionPhase::Resolving)?;
        let Some(pending) = self.pending_decision.clone() else {
            return Err(self.invalid_state("resolve a turn"));
        };

        let number = self.next_turn_number();
        let from = self.current_regime().clone();

        // 1. Market
        let draw = self.market.sample_next(self.current_regime)?;
        let to = self
            .market
            .regime(draw.regime)
            .cloned()
            .ok_or(market::MarketError::UnknownRegime(draw.regime.0))?;

        // 2. Portfolio
        let mut portfolio = self.portfolio.clone();
        let applied = portfolio.apply_return(&draw.returns);
        let drawdown = portfolio.drawdown_from_peak();

        // 3. Psychology
        let communication = pending.decision.communication;
        let turns_without_contact = if communication.is_contact() {
            0
        } else {
            self.turns_without_contact + 1
        };
        let equity_shift = portfolio.allocation().equity() - pending.previous_allocation.equity();
        let action = AdvisorAction::new(communication)
            .with_equity_shift(equity_shift)
            .with_pending_request(self.pending_request);
        let outcome = self.model.update(
            &self.client.profile,
            &PsychologyInput {
                state: self.client.state(),
                latest_return: applied.effective,
                return_history: portfolio.returns(),
                drawdown,
                regime_severity: to.severity,
                equity_weight: portfolio.allocation().equity(),
                action,
                turns_since_last_contact: turns_without_contact,
            },
        );
        let intent =
            ClientIntent::classify(&outcome.next, &self.client.profile.traits, applied.effective);
        let end_reason = self.end_check(number, &outcome.next);

        let turn = Turn::finalize(TurnRecord {
            number,
            decision: pending.decision,
            allocation: portfolio.allocation(),
            equity_shift,
            regime: RegimeOutcome {
                from: from.name.clone(),
                from_crisis: from.crisis,
                from_downturn: from.downturn,
                to: to.name.clone(),
                to_crisis: to.crisis,
                to_downturn: to.downturn,
                returns: draw.returns,
            },
            portfolio_return: applied.effective,
            value_after: applied.value_after,
            drawdown,
            raw_delta: outcome.raw,
            applied_delta: outcome.applied,
            state_after: outcome.next,
            request_faced: self.pending_request,
            overrode_request: outcome.overrode_request,
            intent_after: intent,
        });

        // Commit.
        self.portfolio = portfolio;
        self.client.set_state(outcome.next);
        self.current_regime = draw.regime;
        self.turns_without_contact = turns_without_contact;
        self.pending_request = intent.request();
        self.pending_decision = None;
        self.end_reason = end_reason;
        self.turns.push(turn.clone());

        let context = self.narrative_context(&turn, &to, intent);
        self.pending_context = Some(context.clone());
        self.phase = SessionPhase::TurnComplete;

        for line in &outcome.breakdown {
            debug!(session = %self.id, turn = %number, "{line}");
        }
        info!(
            session = %self.id,
            turn = %number,
            regime = %to.name,
            portfolio_return = applied.effective,
            value = applied.value_after,
            anxiety = outcome.next.anxiety,
            trust = outcome.next.trust,
            intent = %intent,
            overrode_request = outcome.overrode_request,
            "Turn resolved"
        );
        if let Some(reason) = end_reason {
            info!(session = %self.id, turn = %number, reason = %reason, "Final turn");
        }

        Ok(TurnResolution { turn, context })
    }

    /// Attach narrative text to the latest turn. Failures become fallback text.
    pub fn attach_narrative(
        &mut self,
        result: std::result::Result<NarrativeText, NarrativeError>,
    ) -> Result<NarrativeText> {
        self.expect_phase("attach narrative", SessionPhase::TurnComplete)?;
        let Some(context) = self.pending_context.take() else {
            return Err(self.invalid_state("attach narrative"));
        };

        let text = match result {
            Ok(text)
                if !text.client_message.trim().is_empty()
                    && !text.market_commentary.trim().is_empty() =>
            {
                text
            }
            Ok(_) => {
                warn!(session = %self.id, turn = %context.turn, "Narrator returned empty text, using fallback");
                NarrativeText::fallback(&context)
            }
            Err(e) => {
                warn!(session = %self.id, turn = %context.turn, error = %e, "Narrative failed, using fallback");
                NarrativeText::fallback(&context)
            }
        };

        if let Some(turn) = self.turns.last_mut() {
            turn.attach_narrative(text.clone());
        }
        match self.end_reason {
            Some(reason) => self.close(reason),
            None => self.phase = SessionPhase::AwaitingDecision,
        }
        Ok(text)
    }

    /// Run `narrator` on the latest turn, bounded by `timeout`, and attach the result.
    pub async fn narrate<N>(&mut self, narrator: &N, timeout: Duration) -> Result<NarrativeText>
    where
        N: Narrator + Sync,
    {
        self.expect_phase("narrate", SessionPhase::TurnComplete)?;
        let Some(context) = self.pending_context.clone() else {
            return Err(self.invalid_state("narrate"));
        };

        let result = match tokio::time::timeout(timeout, narrator.generate(&context)).await {
            Ok(result) => result,
            Err(_) => Err(NarrativeError::Timeout(timeout)),
        };
        self.attach_narrative(result)
    }

    /// Play one full turn: decide, resolve, narrate.
    pub async fn advance_turn<N>(&mut self, decision: Decision, narrator: &N) -> Result<Turn>
    where
        N: Narrator + Sync,
    {
        self.submit_decision(decision)?;
        let TurnResolution { mut turn, .. } = self.resolve_turn()?;
        let text = self.narrate(narrator, self.config.narrative_timeout).await?;
        turn.attach_narrative(text);
        Ok(turn)
    }

    /// Close the session and score it. Idempotent.
    ///
    /// A submitted but unresolved decision is discarded and its reallocation
    /// rolled back, so every allocation change has a turn behind it.
    pub fn end_session(&mut self) -> CareerReport {
        if self.phase != SessionPhase::Ended {
            if let Some(pending) = self.pending_decision.take() {
                self.portfolio.set_allocation(pending.previous_allocation);
            }
            self.close(self.end_reason.unwrap_or(EndReason::Closed));
        }
        self.career_report()
    }

    /// Score the session as it stands.
    pub fn career_report(&self) -> CareerReport {
        scoring::evaluate(
            &self.turns,
            &self.client.state(),
            self.portfolio.initial_value(),
            self.portfolio.value(),
        )
    }

    // ─── Snapshots ──────────────────────────────────────────────────────

    /// Owned, serializable copy of the session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            phase: self.phase,
            client: self.client.clone(),
            portfolio: self.portfolio.clone(),
            current_regime: self.current_regime().name.clone(),
            turns: self.turns.clone(),
            pending_decision: self.pending_decision.clone(),
            pending_context: self.pending_context.clone(),
            pending_request: self.pending_request,
            turns_without_contact: self.turns_without_contact,
            end_reason: self.end_reason,
        }
    }

    /// Rebuild a session from a snapshot. Market draws continue from `seed`.
    pub fn restore(snapshot: SessionSnapshot, config: SessionConfig, seed: u64) -> Result<Self> {
        snapshot.check_consistency()?;
        let market = MarketRegimeProcess::new(&config.regimes, seed)?;
        let model = ClientPsychologyModel::new(config.psychology.clone())?;
        let current_regime = market.require(&snapshot.current_regime)?;

        info!(
            session = %snapshot.id,
            turns = snapshot.turns.len(),
            phase = %snapshot.phase,
            "Session restored"
        );

        Ok(Self {
            id: snapshot.id,
            config,
            client: snapshot.client,
            portfolio: snapshot.portfolio,
            market,
            model,
            current_regime,
            phase: snapshot.phase,
            turns: snapshot.turns,
            pending_decision: snapshot.pending_decision,
            pending_context: snapshot.pending_context,
            pending_request: snapshot.pending_request,
            turns_without_contact: snapshot.turns_without_contact,
            end_reason: snapshot.end_reason,
        })
    }

    // ─── Helpers ────────────────────────────────────────────────────────

    /// Departure takes precedence over the turn limit.
    fn end_check(&self, number: TurnNumber, state: &EmotionalState) -> Option<EndReason> {
        if let Some(limits) = &self.config.departure {
            if state.trust < limits.min_trust {
                return Some(EndReason::TrustLost);
            }
            if state.engagement < limits.min_engagement {
                return Some(EndReason::Disengaged);
            }
        }
        match self.config.max_turns {
            Some(max) if number.0 >= max => Some(EndReason::TurnLimit),
            _ => None,
        }
    }

    fn close(&mut self, reason: EndReason) {
        self.phase = SessionPhase::Ended;
        self.end_reason = Some(reason);
        self.pending_decision = None;
        self.pending_context = None;
        info!(
            session = %self.id,
            reason = %reason,
            turns = self.turns.len(),
            value = self.portfolio.value(),
            total_return = self.portfolio.total_return(),
            trust = self.client.trust(),
            "Session ended"
        );
    }

    fn expect_phase(&self, operation: &'static str, expected: SessionPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            phase: self.phase,
        }
    }

    fn narrative_context(
        &self,
        turn: &Turn,
        regime: &MarketRegime,
        intent: ClientIntent,
    ) -> NarrativeContext {
        let profile = &self.client.profile;
        let state = self.client.state();
        let (equity_pct, bond_pct, cash_pct) = turn.allocation().percentages();
        NarrativeContext {
            turn: turn.number(),
            client_name: profile.name.clone(),
            client_goal: profile.goal.clone(),
            risk_tolerance: profile.risk_tolerance,
            loss_aversion: profile.traits.loss_aversion,
            anxiety: state.anxiety,
            trust: state.trust,
            satisfaction: state.satisfaction,
            intent,
            intent_description: intent.description().to_string(),
            regime: regime.name.clone(),
            regime_description: regime.description.clone(),
            portfolio_return: turn.portfolio_return(),
            drawdown: turn.drawdown(),
            value_direction: ValueDirection::of(turn.portfolio_return()),
            equity_pct,
            bond_pct,
            cash_pct,
        }
    }
}
