//! End-to-end session scenarios.

use std::time::Duration;

use market::{AssetReturns, RegimeSpec, RegimeTable, ReturnDistribution};
use narrative::{FallbackNarrator, NarrativeContext, NarrativeError, NarrativeText, Narrator};
use portfolio::{MIN_VALUE, ReallocationPreset};
use psychology::{Client, ClientProfile, ClientRequest, EmotionalState, PersonalityTraits};
use simulation::{
    Decision, EndReason, SessionConfig, SessionError, SessionPhase, SessionSnapshot,
    SimulationSession,
};
use types::{Allocation, CommunicationChoice, RiskTolerance};

// =============================================================================
// Fixtures
// =============================================================================

fn fixed_returns(equity: f64, bond: f64, cash: f64) -> AssetReturns {
    AssetReturns {
        equity: ReturnDistribution::fixed(equity),
        bond: ReturnDistribution::fixed(bond),
        cash: ReturnDistribution::fixed(cash),
    }
}

/// A single calm regime with strictly positive draws.
fn steady_growth_table() -> RegimeTable {
    let returns = AssetReturns {
        equity: ReturnDistribution::uniform(0.06, 0.02),
        bond: ReturnDistribution::uniform(0.02, 0.01),
        cash: ReturnDistribution::fixed(0.005),
    };
    RegimeTable::new(vec![
        RegimeSpec::new("calm-growth", "Steady gains across the board.", -5.0, returns)
            .to("calm-growth", 1.0),
    ])
}

/// Calm now, crash next, crash forever.
fn crash_table() -> RegimeTable {
    RegimeTable::new(vec![
        RegimeSpec::new("calm-growth", "Quiet markets.", -5.0, fixed_returns(0.02, 0.01, 0.005))
            .to("crash", 1.0),
        RegimeSpec::new("crash", "Stocks collapse.", 25.0, fixed_returns(-0.40, 0.0, 0.0))
            .as_crisis()
            .to("crash", 1.0),
    ])
}

/// No turn limit and no departures, for scenarios about something else.
fn open_ended() -> SessionConfig {
    SessionConfig::default()
        .with_max_turns(None)
        .with_departure(None)
}

fn client(tolerance: RiskTolerance, anxiety: f64, trust: f64) -> Client {
    Client::new(
        ClientProfile::new("Sofia", "retirement at age 65", tolerance),
        EmotionalState::baseline(anxiety, trust),
    )
}

fn resolve_silently(session: &mut SimulationSession, decision: Decision) {
    session.submit_decision(decision).unwrap();
    session.resolve_turn().unwrap();
    session
        .attach_narrative(Err(NarrativeError::Unavailable("offline".into())))
        .unwrap();
}

struct FailingNarrator;

impl Narrator for FailingNarrator {
    async fn generate(&self, _: &NarrativeContext) -> Result<NarrativeText, NarrativeError> {
        Err(NarrativeError::Generation("model overloaded".into()))
    }
}

struct SlowNarrator;

impl Narrator for SlowNarrator {
    async fn generate(&self, _: &NarrativeContext) -> Result<NarrativeText, NarrativeError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(NarrativeText::generated("too late", "too late"))
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_calm_growth_hold_builds_confidence() {
    let config = SessionConfig::default()
        .with_regimes(steady_growth_table())
        .with_initial_allocation(Allocation::new(0.6, 0.3, 0.1).unwrap());
    let mut session =
        SimulationSession::new(config, client(RiskTolerance::Medium, 30.0, 60.0), 11).unwrap();

    let mut previous = session.client().state();
    for _ in 0..3 {
        resolve_silently(&mut session, Decision::hold(CommunicationChoice::HoldFirm));
        let state = session.client().state();
        assert!(state.trust >= previous.trust, "trust fell: {previous:?} -> {state:?}");
        assert!(state.anxiety <= previous.anxiety, "anxiety rose: {previous:?} -> {state:?}");
        previous = state;
    }

    assert_eq!(session.turns().len(), 3);
    assert!(session.portfolio().value() > session.portfolio().initial_value());
    assert!(session.turns().iter().all(|t| t.portfolio_return() > 0.0));
    assert!(session.turns().iter().all(|t| !t.overrode_request()));
}

#[test]
fn test_crash_clamps_anxiety_at_maximum() {
    let config = SessionConfig::default().with_regimes(crash_table());
    let mut anxious = client(RiskTolerance::Low, 85.0, 50.0);
    anxious.profile.traits = PersonalityTraits {
        loss_aversion: 80.0,
        ..PersonalityTraits::default()
    };
    let mut session = SimulationSession::new(config, anxious, 3).unwrap();

    resolve_silently(&mut session, Decision::hold(CommunicationChoice::HoldFirm));

    let turn = &session.turns()[0];
    assert_eq!(turn.regime().to, "crash");
    assert!((turn.regime_return().equity + 0.40).abs() < 1e-12);
    assert!(turn.raw_delta().anxiety > 15.0);
    assert_eq!(turn.state_after().anxiety, 100.0);
    assert_eq!(session.client().anxiety(), 100.0);
    assert!((turn.applied_delta().anxiety - 15.0).abs() < 1e-9);
}

#[test]
fn test_resolve_before_submit_is_rejected() {
    let mut session = SimulationSession::with_random_client(SessionConfig::default(), 5).unwrap();
    let value = session.portfolio().value();

    let err = session.resolve_turn().unwrap_err();
    assert_eq!(
        err,
        SessionError::InvalidState {
            operation: "resolve a turn",
            phase: SessionPhase::AwaitingDecision,
        }
    );
    assert!(session.turns().is_empty());
    assert_eq!(session.phase(), SessionPhase::AwaitingDecision);
    assert_eq!(session.portfolio().value(), value);
}

#[test]
fn test_ignored_derisk_request_never_raises_trust() {
    let config = open_ended().with_regimes(crash_table());
    let mut session =
        SimulationSession::new(config, client(RiskTolerance::Low, 85.0, 40.0), 9).unwrap();

    // The crash leaves the client demanding a de-risk.
    resolve_silently(&mut session, Decision::hold(CommunicationChoice::Empathize));
    assert_eq!(session.pending_request(), ClientRequest::DeRisk);

    for comm in [CommunicationChoice::Empathize, CommunicationChoice::Dismiss] {
        let before = session.client().trust();
        resolve_silently(&mut session, Decision::hold(comm));
        let turn = session.turns().last().unwrap();
        assert!(turn.overrode_request());
        assert!(turn.raw_delta().trust < 0.0);
        assert!(session.client().trust() <= before);
    }
}

#[test]
fn test_honoring_derisk_request_is_not_an_override() {
    let config = SessionConfig::default().with_regimes(crash_table());
    let mut session =
        SimulationSession::new(config, client(RiskTolerance::Low, 85.0, 40.0), 9).unwrap();
    resolve_silently(&mut session, Decision::hold(CommunicationChoice::Empathize));
    assert_eq!(session.pending_request(), ClientRequest::DeRisk);

    resolve_silently(
        &mut session,
        Decision::preset(ReallocationPreset::LargerDeRisk, CommunicationChoice::Empathize),
    );
    let turn = session.turns().last().unwrap();
    assert!(!turn.overrode_request());
    assert!(turn.equity_shift() < 0.0);
}

#[test]
fn test_derisk_request_satisfied_by_all_cash_portfolio() {
    let config = SessionConfig::default()
        .with_regimes(crash_table())
        .with_initial_allocation(Allocation::all_cash());
    let mut session =
        SimulationSession::new(config, client(RiskTolerance::Low, 85.0, 40.0), 9).unwrap();
    resolve_silently(&mut session, Decision::hold(CommunicationChoice::Empathize));
    assert_eq!(session.pending_request(), ClientRequest::DeRisk);

    for _ in 0..3 {
        let before = session.client().trust();
        resolve_silently(
            &mut session,
            Decision::preset(ReallocationPreset::MoveToCash, CommunicationChoice::Empathize),
        );
        let turn = session.turns().last().unwrap();
        assert_eq!(turn.request_faced(), ClientRequest::DeRisk);
        assert_eq!(turn.allocation().equity(), 0.0);
        assert!(!turn.overrode_request());
        assert!(session.client().trust() > before);
    }
}

#[tokio::test]
async fn test_client_leaves_when_trust_collapses() {
    let config = SessionConfig::default().with_regimes(crash_table());
    let mut session =
        SimulationSession::new(config, client(RiskTolerance::Medium, 50.0, 18.0), 2).unwrap();

    let turn = session
        .advance_turn(Decision::hold(CommunicationChoice::Dismiss), &FallbackNarrator)
        .await
        .unwrap();
    assert!(turn.state_after().trust < 15.0);
    assert!(turn.narrative().is_some());
    assert_eq!(session.phase(), SessionPhase::Ended);
    assert_eq!(session.end_reason(), Some(EndReason::TrustLost));

    let err = session
        .advance_turn(Decision::hold(CommunicationChoice::Empathize), &FallbackNarrator)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidState { .. }));
    assert_eq!(session.end_session().turns_played, 1);
}

#[test]
fn test_default_session_ends_after_ten_turns() {
    let config = SessionConfig::default()
        .with_regimes(steady_growth_table())
        .with_initial_allocation(Allocation::new(0.6, 0.3, 0.1).unwrap());
    let mut session =
        SimulationSession::new(config, client(RiskTolerance::Medium, 30.0, 60.0), 11).unwrap();

    let mut played = 0;
    while !session.is_over() {
        resolve_silently(&mut session, Decision::hold(CommunicationChoice::HoldFirm));
        played += 1;
        assert!(played <= 10);
    }
    assert_eq!(played, 10);
    assert_eq!(session.end_reason(), Some(EndReason::TurnLimit));
    assert_eq!(session.phase(), SessionPhase::Ended);
}

#[test]
fn test_total_loss_keeps_value_positive() {
    let table = RegimeTable::new(vec![
        RegimeSpec::new("wipeout", "Everything goes to zero.", 25.0, fixed_returns(-1.0, -1.0, -1.0))
            .as_crisis()
            .to("wipeout", 1.0),
    ])
    .with_return_clamp(1.0);
    let config = open_ended()
        .with_regimes(table)
        .with_initial_regime("wipeout");
    let mut session = SimulationSession::with_random_client(config, 1).unwrap();

    for _ in 0..3 {
        resolve_silently(&mut session, Decision::hold(CommunicationChoice::HoldFirm));
        assert!(session.portfolio().value() > 0.0);
    }
    assert!((session.portfolio().value() - MIN_VALUE).abs() < 1e-12);
}

#[test]
fn test_random_sessions_hold_invariants() {
    let decisions = [
        Decision::hold(CommunicationChoice::Empathize),
        Decision::preset(ReallocationPreset::SmallDeRisk, CommunicationChoice::DataReassurance),
        Decision::hold(CommunicationChoice::NoContact),
        Decision::preset(ReallocationPreset::IncreaseRisk, CommunicationChoice::Accommodate),
        Decision::preset(ReallocationPreset::MoveToCash, CommunicationChoice::Dismiss),
        Decision::hold(CommunicationChoice::HoldFirm),
    ];

    let config = SessionConfig::default().with_max_turns(None);
    for seed in 0..10 {
        let mut session = SimulationSession::with_random_client(config.clone(), seed).unwrap();
        for i in 0..12 {
            if session.is_over() {
                assert!(session.end_reason().is_some_and(EndReason::is_departure));
                break;
            }
            resolve_silently(&mut session, decisions[(i + seed as usize) % decisions.len()].clone());

            let state = session.client().state();
            for level in [state.anxiety, state.trust, state.satisfaction, state.engagement] {
                assert!((0.0..=100.0).contains(&level));
            }
            let alloc = session.portfolio().allocation();
            assert!((alloc.sum() - 1.0).abs() < 1e-6);
            assert!(session.portfolio().value() > 0.0);
        }

        let traced = session
            .portfolio()
            .returns()
            .iter()
            .fold(session.portfolio().initial_value(), |v, r| v * (1.0 + r));
        assert!((traced - session.portfolio().value()).abs() < 1e-6);

        let report = session.end_session();
        assert_eq!(report.turns_played, session.turns().len());
        assert!(report.score <= 100);
    }
}

#[test]
fn test_snapshot_restore_continues_session() {
    let mut session = SimulationSession::with_random_client(open_ended(), 21).unwrap();
    for _ in 0..4 {
        resolve_silently(&mut session, Decision::hold(CommunicationChoice::DataReassurance));
    }
    session
        .submit_decision(Decision::preset(ReallocationPreset::SmallDeRisk, CommunicationChoice::Empathize))
        .unwrap();

    let json = session.snapshot().to_json().unwrap();
    let snapshot = SessionSnapshot::from_json(&json).unwrap();
    assert_eq!(snapshot.id, session.id());
    assert_eq!(snapshot.turns.len(), 4);
    assert!(snapshot.pending_decision.is_some());

    let mut restored = SimulationSession::restore(snapshot, open_ended(), 99).unwrap();
    assert_eq!(restored.id(), session.id());
    assert_eq!(restored.phase(), SessionPhase::Resolving);
    assert_eq!(restored.turns().len(), session.turns().len());
    assert_eq!(restored.portfolio().allocation().percentages(), (50, 40, 10));
    assert!((restored.portfolio().value() - session.portfolio().value()).abs() < 1e-6);

    let resolution = restored.resolve_turn().unwrap();
    assert_eq!(resolution.turn.number().raw(), 5);
}

#[test]
fn test_restore_rejects_inconsistent_snapshot() {
    let mut session = SimulationSession::with_random_client(SessionConfig::default(), 4).unwrap();
    resolve_silently(&mut session, Decision::hold(CommunicationChoice::HoldFirm));

    let mut snapshot = session.snapshot();
    snapshot.phase = SessionPhase::Resolving;
    assert!(matches!(
        SimulationSession::restore(snapshot, SessionConfig::default(), 1),
        Err(SessionError::InvalidSnapshot(_))
    ));

    let mut snapshot = session.snapshot();
    snapshot.current_regime = "bubble".into();
    assert!(matches!(
        SimulationSession::restore(snapshot, SessionConfig::default(), 1),
        Err(SessionError::Configuration(_))
    ));
}

// =============================================================================
// Narrative
// =============================================================================

#[tokio::test]
async fn test_failed_narrative_becomes_fallback() {
    let mut session = SimulationSession::with_random_client(SessionConfig::default(), 8).unwrap();
    let turn = session
        .advance_turn(Decision::hold(CommunicationChoice::Empathize), &FailingNarrator)
        .await
        .unwrap();

    let narrative = turn.narrative().unwrap();
    assert!(narrative.is_fallback());
    assert!(narrative.client_message.starts_with(&session.client().profile.name));
    assert_eq!(session.phase(), SessionPhase::AwaitingDecision);
}

#[tokio::test]
async fn test_slow_narrator_times_out_to_fallback() {
    let config = SessionConfig::default().with_narrative_timeout(Duration::from_millis(20));
    let mut session = SimulationSession::with_random_client(config, 8).unwrap();

    let value_before_narration = {
        session
            .submit_decision(Decision::hold(CommunicationChoice::HoldFirm))
            .unwrap();
        session.resolve_turn().unwrap();
        session.portfolio().value()
    };

    let text = session
        .narrate(&SlowNarrator, Duration::from_millis(20))
        .await
        .unwrap();
    assert!(text.is_fallback());
    assert_eq!(session.portfolio().value(), value_before_narration);
    assert!(session.turns()[0].narrative().unwrap().is_fallback());
}

#[tokio::test]
async fn test_narration_does_not_change_outcomes() {
    let config = SessionConfig::default();
    let mut narrated = SimulationSession::with_random_client(config.clone(), 13).unwrap();
    let mut silent = SimulationSession::with_random_client(config, 13).unwrap();

    for _ in 0..5 {
        let decision = Decision::hold(CommunicationChoice::Empathize);
        narrated
            .advance_turn(decision.clone(), &FallbackNarrator)
            .await
            .unwrap();
        resolve_silently(&mut silent, decision);
    }

    assert_eq!(narrated.client().state(), silent.client().state());
    assert_eq!(narrated.portfolio().value(), silent.portfolio().value());
}
