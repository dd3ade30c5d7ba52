//! Central configuration for the Advisor Gym binary.
//!
//! Everything a headless run needs is defined here; library-level tuning
//! (regime table, psychology coefficients) lives in the session config.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use portfolio::ReallocationPreset;
use psychology::{ClientIntent, ClientRequest};
use simulation::{DEFAULT_NARRATIVE_TIMEOUT, Decision};
use types::CommunicationChoice;

/// Scripted advisor behavior for headless sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Keep the allocation and reassure whoever is worried.
    #[default]
    Steady,
    /// Follow what the client asks for and talk them through it.
    Reactive,
    /// De-risk at the first sign of trouble.
    Panicky,
    /// Random communication with no reallocation.
    Random,
}

impl Strategy {
    /// Pick the decision for the next turn given the client's current mood.
    ///
    /// `Random` takes its communication from `pick` so the caller owns the RNG.
    pub fn decide(
        self,
        intent: ClientIntent,
        request: ClientRequest,
        pick: impl FnOnce() -> CommunicationChoice,
    ) -> Decision {
        match self {
            Strategy::Steady => {
                let communication = match intent {
                    ClientIntent::OverrideThreat | ClientIntent::Panic => {
                        CommunicationChoice::Empathize
                    }
                    ClientIntent::Concerned => CommunicationChoice::DataReassurance,
                    ClientIntent::Greedy => CommunicationChoice::HoldFirm,
                    _ => CommunicationChoice::NoContact,
                };
                Decision::hold(communication)
            }
            Strategy::Reactive => match request {
                ClientRequest::DeRisk => Decision::preset(
                    ReallocationPreset::SmallDeRisk,
                    CommunicationChoice::Accommodate,
                ),
                ClientRequest::AddRisk => Decision::preset(
                    ReallocationPreset::IncreaseRisk,
                    CommunicationChoice::Accommodate,
                ),
                ClientRequest::None => Decision::hold(CommunicationChoice::Empathize),
            },
            Strategy::Panicky => match intent {
                ClientIntent::OverrideThreat | ClientIntent::Panic => Decision::preset(
                    ReallocationPreset::MoveToCash,
                    CommunicationChoice::Accommodate,
                ),
                ClientIntent::Concerned => Decision::preset(
                    ReallocationPreset::LargerDeRisk,
                    CommunicationChoice::Accommodate,
                ),
                _ => Decision::hold(CommunicationChoice::HoldFirm),
            },
            Strategy::Random => Decision::hold(pick()),
        }
    }
}

/// Master configuration for a headless run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Session Control
    // ─────────────────────────────────────────────────────────────────────────
    /// Seed for the market process and the generated client.
    pub seed: u64,
    /// Turns to play before ending the session.
    pub turns: u32,
    /// Starting portfolio value.
    pub initial_value: f64,
    /// Scripted advisor behavior.
    pub strategy: Strategy,

    // ─────────────────────────────────────────────────────────────────────────
    // Market
    // ─────────────────────────────────────────────────────────────────────────
    /// Optional JSON regime table replacing the built-in one.
    pub regimes_path: Option<PathBuf>,
    /// Regime the session opens in.
    pub initial_regime: String,

    // ─────────────────────────────────────────────────────────────────────────
    // Narrative
    // ─────────────────────────────────────────────────────────────────────────
    /// Use the LLM narrator when an API key is present.
    pub use_llm: bool,
    /// Model name for the LLM narrator.
    pub model: String,
    /// Upper bound on each narrative call.
    pub narrative_timeout: Duration,

    // ─────────────────────────────────────────────────────────────────────────
    // Output
    // ─────────────────────────────────────────────────────────────────────────
    /// Print the career report as JSON instead of text.
    pub json_report: bool,
    /// Write a session snapshot here when the run ends.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            turns: 8,
            initial_value: simulation::DEFAULT_INITIAL_VALUE,
            strategy: Strategy::default(),

            regimes_path: None,
            initial_regime: "calm-growth".into(),

            use_llm: false,
            model: narrative::DEFAULT_MODEL.into(),
            narrative_timeout: DEFAULT_NARRATIVE_TIMEOUT,

            json_report: false,
            snapshot_path: None,
        }
    }
}

impl SimConfig {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn turns(mut self, turns: u32) -> Self {
        self.turns = turns;
        self
    }

    pub fn initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn initial_regime(mut self, regime: impl Into<String>) -> Self {
        self.initial_regime = regime.into();
        self
    }

    pub fn narrative_timeout(mut self, timeout: Duration) -> Self {
        self.narrative_timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Preset Configurations
// ─────────────────────────────────────────────────────────────────────────────

impl SimConfig {
    /// Quick demo: a short session with the steady script.
    pub fn demo() -> Self {
        Self::default().turns(4)
    }

    /// Open in a crash and watch the panicky script dump equity.
    pub fn crisis_drill() -> Self {
        Self::default()
            .turns(6)
            .initial_regime("crash")
            .strategy(Strategy::Panicky)
    }

    /// Long session for comparing scripts.
    pub fn full_career() -> Self {
        Self::default().turns(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::Reallocation;

    fn never() -> CommunicationChoice {
        panic!("only the random strategy draws a communication")
    }

    #[test]
    fn test_presets() {
        assert_eq!(SimConfig::demo().turns, 4);
        let drill = SimConfig::crisis_drill();
        assert_eq!(drill.initial_regime, "crash");
        assert_eq!(drill.strategy, Strategy::Panicky);
        assert!(SimConfig::full_career().turns > SimConfig::default().turns);
    }

    #[test]
    fn test_steady_never_reallocates() {
        for intent in [
            ClientIntent::OverrideThreat,
            ClientIntent::Panic,
            ClientIntent::Concerned,
            ClientIntent::Greedy,
            ClientIntent::NeutralCheckin,
        ] {
            let decision = Strategy::Steady.decide(intent, intent.request(), never);
            assert_eq!(decision.reallocation, Reallocation::Hold);
        }
    }

    #[test]
    fn test_reactive_follows_request() {
        let decision =
            Strategy::Reactive.decide(ClientIntent::Panic, ClientRequest::DeRisk, never);
        assert_eq!(
            decision.reallocation,
            Reallocation::Preset(ReallocationPreset::SmallDeRisk)
        );
    }

    #[test]
    fn test_panicky_moves_to_cash() {
        let decision =
            Strategy::Panicky.decide(ClientIntent::Panic, ClientRequest::DeRisk, never);
        assert_eq!(
            decision.reallocation,
            Reallocation::Preset(ReallocationPreset::MoveToCash)
        );
    }

    #[test]
    fn test_random_uses_picker() {
        let decision = Strategy::Random.decide(
            ClientIntent::NeutralCheckin,
            ClientRequest::None,
            || CommunicationChoice::Dismiss,
        );
        assert_eq!(decision.communication, CommunicationChoice::Dismiss);
    }
}
