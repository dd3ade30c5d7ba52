//! Session configuration.

use std::time::Duration;

use market::RegimeTable;
use psychology::PsychologyConfig;
use serde::{Deserialize, Serialize};
use types::Allocation;

/// Default starting portfolio value.
pub const DEFAULT_INITIAL_VALUE: f64 = 100_000.0;

/// Default bound on a narrative call.
pub const DEFAULT_NARRATIVE_TIMEOUT: Duration = Duration::from_secs(8);

/// Default session length in turns.
pub const DEFAULT_MAX_TURNS: u32 = 10;

/// Relationship levels below which the client leaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartureThresholds {
    /// The client leaves once trust falls below this.
    pub min_trust: f64,
    /// The client leaves once engagement falls below this.
    pub min_engagement: f64,
}

impl Default for DepartureThresholds {
    fn default() -> Self {
        Self {
            min_trust: 15.0,
            min_engagement: 10.0,
        }
    }
}

/// Configuration for one [`SimulationSession`](crate::SimulationSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub initial_value: f64,

    /// Allocation in force before the first decision.
    pub initial_allocation: Allocation,

    /// Regime the market starts in. Must name a regime in `regimes`.
    pub initial_regime: String,

    pub regimes: RegimeTable,

    pub psychology: PsychologyConfig,

    /// Upper bound on each narrative call.
    pub narrative_timeout: Duration,

    /// The session ends on its own after this many turns. `None` plays until
    /// [`end_session`](crate::SimulationSession::end_session) is called.
    pub max_turns: Option<u32>,

    /// The client walks away below these levels. `None` keeps the client
    /// whatever happens.
    pub departure: Option<DepartureThresholds>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_value: DEFAULT_INITIAL_VALUE,
            initial_allocation: Allocation::balanced(),
            initial_regime: "calm-growth".into(),
            regimes: RegimeTable::default(),
            psychology: PsychologyConfig::default(),
            narrative_timeout: DEFAULT_NARRATIVE_TIMEOUT,
            max_turns: Some(DEFAULT_MAX_TURNS),
            departure: Some(DepartureThresholds::default()),
        }
    }
}

impl SessionConfig {
    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    pub fn with_initial_allocation(mut self, allocation: Allocation) -> Self {
        self.initial_allocation = allocation;
        self
    }

    pub fn with_initial_regime(mut self, regime: impl Into<String>) -> Self {
        self.initial_regime = regime.into();
        self
    }

    pub fn with_regimes(mut self, regimes: RegimeTable) -> Self {
        self.regimes = regimes;
        self
    }

    pub fn with_psychology(mut self, psychology: PsychologyConfig) -> Self {
        self.psychology = psychology;
        self
    }

    pub fn with_narrative_timeout(mut self, timeout: Duration) -> Self {
        self.narrative_timeout = timeout;
        self
    }

    pub fn with_max_turns(mut self, turns: Option<u32>) -> Self {
        self.max_turns = turns;
        self
    }

    pub fn with_departure(mut self, departure: Option<DepartureThresholds>) -> Self {
        self.departure = departure;
        self
    }
}
