//! Client identity, personality and emotional state.

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use types::{RiskTolerance, clamp_level};

/// Name pool for generated clients.
const NAMES: &[&str] = &[
    "Michael", "Sofia", "Jordan", "Ava", "Ethan", "Maya", "Carlos", "Priya",
];

/// What generated clients are saving for.
const GOALS: &[&str] = &[
    "retirement at age 65",
    "buying a home in 5 years",
    "funding their children's college",
    "building generational wealth",
    "achieving financial independence",
];

// =============================================================================
// Personality
// =============================================================================

/// Fixed behavioral traits on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    /// How badly losses feel. High = panics more in downturns.
    pub loss_aversion: f64,
    /// How quickly trust builds.
    pub trust_propensity: f64,
    /// How much the client wants to make their own decisions.
    pub control_preference: f64,
    /// Tendency to overweight the latest period.
    pub recency_bias: f64,
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        Self {
            loss_aversion: 50.0,
            trust_propensity: 50.0,
            control_preference: 50.0,
            recency_bias: 50.0,
        }
    }
}

impl PersonalityTraits {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            loss_aversion: rng.random_range(40..=90) as f64,
            trust_propensity: rng.random_range(30..=75) as f64,
            control_preference: rng.random_range(20..=80) as f64,
            recency_bias: rng.random_range(30..=85) as f64,
        }
    }

    /// Every trait clamped into the level range.
    pub fn clamped(self) -> Self {
        Self {
            loss_aversion: clamp_level(self.loss_aversion),
            trust_propensity: clamp_level(self.trust_propensity),
            control_preference: clamp_level(self.control_preference),
            recency_bias: clamp_level(self.recency_bias),
        }
    }
}

// =============================================================================
// ClientProfile
// =============================================================================

/// Static client identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    /// Long-term goal, e.g. "retirement at age 65".
    pub goal: String,
    pub risk_tolerance: RiskTolerance,
    pub traits: PersonalityTraits,
}

impl ClientProfile {
    pub fn new(
        name: impl Into<String>,
        goal: impl Into<String>,
        risk_tolerance: RiskTolerance,
    ) -> Self {
        Self {
            name: name.into(),
            goal: goal.into(),
            risk_tolerance,
            traits: PersonalityTraits::default(),
        }
    }

    pub fn with_traits(mut self, traits: PersonalityTraits) -> Self {
        self.traits = traits.clamped();
        self
    }

    /// Roll a random client.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name = NAMES.choose(rng).copied().unwrap_or("Alex");
        let goal = GOALS.choose(rng).copied().unwrap_or(GOALS[0]);
        let risk_tolerance = RiskTolerance::ALL
            .choose(rng)
            .copied()
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            goal: goal.to_string(),
            risk_tolerance,
            traits: PersonalityTraits::random(rng),
        }
    }
}

// =============================================================================
// EmotionalState
// =============================================================================

/// Change to each emotional level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionDelta {
    pub anxiety: f64,
    pub trust: f64,
    pub satisfaction: f64,
    pub engagement: f64,
}

impl EmotionDelta {
    pub fn new(anxiety: f64, trust: f64, satisfaction: f64, engagement: f64) -> Self {
        Self {
            anxiety,
            trust,
            satisfaction,
            engagement,
        }
    }
}

/// Dynamic client state, every level in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub anxiety: f64,
    pub trust: f64,
    pub satisfaction: f64,
    pub engagement: f64,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self::new(40.0, 55.0, 55.0, 60.0)
    }
}

impl EmotionalState {
    /// Build a state; every level is clamped into bounds.
    pub fn new(anxiety: f64, trust: f64, satisfaction: f64, engagement: f64) -> Self {
        Self {
            anxiety: clamp_level(anxiety),
            trust: clamp_level(trust),
            satisfaction: clamp_level(satisfaction),
            engagement: clamp_level(engagement),
        }
    }

    /// Baseline anxiety and trust with default satisfaction and engagement.
    pub fn baseline(anxiety: f64, trust: f64) -> Self {
        let default = Self::default();
        Self::new(anxiety, trust, default.satisfaction, default.engagement)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(
            rng.random_range(30..=50) as f64,
            rng.random_range(45..=65) as f64,
            rng.random_range(45..=65) as f64,
            rng.random_range(50..=70) as f64,
        )
    }

    /// State after `delta`, clamped into bounds.
    pub fn after(&self, delta: &EmotionDelta) -> Self {
        Self::new(
            self.anxiety + delta.anxiety,
            self.trust + delta.trust,
            self.satisfaction + delta.satisfaction,
            self.engagement + delta.engagement,
        )
    }

    /// Difference between `self` and an earlier state.
    pub fn delta_from(&self, earlier: &EmotionalState) -> EmotionDelta {
        EmotionDelta::new(
            self.anxiety - earlier.anxiety,
            self.trust - earlier.trust,
            self.satisfaction - earlier.satisfaction,
            self.engagement - earlier.engagement,
        )
    }
}

// =============================================================================
// Client
// =============================================================================

/// Overall relationship health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    CrisisMode,
    Strong,
    AtRisk,
    Stable,
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationshipStatus::CrisisMode => "Crisis mode",
            RelationshipStatus::Strong => "Strong relationship",
            RelationshipStatus::AtRisk => "At risk of leaving",
            RelationshipStatus::Stable => "Stable",
        })
    }
}

/// A client: fixed profile plus current emotional state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub profile: ClientProfile,
    state: EmotionalState,
}

impl Client {
    pub fn new(profile: ClientProfile, state: EmotionalState) -> Self {
        Self { profile, state }
    }

    /// Roll a random client with a random starting mood.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let profile = ClientProfile::random(rng);
        let state = EmotionalState::random(rng);
        Self { profile, state }
    }

    pub fn state(&self) -> EmotionalState {
        self.state
    }

    pub fn anxiety(&self) -> f64 {
        self.state.anxiety
    }

    pub fn trust(&self) -> f64 {
        self.state.trust
    }

    /// Replace the emotional state. Levels are clamped.
    pub fn set_state(&mut self, state: EmotionalState) {
        self.state = EmotionalState::new(
            state.anxiety,
            state.trust,
            state.satisfaction,
            state.engagement,
        );
    }

    /// Likelihood (0-100) that the client follows the advisor's advice.
    ///
    /// High trust, low anxiety and low control preference all help.
    pub fn adherence_score(&self) -> f64 {
        let score = 50.0 + 0.5 * self.state.trust
            - 0.4 * self.state.anxiety
            - 0.2 * (self.profile.traits.control_preference - 50.0);
        clamp_level(score.trunc())
    }

    pub fn status(&self) -> RelationshipStatus {
        let s = &self.state;
        let avg = (s.trust + s.satisfaction + s.engagement) / 3.0;
        if s.anxiety > 75.0 {
            RelationshipStatus::CrisisMode
        } else if avg > 70.0 && s.anxiety < 40.0 {
            RelationshipStatus::Strong
        } else if avg < 40.0 || s.trust < 30.0 {
            RelationshipStatus::AtRisk
        } else {
            RelationshipStatus::Stable
        }
    }
}
