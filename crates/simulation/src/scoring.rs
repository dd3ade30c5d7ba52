//! End-of-session career evaluation.
//!
//! The final score weighs four components:
//!
//! | Component        | Weight | Measures |
//! |------------------|--------|----------|
//! | Portfolio        | 25%    | total return against a 2.5%-per-turn benchmark |
//! | Relationship     | 35%    | final trust, satisfaction, calm and engagement |
//! | Risk management  | 25%    | panic moves and risk added in falling markets |
//! | Crisis handling  | 15%    | communication quality while in a crisis regime |

use std::fmt;

use portfolio::ReallocationPreset;
use psychology::EmotionalState;
use serde::{Deserialize, Serialize};

use crate::decision::Reallocation;
use crate::turn::Turn;

/// Benchmark return per turn.
pub const BENCHMARK_PER_TURN: f64 = 0.025;

/// Equity cut at or beyond which a reallocation counts as a panic move.
pub const PANIC_EQUITY_CUT: f64 = 0.30;

/// Equity added during a downturn at or beyond which a move counts as an aggressive swing.
pub const AGGRESSIVE_EQUITY_ADD: f64 = 0.10;

const PORTFOLIO_WEIGHT: f64 = 0.25;
const RELATIONSHIP_WEIGHT: f64 = 0.35;
const RISK_WEIGHT: f64 = 0.25;
const CRISIS_WEIGHT: f64 = 0.15;

// =============================================================================
// Career titles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerTitle {
    ProbationaryAdvisor,
    JuniorAdvisor,
    AssociateAdvisor,
    VicePresident,
    SeniorPartner,
}

impl CareerTitle {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => CareerTitle::SeniorPartner,
            75..=89 => CareerTitle::VicePresident,
            60..=74 => CareerTitle::AssociateAdvisor,
            45..=59 => CareerTitle::JuniorAdvisor,
            _ => CareerTitle::ProbationaryAdvisor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CareerTitle::SeniorPartner => "Senior Partner",
            CareerTitle::VicePresident => "Vice President",
            CareerTitle::AssociateAdvisor => "Associate Advisor",
            CareerTitle::JuniorAdvisor => "Junior Advisor",
            CareerTitle::ProbationaryAdvisor => "Probationary Advisor",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CareerTitle::SeniorPartner => {
                "Elite advisor. Clients trust you completely and your portfolio management is exceptional."
            }
            CareerTitle::VicePresident => {
                "Strong advisor with excellent client relationships and solid investment discipline."
            }
            CareerTitle::AssociateAdvisor => {
                "Competent advisor. Good fundamentals but room to grow in crisis situations."
            }
            CareerTitle::JuniorAdvisor => {
                "Still developing. Focus on communication skills and risk management."
            }
            CareerTitle::ProbationaryAdvisor => {
                "Significant improvement needed. Review your communication and portfolio management approach."
            }
        }
    }
}

impl fmt::Display for CareerTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Report
// =============================================================================

/// Component scores, each 0-100, plus the counts behind them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub portfolio: f64,
    pub relationship: f64,
    pub risk: f64,
    pub crisis: f64,
    pub total_return: f64,
    pub benchmark_return: f64,
    pub panic_moves: usize,
    pub aggressive_swings: usize,
    pub crisis_turns: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feedback {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub key_insight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerReport {
    pub score: u32,
    pub title: CareerTitle,
    pub turns_played: usize,
    pub breakdown: ScoreBreakdown,
    pub feedback: Feedback,
}

impl fmt::Display for CareerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}/100)", self.title, self.score)?;
        writeln!(f, "{}", self.title.description())?;
        let b = &self.breakdown;
        writeln!(
            f,
            "portfolio {:.0} | relationship {:.0} | risk {:.0} | crisis {:.0}",
            b.portfolio, b.relationship, b.risk, b.crisis
        )?;
        for s in &self.feedback.strengths {
            writeln!(f, "  + {s}")?;
        }
        for s in &self.feedback.improvements {
            writeln!(f, "  - {s}")?;
        }
        write!(f, "{}", self.feedback.key_insight)
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Whether a turn's reallocation dumped equity in a hurry.
pub fn is_panic_move(turn: &Turn) -> bool {
    matches!(
        turn.decision().reallocation,
        Reallocation::Preset(ReallocationPreset::MoveToCash)
    ) || turn.equity_shift() <= -PANIC_EQUITY_CUT
}

/// Whether a turn added meaningful equity while the market was falling.
///
/// Only downturn regimes count; a rate shock is a crisis but not a downturn.
pub fn is_aggressive_swing(turn: &Turn) -> bool {
    turn.regime().from_downturn && turn.equity_shift() >= AGGRESSIVE_EQUITY_ADD
}

/// Score a finished (or in-progress) session.
pub fn evaluate(
    turns: &[Turn],
    final_state: &EmotionalState,
    initial_value: f64,
    final_value: f64,
) -> CareerReport {
    if turns.is_empty() {
        return CareerReport {
            score: 0,
            title: CareerTitle::ProbationaryAdvisor,
            turns_played: 0,
            breakdown: ScoreBreakdown::default(),
            feedback: Feedback::default(),
        };
    }

    let total_return = (final_value - initial_value) / initial_value;
    let benchmark_return = BENCHMARK_PER_TURN * turns.len() as f64;
    let portfolio = if total_return >= benchmark_return * 1.2 {
        100.0
    } else if total_return >= benchmark_return {
        80.0
    } else if total_return >= 0.0 {
        60.0
    } else if total_return >= -0.10 {
        35.0
    } else {
        10.0
    };

    let relationship = final_state.trust * 0.35
        + final_state.satisfaction * 0.30
        + (100.0 - final_state.anxiety) * 0.20
        + final_state.engagement * 0.15;

    let panic_moves = turns.iter().filter(|t| is_panic_move(t)).count();
    let aggressive_swings = turns.iter().filter(|t| is_aggressive_swing(t)).count();
    let risk = (100.0 - (panic_moves + aggressive_swings) as f64 * 20.0).max(0.0);

    let crisis_turns: Vec<&Turn> = turns.iter().filter(|t| t.regime().from_crisis).collect();
    let crisis = if crisis_turns.is_empty() {
        70.0
    } else {
        let good = crisis_turns
            .iter()
            .filter(|t| t.decision().communication.is_crisis_appropriate())
            .count();
        (good as f64 / crisis_turns.len() as f64 * 100.0).trunc()
    };

    let weighted = portfolio * PORTFOLIO_WEIGHT
        + relationship * RELATIONSHIP_WEIGHT
        + risk * RISK_WEIGHT
        + crisis * CRISIS_WEIGHT;
    let score = weighted.clamp(0.0, 100.0) as u32;

    let breakdown = ScoreBreakdown {
        portfolio,
        relationship,
        risk,
        crisis,
        total_return,
        benchmark_return,
        panic_moves,
        aggressive_swings,
        crisis_turns: crisis_turns.len(),
    };
    let feedback = feedback(&breakdown);

    CareerReport {
        score,
        title: CareerTitle::from_score(score),
        turns_played: turns.len(),
        breakdown,
        feedback,
    }
}

fn feedback(b: &ScoreBreakdown) -> Feedback {
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    if b.portfolio >= 80.0 {
        strengths.push("Strong portfolio growth. You kept the client invested and it paid off.".into());
    }
    if b.relationship >= 70.0 {
        strengths.push("Excellent client relationship with high trust and satisfaction.".into());
    }
    if b.risk >= 80.0 {
        strengths.push("Disciplined risk management. You avoided panic moves.".into());
    }
    if b.crisis >= 75.0 {
        strengths.push("Strong crisis communication. You kept the client calm during downturns.".into());
    }

    if b.portfolio < 60.0 {
        improvements.push(
            "Portfolio underperformed. Consider staying invested during downturns rather than moving to cash."
                .into(),
        );
    }
    if b.relationship < 55.0 {
        improvements.push(
            "Client relationship needs work. Prioritize empathetic communication, especially during losses."
                .into(),
        );
    }
    if b.panic_moves > 0 {
        improvements.push(format!(
            "You made {} panic move(s) to cash. That locks in losses and damages long-term returns.",
            b.panic_moves
        ));
    }
    if b.crisis < 50.0 && b.crisis_turns > 0 {
        improvements.push(
            "Crisis handling needs improvement. During downturns, empathetic explanation beats dismissiveness."
                .into(),
        );
    }

    let key_insight = if b.panic_moves > 1 {
        "Staying invested through downturns is almost always better than moving to cash. Missing just the best few market days can cut returns in half."
    } else if b.relationship < 50.0 {
        "Clients don't leave advisors because of bad markets. They leave because of bad communication during bad markets."
    } else if b.portfolio >= 80.0 && b.relationship >= 70.0 {
        "You balanced investment discipline with behavioral coaching, the core skill of wealth management."
    } else {
        "Wealth management is mostly behavioral psychology. The best advisors keep clients calm and invested through volatility."
    };

    Feedback {
        strengths,
        improvements,
        key_insight: key_insight.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market::RegimeReturn;
    use psychology::{ClientIntent, ClientRequest, EmotionDelta};
    use types::{Allocation, CommunicationChoice, TurnNumber};

    use crate::decision::Decision;
    use crate::turn::{RegimeOutcome, TurnRecord};

    fn turn_in(regime: &str, crisis: bool, downturn: bool, decision: Decision, equity_shift: f64) -> Turn {
        Turn::finalize(TurnRecord {
            number: TurnNumber::FIRST,
            decision,
            allocation: Allocation::balanced(),
            equity_shift,
            regime: RegimeOutcome {
                from: regime.into(),
                from_crisis: crisis,
                from_downturn: downturn,
                to: regime.into(),
                to_crisis: crisis,
                to_downturn: downturn,
                returns: RegimeReturn::default(),
            },
            portfolio_return: 0.0,
            value_after: 100_000.0,
            drawdown: 0.0,
            raw_delta: EmotionDelta::default(),
            applied_delta: EmotionDelta::default(),
            state_after: EmotionalState::default(),
            request_faced: ClientRequest::None,
            overrode_request: false,
            intent_after: ClientIntent::NeutralCheckin,
        })
    }

    #[test]
    fn test_aggressive_swing_needs_downturn() {
        let add = || Decision::preset(ReallocationPreset::IncreaseRisk, CommunicationChoice::HoldFirm);

        assert!(is_aggressive_swing(&turn_in("crash", true, true, add(), 0.15)));
        assert!(!is_aggressive_swing(&turn_in("rate-shock", true, false, add(), 0.15)));
        assert!(!is_aggressive_swing(&turn_in("calm-growth", false, false, add(), 0.15)));
        assert!(!is_aggressive_swing(&turn_in("crash", true, true, add(), 0.05)));
    }

    #[test]
    fn test_rate_shock_still_counts_as_crisis_turn() {
        let add = Decision::preset(ReallocationPreset::IncreaseRisk, CommunicationChoice::Empathize);
        let turns = [turn_in("rate-shock", true, false, add, 0.15)];
        let report = evaluate(&turns, &EmotionalState::default(), 100_000.0, 100_000.0);
        assert_eq!(report.breakdown.aggressive_swings, 0);
        assert_eq!(report.breakdown.crisis_turns, 1);
        assert_eq!(report.breakdown.risk, 100.0);
    }

    #[test]
    fn test_title_ladder() {
        assert_eq!(CareerTitle::from_score(95), CareerTitle::SeniorPartner);
        assert_eq!(CareerTitle::from_score(90), CareerTitle::SeniorPartner);
        assert_eq!(CareerTitle::from_score(75), CareerTitle::VicePresident);
        assert_eq!(CareerTitle::from_score(60), CareerTitle::AssociateAdvisor);
        assert_eq!(CareerTitle::from_score(45), CareerTitle::JuniorAdvisor);
        assert_eq!(CareerTitle::from_score(44), CareerTitle::ProbationaryAdvisor);
        assert!(CareerTitle::SeniorPartner > CareerTitle::JuniorAdvisor);
    }

    #[test]
    fn test_empty_session_scores_zero() {
        let report = evaluate(&[], &EmotionalState::default(), 100_000.0, 100_000.0);
        assert_eq!(report.score, 0);
        assert_eq!(report.turns_played, 0);
    }
}
