//! Advisor Gym - Main binary
//!
//! Plays a scripted wealth-advisor session headlessly and prints the career
//! report at the end.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  Decision   ┌───────────────────┐  NarrativeContext  ┌──────────┐
//! │  Strategy  │ ──────────► │ SimulationSession │ ─────────────────► │ Narrator │
//! │  (script)  │             │ market, portfolio │ ◄───────────────── │ LLM or   │
//! │            │ ◄────────── │ client psychology │   NarrativeText    │ fallback │
//! └────────────┘ intent, req └───────────────────┘                    └──────────┘
//! ```
//!
//! The narrator never changes outcomes; without `--llm` (or without
//! `GEMINI_API_KEY`) canned text is used. The run stops early if the client
//! walks away.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use market::RegimeTable;
use narrative::{AnyNarrator, FallbackNarrator, Narrator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use simulation::{SessionConfig, SimulationSession, Turn};
use tracing_subscriber::EnvFilter;
use types::CommunicationChoice;

pub use config::{SimConfig, Strategy};

/// Advisor Gym - Wealth advisor training simulation
#[derive(Parser, Debug)]
#[command(name = "advisor-gym")]
#[command(about = "A turn-based wealth advisor training simulation")]
#[command(version)]
struct Args {
    /// Seed for the market and the generated client
    #[arg(long, env = "SIM_SEED")]
    seed: Option<u64>,

    /// Turns to play
    #[arg(long, env = "SIM_TURNS")]
    turns: Option<u32>,

    /// Starting portfolio value
    #[arg(long, env = "SIM_INITIAL_VALUE")]
    initial_value: Option<f64>,

    /// Scripted advisor behavior
    #[arg(long, value_enum, env = "SIM_STRATEGY")]
    strategy: Option<Strategy>,

    /// JSON regime table to use instead of the built-in one
    #[arg(long, env = "SIM_REGIMES")]
    regimes: Option<PathBuf>,

    /// Regime the session opens in
    #[arg(long, env = "SIM_INITIAL_REGIME")]
    initial_regime: Option<String>,

    /// Generate narrative with the LLM (needs GEMINI_API_KEY)
    #[arg(long, env = "SIM_LLM")]
    llm: bool,

    /// LLM model name
    #[arg(long, env = "SIM_MODEL")]
    model: Option<String>,

    /// Narrative timeout in seconds
    #[arg(long, env = "SIM_NARRATIVE_TIMEOUT")]
    narrative_timeout: Option<u64>,

    /// Print the career report as JSON
    #[arg(long)]
    json: bool,

    /// Write a session snapshot to this path at the end
    #[arg(long, env = "SIM_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Named preset: demo, crisis-drill, full-career
    #[arg(long)]
    preset: Option<String>,
}

fn build_config(args: Args) -> anyhow::Result<SimConfig> {
    let mut config = match args.preset.as_deref() {
        None => SimConfig::default(),
        Some("demo") => SimConfig::demo(),
        Some("crisis-drill") => SimConfig::crisis_drill(),
        Some("full-career") => SimConfig::full_career(),
        Some(other) => anyhow::bail!("unknown preset '{other}'"),
    };

    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    if let Some(turns) = args.turns {
        config = config.turns(turns);
    }
    if let Some(value) = args.initial_value {
        config = config.initial_value(value);
    }
    if let Some(strategy) = args.strategy {
        config = config.strategy(strategy);
    }
    if let Some(regime) = args.initial_regime {
        config = config.initial_regime(regime);
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(secs) = args.narrative_timeout {
        config = config.narrative_timeout(Duration::from_secs(secs));
    }
    config.regimes_path = args.regimes;
    config.use_llm = args.llm;
    config.json_report = args.json;
    config.snapshot_path = args.snapshot;
    Ok(config)
}

fn session_config(config: &SimConfig) -> anyhow::Result<SessionConfig> {
    let mut session = SessionConfig::default()
        .with_initial_value(config.initial_value)
        .with_initial_regime(config.initial_regime.clone())
        .with_narrative_timeout(config.narrative_timeout)
        .with_max_turns(Some(config.turns));
    if let Some(path) = &config.regimes_path {
        let table = RegimeTable::load(path)
            .with_context(|| format!("loading regime table from {}", path.display()))?;
        session = session.with_regimes(table);
    }
    Ok(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(Args::parse())?;
    let session = SimulationSession::with_random_client(session_config(&config)?, config.seed)
        .context("creating session")?;

    if config.use_llm {
        let narrator = AnyNarrator::from_env_or_fallback(config.model.clone());
        run(session, &config, &narrator).await
    } else {
        run(session, &config, &FallbackNarrator).await
    }
}

/// Play the scripted session to completion and report.
async fn run<N>(mut session: SimulationSession, config: &SimConfig, narrator: &N) -> anyhow::Result<()>
where
    N: Narrator + Sync,
{
    let profile = &session.client().profile;
    eprintln!("╔═══════════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Advisor Gym - Session {}", session.id());
    eprintln!("╠═══════════════════════════════════════════════════════════════════════╣");
    eprintln!("║  Client:   {} ({})", profile.name, profile.risk_tolerance);
    eprintln!("║  Goal:     {}", profile.goal);
    eprintln!(
        "║  Strategy: {:?}  │  Turns: {}  │  Seed: {}",
        config.strategy, config.turns, config.seed
    );
    eprintln!("╚═══════════════════════════════════════════════════════════════════════╝");
    eprintln!();

    // Separate stream from the market's so scripted picks don't shift regime draws.
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));

    for _ in 0..config.turns {
        let decision = config.strategy.decide(
            session.client_intent(),
            session.pending_request(),
            || {
                CommunicationChoice::ALL
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or_default()
            },
        );
        let turn = session.advance_turn(decision, narrator).await?;
        print_turn(&turn);
        if session.is_over() {
            break;
        }
    }

    let client = session.client();
    eprintln!();
    if let Some(reason) = session.end_reason().filter(|r| r.is_departure()) {
        eprintln!("Session over after {} turns: {reason}", session.turns().len());
    }
    eprintln!(
        "{} is {} (adherence {:.0}/100)",
        client.profile.name,
        client.status(),
        client.adherence_score()
    );

    let report = session.end_session();
    if config.json_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("{report}");
    }

    if let Some(path) = &config.snapshot_path {
        let json = session.snapshot().to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        eprintln!("Snapshot written to {}", path.display());
    }
    Ok(())
}

fn print_turn(turn: &Turn) {
    let (equity, bond, cash) = turn.allocation().percentages();
    let state = turn.state_after();
    println!(
        "Turn {:>2} │ {:<18} │ {:+6.2}% │ ${:>12.2} │ {equity}/{bond}/{cash} │ anxiety {:>3.0} trust {:>3.0}{}",
        turn.number().0,
        turn.regime().to,
        turn.portfolio_return() * 100.0,
        turn.value_after(),
        state.anxiety,
        state.trust,
        if turn.overrode_request() { " │ overrode request" } else { "" },
    );
    if let Some(text) = turn.narrative() {
        for line in text.to_string().lines() {
            println!("         {line}");
        }
    }
}
