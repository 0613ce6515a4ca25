//! Star Orbit - Entry Point
//!
//! Runs a string of autopiloted battles against the default enemy, claiming
//! rewards between fights, with engine time mapped onto real sleeps.

use clap::Parser;
use serde::Serialize;
use star_orbit::{
    pilot_step, BattleConfig, BattleObserver, BattleOutcome, BattleSession, Catalog,
    Collection, GreedyPilot, Phase, RewardChoice, UpgradePath,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Autopiloted card battles
#[derive(Parser, Debug)]
#[command(name = "star-orbit")]
#[command(about = "Run autopiloted card battles against the default enemy")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Battle config (RON); built-in balance when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Card catalog (RON); built-in catalog when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Number of battles to run, stopping early on a loss
    #[arg(long, default_value_t = 3)]
    battles: u32,

    /// Engine-time speedup over the wall clock; 0 disables sleeping
    #[arg(long, default_value_t = 10.0)]
    speed: f64,

    /// Print a JSON summary instead of the battle log
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct BattleSummary {
    battle: u32,
    outcome: Option<BattleOutcome>,
    turns: u32,
    player_hp: u32,
    enemy_hp: u32,
    collection_size: usize,
    upgraded_cards: usize,
}

struct ConsoleLog;

impl BattleObserver for ConsoleLog {
    fn on_log(&mut self, message: &str) {
        println!("  {}", message);
    }

    fn on_battle_end(&mut self, outcome: BattleOutcome) {
        println!("=== {:?} ===", outcome);
    }
}

// Guards against a pilot that never ends its turn
const MAX_STEPS: usize = 10_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("star_orbit=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => Arc::new(Catalog::load(path)?),
        None => Catalog::builtin(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!("Star Orbit starting with seed {}", seed);

    let mut session = BattleSession::with_seed(Arc::clone(&catalog), config, seed)?;
    if !args.json {
        session.subscribe(Box::new(ConsoleLog));
    }

    let mut collection = Collection::starter(&catalog)?;
    let pilot = GreedyPilot::new();
    let mut summaries = Vec::new();

    for battle in 1..=args.battles {
        if !args.json {
            println!("\n=== Battle {} ===", battle);
        }
        session.start_battle(collection.cards());
        run_battle(&mut session, &pilot, args.speed).await;

        let outcome = session.outcome();
        if outcome == Some(BattleOutcome::Win) {
            let choice = if battle % 2 == 1 {
                RewardChoice::UpgradePoint
            } else {
                RewardChoice::Card
            };
            session.claim_reward(&mut collection, choice)?;
            spend_upgrade_points(&mut collection, &catalog);
        }

        let combat = session.snapshot().combat;
        summaries.push(BattleSummary {
            battle,
            outcome,
            turns: combat.turn_number,
            player_hp: combat.player_hp,
            enemy_hp: combat.enemy_hp,
            collection_size: collection.len(),
            upgraded_cards: collection.cards().iter().filter(|c| c.is_upgraded()).count(),
        });

        if outcome != Some(BattleOutcome::Win) {
            break;
        }
    }

    session.teardown();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!(
                "Battle {}: {:?} after {} turns ({} HP left)",
                summary.battle, summary.outcome, summary.turns, summary.player_hp
            );
        }
    }

    Ok(())
}

/// Drive one battle until it is lost or its reward is on the table.
async fn run_battle(session: &mut BattleSession, pilot: &GreedyPilot, speed: f64) {
    for _ in 0..MAX_STEPS {
        let phase = session.phase();
        let state = session.controller().state();
        let settled = phase == Phase::Lost || state.pending_reward.is_some();
        if settled {
            return;
        }

        if phase.is_player_turn() && state.in_flight.is_empty() {
            if let Err(err) = pilot_step(session, pilot) {
                tracing::warn!("Autopilot could not act: {}", err);
            }
        }

        let Some(wait_ms) = session.next_timer_in() else {
            tracing::warn!("Battle stalled with nothing scheduled");
            return;
        };
        if speed > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(wait_ms as f64 / 1000.0 / speed)).await;
        }
        session.advance(wait_ms);
    }
    tracing::warn!("Battle hit the step limit");
}

fn spend_upgrade_points(collection: &mut Collection, catalog: &Catalog) {
    while collection.upgrade_points() > 0 {
        let Some(target) = collection
            .cards()
            .iter()
            .find(|c| !c.is_upgraded())
            .map(|c| c.instance_id)
        else {
            return;
        };
        if let Err(err) = collection.choose_upgrade(catalog, target, UpgradePath::Power) {
            tracing::warn!("Upgrade failed: {}", err);
            return;
        }
    }
}
