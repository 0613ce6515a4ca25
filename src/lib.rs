//! Star Orbit Battle Engine
//!
//! A turn-based card battle system: a persistent collection of upgradeable
//! cards, a shuffled battle deck, an energy economy, and an enemy that
//! attacks or defends on its own clock.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod card;
pub mod catalog;
pub mod config;
pub mod errors;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    CardId, CardTemplate, CardType, EffectKind, EffectModifier, ExecuteThreshold, UpgradeOption,
    UpgradePath,
};

// --- From this crate's modules (`src/`) ---

// Battle engine and session.
pub use battle::ai::{EnemyAction, EnemyPolicy, RandomPolicy};
pub use battle::autopilot::{pilot_step, GreedyPilot, PilotDecision, PlayerBehavior};
pub use battle::engine::TurnController;
pub use battle::session::{BattleObserver, BattleSession};
pub use battle::state::{
    BattleEvent, BattleOutcome, BattleRng, BattleSnapshot, CombatState, EventBus, Phase,
    RewardChoice, Side,
};

// Cards and collection.
pub use card::{effective_stats, CardInstance, CardStats, Collection, InstanceId};
pub use catalog::Catalog;
pub use config::BattleConfig;

// Crate-specific error and result types.
pub use errors::{
    ActionError, CatalogError, CatalogResult, ConfigError, EngineError, EngineResult, UpgradeError,
};
