//! Enemy decision making.

use crate::battle::commands::BattleCommand;
use crate::battle::state::{BattleEvent, BattleRng, CombatState, Side};
use crate::config::EnemyConfig;
use schema::EffectKind;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyAction {
    Attack { damage: u32 },
    Defend { shield: u32 },
}

/// A trait for any system that can decide the enemy's action.
/// Swapping implementations changes difficulty without touching the turn flow.
pub trait EnemyPolicy {
    /// Inspects the combat state and picks the enemy's next action.
    fn decide(&self, state: &CombatState, rng: &mut BattleRng) -> EnemyAction;
}

/// Coin-flip enemy: attacks for a random amount or raises its shield.
#[derive(Debug, Clone, Default)]
pub struct RandomPolicy {
    config: EnemyConfig,
}

impl RandomPolicy {
    pub fn new(config: EnemyConfig) -> Self {
        Self { config }
    }
}

impl EnemyPolicy for RandomPolicy {
    fn decide(&self, _state: &CombatState, rng: &mut BattleRng) -> EnemyAction {
        let roll = rng.roll_percent("Enemy attack or defend");
        if roll <= self.config.attack_percent as u32 {
            let damage = rng.roll_range(
                "Enemy attack damage",
                self.config.damage_min,
                self.config.damage_max,
            );
            EnemyAction::Attack { damage }
        } else {
            EnemyAction::Defend {
                shield: self.config.defend_shield,
            }
        }
    }
}

/// Translate the chosen action into commands.
pub fn calculate_enemy_action(action: EnemyAction) -> Vec<BattleCommand> {
    match action {
        EnemyAction::Attack { damage } => vec![
            BattleCommand::EmitEvent(BattleEvent::EnemyAttacked { damage }),
            BattleCommand::DealDamage {
                target: Side::Player,
                amount: damage,
                pierce: false,
                lifesteal_percent: 0,
            },
            BattleCommand::EmitEvent(BattleEvent::Vfx {
                kind: EffectKind::Slash,
                target: Side::Player,
            }),
        ],
        EnemyAction::Defend { shield } => vec![
            BattleCommand::EmitEvent(BattleEvent::EnemyDefended { shield }),
            BattleCommand::GainShield {
                target: Side::Enemy,
                amount: shield,
            },
            BattleCommand::EmitEvent(BattleEvent::Vfx {
                kind: EffectKind::Block,
                target: Side::Enemy,
            }),
        ],
    }
}
