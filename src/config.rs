//! Tunable battle constants.
//!
//! Every field has a default matching the shipped game balance, so a config file
//! only needs to name the values it changes:
//!
//! ```ron
//! (
//!     enemy_max_hp: 250,
//!     enemy: (attack_percent: 80),
//! )
//! ```

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BattleConfig {
    pub player_max_hp: u32,
    pub enemy_max_hp: u32,
    pub starting_energy: u32,
    pub deck_size: usize,
    pub opening_hand: usize,
    pub cards_per_turn: usize,
    /// Player shield is divided by this (floor) at the start of each player turn.
    pub shield_decay_divisor: u32,
    pub execute_damage: u32,
    pub void_hp_cost: u32,
    pub void_energy_gain: u32,
    /// Energy granted by a BUFF_AURA skill whose value is not positive.
    pub buff_fallback_energy: u32,
    pub enemy: EnemyConfig,
    pub timings: Timings,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            player_max_hp: 100,
            enemy_max_hp: 200,
            starting_energy: 3,
            deck_size: 30,
            opening_hand: 3,
            cards_per_turn: 2,
            shield_decay_divisor: 2,
            execute_damage: 999,
            void_hp_cost: 10,
            void_energy_gain: 2,
            buff_fallback_energy: 1,
            enemy: EnemyConfig::default(),
            timings: Timings::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnemyConfig {
    /// Chance (0-100) that the enemy attacks rather than defends.
    pub attack_percent: u8,
    pub damage_min: u32,
    pub damage_max: u32,
    pub defend_shield: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            attack_percent: 70,
            damage_min: 8,
            damage_max: 17,
            defend_shield: 10,
        }
    }
}

/// Scripted delays, in milliseconds of engine time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Timings {
    pub play_settle_ms: u64,
    pub auto_end_settle_ms: u64,
    pub enemy_think_ms: u64,
    pub reward_delay_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            play_settle_ms: 300,
            auto_end_settle_ms: 1500,
            enemy_think_ms: 2000,
            reward_delay_ms: 2000,
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_max_hp == 0 || self.enemy_max_hp == 0 {
            return Err(ConfigError::Invalid("max HP must be positive".to_string()));
        }
        if self.deck_size == 0 {
            return Err(ConfigError::Invalid("deck size must be positive".to_string()));
        }
        if self.shield_decay_divisor == 0 {
            return Err(ConfigError::Invalid(
                "shield decay divisor must be positive".to_string(),
            ));
        }
        if self.enemy.damage_min > self.enemy.damage_max {
            return Err(ConfigError::Invalid(format!(
                "enemy damage range {}..={} is empty",
                self.enemy.damage_min, self.enemy.damage_max
            )));
        }
        if self.enemy.attack_percent > 100 {
            return Err(ConfigError::Invalid(
                "enemy attack chance must be at most 100".to_string(),
            ));
        }
        Ok(())
    }
}
