use crate::card_types::{CardType, EffectKind, UpgradePath};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Catalog identifier of a card template (e.g. `"c1"`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When an execute modifier turns a hit lethal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteThreshold {
    /// Enemy HP strictly below this absolute value.
    Below(u32),
    /// Enemy HP strictly below this percentage of the enemy's max HP.
    BelowPercentOfMax(u8),
}

impl ExecuteThreshold {
    pub fn is_met(&self, current_hp: u32, max_hp: u32) -> bool {
        match *self {
            ExecuteThreshold::Below(limit) => current_hp < limit,
            ExecuteThreshold::BelowPercentOfMax(percent) => {
                (current_hp as u64) * 100 < (max_hp as u64) * percent as u64
            }
        }
    }
}

/// Data-driven rider attached to a template or an upgrade option.
/// The resolver dispatches on these instead of on card ids.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum EffectModifier {
    /// Attack damage is doubled (flat multiplier, single shield check).
    DoubleHit,
    /// Attack damage becomes the lethal constant when the threshold is met.
    Execute(ExecuteThreshold),
    /// Attack ignores enemy shield.
    Pierce,
    /// Heal the player by this percentage of HP damage actually dealt. Stacks additively.
    Lifesteal(u32),
    /// Defend also freezes the enemy for its next action.
    Freeze,
    /// Grant extra energy after the main effect.
    GainEnergy(u32),
    /// Heal the player after the main effect.
    Heal(u32),
    /// The player loses HP, never dropping below 1.
    SelfDamage(u32),
    /// Overrides the HP cost and energy gain of a VOID skill.
    Pact { hp_cost: u32, energy_gain: u32 },
    /// Return one random card from the discard pile to the hand.
    Recycle,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOption {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub value_delta: i32,
    #[serde(default)]
    pub cost_delta: i32,
    #[serde(default)]
    pub modifiers: Vec<EffectModifier>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardTemplate {
    pub id: CardId,
    pub card_type: CardType,
    pub base_name: String,
    /// May contain a `{val}` placeholder for the computed value.
    pub base_description: String,
    pub base_cost: u32,
    pub base_value: i32,
    pub base_effect: EffectKind,
    pub color: String,
    #[serde(default)]
    pub base_modifiers: Vec<EffectModifier>,
    #[serde(default)]
    pub upgrades: BTreeMap<UpgradePath, UpgradeOption>,
}

impl CardTemplate {
    pub fn upgrade(&self, path: UpgradePath) -> Option<&UpgradeOption> {
        self.upgrades.get(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_execute_threshold() {
        let threshold = ExecuteThreshold::Below(30);
        assert!(threshold.is_met(25, 200));
        assert!(threshold.is_met(0, 200));
        assert!(!threshold.is_met(30, 200));
    }

    #[test]
    fn test_percent_execute_threshold() {
        let threshold = ExecuteThreshold::BelowPercentOfMax(30);
        assert!(threshold.is_met(59, 200));
        assert!(!threshold.is_met(60, 200));
        assert!(!threshold.is_met(1, 0));
    }

    #[test]
    fn test_card_id_display() {
        assert_eq!(CardId::new("c5").to_string(), "c5");
        assert_eq!(CardId::new("c5").as_str(), "c5");
    }
}
