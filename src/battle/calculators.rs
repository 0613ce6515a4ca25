use crate::battle::commands::BattleCommand;
use crate::battle::state::{BattleEvent, CombatState, Side};
use crate::card::{CardInstance, CardStats};
use crate::config::BattleConfig;
use schema::{CardType, EffectKind, EffectModifier};

/// Translate a committed card play into commands.
///
/// Pure: reads the combat state, never mutates it. The card's cost has already
/// been paid when this runs.
pub fn calculate_card_effect(
    card: &CardInstance,
    stats: &CardStats,
    state: &CombatState,
    config: &BattleConfig,
) -> Vec<BattleCommand> {
    let mut commands = vec![BattleCommand::EmitEvent(BattleEvent::CardPlayed {
        instance_id: card.instance_id,
        name: stats.name.clone(),
    })];

    match stats.card_type {
        CardType::Attack => calculate_attack(stats, state, config, &mut commands),
        CardType::Defend => calculate_defend(stats, &mut commands),
        CardType::Skill => calculate_skill(stats, config, &mut commands),
    }

    commands.extend(calculate_riders(stats));
    commands
}

fn calculate_attack(
    stats: &CardStats,
    state: &CombatState,
    config: &BattleConfig,
    commands: &mut Vec<BattleCommand>,
) {
    let mut damage = stats.magnitude();

    // Each DoubleHit stacks another x2
    let doublings = stats
        .modifiers
        .iter()
        .filter(|modifier| **modifier == EffectModifier::DoubleHit)
        .count();
    if doublings > 0 {
        let multiplier = (0..doublings).fold(1u32, |acc, _| acc.saturating_mul(2));
        damage = damage.saturating_mul(multiplier);
        commands.push(BattleCommand::EmitEvent(BattleEvent::DoubleHit { multiplier }));
    }

    // Execute overrides every other damage adjustment
    let executes = stats.modifiers.iter().any(|modifier| match modifier {
        EffectModifier::Execute(threshold) => {
            threshold.is_met(state.enemy_hp, state.enemy_max_hp)
        }
        _ => false,
    });
    if executes {
        damage = config.execute_damage;
        commands.push(BattleCommand::EmitEvent(BattleEvent::Executed));
        commands.push(vfx(EffectKind::Explosion, Side::Enemy));
    }

    let lifesteal_percent = stats.lifesteal_percent();
    commands.push(BattleCommand::DealDamage {
        target: Side::Enemy,
        amount: damage,
        pierce: stats.has(&EffectModifier::Pierce),
        lifesteal_percent,
    });
    commands.push(vfx(stats.effect, Side::Enemy));
    if lifesteal_percent > 0 {
        commands.push(vfx(EffectKind::Drain, Side::Player));
    }
}

fn calculate_defend(stats: &CardStats, commands: &mut Vec<BattleCommand>) {
    commands.push(BattleCommand::GainShield {
        target: Side::Player,
        amount: stats.magnitude(),
    });
    commands.push(vfx(stats.effect, Side::Player));

    if stats.has(&EffectModifier::Freeze) {
        commands.push(BattleCommand::FreezeEnemy);
        commands.push(vfx(EffectKind::IceNova, Side::Enemy));
    }
}

fn calculate_skill(stats: &CardStats, config: &BattleConfig, commands: &mut Vec<BattleCommand>) {
    match stats.effect {
        EffectKind::Draw => {
            let count = stats.magnitude() as usize;
            if count > 0 {
                commands.push(BattleCommand::DrawCards { count });
            }
        }
        EffectKind::BuffAura => {
            let amount = if stats.value > 0 {
                stats.magnitude()
            } else {
                config.buff_fallback_energy
            };
            commands.push(BattleCommand::GainEnergy { amount });
        }
        EffectKind::Heal => {
            commands.push(BattleCommand::Heal {
                target: Side::Player,
                amount: stats.magnitude(),
            });
        }
        EffectKind::Void => {
            let (hp_cost, energy_gain) = stats
                .modifiers
                .iter()
                .find_map(|modifier| match modifier {
                    EffectModifier::Pact {
                        hp_cost,
                        energy_gain,
                    } => Some((*hp_cost, *energy_gain)),
                    _ => None,
                })
                .unwrap_or((config.void_hp_cost, config.void_energy_gain));
            commands.push(BattleCommand::SacrificeHealth { amount: hp_cost });
            commands.push(BattleCommand::GainEnergy {
                amount: energy_gain,
            });
        }
        other => {
            tracing::warn!("Skill card {} has no base effect for {}", stats.name, other);
        }
    }

    commands.push(vfx(stats.effect, Side::Player));
}

/// Modifiers that tack an extra effect onto any card type.
fn calculate_riders(stats: &CardStats) -> Vec<BattleCommand> {
    stats
        .modifiers
        .iter()
        .filter_map(|modifier| match *modifier {
            EffectModifier::GainEnergy(amount) => Some(BattleCommand::GainEnergy { amount }),
            EffectModifier::Heal(amount) => Some(BattleCommand::Heal {
                target: Side::Player,
                amount,
            }),
            EffectModifier::SelfDamage(amount) => Some(BattleCommand::SacrificeHealth { amount }),
            EffectModifier::Recycle => Some(BattleCommand::RecycleFromDiscard),
            _ => None,
        })
        .collect()
}

fn vfx(kind: EffectKind, target: Side) -> BattleCommand {
    BattleCommand::EmitEvent(BattleEvent::Vfx { kind, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::effective_stats;
    use crate::catalog::Catalog;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{CardId, UpgradePath};

    fn card_and_stats(id: &str, path: Option<UpgradePath>) -> (CardInstance, CardStats) {
        let catalog = Catalog::builtin();
        let template = catalog.template(&CardId::new(id)).unwrap();
        let mut card = CardInstance::new(template);
        card.chosen_path = path;
        (card, effective_stats(template, path))
    }

    fn damage_command(commands: &[BattleCommand]) -> Option<(u32, bool, u32)> {
        commands.iter().find_map(|c| match c {
            BattleCommand::DealDamage {
                amount,
                pierce,
                lifesteal_percent,
                ..
            } => Some((*amount, *pierce, *lifesteal_percent)),
            _ => None,
        })
    }

    fn state() -> CombatState {
        CombatState::new(&BattleConfig::default())
    }

    #[rstest]
    #[case("c1", None, 8, false)]
    #[case("c1", Some(UpgradePath::Power), 13, false)]
    #[case("c1", Some(UpgradePath::Special), 16, false)]
    #[case("c3", Some(UpgradePath::Special), 14, true)]
    #[case("c9", Some(UpgradePath::Special), 12, true)]
    #[case("c5", None, 25, false)]
    fn test_attack_damage(
        #[case] id: &str,
        #[case] path: Option<UpgradePath>,
        #[case] damage: u32,
        #[case] pierce: bool,
    ) {
        let (card, stats) = card_and_stats(id, path);
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert_eq!(damage_command(&commands), Some((damage, pierce, 0)));
    }

    #[test]
    fn test_card_played_is_first() {
        let (card, stats) = card_and_stats("c2", None);
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert_eq!(
            commands[0],
            BattleCommand::EmitEvent(BattleEvent::CardPlayed {
                instance_id: card.instance_id,
                name: "Phase Shield".to_string(),
            })
        );
    }

    #[test]
    fn test_execute_below_threshold() {
        let (card, stats) = card_and_stats("c5", Some(UpgradePath::Special));
        let mut combat = state();
        combat.enemy_hp = 25;

        let commands = calculate_card_effect(&card, &stats, &combat, &BattleConfig::default());

        assert_eq!(damage_command(&commands), Some((999, false, 0)));
        assert!(commands.contains(&BattleCommand::EmitEvent(BattleEvent::Executed)));
    }

    #[test]
    fn test_execute_above_threshold_hits_normally() {
        let (card, stats) = card_and_stats("c5", Some(UpgradePath::Special));
        let mut combat = state();
        combat.enemy_hp = 30;

        let commands = calculate_card_effect(&card, &stats, &combat, &BattleConfig::default());

        assert_eq!(damage_command(&commands), Some((25, false, 0)));
        assert!(!commands.contains(&BattleCommand::EmitEvent(BattleEvent::Executed)));
    }

    #[test]
    fn test_drain_carries_lifesteal() {
        let (card, stats) = card_and_stats("c7", None);
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert_eq!(damage_command(&commands), Some((8, false, 100)));
    }

    #[test]
    fn test_freeze_defend() {
        let (card, stats) = card_and_stats("c2", Some(UpgradePath::Special));
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());

        assert!(commands.contains(&BattleCommand::GainShield {
            target: Side::Player,
            amount: 7
        }));
        assert!(commands.contains(&BattleCommand::FreezeEnemy));
    }

    #[rstest]
    #[case(None, 10, 2)]
    #[case(Some(UpgradePath::Power), 20, 3)]
    #[case(Some(UpgradePath::Speed), 5, 1)]
    #[case(Some(UpgradePath::Special), 10, 2)]
    fn test_void_pact_costs(
        #[case] path: Option<UpgradePath>,
        #[case] hp_cost: u32,
        #[case] energy_gain: u32,
    ) {
        let (card, stats) = card_and_stats("c10", path);
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());

        assert!(commands.contains(&BattleCommand::SacrificeHealth { amount: hp_cost }));
        assert!(commands.contains(&BattleCommand::GainEnergy {
            amount: energy_gain
        }));
    }

    #[test]
    fn test_buff_aura_fallback_energy() {
        let (card, mut stats) = card_and_stats("c4", None);
        stats.value = 0;
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert!(commands.contains(&BattleCommand::GainEnergy { amount: 1 }));
    }

    #[test]
    fn test_overcharged_buff_costs_health() {
        let (card, stats) = card_and_stats("c4", Some(UpgradePath::Power));
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert!(commands.contains(&BattleCommand::GainEnergy { amount: 3 }));
        assert!(commands.contains(&BattleCommand::SacrificeHealth { amount: 5 }));
    }

    #[test]
    fn test_draw_skill_and_riders() {
        let (card, stats) = card_and_stats("c11", Some(UpgradePath::Special));
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert!(commands.contains(&BattleCommand::DrawCards { count: 1 }));
        assert!(commands.contains(&BattleCommand::GainEnergy { amount: 1 }));

        let (card, stats) = card_and_stats("c12", Some(UpgradePath::Special));
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert!(!commands
            .iter()
            .any(|c| matches!(c, BattleCommand::DrawCards { .. })));
        assert!(commands.contains(&BattleCommand::RecycleFromDiscard));
    }

    #[test]
    fn test_heal_skill() {
        let (card, stats) = card_and_stats("c8", None);
        let commands = calculate_card_effect(&card, &stats, &state(), &BattleConfig::default());
        assert!(commands.contains(&BattleCommand::Heal {
            target: Side::Player,
            amount: 12
        }));
    }
}
