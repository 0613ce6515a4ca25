use crate::battle::piles::Piles;
use crate::battle::state::{BattleEvent, BattleRng, CombatState, EventBus, Side};

/// How an incoming hit splits between shield and HP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub absorbed: u32,
    pub hp_loss: u32,
    pub shield_after: u32,
}

/// Shield soaks damage first unless the hit is true damage.
pub fn absorb_damage(damage: u32, shield: u32, true_damage: bool) -> DamageOutcome {
    if true_damage {
        return DamageOutcome {
            absorbed: 0,
            hp_loss: damage,
            shield_after: shield,
        };
    }

    let absorbed = damage.min(shield);
    DamageOutcome {
        absorbed,
        hp_loss: damage - absorbed,
        shield_after: shield - absorbed,
    }
}

/// Atomic commands representing final state changes
#[derive(Debug, Clone, PartialEq)]
pub enum BattleCommand {
    // Health and shield
    DealDamage {
        target: Side,
        amount: u32,
        pierce: bool,
        lifesteal_percent: u32, // Heals the player by this share of HP actually removed
    },
    GainShield {
        target: Side,
        amount: u32,
    },
    Heal {
        target: Side,
        amount: u32,
    },
    SacrificeHealth {
        amount: u32,
    },

    // Resources and piles
    GainEnergy {
        amount: u32,
    },
    FreezeEnemy,
    DrawCards {
        count: usize,
    },
    RecycleFromDiscard,

    EmitEvent(BattleEvent),
}

/// Apply commands in order. Every HP and shield change saturates, so the
/// combat state never leaves its bounds.
pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    state: &mut CombatState,
    piles: &mut Piles,
    bus: &mut EventBus,
    rng: &mut BattleRng,
) {
    for command in commands {
        execute_command(command, state, piles, bus, rng);
    }
}

fn execute_command(
    command: BattleCommand,
    state: &mut CombatState,
    piles: &mut Piles,
    bus: &mut EventBus,
    rng: &mut BattleRng,
) {
    match command {
        BattleCommand::EmitEvent(event) => bus.push(event),
        BattleCommand::DealDamage {
            target,
            amount,
            pierce,
            lifesteal_percent,
        } => execute_deal_damage_command(target, amount, pierce, lifesteal_percent, state, bus),
        BattleCommand::GainShield { target, amount } => {
            let shield = state.shield_mut(target);
            *shield = shield.saturating_add(amount);
            let total = *shield;
            bus.push(BattleEvent::ShieldGained {
                target,
                amount,
                total,
            });
        }
        BattleCommand::Heal { target, amount } => execute_heal_command(target, amount, state, bus),
        BattleCommand::SacrificeHealth { amount } => {
            // Self-inflicted costs never kill
            let new_hp = state.player_hp.saturating_sub(amount).max(1);
            let lost = state.player_hp.saturating_sub(new_hp);
            state.player_hp = new_hp;
            bus.push(BattleEvent::HealthSacrificed {
                amount: lost,
                new_hp,
            });
        }
        BattleCommand::GainEnergy { amount } => {
            state.energy = state.energy.saturating_add(amount);
            bus.push(BattleEvent::EnergyGained {
                amount,
                total: state.energy,
            });
        }
        BattleCommand::FreezeEnemy => {
            state.enemy_frozen = true;
            bus.push(BattleEvent::EnemyFrozen);
        }
        BattleCommand::DrawCards { count } => {
            let result = piles.draw(count);
            bus.push(BattleEvent::CardsDrawn {
                requested: result.requested,
                drawn: result.drawn,
            });
        }
        BattleCommand::RecycleFromDiscard => {
            if let Some(instance_id) = piles.recycle(rng) {
                bus.push(BattleEvent::CardRecycled { instance_id });
            }
        }
    }
}

fn execute_deal_damage_command(
    target: Side,
    amount: u32,
    pierce: bool,
    lifesteal_percent: u32,
    state: &mut CombatState,
    bus: &mut EventBus,
) {
    let outcome = absorb_damage(amount, state.shield(target), pierce);
    *state.shield_mut(target) = outcome.shield_after;

    if outcome.absorbed > 0 {
        bus.push(BattleEvent::ShieldAbsorbed {
            target,
            absorbed: outcome.absorbed,
            remaining_shield: outcome.shield_after,
        });
    }

    let hp_before = state.hp(target);
    let remaining_hp = hp_before.saturating_sub(outcome.hp_loss);
    *state.hp_mut(target) = remaining_hp;
    let removed = hp_before - remaining_hp;

    if outcome.hp_loss > 0 {
        bus.push(BattleEvent::DamageDealt {
            target,
            damage: outcome.hp_loss,
            remaining_hp,
        });
    }

    if lifesteal_percent > 0 && removed > 0 {
        let drained = (removed as u64 * lifesteal_percent as u64 / 100) as u32;
        execute_heal_command(target.opponent(), drained, state, bus);
    }
}

fn execute_heal_command(target: Side, amount: u32, state: &mut CombatState, bus: &mut EventBus) {
    let max_hp = state.max_hp(target);
    let hp = state.hp_mut(target);
    let new_hp = hp.saturating_add(amount).min(max_hp);
    let restored = new_hp.saturating_sub(*hp);
    *hp = new_hp;

    if restored > 0 {
        bus.push(BattleEvent::Healed {
            target,
            amount: restored,
            new_hp,
        });
    }
}
