//! Scripted player for demos and soak tests.

use crate::battle::commands::absorb_damage;
use crate::battle::engine::TurnController;
use crate::battle::session::BattleSession;
use crate::battle::state::CombatState;
use crate::card::{CardInstance, CardStats, InstanceId};
use crate::errors::ActionError;
use schema::{CardType, EffectKind, EffectModifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotDecision {
    Play(InstanceId),
    EndTurn,
}

/// A trait for anything that can take the player's seat.
pub trait PlayerBehavior {
    /// Inspects the battle and decides what the player does next.
    fn decide(&self, controller: &TurnController) -> PilotDecision;
}

/// Plays the highest-scoring affordable card until nothing scores above zero.
#[derive(Debug, Clone, Default)]
pub struct GreedyPilot;

impl GreedyPilot {
    pub fn new() -> Self {
        Self
    }

    fn score_card(&self, stats: &CardStats, controller: &TurnController) -> f32 {
        let combat = controller.combat();
        let score = match stats.card_type {
            CardType::Attack => self.score_attack(stats, combat, controller),
            CardType::Defend => self.score_defend(stats, combat),
            CardType::Skill => self.score_skill(stats, combat, controller),
        };

        // Cheaper cards leave room for more plays this turn.
        score / (stats.cost as f32 + 1.0)
    }

    fn score_attack(
        &self,
        stats: &CardStats,
        combat: &CombatState,
        controller: &TurnController,
    ) -> f32 {
        let mut damage = stats.magnitude();
        for modifier in &stats.modifiers {
            match modifier {
                EffectModifier::DoubleHit => damage = damage.saturating_mul(2),
                EffectModifier::Execute(threshold)
                    if threshold.is_met(combat.enemy_hp, combat.enemy_max_hp) =>
                {
                    damage = controller.config().execute_damage;
                }
                _ => {}
            }
        }

        let outcome = absorb_damage(
            damage,
            combat.enemy_shield,
            stats.has(&EffectModifier::Pierce),
        );

        // A killing blow beats everything else.
        if outcome.hp_loss >= combat.enemy_hp {
            return 1000.0;
        }

        let missing_hp = combat.player_max_hp.saturating_sub(combat.player_hp);
        let drained = (outcome.hp_loss * stats.lifesteal_percent() / 100).min(missing_hp);

        outcome.hp_loss as f32 + outcome.absorbed as f32 * 0.5 + drained as f32 * 0.8
    }

    fn score_defend(&self, stats: &CardStats, combat: &CombatState) -> f32 {
        let mut score = stats.magnitude() as f32 * 0.8;
        if stats.has(&EffectModifier::Freeze) && !combat.enemy_frozen {
            score += 12.0;
        }
        score
    }

    fn score_skill(
        &self,
        stats: &CardStats,
        combat: &CombatState,
        controller: &TurnController,
    ) -> f32 {
        let piles = controller.piles();
        let riders: f32 = stats
            .modifiers
            .iter()
            .map(|modifier| match modifier {
                EffectModifier::GainEnergy(amount) => *amount as f32 * 4.0,
                EffectModifier::Heal(amount) => {
                    (*amount).min(combat.player_max_hp.saturating_sub(combat.player_hp)) as f32
                }
                EffectModifier::SelfDamage(amount) => -(*amount as f32) * 0.5,
                EffectModifier::Recycle if !piles.discard_pile().is_empty() => 6.0,
                _ => 0.0,
            })
            .sum();

        let base = match stats.effect {
            EffectKind::Draw => {
                let drawable = (stats.magnitude() as usize).min(piles.draw_pile().len());
                drawable as f32 * 5.0
            }
            EffectKind::BuffAura => {
                // Energy only matters if something in hand needs it.
                let wants_energy = piles.hand().iter().any(|card| {
                    card.stats(controller.catalog())
                        .is_ok_and(|s| s.cost > combat.energy)
                });
                if wants_energy {
                    stats.value.max(1) as f32 * 6.0
                } else {
                    0.0
                }
            }
            EffectKind::Heal => {
                stats
                    .magnitude()
                    .min(combat.player_max_hp.saturating_sub(combat.player_hp)) as f32
            }
            EffectKind::Void => {
                // Only pay with health while there is plenty of it.
                if combat.player_hp > combat.player_max_hp / 2 {
                    8.0
                } else {
                    -1.0
                }
            }
            _ => 0.0,
        };

        base + riders
    }

    fn playable_cards<'a>(
        &self,
        controller: &'a TurnController,
    ) -> impl Iterator<Item = (&'a CardInstance, CardStats)> + 'a {
        let energy = controller.combat().energy;
        controller
            .piles()
            .hand()
            .iter()
            .filter(move |card| !controller.state().is_in_flight(card.instance_id))
            .filter_map(move |card| {
                let stats = card.stats(controller.catalog()).ok()?;
                (stats.cost <= energy).then_some((card, stats))
            })
    }
}

impl PlayerBehavior for GreedyPilot {
    fn decide(&self, controller: &TurnController) -> PilotDecision {
        if !controller.phase().is_player_turn() {
            return PilotDecision::EndTurn;
        }

        self.playable_cards(controller)
            .map(|(card, stats)| (card.instance_id, self.score_card(&stats, controller)))
            .filter(|(_, score)| *score > 0.0)
            .max_by_key(|(_, score)| ordered_float::OrderedFloat(*score))
            .map(|(instance_id, _)| PilotDecision::Play(instance_id))
            .unwrap_or(PilotDecision::EndTurn)
    }
}

/// Let `pilot` take one action in the player's seat and report what was done.
/// A rejected play falls back to ending the turn.
pub fn pilot_step(
    session: &mut BattleSession,
    pilot: &dyn PlayerBehavior,
) -> Result<PilotDecision, ActionError> {
    match pilot.decide(session.controller()) {
        PilotDecision::Play(instance_id) => match session.play_card(instance_id) {
            Ok(()) => Ok(PilotDecision::Play(instance_id)),
            Err(err) => {
                tracing::warn!("Autopilot play of {} rejected: {}", instance_id, err);
                session.end_turn()?;
                Ok(PilotDecision::EndTurn)
            }
        },
        PilotDecision::EndTurn => {
            session.end_turn()?;
            Ok(PilotDecision::EndTurn)
        }
    }
}
