use crate::battle::ai::{calculate_enemy_action, EnemyPolicy};
use crate::battle::calculators::calculate_card_effect;
use crate::battle::commands::execute_command_batch;
use crate::battle::piles::{assemble_deck, Piles};
use crate::battle::scheduler::{Scheduler, TimerEvent};
use crate::battle::state::{
    BattleEvent, BattleOutcome, BattleRng, BattleSnapshot, BattleState, CombatState, EventBus,
    HandCardView, Phase, Reward, Side, TurnEndReason,
};
use crate::card::{CardInstance, InstanceId};
use crate::catalog::Catalog;
use crate::config::BattleConfig;
use crate::errors::{ActionError, ConfigError};
use std::sync::Arc;

/// Drives one battle at a time through its phases.
///
/// All delays run on the scheduler's virtual clock; nothing happens between
/// calls. Callers feed elapsed time through [`TurnController::advance`] and
/// collect the resulting events from the bus they pass in.
pub struct TurnController {
    config: BattleConfig,
    catalog: Arc<Catalog>,
    policy: Box<dyn EnemyPolicy>,
    rng: BattleRng,
    scheduler: Scheduler,
    state: BattleState,
}

impl TurnController {
    /// Fails if the config could make a later roll or draw impossible.
    pub fn new(
        catalog: Arc<Catalog>,
        config: BattleConfig,
        policy: Box<dyn EnemyPolicy>,
        rng: BattleRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = BattleState::idle(&config);
        Ok(Self {
            config,
            catalog,
            policy,
            rng,
            scheduler: Scheduler::new(),
            state,
        })
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn combat(&self) -> &CombatState {
        &self.state.combat
    }

    pub fn piles(&self) -> &Piles {
        &self.state.piles
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Milliseconds until the next scheduled engine step, if any.
    pub fn next_timer_in(&self) -> Option<u64> {
        self.scheduler.next_due_in()
    }

    /// Replace whatever battle was running with a fresh one.
    pub fn start_battle(&mut self, collection: &[CardInstance], bus: &mut EventBus) {
        self.scheduler.cancel_all();

        let deck = assemble_deck(collection, &self.catalog, self.config.deck_size, &mut self.rng);
        let deck_size = deck.len();
        let mut piles = Piles::new(deck);
        let deck_ids = piles.instance_ids();
        debug_assert!(
            deck_ids.windows(2).all(|pair| pair[0] != pair[1]),
            "battle deck must not repeat an instance id"
        );
        let opening = piles.draw(self.config.opening_hand);

        self.state = BattleState {
            combat: CombatState::new(&self.config),
            piles,
            phase: Phase::Idle,
            in_flight: Vec::new(),
            deck_ids,
            pending_reward: None,
            reward_granted: false,
        };

        tracing::info!(
            "Battle started: {} cards in deck, {} in opening hand",
            deck_size,
            opening.drawn
        );
        bus.push(BattleEvent::BattleStarted {
            deck_size,
            hand_size: opening.drawn,
        });

        self.set_phase(Phase::PlayerActive);
        self.evaluate_auto_end();
    }

    /// Pay for a card now; its effect resolves once the play delay elapses.
    pub fn play_card(&mut self, instance_id: InstanceId) -> Result<(), ActionError> {
        let result = self.try_play_card(instance_id);
        if let Err(err) = &result {
            tracing::debug!("Rejected play of card {}: {}", instance_id, err);
        }
        result
    }

    fn try_play_card(&mut self, instance_id: InstanceId) -> Result<(), ActionError> {
        self.check_player_turn()?;

        if self.state.is_in_flight(instance_id) {
            return Err(ActionError::CardInFlight(instance_id));
        }

        let card = self
            .state
            .piles
            .hand_card(instance_id)
            .ok_or(ActionError::CardNotInHand(instance_id))?;
        let stats = card
            .stats(&self.catalog)
            .map_err(|_| ActionError::UnknownTemplate(card.template_id.clone()))?;

        let available = self.state.combat.energy;
        if stats.cost > available {
            return Err(ActionError::InsufficientEnergy {
                required: stats.cost,
                available,
            });
        }

        self.state.combat.energy = available - stats.cost;
        self.state.in_flight.push(instance_id);
        self.scheduler
            .schedule(self.config.timings.play_settle_ms, TimerEvent::CommitPlay(instance_id));
        tracing::debug!(
            "Card {} ({}) paid {} energy, {} left",
            instance_id,
            stats.name,
            stats.cost,
            self.state.combat.energy
        );

        self.evaluate_auto_end();
        Ok(())
    }

    /// End the player's turn. Plays still waiting on their delay resolve first.
    pub fn end_turn(&mut self, bus: &mut EventBus) -> Result<(), ActionError> {
        if let Err(err) = self.check_player_turn() {
            tracing::debug!("Rejected end turn: {}", err);
            return Err(err);
        }

        for instance_id in self.state.in_flight.clone() {
            self.scheduler.cancel(&TimerEvent::CommitPlay(instance_id));
            self.commit_play(instance_id, bus);
            if self.state.phase.is_terminal() {
                return Ok(());
            }
        }

        bus.push(BattleEvent::TurnEnded {
            reason: TurnEndReason::Requested,
        });
        self.begin_enemy_phase();
        Ok(())
    }

    /// Move the virtual clock forward, firing every timer that comes due.
    pub fn advance(&mut self, elapsed_ms: u64, bus: &mut EventBus) {
        let target = self.scheduler.now().saturating_add(elapsed_ms);
        while let Some(event) = self.scheduler.pop_due(target) {
            self.handle_timer(event, bus);
        }
        self.scheduler.advance_to(target);
    }

    /// Hand out the reward of a won battle. Succeeds at most once per battle.
    pub fn take_reward(&mut self) -> Result<Reward, ActionError> {
        self.state.pending_reward.take().ok_or(ActionError::NoReward)
    }

    /// Drop the current battle and every pending timer.
    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.state = BattleState::idle(&self.config);
        tracing::debug!("Battle torn down");
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        let hand = self
            .state
            .piles
            .hand()
            .iter()
            .filter_map(|card| {
                let stats = card.stats(&self.catalog).ok()?;
                let in_flight = self.state.is_in_flight(card.instance_id);
                Some(HandCardView {
                    instance_id: card.instance_id,
                    playable: self.state.phase.is_player_turn()
                        && !in_flight
                        && stats.cost <= self.state.combat.energy,
                    in_flight,
                    name: stats.name,
                    description: stats.long_description,
                    card_type: stats.card_type,
                    effect: stats.effect,
                    cost: stats.cost,
                    value: stats.value,
                })
            })
            .collect();

        BattleSnapshot {
            combat: self.state.combat.clone(),
            phase: self.state.phase,
            draw_pile: self.state.piles.draw_pile().len(),
            hand,
            discard_pile: self.state.piles.discard_pile().len(),
        }
    }

    fn check_player_turn(&self) -> Result<(), ActionError> {
        match self.state.phase {
            Phase::Idle => Err(ActionError::NoBattle),
            Phase::Won | Phase::Lost => Err(ActionError::BattleOver),
            Phase::PlayerActive | Phase::PlayerAutoEnd => Ok(()),
            Phase::EnemyActive | Phase::RoundReset => Err(ActionError::NotPlayerTurn),
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase != phase {
            tracing::debug!("Phase {:?} -> {:?}", self.state.phase, phase);
            self.state.phase = phase;
        }
    }

    fn handle_timer(&mut self, event: TimerEvent, bus: &mut EventBus) {
        match event {
            TimerEvent::CommitPlay(instance_id) => self.commit_play(instance_id, bus),
            TimerEvent::AutoEndCheck => self.auto_end_check(bus),
            TimerEvent::EnemyAct => self.enemy_act(bus),
            TimerEvent::GrantReward => self.grant_reward(bus),
        }
    }

    fn commit_play(&mut self, instance_id: InstanceId, bus: &mut EventBus) {
        self.state.in_flight.retain(|id| *id != instance_id);
        if self.state.phase.is_terminal() {
            return;
        }

        let Some(card) = self.state.piles.hand_card(instance_id).cloned() else {
            tracing::warn!("Committed card {} is no longer in hand", instance_id);
            return;
        };

        match card.stats(&self.catalog) {
            Ok(stats) => {
                let commands =
                    calculate_card_effect(&card, &stats, &self.state.combat, &self.config);
                execute_command_batch(
                    commands,
                    &mut self.state.combat,
                    &mut self.state.piles,
                    bus,
                    &mut self.rng,
                );
            }
            Err(err) => tracing::warn!("Card {} resolved without effect: {}", instance_id, err),
        }

        self.state.piles.discard_from_hand(instance_id);
        debug_assert_eq!(
            self.state.piles.instance_ids(),
            self.state.deck_ids,
            "card instances must be conserved across piles"
        );

        if self.check_battle_end(bus) {
            return;
        }
        self.evaluate_auto_end();
    }

    fn has_affordable_card(&self) -> bool {
        let energy = self.state.combat.energy;
        self.state
            .piles
            .hand()
            .iter()
            .filter(|card| !self.state.is_in_flight(card.instance_id))
            .any(|card| {
                card.stats(&self.catalog)
                    .is_ok_and(|stats| stats.cost <= energy)
            })
    }

    /// Enter or leave the auto-end wait depending on whether anything is playable.
    pub(crate) fn evaluate_auto_end(&mut self) {
        if !self.state.phase.is_player_turn() {
            return;
        }

        if self.has_affordable_card() {
            if self.state.phase == Phase::PlayerAutoEnd {
                self.scheduler.cancel(&TimerEvent::AutoEndCheck);
                self.set_phase(Phase::PlayerActive);
            }
            return;
        }

        self.set_phase(Phase::PlayerAutoEnd);
        if !self.scheduler.is_pending(&TimerEvent::AutoEndCheck) {
            self.scheduler
                .schedule(self.config.timings.auto_end_settle_ms, TimerEvent::AutoEndCheck);
        }
    }

    fn auto_end_check(&mut self, bus: &mut EventBus) {
        if self.state.phase != Phase::PlayerAutoEnd {
            return;
        }

        // A pending commit re-evaluates when it lands
        if !self.state.in_flight.is_empty() {
            tracing::debug!(
                "Auto-end deferred, {} card(s) still resolving",
                self.state.in_flight.len()
            );
            return;
        }

        if self.has_affordable_card() {
            self.set_phase(Phase::PlayerActive);
            return;
        }

        let piles = &self.state.piles;
        let reason = if piles.hand().is_empty() && piles.draw_pile().is_empty() {
            TurnEndReason::DeckExhausted
        } else if piles.hand().is_empty() {
            TurnEndReason::HandEmpty
        } else {
            TurnEndReason::OutOfEnergy
        };

        bus.push(BattleEvent::TurnEnded { reason });
        self.begin_enemy_phase();
    }

    fn begin_enemy_phase(&mut self) {
        self.scheduler.cancel(&TimerEvent::AutoEndCheck);
        self.state.combat.turn = Side::Enemy;
        self.set_phase(Phase::EnemyActive);
        self.scheduler
            .schedule(self.config.timings.enemy_think_ms, TimerEvent::EnemyAct);
    }

    fn enemy_act(&mut self, bus: &mut EventBus) {
        if self.state.phase != Phase::EnemyActive {
            return;
        }

        if self.state.combat.enemy_frozen {
            self.state.combat.enemy_frozen = false;
            bus.push(BattleEvent::EnemyFreezeConsumed);
            tracing::debug!("Enemy frozen, action skipped");
        } else {
            let action = self.policy.decide(&self.state.combat, &mut self.rng);
            tracing::debug!("Enemy chose {:?}", action);
            execute_command_batch(
                calculate_enemy_action(action),
                &mut self.state.combat,
                &mut self.state.piles,
                bus,
                &mut self.rng,
            );
            if self.check_battle_end(bus) {
                return;
            }
        }

        self.start_player_round(bus);
    }

    fn start_player_round(&mut self, bus: &mut EventBus) {
        self.set_phase(Phase::RoundReset);

        let combat = &mut self.state.combat;
        combat.energy = self.config.starting_energy;
        combat.turn_number += 1;
        let turn_number = combat.turn_number;

        let draw = self.state.piles.draw(self.config.cards_per_turn);
        bus.push(BattleEvent::TurnStarted {
            turn_number,
            drawn: draw.drawn,
        });

        let combat = &mut self.state.combat;
        let decayed = combat.player_shield / self.config.shield_decay_divisor.max(1);
        if decayed != combat.player_shield {
            bus.push(BattleEvent::ShieldDecayed {
                from: combat.player_shield,
                to: decayed,
            });
            combat.player_shield = decayed;
        }
        combat.turn = Side::Player;

        self.set_phase(Phase::PlayerActive);
        self.evaluate_auto_end();
    }

    /// Check both HP totals; on a decisive result stop everything that is pending.
    fn check_battle_end(&mut self, bus: &mut EventBus) -> bool {
        if self.state.phase.is_terminal() {
            return true;
        }

        let outcome = if self.state.combat.enemy_hp == 0 {
            BattleOutcome::Win
        } else if self.state.combat.player_hp == 0 {
            BattleOutcome::Loss
        } else {
            return false;
        };

        self.scheduler.cancel_all();
        self.state.in_flight.clear();
        self.set_phase(match outcome {
            BattleOutcome::Win => Phase::Won,
            BattleOutcome::Loss => Phase::Lost,
        });
        bus.push(BattleEvent::BattleEnded { outcome });
        tracing::info!(
            "Battle ended with a {:?} on turn {}",
            outcome,
            self.state.combat.turn_number
        );

        if outcome == BattleOutcome::Win {
            self.scheduler
                .schedule(self.config.timings.reward_delay_ms, TimerEvent::GrantReward);
        }
        true
    }

    fn grant_reward(&mut self, bus: &mut EventBus) {
        if self.state.phase != Phase::Won || self.state.reward_granted {
            return;
        }

        let template = self.catalog.random_template(self.rng.generator());
        let card = CardInstance::new(template);
        let name = template.base_name.clone();

        self.state.reward_granted = true;
        self.state.pending_reward = Some(Reward { card: card.clone() });
        tracing::info!("Reward offered: {}", name);
        bus.push(BattleEvent::RewardOffered { card, name });
    }
}
