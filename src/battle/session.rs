use crate::battle::ai::{EnemyPolicy, RandomPolicy};
use crate::battle::engine::TurnController;
use crate::battle::state::{
    BattleEvent, BattleOutcome, BattleRng, BattleSnapshot, EventBus, Phase, Reward,
    RewardChoice, Side,
};
use crate::card::{CardInstance, Collection, InstanceId};
use crate::catalog::Catalog;
use crate::config::BattleConfig;
use crate::errors::{ActionError, ConfigError};
use schema::EffectKind;
use std::sync::Arc;

/// Presentation hooks. Every method has a no-op default, so an observer only
/// implements what it renders.
pub trait BattleObserver {
    fn on_log(&mut self, _message: &str) {}
    fn on_vfx(&mut self, _kind: EffectKind, _target: Side) {}
    fn on_state_change(&mut self, _snapshot: &BattleSnapshot) {}
    fn on_battle_end(&mut self, _outcome: BattleOutcome) {}
    fn on_reward(&mut self, _card: &CardInstance) {}
}

/// High-level battle interface that hides timers and phases behind a handful of calls.
/// Events from every call are forwarded to the subscribed observers and returned.
pub struct BattleSession {
    controller: TurnController,
    observers: Vec<Box<dyn BattleObserver>>,
    history: Vec<BattleEvent>,
}

impl BattleSession {
    /// Session with the default enemy and an entropy-seeded rng.
    pub fn new(catalog: Arc<Catalog>, config: BattleConfig) -> Result<Self, ConfigError> {
        let policy = Box::new(RandomPolicy::new(config.enemy.clone()));
        Self::with_policy(catalog, config, policy, BattleRng::from_entropy())
    }

    /// Reproducible session: the same seed and inputs replay the same battle.
    pub fn with_seed(
        catalog: Arc<Catalog>,
        config: BattleConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let policy = Box::new(RandomPolicy::new(config.enemy.clone()));
        Self::with_policy(catalog, config, policy, BattleRng::seeded(seed))
    }

    pub fn with_policy(
        catalog: Arc<Catalog>,
        config: BattleConfig,
        policy: Box<dyn EnemyPolicy>,
        rng: BattleRng,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            controller: TurnController::new(catalog, config, policy, rng)?,
            observers: Vec::new(),
            history: Vec::new(),
        })
    }

    pub fn subscribe(&mut self, observer: Box<dyn BattleObserver>) {
        self.observers.push(observer);
    }

    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.controller.state().outcome()
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        self.controller.snapshot()
    }

    pub fn next_timer_in(&self) -> Option<u64> {
        self.controller.next_timer_in()
    }

    /// Every event since the current battle started.
    pub fn history(&self) -> &[BattleEvent] {
        &self.history
    }

    /// Start a new battle from the player's collection, discarding any battle in progress.
    pub fn start_battle(&mut self, collection: &[CardInstance]) -> EventBus {
        self.history.clear();
        let mut bus = EventBus::new();
        self.controller.start_battle(collection, &mut bus);
        self.publish(&bus);
        bus
    }

    pub fn play_card(&mut self, instance_id: InstanceId) -> Result<(), ActionError> {
        self.controller.play_card(instance_id)?;
        self.publish(&EventBus::new());
        Ok(())
    }

    pub fn end_turn(&mut self) -> Result<EventBus, ActionError> {
        let mut bus = EventBus::new();
        self.controller.end_turn(&mut bus)?;
        self.publish(&bus);
        Ok(bus)
    }

    /// Let `elapsed_ms` of battle time pass.
    pub fn advance(&mut self, elapsed_ms: u64) -> EventBus {
        let mut bus = EventBus::new();
        self.controller.advance(elapsed_ms, &mut bus);
        if !bus.is_empty() {
            self.publish(&bus);
        }
        bus
    }

    /// Apply the pending reward to the collection: the offered card, or one upgrade point.
    pub fn claim_reward(
        &mut self,
        collection: &mut Collection,
        choice: RewardChoice,
    ) -> Result<Reward, ActionError> {
        let reward = self.controller.take_reward()?;
        match choice {
            RewardChoice::Card => collection.add_card(reward.card.clone()),
            RewardChoice::UpgradePoint => collection.add_upgrade_points(1),
        }
        tracing::info!("Reward claimed as {:?}", choice);
        Ok(reward)
    }

    /// Cancel every pending timer and return to idle.
    pub fn teardown(&mut self) {
        self.controller.teardown();
        self.history.clear();
    }

    fn publish(&mut self, bus: &EventBus) {
        for event in bus.events() {
            let message = event.format();
            for observer in self.observers.iter_mut() {
                if let Some(line) = &message {
                    observer.on_log(line);
                }
                match event {
                    BattleEvent::Vfx { kind, target } => observer.on_vfx(*kind, *target),
                    BattleEvent::BattleEnded { outcome } => observer.on_battle_end(*outcome),
                    BattleEvent::RewardOffered { card, .. } => observer.on_reward(card),
                    _ => {}
                }
            }
        }
        self.history.extend(bus.events().iter().cloned());

        if !self.observers.is_empty() {
            let snapshot = self.controller.snapshot();
            for observer in self.observers.iter_mut() {
                observer.on_state_change(&snapshot);
            }
        }
    }
}
