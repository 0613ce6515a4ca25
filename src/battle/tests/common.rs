use crate::battle::ai::{EnemyAction, EnemyPolicy};
use crate::battle::engine::TurnController;
use crate::battle::piles::Piles;
use crate::battle::state::{BattleEvent, BattleRng, BattleState, CombatState, EventBus, Phase};
use crate::card::{CardInstance, InstanceId};
use crate::catalog::Catalog;
use crate::config::BattleConfig;
use schema::{CardId, UpgradePath};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Creates a fresh, unupgraded instance of a built-in card.
pub fn card(id: &str) -> CardInstance {
    match Catalog::builtin().instantiate(&CardId::new(id)) {
        Ok(card) => card,
        Err(err) => panic!("Failed to instantiate card {}: {}", id, err),
    }
}

/// Creates an instance of a built-in card already upgraded along `path`.
pub fn upgraded(id: &str, path: UpgradePath) -> CardInstance {
    let mut instance = card(id);
    instance.chosen_path = Some(path);
    instance.level = 2;
    instance
}

/// Creates a `BattleRng` with a long list of default values (50).
/// Useful for tests where the specific RNG outcome is not important.
pub fn predictable_rng() -> BattleRng {
    BattleRng::new_for_test(vec![50; 100])
}

/// Enemy that replays a fixed list of actions, then defends for 0.
pub struct ScriptedPolicy {
    actions: RefCell<VecDeque<EnemyAction>>,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<EnemyAction>) -> Self {
        Self {
            actions: RefCell::new(actions.into()),
        }
    }
}

impl EnemyPolicy for ScriptedPolicy {
    fn decide(&self, _state: &CombatState, _rng: &mut BattleRng) -> EnemyAction {
        self.actions
            .borrow_mut()
            .pop_front()
            .unwrap_or(EnemyAction::Defend { shield: 0 })
    }
}

/// A builder for a controller dropped straight into the player's turn.
///
/// # Example
/// ```
/// let mut controller = TestBattleBuilder::new()
///     .with_hand(vec![card("c1"), card("c2")])
///     .with_energy(1)
///     .with_enemy_actions(vec![EnemyAction::Attack { damage: 12 }])
///     .build();
/// ```
pub struct TestBattleBuilder {
    config: BattleConfig,
    hand: Vec<CardInstance>,
    draw_pile: Vec<CardInstance>,
    discard_pile: Vec<CardInstance>,
    energy: Option<u32>,
    player_hp: Option<u32>,
    enemy_hp: Option<u32>,
    player_shield: u32,
    enemy_shield: u32,
    enemy_actions: Vec<EnemyAction>,
}

impl TestBattleBuilder {
    pub fn new() -> Self {
        Self {
            config: BattleConfig::default(),
            hand: Vec::new(),
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            energy: None,
            player_hp: None,
            enemy_hp: None,
            player_shield: 0,
            enemy_shield: 0,
            enemy_actions: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hand(mut self, hand: Vec<CardInstance>) -> Self {
        self.hand = hand;
        self
    }

    pub fn with_draw_pile(mut self, draw_pile: Vec<CardInstance>) -> Self {
        self.draw_pile = draw_pile;
        self
    }

    pub fn with_discard_pile(mut self, discard_pile: Vec<CardInstance>) -> Self {
        self.discard_pile = discard_pile;
        self
    }

    pub fn with_energy(mut self, energy: u32) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn with_player_hp(mut self, hp: u32) -> Self {
        self.player_hp = Some(hp);
        self
    }

    pub fn with_enemy_hp(mut self, hp: u32) -> Self {
        self.enemy_hp = Some(hp);
        self
    }

    pub fn with_player_shield(mut self, shield: u32) -> Self {
        self.player_shield = shield;
        self
    }

    pub fn with_enemy_shield(mut self, shield: u32) -> Self {
        self.enemy_shield = shield;
        self
    }

    pub fn with_enemy_actions(mut self, actions: Vec<EnemyAction>) -> Self {
        self.enemy_actions = actions;
        self
    }

    pub fn build(self) -> TurnController {
        let policy = Box::new(ScriptedPolicy::new(self.enemy_actions));
        let mut controller = match TurnController::new(
            Catalog::builtin(),
            self.config.clone(),
            policy,
            predictable_rng(),
        ) {
            Ok(controller) => controller,
            Err(err) => panic!("Test battle config is invalid: {}", err),
        };

        let mut combat = CombatState::new(&self.config);
        if let Some(energy) = self.energy {
            combat.energy = energy;
        }
        if let Some(hp) = self.player_hp {
            combat.player_hp = hp;
        }
        if let Some(hp) = self.enemy_hp {
            combat.enemy_hp = hp;
        }
        combat.player_shield = self.player_shield;
        combat.enemy_shield = self.enemy_shield;

        let piles = Piles::from_parts(self.draw_pile, self.hand, self.discard_pile);
        *controller.state_mut() = BattleState {
            combat,
            deck_ids: piles.instance_ids(),
            piles,
            phase: Phase::PlayerActive,
            in_flight: Vec::new(),
            pending_reward: None,
            reward_granted: false,
        };
        controller.evaluate_auto_end();
        controller
    }
}

/// Plays a card and lets its resolve delay pass.
pub fn play_and_settle(controller: &mut TurnController, instance_id: InstanceId) -> EventBus {
    if let Err(err) = controller.play_card(instance_id) {
        panic!("Expected play of {} to succeed: {}", instance_id, err);
    }
    let delay = controller.config().timings.play_settle_ms;
    advance(controller, delay)
}

pub fn advance(controller: &mut TurnController, elapsed_ms: u64) -> EventBus {
    let mut bus = EventBus::new();
    controller.advance(elapsed_ms, &mut bus);
    bus
}

pub fn end_turn(controller: &mut TurnController) -> EventBus {
    let mut bus = EventBus::new();
    if let Err(err) = controller.end_turn(&mut bus) {
        panic!("Expected end turn to succeed: {}", err);
    }
    bus
}

pub fn contains_event(bus: &EventBus, predicate: impl Fn(&BattleEvent) -> bool) -> bool {
    bus.events().iter().any(predicate)
}

pub fn discard_ids(controller: &TurnController) -> Vec<InstanceId> {
    controller
        .piles()
        .discard_pile()
        .iter()
        .map(|c| c.instance_id)
        .collect()
}
