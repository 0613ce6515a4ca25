use crate::battle::piles::Piles;
use crate::card::{CardInstance, InstanceId};
use crate::config::BattleConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use schema::{CardType, EffectKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Which side of the table something happens to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Side::Player => "You",
            Side::Enemy => "The enemy",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PlayerActive,
    PlayerAutoEnd, // No affordable card left, waiting out the settle delay
    EnemyActive,
    RoundReset,
    Won,
    Lost,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }

    pub fn is_player_turn(self) -> bool {
        matches!(self, Phase::PlayerActive | Phase::PlayerAutoEnd)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Win,
    Loss,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEndReason {
    Requested,
    DeckExhausted,
    HandEmpty,
    OutOfEnergy,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Battle Flow
    BattleStarted {
        deck_size: usize,
        hand_size: usize,
    },
    TurnStarted {
        turn_number: u32,
        drawn: usize,
    },
    TurnEnded {
        reason: TurnEndReason,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
    RewardOffered {
        card: CardInstance,
        name: String,
    },

    // Card Play
    CardPlayed {
        instance_id: InstanceId,
        name: String,
    },
    DoubleHit {
        multiplier: u32,
    },
    Executed,
    CardsDrawn {
        requested: usize,
        drawn: usize,
    },
    CardRecycled {
        instance_id: InstanceId,
    },

    // Health, Shield, Energy
    DamageDealt {
        target: Side,
        damage: u32,
        remaining_hp: u32,
    },
    ShieldAbsorbed {
        target: Side,
        absorbed: u32,
        remaining_shield: u32,
    },
    ShieldGained {
        target: Side,
        amount: u32,
        total: u32,
    },
    ShieldDecayed {
        from: u32,
        to: u32,
    },
    Healed {
        target: Side,
        amount: u32,
        new_hp: u32,
    },
    HealthSacrificed {
        amount: u32,
        new_hp: u32,
    },
    EnergyGained {
        amount: u32,
        total: u32,
    },

    // Enemy
    EnemyFrozen,
    EnemyFreezeConsumed,
    EnemyAttacked {
        damage: u32,
    },
    EnemyDefended {
        shield: u32,
    },

    // Presentation trigger, never logged
    Vfx {
        kind: EffectKind,
        target: Side,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable log line.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self) -> Option<String> {
        match self {
            BattleEvent::BattleStarted { .. } => Some("The battle begins!".to_string()),
            BattleEvent::TurnStarted { turn_number, drawn } => {
                if *drawn == 0 {
                    Some("The draw pile is empty, no cards drawn!".to_string())
                } else {
                    Some(format!("Turn {} begins, drew {} cards", turn_number, drawn))
                }
            }
            BattleEvent::TurnEnded { reason } => match reason {
                TurnEndReason::Requested => None,
                TurnEndReason::DeckExhausted => {
                    Some("Out of cards, the turn is over".to_string())
                }
                TurnEndReason::HandEmpty => Some("Hand is empty, the turn is over".to_string()),
                TurnEndReason::OutOfEnergy => {
                    Some("Not enough energy, the turn is over".to_string())
                }
            },
            BattleEvent::BattleEnded { outcome } => match outcome {
                BattleOutcome::Win => Some("Victory!".to_string()),
                BattleOutcome::Loss => Some("Defeat...".to_string()),
            },
            BattleEvent::RewardOffered { name, .. } => {
                Some(format!("A reward awaits: {}", name))
            }

            BattleEvent::CardPlayed { name, .. } => Some(format!("You played {}!", name)),
            BattleEvent::DoubleHit { multiplier } => {
                Some(format!("Double strike! {}% damage", multiplier * 100))
            }
            BattleEvent::Executed => Some("Execution!".to_string()),
            BattleEvent::CardsDrawn { requested, drawn } => {
                if drawn < requested {
                    Some(format!(
                        "Drew {} of {} cards, the draw pile ran dry",
                        drawn, requested
                    ))
                } else {
                    Some(format!("Drew {} cards", drawn))
                }
            }
            BattleEvent::CardRecycled { .. } => {
                Some("A card returned from the discard pile".to_string())
            }

            BattleEvent::DamageDealt { target, damage, .. } => Some(format!(
                "{} took {} damage!",
                target.display_name(),
                damage
            )),
            BattleEvent::ShieldAbsorbed {
                target,
                remaining_shield,
                ..
            } => {
                if *remaining_shield > 0 {
                    Some(format!("{} blocked the attack!", target.display_name()))
                } else {
                    None // The damage line that follows tells the rest
                }
            }
            BattleEvent::ShieldGained { target, amount, .. } => Some(format!(
                "{} gained {} shield",
                target.display_name(),
                amount
            )),
            BattleEvent::ShieldDecayed { .. } => None,
            BattleEvent::Healed { target, amount, .. } => Some(format!(
                "{} recovered {} HP",
                target.display_name(),
                amount
            )),
            BattleEvent::HealthSacrificed { amount, .. } => {
                Some(format!("Forbidden pact: sacrificed {} HP", amount))
            }
            BattleEvent::EnergyGained { amount, .. } => {
                Some(format!("Gained {} energy", amount))
            }

            BattleEvent::EnemyFrozen => Some("Frost sets in! The enemy is frozen".to_string()),
            BattleEvent::EnemyFreezeConsumed => {
                Some("The enemy is frozen and cannot act!".to_string())
            }
            BattleEvent::EnemyAttacked { damage } => {
                Some(format!("The enemy attacks for {}!", damage))
            }
            BattleEvent::EnemyDefended { .. } => {
                Some("The enemy strengthened its defenses".to_string())
            }

            BattleEvent::Vfx { .. } => None,
        }
    }
}

/// Event bus for collecting the events produced by one engine operation.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Every non-silent event rendered as a log line, in order.
    pub fn log_lines(&self) -> Vec<String> {
        self.events.iter().filter_map(BattleEvent::format).collect()
    }

    /// Print all events in debug format with a custom prefix message.
    pub fn print_debug_with_message(&self, message: &str) {
        println!("{}", message);
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Random source for a battle: shuffles, enemy rolls, reward picks.
///
/// Tests can queue scripted outcomes; each roll consumes one (clamped into the
/// requested range) before falling back to the seeded generator.
#[derive(Debug, Clone)]
pub struct BattleRng {
    rng: StdRng,
    scripted: VecDeque<u32>,
}

impl BattleRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            scripted: VecDeque::new(),
        }
    }

    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }

    pub fn new_for_test(outcomes: Vec<u32>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(0),
            scripted: outcomes.into(),
        }
    }

    /// Uniform roll in `min..=max`.
    pub fn roll_range(&mut self, reason: &str, min: u32, max: u32) -> u32 {
        let outcome = match self.scripted.pop_front() {
            Some(value) => value.clamp(min, max),
            None => self.rng.random_range(min..=max),
        };
        tracing::trace!("[RNG] Consumed {} for: {}", outcome, reason);
        outcome
    }

    /// Roll in `1..=100`.
    pub fn roll_percent(&mut self, reason: &str) -> u32 {
        self.roll_range(reason, 1, 100)
    }

    /// Index into a non-empty collection of `len` items.
    pub fn pick_index(&mut self, reason: &str, len: usize) -> usize {
        debug_assert!(len > 0, "pick_index called on an empty collection");
        self.roll_range(reason, 0, len.saturating_sub(1) as u32) as usize
    }

    /// Unbiased in-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    pub fn generator(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CombatState {
    pub player_hp: u32,
    pub player_max_hp: u32,
    pub enemy_hp: u32,
    pub enemy_max_hp: u32,
    pub player_shield: u32,
    pub enemy_shield: u32,
    pub enemy_frozen: bool,
    pub energy: u32,
    pub turn: Side,
    pub turn_number: u32,
}

impl CombatState {
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            player_hp: config.player_max_hp,
            player_max_hp: config.player_max_hp,
            enemy_hp: config.enemy_max_hp,
            enemy_max_hp: config.enemy_max_hp,
            player_shield: 0,
            enemy_shield: 0,
            enemy_frozen: false,
            energy: config.starting_energy,
            turn: Side::Player,
            turn_number: 1,
        }
    }

    pub fn hp(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_hp,
            Side::Enemy => self.enemy_hp,
        }
    }

    pub fn max_hp(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_max_hp,
            Side::Enemy => self.enemy_max_hp,
        }
    }

    pub fn hp_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Player => &mut self.player_hp,
            Side::Enemy => &mut self.enemy_hp,
        }
    }

    pub fn shield(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_shield,
            Side::Enemy => self.enemy_shield,
        }
    }

    pub fn shield_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Player => &mut self.player_shield,
            Side::Enemy => &mut self.enemy_shield,
        }
    }
}

/// Reward waiting to be claimed after a win.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reward {
    pub card: CardInstance,
}

/// What the player takes from a reward.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardChoice {
    Card,
    UpgradePoint,
}

/// All per-battle mutable state. Discarded when the next battle starts.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BattleState {
    pub combat: CombatState,
    pub piles: Piles,
    pub phase: Phase,
    pub in_flight: Vec<InstanceId>, // Paid for, effect not yet committed
    pub deck_ids: Vec<InstanceId>, // Sorted ids of every card dealt into this battle
    pub pending_reward: Option<Reward>,
    pub reward_granted: bool,
}

impl BattleState {
    pub fn idle(config: &BattleConfig) -> Self {
        Self {
            combat: CombatState::new(config),
            piles: Piles::default(),
            phase: Phase::Idle,
            in_flight: Vec::new(),
            deck_ids: Vec::new(),
            pending_reward: None,
            reward_granted: false,
        }
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            Phase::Won => Some(BattleOutcome::Win),
            Phase::Lost => Some(BattleOutcome::Loss),
            _ => None,
        }
    }

    pub fn is_in_flight(&self, instance_id: InstanceId) -> bool {
        self.in_flight.contains(&instance_id)
    }
}

/// Read-only view handed to presentation after each state change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleSnapshot {
    pub combat: CombatState,
    pub phase: Phase,
    pub draw_pile: usize,
    pub hand: Vec<HandCardView>,
    pub discard_pile: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HandCardView {
    pub instance_id: InstanceId,
    pub name: String,
    pub description: String,
    pub card_type: CardType,
    pub effect: EffectKind,
    pub cost: u32,
    pub value: i32,
    pub playable: bool,
    pub in_flight: bool,
}

#[cfg(test)]
mod event_formatting_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_silent_events_return_none() {
        let silent_events = vec![
            BattleEvent::Vfx {
                kind: EffectKind::Slash,
                target: Side::Enemy,
            },
            BattleEvent::ShieldDecayed { from: 10, to: 5 },
            BattleEvent::TurnEnded {
                reason: TurnEndReason::Requested,
            },
        ];

        for event in silent_events {
            assert!(
                event.format().is_none(),
                "Event {:?} should be silent but returned text",
                event
            );
        }
    }

    #[test]
    fn test_event_text_samples() {
        let damage = BattleEvent::DamageDealt {
            target: Side::Enemy,
            damage: 8,
            remaining_hp: 192,
        };
        assert_eq!(damage.format(), Some("The enemy took 8 damage!".to_string()));

        let empty_draw = BattleEvent::TurnStarted {
            turn_number: 4,
            drawn: 0,
        };
        assert_eq!(
            empty_draw.format(),
            Some("The draw pile is empty, no cards drawn!".to_string())
        );

        let short_draw = BattleEvent::CardsDrawn {
            requested: 3,
            drawn: 1,
        };
        assert_eq!(
            short_draw.format(),
            Some("Drew 1 of 3 cards, the draw pile ran dry".to_string())
        );

        let out_of_energy = BattleEvent::TurnEnded {
            reason: TurnEndReason::OutOfEnergy,
        };
        assert_eq!(
            out_of_energy.format(),
            Some("Not enough energy, the turn is over".to_string())
        );
    }

    #[test]
    fn test_event_bus_log_lines_skip_silent_events() {
        let mut bus = EventBus::new();
        bus.push(BattleEvent::EnemyAttacked { damage: 12 });
        bus.push(BattleEvent::Vfx {
            kind: EffectKind::Slash,
            target: Side::Player,
        });
        bus.push(BattleEvent::EnemyFrozen);

        assert_eq!(bus.len(), 3);
        assert_eq!(
            bus.log_lines(),
            vec![
                "The enemy attacks for 12!".to_string(),
                "Frost sets in! The enemy is frozen".to_string(),
            ]
        );

        let display_output = format!("{}", bus);
        assert!(display_output.contains("EnemyAttacked"));
        assert!(display_output.contains("Vfx"));
    }

    #[test]
    fn test_scripted_rolls_are_clamped_then_fall_back() {
        let mut rng = BattleRng::new_for_test(vec![50, 300]);
        assert_eq!(rng.roll_percent("first"), 50);
        assert_eq!(rng.roll_range("second", 8, 17), 17);

        // Script exhausted: seeded generator takes over, still in range
        for _ in 0..100 {
            let roll = rng.roll_range("fallback", 8, 17);
            assert!((8..=17).contains(&roll));
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = BattleRng::seeded(42);
        let mut b = BattleRng::seeded(42);
        let rolls_a: Vec<u32> = (0..10).map(|_| a.roll_percent("a")).collect();
        let rolls_b: Vec<u32> = (0..10).map(|_| b.roll_percent("b")).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn test_combat_state_starts_from_config() {
        let state = CombatState::new(&BattleConfig::default());
        assert_eq!(state.player_hp, 100);
        assert_eq!(state.enemy_hp, 200);
        assert_eq!(state.energy, 3);
        assert_eq!(state.turn, Side::Player);
        assert_eq!(state.hp(Side::Enemy), 200);
        assert_eq!(state.max_hp(Side::Player), 100);
    }

    #[test]
    fn test_phase_helpers() {
        assert!(Phase::Won.is_terminal());
        assert!(Phase::Lost.is_terminal());
        assert!(!Phase::EnemyActive.is_terminal());
        assert!(Phase::PlayerAutoEnd.is_player_turn());
        assert!(!Phase::RoundReset.is_player_turn());
        assert_eq!(Side::Player.opponent(), Side::Enemy);
    }
}
