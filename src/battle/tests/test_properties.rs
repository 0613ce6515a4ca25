#[cfg(test)]
mod tests {
    use crate::battle::ai::RandomPolicy;
    use crate::battle::autopilot::{GreedyPilot, PilotDecision, PlayerBehavior};
    use crate::battle::engine::TurnController;
    use crate::battle::state::{BattleRng, EventBus, Side};
    use crate::card::{Collection, InstanceId};
    use crate::catalog::Catalog;
    use crate::config::BattleConfig;
    use proptest::prelude::*;
    use rstest::rstest;

    #[derive(Debug, Clone)]
    enum Op {
        Play(usize),
        PlayMissing,
        EndTurn,
        Advance(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0usize..10).prop_map(Op::Play),
            1 => Just(Op::PlayMissing),
            2 => Just(Op::EndTurn),
            3 => (0u64..2500).prop_map(Op::Advance),
        ]
    }

    fn seeded_controller(seed: u64) -> TurnController {
        let catalog = Catalog::builtin();
        let mut controller = TurnController::new(
            catalog.clone(),
            BattleConfig::default(),
            Box::new(RandomPolicy::default()),
            BattleRng::seeded(seed),
        )
        .unwrap();
        let collection = match Collection::starter(&catalog) {
            Ok(collection) => collection,
            Err(err) => panic!("Starter deck is missing from the catalog: {}", err),
        };
        controller.start_battle(collection.cards(), &mut EventBus::new());
        controller
    }

    fn check_invariants(controller: &TurnController) -> Result<(), TestCaseError> {
        let combat = controller.combat();
        for side in [Side::Player, Side::Enemy] {
            prop_assert!(combat.hp(side) <= combat.max_hp(side));
        }

        let piles = controller.piles();
        prop_assert_eq!(piles.total(), 30);
        let mut ids = piles.instance_ids();
        ids.dedup();
        prop_assert_eq!(ids.len(), 30);

        let someone_down = combat.player_hp == 0 || combat.enemy_hp == 0;
        prop_assert_eq!(controller.phase().is_terminal(), someone_down);

        for id in &controller.state().in_flight {
            prop_assert!(piles.hand_card(*id).is_some());
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn proptest_random_actions_keep_battle_consistent(
            seed in any::<u64>(),
            ops in prop::collection::vec(op_strategy(), 1..80)
        ) {
            let mut controller = seeded_controller(seed);
            check_invariants(&controller)?;

            for op in ops {
                let before = controller.state().clone();
                let mut bus = EventBus::new();
                let rejected = match op {
                    Op::Play(index) => {
                        let hand = controller.piles().hand();
                        if hand.is_empty() {
                            continue;
                        }
                        let id = hand[index % hand.len()].instance_id;
                        controller.play_card(id).is_err()
                    }
                    Op::PlayMissing => controller.play_card(InstanceId(u64::MAX)).is_err(),
                    Op::EndTurn => controller.end_turn(&mut bus).is_err(),
                    Op::Advance(ms) => {
                        controller.advance(ms, &mut bus);
                        false
                    }
                };

                if rejected {
                    prop_assert_eq!(&controller.state().combat, &before.combat);
                    prop_assert_eq!(&controller.state().piles, &before.piles);
                    prop_assert_eq!(controller.phase(), before.phase);
                    prop_assert!(bus.is_empty());
                }
                check_invariants(&controller)?;
            }
        }
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(42)]
    #[case(2024)]
    fn test_greedy_pilot_finishes_battle(#[case] seed: u64) {
        const MAX_STEPS: usize = 10_000;
        let mut controller = seeded_controller(seed);
        let pilot = GreedyPilot::new();
        let settle = controller.config().timings.play_settle_ms;

        for _ in 0..MAX_STEPS {
            if controller.phase().is_terminal() {
                break;
            }
            let mut bus = EventBus::new();
            if controller.phase().is_player_turn() {
                match pilot.decide(&controller) {
                    PilotDecision::Play(id) => {
                        controller.play_card(id).unwrap();
                        controller.advance(settle, &mut bus);
                    }
                    PilotDecision::EndTurn => controller.end_turn(&mut bus).unwrap(),
                }
            } else {
                let wait = controller.next_timer_in().unwrap_or(1);
                controller.advance(wait, &mut bus);
            }
        }

        assert!(
            controller.state().outcome().is_some(),
            "Battle with seed {} did not finish",
            seed
        );
        assert_eq!(controller.piles().total(), 30);
    }
}
