// Copyright © greedhall 2024-present
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use data::actions::game_action::GameAction;
use data::core::dice::DICE_PER_TURN;
use data::game_states::game_state::GameState;
use data::game_states::turn_state::TurnPhase;
use data::player_states::player_state::AiStrategy;
use rand::Rng;
use rules::legality::legal_actions;
use rules::scoring::evaluate::evaluate;
use tracing::debug;
use utils::fail;
use utils::outcome::{GameError, Outcome};

use crate::strategies::{aggressive, balanced, chaos, conservative, DecideContext, Decision,
    StealChoice};

/// How long the AI pretends to think before each step.
///
/// The orchestrator sleeps this long before asking for a move, so a bot's
/// turn reads like a person's.
pub fn thinking_delay(rng: &mut impl Rng) -> Duration {
    Duration::from_millis(rng.gen_range(1000..=1500))
}

/// Select a game action for the current player in the given [GameState].
///
/// Pure: the same state and strategy always produce the same action, except
/// for [AiStrategy::Chaos], which draws from the supplied rng. Strategy
/// preferences are clamped to legality: a bot never banks through the entry
/// gate and always rerolls a freshly refreshed hot hand.
pub fn select(
    game: &GameState,
    strategy: AiStrategy,
    rng: &mut impl Rng,
) -> Outcome<GameAction> {
    let turn = &game.turn;
    let action = match turn.phase {
        TurnPhase::Rolling => GameAction::Roll,
        TurnPhase::Keeping => {
            let Some(roll) = &turn.current_roll else {
                fail!(GameError::BadRequest("keeping phase with no roll".to_string()));
            };
            // The locally optimal keep: everything the roll's evaluation
            // consumes.
            GameAction::Keep { dice: evaluate(roll).consumed }
        }
        TurnPhase::StealRequired => match steal_choice(game, strategy, rng) {
            StealChoice::Attempt => GameAction::Roll,
            StealChoice::Decline => GameAction::DeclineCarryover,
        },
        TurnPhase::Deciding => deciding_action(game, strategy, rng),
        TurnPhase::Ended => {
            fail!(GameError::BadRequest("no legal actions in an ended turn".to_string()))
        }
    };
    debug!(?strategy, phase = ?turn.phase, action = ?action.kind(), "AI selected action");
    Ok(action)
}

fn deciding_action(game: &GameState, strategy: AiStrategy, rng: &mut impl Rng) -> GameAction {
    let turn = &game.turn;
    // Hot dice: five fresh dice and points on the table always roll.
    if turn.dice_remaining == DICE_PER_TURN && turn.turn_score > 0 {
        return GameAction::Roll;
    }

    let ctx = context(game);
    let decision = match strategy {
        AiStrategy::Conservative => conservative::decide(&ctx),
        AiStrategy::Balanced => balanced::decide(&ctx),
        AiStrategy::Aggressive => aggressive::decide(&ctx),
        AiStrategy::Chaos => chaos::decide(&ctx, rng),
    };
    match decision {
        Decision::Bank if legal_actions::can_bank(game) => GameAction::Bank,
        _ => GameAction::Roll,
    }
}

fn steal_choice(game: &GameState, strategy: AiStrategy, rng: &mut impl Rng) -> StealChoice {
    let pot = game.turn.carryover_points;
    let dice = game.turn.dice_remaining;
    match strategy {
        AiStrategy::Conservative => conservative::steal(pot, dice),
        AiStrategy::Balanced => balanced::steal(pot, dice),
        AiStrategy::Aggressive => aggressive::steal(pot, dice),
        AiStrategy::Chaos => chaos::steal(pot, dice, rng),
    }
}

fn context(game: &GameState) -> DecideContext {
    let turn = &game.turn;
    let player = game.current_player();
    DecideContext {
        turn_score: turn.turn_score,
        own_score: turn.own_score(),
        dice_remaining: turn.dice_remaining,
        is_on_board: player.is_on_board,
        entry_threshold: game.entry_threshold,
        target_score: game.target_score,
        player_score: player.score,
    }
}

#[cfg(test)]
mod tests {
    use data::core::dice::Hand;
    use data::core::primitives::UserId;
    use data::player_states::player_state::AiStrategy;
    use data::rooms::room::{RoomMember, RoomSettings};
    use enum_iterator::all;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use rules::action_handlers::turn_actions;
    use rules::action_handlers::turn_actions::apply_roll;

    use super::*;

    fn hand(values: &[u8]) -> Hand {
        Hand::try_from_values(values).unwrap()
    }

    fn game() -> GameState {
        let members: Vec<_> = ["a", "b"]
            .iter()
            .map(|name| RoomMember {
                user_id: UserId::generate(),
                name: name.to_string(),
                is_ai: true,
                ai_strategy: AiStrategy::Balanced,
                connected: false,
                joined_at: 0,
            })
            .collect();
        rules::new_game::create(&members, &RoomSettings::default(), Some(3))
    }

    #[test]
    fn hot_dice_always_roll() {
        for strategy in all::<AiStrategy>() {
            let mut game = game();
            let mut rng = Xoshiro256StarStar::seed_from_u64(1);
            apply_roll(&mut game, hand(&[1, 1, 1, 5, 5])).unwrap();
            turn_actions::execute(&mut game, GameAction::Keep { dice: hand(&[1, 1, 1, 5, 5]) })
                .unwrap();
            assert_eq!(game.turn.dice_remaining, DICE_PER_TURN);
            let action = select(&game, strategy, &mut rng).unwrap();
            assert_eq!(action, GameAction::Roll, "{strategy:?} must reroll hot dice");
        }
    }

    #[test]
    fn never_banks_below_the_entry_threshold() {
        for strategy in all::<AiStrategy>() {
            let mut game = game();
            let mut rng = Xoshiro256StarStar::seed_from_u64(2);
            apply_roll(&mut game, hand(&[1, 3, 3, 4, 6])).unwrap();
            turn_actions::execute(&mut game, GameAction::Keep { dice: hand(&[1]) }).unwrap();
            assert!(game.turn.own_score() < game.entry_threshold);
            // Run chaos a few times; it must still never pick Bank here.
            for _ in 0..16 {
                let action = select(&game, strategy, &mut rng).unwrap();
                assert_eq!(action, GameAction::Roll, "{strategy:?} banked through the gate");
            }
        }
    }

    #[test]
    fn keeping_takes_the_full_consumed_set() {
        let mut game = game();
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        apply_roll(&mut game, hand(&[1, 1, 5, 3, 2])).unwrap();
        let action = select(&game, AiStrategy::Balanced, &mut rng).unwrap();
        assert_eq!(action, GameAction::Keep { dice: hand(&[1, 1, 5]) });
    }

    #[test]
    fn selection_is_always_legal() {
        for strategy in all::<AiStrategy>() {
            let mut game = game();
            let mut rng = Xoshiro256StarStar::seed_from_u64(9);
            // Drive a few full turns with the engine generating dice.
            for _ in 0..200 {
                if game.is_game_over {
                    break;
                }
                if game.turn.is_ended() {
                    rules::action_handlers::end_turn::execute(&mut game).unwrap();
                    continue;
                }
                let action = select(&game, strategy, &mut rng).unwrap();
                assert!(
                    legal_actions::can_take_action(&game, &action),
                    "{strategy:?} chose illegal {action:?}"
                );
                turn_actions::execute(&mut game, action).unwrap();
            }
        }
    }

    #[test]
    fn conservative_banks_modest_piles_once_on_board() {
        let ctx = DecideContext {
            turn_score: 350,
            own_score: 350,
            dice_remaining: 2,
            is_on_board: true,
            entry_threshold: 650,
            target_score: 10_000,
            player_score: 2000,
        };
        assert_eq!(crate::strategies::conservative::decide(&ctx), Decision::Bank);
    }

    #[test]
    fn aggressive_holds_out_for_big_turns() {
        let mut ctx = DecideContext {
            turn_score: 1000,
            own_score: 1000,
            dice_remaining: 4,
            is_on_board: true,
            entry_threshold: 650,
            target_score: 10_000,
            player_score: 0,
        };
        assert_eq!(crate::strategies::aggressive::decide(&ctx), Decision::Roll);
        ctx.turn_score = 3500;
        assert_eq!(crate::strategies::aggressive::decide(&ctx), Decision::Bank);
        ctx.turn_score = 2000;
        ctx.dice_remaining = 2;
        assert_eq!(crate::strategies::aggressive::decide(&ctx), Decision::Bank);
    }

    #[test]
    fn balanced_secures_entry_unless_hand_is_rich() {
        let mut ctx = DecideContext {
            turn_score: 700,
            own_score: 700,
            dice_remaining: 2,
            is_on_board: false,
            entry_threshold: 650,
            target_score: 10_000,
            player_score: 0,
        };
        assert_eq!(crate::strategies::balanced::decide(&ctx), Decision::Bank);
        // Barely over with a rich hand keeps rolling.
        ctx.dice_remaining = 4;
        assert_eq!(crate::strategies::balanced::decide(&ctx), Decision::Roll);
        ctx.turn_score = 900;
        ctx.own_score = 900;
        assert_eq!(crate::strategies::balanced::decide(&ctx), Decision::Bank);
    }

    #[test]
    fn steal_choices_follow_strategy_appetite() {
        use crate::strategies::StealChoice;
        assert_eq!(
            crate::strategies::conservative::steal(100, 5),
            StealChoice::Decline
        );
        assert_eq!(
            crate::strategies::conservative::steal(400, 5),
            StealChoice::Attempt
        );
        assert_eq!(crate::strategies::balanced::steal(100, 5), StealChoice::Attempt);
        assert_eq!(crate::strategies::aggressive::steal(50, 5), StealChoice::Attempt);
    }
}
