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

use data::actions::game_action::GameAction;
use data::core::clock;
use data::core::dice::{Hand, DICE_PER_TURN};
use data::core::primitives::UserId;
use data::game_states::game_state::GameState;
use data::game_states::turn_state::TurnPhase;
use data::player_states::player_state::AiStrategy;
use data::rooms::room::{RoomMember, RoomSettings};
use rules::action_handlers::{end_turn, turn_actions};
use rules::action_handlers::turn_actions::apply_roll;
use rules::legality::legal_actions;
use utils::outcome::GameError;

fn hand(values: &[u8]) -> Hand {
    Hand::try_from_values(values).unwrap()
}

fn member(name: &str) -> RoomMember {
    RoomMember {
        user_id: UserId::generate(),
        name: name.to_string(),
        is_ai: false,
        ai_strategy: AiStrategy::Balanced,
        connected: true,
        joined_at: clock::now_millis(),
    }
}

fn game_of(count: usize, settings: RoomSettings) -> GameState {
    let members: Vec<_> = (0..count).map(|i| member(&format!("player-{i}"))).collect();
    rules::new_game::create(&members, &settings, Some(11))
}

fn keep(game: &mut GameState, values: &[u8]) {
    turn_actions::execute(game, GameAction::Keep { dice: hand(values) }).unwrap();
}

/// The §8 turn invariants, checked after every scripted step.
fn assert_invariants(game: &GameState) {
    let turn = &game.turn;
    if turn.current_roll.is_none() {
        assert_eq!(
            turn.kept_dice.len() as u8 + turn.dice_remaining,
            DICE_PER_TURN,
            "kept + remaining must cover the hand"
        );
    }
    if turn.carryover_claimed {
        assert!(turn.has_carryover);
        assert!(turn.turn_score >= turn.carryover_points);
    }
    if turn.carryover_points > 0 {
        assert!(turn.has_carryover);
    }
    assert_eq!(game.winner_index.is_some(), game.is_game_over);
}

#[test]
fn bust_forwards_turn_points_as_the_next_pot() {
    let mut game = game_of(2, RoomSettings::default());
    let first = game.players[0].id;

    // Accumulate 400 by keeping a full hot hand.
    apply_roll(&mut game, hand(&[1, 1, 1, 5, 5])).unwrap();
    keep(&mut game, &[1, 1, 1, 5, 5]);
    assert_invariants(&game);
    assert_eq!(game.turn.turn_score, 400);
    assert_eq!(game.turn.dice_remaining, DICE_PER_TURN);

    // Then roll nothing.
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    assert_eq!(game.turn.phase, TurnPhase::Ended);
    assert!(game.turn.busted);
    assert_eq!(game.turn.turn_score, 0);
    assert_eq!(game.turn.forfeited_points, 400);

    end_turn::execute(&mut game).unwrap();
    assert_invariants(&game);
    assert_eq!(game.players[0].id, first);
    assert_eq!(game.players[0].score, 0);
    assert_eq!(game.current_player_index, 1);
    assert_eq!(game.turn.phase, TurnPhase::StealRequired);
    assert_eq!(game.turn.carryover_points, 400);
    assert!(game.turn.has_carryover);
    assert!(!game.turn.carryover_claimed);
    assert_eq!(game.turn.dice_remaining, DICE_PER_TURN);
}

#[test]
fn claimed_pot_does_not_count_toward_entry() {
    let mut game = game_of(2, RoomSettings::default());

    // Player 0 busts away 400, handing player 1 a pot.
    apply_roll(&mut game, hand(&[1, 1, 1, 5, 5])).unwrap();
    keep(&mut game, &[1, 1, 1, 5, 5]);
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    end_turn::execute(&mut game).unwrap();
    assert_eq!(game.turn.carryover_points, 400);

    // Player 1 claims the pot with a single 1: 400 + 100.
    apply_roll(&mut game, hand(&[1, 3, 3, 4, 6])).unwrap();
    assert_eq!(game.turn.phase, TurnPhase::Keeping);
    keep(&mut game, &[1]);
    assert_invariants(&game);
    assert!(game.turn.carryover_claimed);
    assert_eq!(game.turn.turn_score, 500);
    assert_eq!(game.turn.own_score(), 100);

    // Banking is refused below the entry threshold; own points are 100.
    let result = turn_actions::execute(&mut game, GameAction::Bank);
    assert_eq!(
        result,
        Err(GameError::BelowEntry { own_points: 100, entry_threshold: 650 })
    );
    // The turn is untouched and the player must roll again.
    assert_eq!(game.turn.phase, TurnPhase::Deciding);
    assert_eq!(game.turn.turn_score, 500);
    assert!(legal_actions::compute(&game).contains(&GameAction::Roll));
    assert!(!legal_actions::can_bank(&game));
}

#[test]
fn keeping_all_five_refreshes_the_hand() {
    let mut game = game_of(2, RoomSettings::default());
    apply_roll(&mut game, hand(&[1, 1, 1, 5, 5])).unwrap();
    keep(&mut game, &[1, 1, 1, 5, 5]);
    assert_invariants(&game);
    assert_eq!(game.turn.turn_score, 400);
    assert!(game.turn.kept_dice.is_empty());
    assert_eq!(game.turn.dice_remaining, DICE_PER_TURN);
    assert_eq!(game.turn.phase, TurnPhase::Deciding);
}

#[test]
fn bust_during_a_steal_forwards_the_pot_unchanged() {
    let mut game = game_of(3, RoomSettings::default());

    // Player 0 busts away 400.
    apply_roll(&mut game, hand(&[1, 1, 1, 5, 5])).unwrap();
    keep(&mut game, &[1, 1, 1, 5, 5]);
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    end_turn::execute(&mut game).unwrap();
    assert_eq!(game.current_player_index, 1);
    assert_eq!(game.turn.phase, TurnPhase::StealRequired);

    // Player 1 attempts the steal and busts immediately.
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    assert!(game.turn.busted);
    assert_eq!(game.turn.forfeited_points, 400);

    // The pot travels on to player 2.
    end_turn::execute(&mut game).unwrap();
    assert_invariants(&game);
    assert_eq!(game.current_player_index, 2);
    assert_eq!(game.turn.phase, TurnPhase::StealRequired);
    assert_eq!(game.turn.carryover_points, 400);
}

#[test]
fn declining_the_pot_discards_it_for_everyone() {
    let mut game = game_of(2, RoomSettings::default());
    apply_roll(&mut game, hand(&[1, 1, 1, 5, 5])).unwrap();
    keep(&mut game, &[1, 1, 1, 5, 5]);
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    end_turn::execute(&mut game).unwrap();
    assert!(game.turn.has_carryover);

    turn_actions::execute(&mut game, GameAction::DeclineCarryover).unwrap();
    assert_invariants(&game);
    assert_eq!(game.turn.phase, TurnPhase::Rolling);
    assert_eq!(game.turn.carryover_points, 0);
    assert!(!game.turn.has_carryover);

    // A later bust forwards only the turn's own points.
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    assert_eq!(game.turn.forfeited_points, 0);
    end_turn::execute(&mut game).unwrap();
    assert_eq!(game.turn.phase, TurnPhase::Rolling);
}

#[test]
fn banking_consumes_the_pot_and_never_creates_one() {
    let mut game = game_of(2, RoomSettings::default());
    game.players[1].is_on_board = true;

    apply_roll(&mut game, hand(&[1, 1, 1, 5, 5])).unwrap();
    keep(&mut game, &[1, 1, 1, 5, 5]);
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    end_turn::execute(&mut game).unwrap();

    // Player 1 claims and banks; on board, so entry does not apply.
    apply_roll(&mut game, hand(&[1, 3, 3, 4, 6])).unwrap();
    keep(&mut game, &[1]);
    turn_actions::execute(&mut game, GameAction::Bank).unwrap();
    assert_eq!(game.players[1].score, 500);

    end_turn::execute(&mut game).unwrap();
    assert_invariants(&game);
    assert_eq!(game.current_player_index, 0);
    assert_eq!(game.turn.phase, TurnPhase::Rolling);
    assert!(!game.turn.has_carryover);
}

#[test]
fn entry_threshold_marks_the_player_on_board() {
    let mut game = game_of(2, RoomSettings::default());
    apply_roll(&mut game, hand(&[1, 2, 3, 4, 5])).unwrap();
    keep(&mut game, &[1, 2, 3, 4, 5]);
    assert_eq!(game.turn.turn_score, 1500);
    turn_actions::execute(&mut game, GameAction::Bank).unwrap();
    assert!(game.players[0].is_on_board);
    assert_eq!(game.players[0].score, 1500);
}

#[test]
fn final_round_ends_when_rotation_returns_to_the_trigger() {
    let mut game = game_of(2, RoomSettings { target_score: 1000, ..Default::default() });

    // Player 0 banks a large straight, crossing the target.
    apply_roll(&mut game, hand(&[1, 2, 3, 4, 5])).unwrap();
    keep(&mut game, &[1, 2, 3, 4, 5]);
    turn_actions::execute(&mut game, GameAction::Bank).unwrap();
    end_turn::execute(&mut game).unwrap();
    assert!(game.is_final_round);
    assert_eq!(game.final_round_triggered_by, Some(0));
    assert!(!game.is_game_over);
    assert_eq!(game.current_player_index, 1);

    // Player 1 busts their last chance; rotation would return to player 0.
    apply_roll(&mut game, hand(&[2, 2, 3, 4, 6])).unwrap();
    end_turn::execute(&mut game).unwrap();
    assert_invariants(&game);
    assert!(game.is_game_over);
    assert_eq!(game.winner_index, Some(0));
}

#[test]
fn winner_ties_break_to_the_earliest_seat() {
    let mut game = game_of(3, RoomSettings::default());
    game.players[0].score = 10_000;
    game.players[1].score = 10_000;
    game.players[2].score = 9_000;
    assert_eq!(end_turn::winner_index(&game), 0);

    game.players[1].score = 10_050;
    assert_eq!(end_turn::winner_index(&game), 1);
}

#[test]
fn illegal_transitions_leave_the_game_untouched() {
    let mut game = game_of(2, RoomSettings::default());

    // Bank before any roll.
    let result = turn_actions::execute(&mut game, GameAction::Bank);
    assert!(matches!(result, Err(GameError::PhaseViolation { .. })));
    assert_eq!(game.turn.phase, TurnPhase::Rolling);

    // Keep without a roll on the table.
    let result = turn_actions::execute(&mut game, GameAction::Keep { dice: hand(&[1]) });
    assert!(matches!(result, Err(GameError::PhaseViolation { .. })));

    // Decline with no pot.
    let result = turn_actions::execute(&mut game, GameAction::DeclineCarryover);
    assert!(matches!(result, Err(GameError::PhaseViolation { .. })));

    // A bad keep leaves the roll in place.
    apply_roll(&mut game, hand(&[1, 2, 3, 4, 6])).unwrap();
    let result = turn_actions::execute(&mut game, GameAction::Keep { dice: hand(&[2]) });
    assert_eq!(result, Err(GameError::InvalidKeep(utils::outcome::KeepError::NotScoring)));
    assert_eq!(game.turn.phase, TurnPhase::Keeping);
    assert!(game.turn.current_roll.is_some());

    // Rolls after the turn has ended are rejected.
    keep(&mut game, &[1]);
    turn_actions::execute(&mut game, GameAction::Roll).unwrap();
    while game.turn.phase == TurnPhase::Keeping {
        // Keep whatever scored and roll on until the turn ends.
        let roll = game.turn.current_roll.clone().unwrap();
        let consumed = rules::scoring::evaluate::evaluate(&roll).consumed;
        turn_actions::execute(&mut game, GameAction::Keep { dice: consumed }).unwrap();
        turn_actions::execute(&mut game, GameAction::Roll).unwrap();
    }
    assert_eq!(game.turn.phase, TurnPhase::Ended);
    let result = turn_actions::execute(&mut game, GameAction::Roll);
    assert!(matches!(result, Err(GameError::PhaseViolation { .. })));
}

#[test]
fn banked_scores_never_decrease() {
    let mut game = game_of(2, RoomSettings::default());
    game.players[0].is_on_board = true;
    game.players[1].is_on_board = true;
    let mut previous_total: u32 = 0;

    for _ in 0..20 {
        if game.is_game_over {
            break;
        }
        // Play each turn with scripted rolls: keep once, then bank or bust.
        apply_roll(&mut game, hand(&[1, 1, 5, 3, 2])).unwrap();
        keep(&mut game, &[1, 1, 5]);
        turn_actions::execute(&mut game, GameAction::Bank).unwrap();
        end_turn::execute(&mut game).unwrap();
        assert_invariants(&game);

        let total: u32 = game.players.iter().map(|p| p.score).sum();
        assert!(total >= previous_total);
        previous_total = total;
    }
}
