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
use data::core::dice::{Hand, DICE_PER_TURN};
use data::game_states::game_state::GameState;
use data::game_states::turn_state::TurnPhase;
use enumset::{enum_set, EnumSet};
use tracing::{debug, instrument};
use utils::outcome::{GameError, Outcome};
use utils::{fail, verify};

use crate::mutations::dice;
use crate::scoring::evaluate::evaluate;
use crate::scoring::selection;

/// Phases in which the player may roll.
const CAN_ROLL: EnumSet<TurnPhase> =
    enum_set!(TurnPhase::Rolling | TurnPhase::Deciding | TurnPhase::StealRequired);

/// Applies an in-turn action for the current player.
///
/// Illegal transitions fail with [GameError::PhaseViolation] (or
/// [GameError::InvalidKeep] for bad selections) and leave the game
/// untouched. Dice for a roll are always drawn from the game's own rng.
#[instrument(err, level = "debug", skip(game))]
pub fn execute(game: &mut GameState, action: GameAction) -> Outcome {
    match action {
        GameAction::Roll => handle_roll(game),
        GameAction::Keep { dice } => handle_keep(game, dice),
        GameAction::Bank => handle_bank(game),
        GameAction::DeclineCarryover => handle_decline_carryover(game),
    }
}

fn phase_violation(game: &GameState, action: &GameAction) -> GameError {
    GameError::PhaseViolation {
        action: format!("{:?}", action.kind()),
        phase: format!("{:?}", game.turn.phase),
    }
}

fn handle_roll(game: &mut GameState) -> Outcome {
    verify!(CAN_ROLL.contains(game.turn.phase), phase_violation(game, &GameAction::Roll));
    let count = game.turn.dice_remaining;
    let roll = dice::roll(game, count);
    apply_roll(game, roll)
}

/// Applies an already-generated roll to the turn.
///
/// The roll handler draws from the game rng and delegates here; scripted
/// games (and tests that need literal dice) call this directly.
pub fn apply_roll(game: &mut GameState, roll: Hand) -> Outcome {
    verify!(CAN_ROLL.contains(game.turn.phase), phase_violation(game, &GameAction::Roll));
    let result = evaluate(&roll);
    debug!(roll = %roll, points = result.points, "Rolled");

    let turn = &mut game.turn;
    turn.current_roll = Some(roll);
    if result.is_bust() {
        // The turn's accumulated points are surrendered and seed the next
        // player's pot; an unclaimed inherited pot travels on unchanged.
        let unclaimed = if turn.has_carryover && !turn.carryover_claimed {
            turn.carryover_points
        } else {
            0
        };
        turn.forfeited_points = turn.turn_score + unclaimed;
        turn.turn_score = 0;
        turn.busted = true;
        turn.phase = TurnPhase::Ended;
    } else {
        turn.phase = TurnPhase::Keeping;
    }
    Ok(())
}

fn handle_keep(game: &mut GameState, kept: Hand) -> Outcome {
    verify!(
        game.turn.phase == TurnPhase::Keeping,
        phase_violation(game, &GameAction::Keep { dice: kept })
    );
    let Some(roll) = game.turn.current_roll.clone() else {
        fail!(phase_violation(game, &GameAction::Keep { dice: kept }));
    };

    let result = selection::validate_keep(&roll, &kept)?;

    let turn = &mut game.turn;
    turn.kept_dice.extend(&kept);
    turn.turn_score += result.points;
    turn.dice_remaining -= kept.len() as u8;
    turn.current_roll = None;
    if turn.dice_remaining == 0 {
        // Hot dice: all five kept, the hand refreshes and the turn goes on.
        turn.dice_remaining = DICE_PER_TURN;
        turn.kept_dice.clear();
    }
    if turn.has_carryover && !turn.carryover_claimed {
        turn.carryover_claimed = true;
        turn.turn_score += turn.carryover_points;
        debug!(pot = turn.carryover_points, "Carryover claimed");
    }
    turn.phase = TurnPhase::Deciding;
    Ok(())
}

fn handle_bank(game: &mut GameState) -> Outcome {
    verify!(
        game.turn.phase == TurnPhase::Deciding,
        phase_violation(game, &GameAction::Bank)
    );
    verify!(game.turn.turn_score > 0, phase_violation(game, &GameAction::Bank));

    let own_score = game.turn.own_score();
    let entry_threshold = game.entry_threshold;
    let on_board = game.current_player().is_on_board;
    verify!(
        on_board || own_score >= entry_threshold,
        GameError::BelowEntry { own_points: own_score, entry_threshold }
    );

    let banked = game.turn.turn_score;
    let player = game.current_player_mut();
    player.score += banked;
    if !player.is_on_board && own_score >= entry_threshold {
        player.is_on_board = true;
    }
    debug!(player = %player.id, banked, total = player.score, "Banked");
    game.turn.phase = TurnPhase::Ended;
    Ok(())
}

fn handle_decline_carryover(game: &mut GameState) -> Outcome {
    verify!(
        game.turn.phase == TurnPhase::StealRequired,
        phase_violation(game, &GameAction::DeclineCarryover)
    );
    let turn = &mut game.turn;
    turn.carryover_points = 0;
    turn.has_carryover = false;
    turn.phase = TurnPhase::Rolling;
    Ok(())
}
