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

use data::core::clock;
use data::game_states::game_state::GameState;
use data::game_states::turn_state::{TurnPhase, TurnState};
use tracing::{debug, info, instrument};
use utils::outcome::{GameError, Outcome};
use utils::verify;

/// Closes out an ended turn: propagates a bust pot, checks the final-round
/// trigger, rotates to the next seat, and detects the end of the game.
///
/// A bust forwards the turn's surrendered points as the next player's pot;
/// a bank consumes any pot and never creates one. The final round begins
/// when a player's banked score reaches the target, and the game ends when
/// rotation returns to that player; the winner is the highest score, with
/// the earliest seat taking ties.
#[instrument(err, level = "debug", skip(game))]
pub fn execute(game: &mut GameState) -> Outcome {
    verify!(
        game.turn.phase == TurnPhase::Ended,
        GameError::PhaseViolation {
            action: "EndTurn".to_string(),
            phase: format!("{:?}", game.turn.phase),
        }
    );

    let pot = if game.turn.busted { game.turn.forfeited_points } else { 0 };

    // Only the player who just acted can have crossed the target.
    if !game.is_final_round && game.current_player().score >= game.target_score {
        game.is_final_round = true;
        game.final_round_triggered_by = Some(game.current_player_index);
        info!(player = %game.current_player().id, "Final round triggered");
    }

    let next = game.next_player_index(game.current_player_index);
    if game.is_final_round && game.final_round_triggered_by == Some(next) {
        finish(game);
        return Ok(());
    }

    game.current_player_index = next;
    game.turn = TurnState::new(pot, clock::now_millis());
    debug!(
        player = %game.current_player().id,
        pot,
        phase = ?game.turn.phase,
        "Turn rotated"
    );
    Ok(())
}

fn finish(game: &mut GameState) {
    game.is_game_over = true;
    game.winner_index = Some(winner_index(game));
    info!(winner = ?game.winner_index, "Game over");
}

/// Highest banked score wins; the earliest seat takes ties.
pub fn winner_index(game: &GameState) -> usize {
    let mut best = 0;
    for (index, player) in game.players.iter().enumerate() {
        if player.score > game.players[best].score {
            best = index;
        }
    }
    best
}
