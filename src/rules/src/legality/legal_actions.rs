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
use data::game_states::game_state::GameState;
use data::game_states::turn_state::TurnPhase;

use crate::scoring::evaluate::evaluate;

/// All actions the current player can legally take right now.
///
/// Keeping admits many legal subsets; this enumerates only the canonical
/// keep (the roll's full consumed set), which is what the AI plays and what
/// tests sample. Other subsets are validated on submission instead.
pub fn compute(game: &GameState) -> Vec<GameAction> {
    let turn = &game.turn;
    match turn.phase {
        TurnPhase::Rolling => vec![GameAction::Roll],
        TurnPhase::StealRequired => vec![GameAction::Roll, GameAction::DeclineCarryover],
        TurnPhase::Keeping => match &turn.current_roll {
            Some(roll) => vec![GameAction::Keep { dice: evaluate(roll).consumed }],
            None => Vec::new(),
        },
        TurnPhase::Deciding => {
            let mut actions = vec![GameAction::Roll];
            if can_bank(game) {
                actions.push(GameAction::Bank);
            }
            actions
        }
        TurnPhase::Ended => Vec::new(),
    }
}

/// True if banking would be accepted in the current state.
pub fn can_bank(game: &GameState) -> bool {
    let turn = &game.turn;
    turn.phase == TurnPhase::Deciding
        && turn.turn_score > 0
        && (game.current_player().is_on_board || turn.own_score() >= game.entry_threshold)
}

/// Returns true if the current player can legally take the provided action.
pub fn can_take_action(game: &GameState, action: &GameAction) -> bool {
    match action {
        // Any valid keep is legal, not just the canonical one.
        GameAction::Keep { dice } => match (&game.turn.current_roll, game.turn.phase) {
            (Some(roll), TurnPhase::Keeping) => {
                crate::scoring::selection::validate_keep(roll, dice).is_ok()
            }
            _ => false,
        },
        other => compute(game).iter().any(|a| a == other),
    }
}
