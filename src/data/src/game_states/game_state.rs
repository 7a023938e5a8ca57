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

use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use crate::core::numerics::Points;
use crate::game_states::turn_state::TurnState;
use crate::player_states::player_state::PlayerState;

/// This is the state of a single ongoing game within one room.
///
/// Everything a client needs to render the board lives here, plus the game's
/// random number generator. The rng is part of the state so that a game
/// constructed from a seed replays identically; it is stripped from client
/// snapshots so dice can never be predicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Players in fixed seating order. Order never changes once the game
    /// starts.
    pub players: Vec<PlayerState>,

    /// Index into `players` of the player whose turn it is.
    pub current_player_index: usize,

    /// Turn state for the current player.
    pub turn: TurnState,

    /// First player to reach this score triggers the final round.
    pub target_score: Points,

    /// Minimum points a single turn must earn before a player first appears
    /// on the scoreboard.
    pub entry_threshold: Points,

    /// The final rotation is underway.
    pub is_final_round: bool,

    /// Player index whose banked score triggered the final round.
    pub final_round_triggered_by: Option<usize>,

    pub is_game_over: bool,

    /// Defined iff `is_game_over`.
    pub winner_index: Option<usize>,

    /// Random number generator for this game's dice.
    pub rng: Xoshiro256StarStar,
}

impl GameState {
    pub fn current_player(&self) -> &PlayerState {
        &self.players[self.current_player_index]
    }

    pub fn current_player_mut(&mut self) -> &mut PlayerState {
        &mut self.players[self.current_player_index]
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Index of the player seated after `index`.
    pub fn next_player_index(&self, index: usize) -> usize {
        (index + 1) % self.players.len()
    }
}
