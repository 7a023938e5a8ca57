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
use data::game_states::turn_state::TurnState;
use data::player_states::player_state::PlayerState;
use data::rooms::room::{RoomMember, RoomSettings};
use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::info;

/// Constructs a fresh game from room membership, in join order.
///
/// Each game gets its own rng; pass a seed to make dice reproducible in
/// tests, otherwise one is drawn from the process rng.
pub fn create(members: &[RoomMember], settings: &RoomSettings, seed: Option<u64>) -> GameState {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let players = members
        .iter()
        .map(|m| PlayerState::new(m.user_id, m.name.clone(), m.is_ai, m.ai_strategy))
        .collect::<Vec<_>>();
    info!(players = players.len(), seed, "Creating new game");

    GameState {
        players,
        current_player_index: 0,
        turn: TurnState::new(0, clock::now_millis()),
        target_score: settings.target_score,
        entry_threshold: settings.entry_threshold,
        is_final_round: false,
        final_round_triggered_by: None,
        is_game_over: false,
        winner_index: None,
        rng: Xoshiro256StarStar::seed_from_u64(seed),
    }
}
