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

use data::core::dice::{Face, Hand};
use data::game_states::game_state::GameState;
use rand::Rng;

/// Rolls `count` dice uniformly from the game's own rng.
///
/// Dice are only ever produced here, from state the server owns; nothing a
/// client sends influences the outcome.
pub fn roll(game: &mut GameState, count: u8) -> Hand {
    (0..count)
        .map(|_| {
            let value = game.rng.gen_range(1..=6u8);
            Face::new(value).expect("die roll out of range")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use data::core::primitives::UserId;
    use data::game_states::turn_state::TurnState;
    use data::player_states::player_state::{AiStrategy, PlayerState};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    use super::*;

    fn game(seed: u64) -> GameState {
        GameState {
            players: vec![PlayerState::new(UserId::generate(), "a", false, AiStrategy::Balanced)],
            current_player_index: 0,
            turn: TurnState::new(0, 0),
            target_score: 10_000,
            entry_threshold: 650,
            is_final_round: false,
            final_round_triggered_by: None,
            is_game_over: false,
            winner_index: None,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    #[test]
    fn rolls_are_uniform_faces_and_reproducible() {
        let mut first = game(42);
        let mut second = game(42);
        let a = roll(&mut first, 5);
        let b = roll(&mut second, 5);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn every_face_appears_eventually() {
        let mut state = game(7);
        let mut seen = [false; 6];
        for _ in 0..200 {
            for face in roll(&mut state, 5).iter() {
                seen[(face.value() - 1) as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
