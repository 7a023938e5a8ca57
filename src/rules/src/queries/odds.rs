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

//! Probability heuristics shared by the AI strategies.
//!
//! These deliberately model only the chance of rolling no 1s and no 5s;
//! triples and straights are treated as upside rather than folded into the
//! bust estimate.

/// Probability that rolling `dice_remaining` dice scores nothing.
pub fn bust_probability(dice_remaining: u8) -> f64 {
    (4.0f64 / 6.0).powi(dice_remaining as i32)
}

/// Probability that a steal attempt (rolling `dice_remaining` dice against
/// an inherited pot) produces at least one scoring die.
pub fn steal_success_probability(dice_remaining: u8) -> f64 {
    1.0 - bust_probability(dice_remaining)
}

/// Rough expected points from one scoring roll of `dice_remaining` dice.
///
/// 25 per die covers loose 1s and 5s; three or more dice add headroom for
/// triples and straights.
pub fn expected_roll_points(dice_remaining: u8) -> f64 {
    let per_die = 25.0 * dice_remaining as f64;
    if dice_remaining >= 3 {
        per_die + 50.0
    } else {
        per_die
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bust_probability_shrinks_with_more_dice() {
        assert!(bust_probability(1) > bust_probability(2));
        assert!(bust_probability(2) > bust_probability(5));
        assert!((bust_probability(1) - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn steal_success_complements_bust() {
        for n in 1..=5 {
            let total = bust_probability(n) + steal_success_probability(n);
            assert!((total - 1.0).abs() < 1e-12);
        }
    }
}
