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

use data::core::numerics::Points;
use rules::queries::odds;

use crate::strategies::{DecideContext, Decision, StealChoice};

/// Weighs the expected value of one more roll against what a bust would
/// cost. Holds a mandatory "secure entry" rule: once a turn has earned the
/// entry threshold it banks, unless the hand is still rich (four or more
/// dice) and the score only barely clears the bar.
pub fn decide(ctx: &DecideContext) -> Decision {
    if !ctx.is_on_board {
        if ctx.own_score >= ctx.entry_threshold {
            let barely_over = ctx.turn_score <= ctx.entry_threshold + 150;
            if ctx.dice_remaining >= 4 && barely_over {
                return Decision::Roll;
            }
            return Decision::Bank;
        }
        return Decision::Roll;
    }

    // Crossing the target triggers the final round; always take it.
    if ctx.player_score + ctx.turn_score >= ctx.target_score {
        return Decision::Bank;
    }

    let bust = odds::bust_probability(ctx.dice_remaining);
    let expected = (1.0 - bust) * odds::expected_roll_points(ctx.dice_remaining)
        - bust * ctx.turn_score as f64;
    let dice_bonus = 15.0 * ctx.dice_remaining as f64;
    if expected + dice_bonus > 0.0 {
        Decision::Roll
    } else {
        Decision::Bank
    }
}

/// Attempts any pot whose expected yield beats a small floor.
pub fn steal(pot: Points, dice_remaining: u8) -> StealChoice {
    let expected_gain = odds::steal_success_probability(dice_remaining) * pot as f64;
    if expected_gain >= 50.0 {
        StealChoice::Attempt
    } else {
        StealChoice::Decline
    }
}
