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

/// Banks early and often. Off the board it banks the moment entry is
/// secured; on the board it banks anything worth 300 or more, unless the
/// pile has grown risky enough that handing it to the table as a pot looks
/// worse than pressing on with good odds.
pub fn decide(ctx: &DecideContext) -> Decision {
    if !ctx.is_on_board {
        return if ctx.own_score >= ctx.entry_threshold { Decision::Bank } else { Decision::Roll };
    }
    // Crossing the target triggers the final round; always take it.
    if ctx.player_score + ctx.turn_score >= ctx.target_score {
        return Decision::Bank;
    }
    if ctx.turn_score < 300 {
        return Decision::Roll;
    }
    let risk = (ctx.turn_score as f64 / 1000.0).min(1.0);
    let bust = odds::bust_probability(ctx.dice_remaining);
    if risk > 0.6 && ctx.dice_remaining > 2 && bust < 0.35 {
        Decision::Roll
    } else {
        Decision::Bank
    }
}

/// Declines pots too small to be worth chasing.
pub fn steal(pot: Points, dice_remaining: u8) -> StealChoice {
    let expected_gain = odds::steal_success_probability(dice_remaining) * pot as f64;
    if expected_gain >= 150.0 {
        StealChoice::Attempt
    } else {
        StealChoice::Decline
    }
}
