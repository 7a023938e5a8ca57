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

use crate::strategies::{DecideContext, Decision, StealChoice};

/// Chases big turns. Banks only a mountain of points, or a tall pile when
/// the hand has run down to one or two dice.
pub fn decide(ctx: &DecideContext) -> Decision {
    if !ctx.is_on_board && ctx.own_score < ctx.entry_threshold {
        return Decision::Roll;
    }
    // Crossing the target triggers the final round; always take it.
    if ctx.player_score + ctx.turn_score >= ctx.target_score {
        return Decision::Bank;
    }
    if ctx.turn_score >= 3500 {
        return Decision::Bank;
    }
    if ctx.dice_remaining <= 2 && ctx.turn_score >= 2000 {
        return Decision::Bank;
    }
    Decision::Roll
}

/// Always goes after the pot.
pub fn steal(_pot: Points, _dice_remaining: u8) -> StealChoice {
    StealChoice::Attempt
}
