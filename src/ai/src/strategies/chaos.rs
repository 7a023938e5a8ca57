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
use rand::Rng;

use crate::strategies::{DecideContext, Decision, StealChoice};

/// Flips a coin. The dispatcher still refuses illegal banks, so chaos is
/// only ever random among legal moves.
pub fn decide(ctx: &DecideContext, rng: &mut impl Rng) -> Decision {
    if !ctx.is_on_board && ctx.own_score < ctx.entry_threshold {
        return Decision::Roll;
    }
    if rng.gen_bool(0.5) {
        Decision::Bank
    } else {
        Decision::Roll
    }
}

pub fn steal(_pot: Points, _dice_remaining: u8, rng: &mut impl Rng) -> StealChoice {
    if rng.gen_bool(0.5) {
        StealChoice::Attempt
    } else {
        StealChoice::Decline
    }
}
