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

pub mod aggressive;
pub mod balanced;
pub mod chaos;
pub mod conservative;

use data::core::numerics::Points;

/// What a strategy wants to do with a turn in the deciding phase. The
/// dispatcher downgrades an illegal bank to a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Roll,
    Bank,
}

/// What a strategy wants to do with an inherited pot before rolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StealChoice {
    Attempt,
    Decline,
}

/// Everything a strategy sees when deciding. A deliberately flat view of
/// the turn so strategies stay pure and trivially testable.
#[derive(Debug, Clone, Copy)]
pub struct DecideContext {
    pub turn_score: Points,
    /// Turn score excluding a claimed pot; the number the entry gate
    /// checks.
    pub own_score: Points,
    pub dice_remaining: u8,
    pub is_on_board: bool,
    pub entry_threshold: Points,
    pub target_score: Points,
    pub player_score: Points,
}
