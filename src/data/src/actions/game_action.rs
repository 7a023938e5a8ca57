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

use enum_kinds::EnumKind;
use serde::{Deserialize, Serialize};

use crate::core::dice::Hand;

/// An in-turn action taken by the current player (or the AI acting for
/// them). The closed set of turn transitions; room-level requests such as
/// joining or forfeiting are not game actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumKind)]
#[enum_kind(GameActionKind, derive(Serialize, Deserialize, Hash))]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameAction {
    /// Roll the remaining dice. Dice values are always generated
    /// server-side; any client-supplied dice are ignored.
    Roll,

    /// Keep a scoring subset of the current roll.
    Keep { dice: Hand },

    /// Commit the turn's accumulated points to the player's score, ending
    /// the turn.
    Bank,

    /// Discard an inherited pot instead of attempting to claim it. Only
    /// legal at the start of a carryover turn, before the first roll.
    DeclineCarryover,
}

impl GameAction {
    pub fn kind(&self) -> GameActionKind {
        GameActionKind::from(self)
    }
}
