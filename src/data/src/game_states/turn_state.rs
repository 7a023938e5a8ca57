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

use enumset::EnumSetType;
use serde::{Deserialize, Serialize};

use crate::core::dice::{Hand, DICE_PER_TURN};
use crate::core::numerics::{Points, UnixMillis};

/// Phase of the current player's turn.
#[derive(Debug, Hash, Serialize, Deserialize, EnumSetType)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    /// Waiting for the player to roll.
    Rolling,

    /// A scoring roll is on the table; the player must keep a subset.
    Keeping,

    /// The player has kept dice and must choose to roll again or bank.
    Deciding,

    /// The turn starts with an inherited pot. The player either rolls to
    /// claim it or declines, discarding it.
    StealRequired,

    /// The turn is over (bank or bust); the state is frozen until the
    /// reducer rotates to the next player.
    Ended,
}

/// Per-turn state for the current player.
///
/// Invariants (checked by the engine's tests after every transition):
/// `kept_dice.len() + dice_remaining == 5` whenever no roll is mid-flight;
/// `turn_score` includes `carryover_points` iff `carryover_claimed`;
/// `carryover_points > 0` implies `has_carryover`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    pub phase: TurnPhase,

    /// The hand just rolled; `None` before the first roll and after a keep
    /// commits the roll.
    pub current_roll: Option<Hand>,

    /// Dice kept so far this turn. Cleared when all five are kept and the
    /// hand refreshes ("hot dice").
    pub kept_dice: Hand,

    /// Points earned this turn, including a claimed pot.
    pub turn_score: Points,

    /// Dice available to the next roll, in 1..=5.
    pub dice_remaining: u8,

    /// Pot inherited from the previous player's bust.
    pub carryover_points: Points,

    /// A pot was present at turn start and has not been declined.
    pub has_carryover: bool,

    /// The pot has been folded into `turn_score` by a scoring keep.
    pub carryover_claimed: bool,

    /// The turn ended on a scoreless roll.
    pub busted: bool,

    /// Points surrendered by the bust, which seed the next player's pot:
    /// the turn score at the moment of bust plus any still-unclaimed pot.
    pub forfeited_points: Points,

    /// Server wall-clock time at turn start, for client display.
    pub started_at: UnixMillis,
}

impl TurnState {
    /// A fresh turn. Starts in [TurnPhase::StealRequired] when a pot is
    /// inherited, otherwise [TurnPhase::Rolling].
    pub fn new(carryover_points: Points, started_at: UnixMillis) -> Self {
        let has_carryover = carryover_points > 0;
        Self {
            phase: if has_carryover { TurnPhase::StealRequired } else { TurnPhase::Rolling },
            current_roll: None,
            kept_dice: Hand::default(),
            turn_score: 0,
            dice_remaining: DICE_PER_TURN,
            carryover_points,
            has_carryover,
            carryover_claimed: false,
            busted: false,
            forfeited_points: 0,
            started_at,
        }
    }

    /// Points earned by this player's own dice, excluding a claimed pot.
    ///
    /// This is the number compared against the entry threshold when banking.
    pub fn own_score(&self) -> Points {
        if self.carryover_claimed {
            self.turn_score - self.carryover_points
        } else {
            self.turn_score
        }
    }

    pub fn is_ended(&self) -> bool {
        self.phase == TurnPhase::Ended
    }
}
