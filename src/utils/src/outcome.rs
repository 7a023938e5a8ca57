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

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a candidate keep-selection can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum KeepError {
    /// The selection contains no dice.
    #[error("selection is empty")]
    Empty,
    /// The selection is not a sub-bag of the current roll.
    #[error("selection contains dice that are not in the current roll")]
    NotInRoll,
    /// At least one selected die contributes no points.
    #[error("every kept die must contribute to the score")]
    NotScoring,
}

/// Every way the runtime can refuse to do what it was asked.
///
/// Engine modules surface [GameError::PhaseViolation] and
/// [GameError::InvalidKeep]; the orchestrator rejects the action and reports
/// the error to the offending client only. Room state is never mutated by a
/// failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The action is not legal in the turn's current phase.
    #[error("action {action} is illegal in phase {phase}")]
    PhaseViolation { action: String, phase: String },

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("invalid keep: {0}")]
    InvalidKeep(KeepError),

    /// Banking is refused until a single turn has earned the entry threshold.
    #[error("cannot bank {own_points} points before reaching the {entry_threshold} entry threshold")]
    BelowEntry { own_points: u32, entry_threshold: u32 },

    #[error("room is full")]
    GameFull,

    #[error("game has already started")]
    AlreadyStarted,

    #[error("game is paused")]
    Paused,

    #[error("persistence fault: {0}")]
    PersistenceFault(String),

    #[error("unable to allocate an unused room code")]
    CodeSpaceExhausted,
}

impl From<KeepError> for GameError {
    fn from(value: KeepError) -> Self {
        GameError::InvalidKeep(value)
    }
}

/// Represents the result of some game mutation.
///
/// Engine and orchestrator code halts on the first [GameError] via `?`; the
/// caller decides whether the error reaches a client or is logged and
/// swallowed (timer callbacks).
pub type Outcome<T = ()> = Result<T, GameError>;

/// Returns a [GameError] from the enclosing function unless `condition` is
/// true.
#[macro_export]
macro_rules! verify {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error.into());
        }
    };
}

/// Returns a [GameError] from the enclosing function.
#[macro_export]
macro_rules! fail {
    ($error:expr) => {
        return Err($error.into())
    };
}
