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

use std::fmt;
use std::str::FromStr;

use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

use crate::core::numerics::Points;
use crate::core::primitives::UserId;

/// The closed set of AI policies.
///
/// Every player carries a strategy: native AI players use it on every turn,
/// and humans declare it as their takeover strategy for disconnect or
/// timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    Conservative,
    Balanced,
    Aggressive,
    Chaos,
}

impl AiStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiStrategy::Conservative => "conservative",
            AiStrategy::Balanced => "balanced",
            AiStrategy::Aggressive => "aggressive",
            AiStrategy::Chaos => "chaos",
        }
    }
}

impl Default for AiStrategy {
    fn default() -> Self {
        AiStrategy::Balanced
    }
}

impl FromStr for AiStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" => Ok(AiStrategy::Conservative),
            "balanced" => Ok(AiStrategy::Balanced),
            "aggressive" => Ok(AiStrategy::Aggressive),
            "chaos" => Ok(AiStrategy::Chaos),
            other => Err(format!("unknown strategy {other:?}")),
        }
    }
}

impl fmt::Display for AiStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the state of a single player within a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: UserId,

    pub name: String,

    /// Whether this seat is played by an AI from the start of the game.
    pub is_ai: bool,

    /// Native strategy for AI seats; declared takeover strategy for humans.
    pub ai_strategy: AiStrategy,

    /// Banked score.
    pub score: Points,

    /// The player has banked at least `entry_threshold` points in a single
    /// turn at least once. Never reverts to false.
    pub is_on_board: bool,
}

impl PlayerState {
    pub fn new(id: UserId, name: impl Into<String>, is_ai: bool, ai_strategy: AiStrategy) -> Self {
        Self { id, name: name.into(), is_ai, ai_strategy, score: 0, is_on_board: false }
    }
}
