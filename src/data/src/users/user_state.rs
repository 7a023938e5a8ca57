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

use crate::core::numerics::{Points, UnixMillis};
use crate::core::primitives::UserId;

/// Aggregate statistics surfaced by the profile and stats endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub games_played: u32,
    pub games_won: u32,
    pub total_banked: Points,
    /// Highest score banked in a single turn.
    pub best_turn: Points,
}

/// A user known to the server: a guest or a verified account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub id: UserId,
    pub name: String,
    /// True when the user authenticated with a trusted guest token rather
    /// than a verified signed token.
    pub guest: bool,
    pub stats: UserStats,
    pub created_at: UnixMillis,
}

impl UserState {
    pub fn new(id: UserId, name: impl Into<String>, guest: bool, created_at: UnixMillis) -> Self {
        Self { id, name: name.into(), guest, stats: UserStats::default(), created_at }
    }
}
