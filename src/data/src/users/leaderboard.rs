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

use crate::core::numerics::{Points, UnixMillis};
use crate::core::primitives::UserId;

/// Time window a leaderboard aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    Daily,
    Weekly,
    AllTime,
}

impl LeaderboardPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardPeriod::Daily => "daily",
            LeaderboardPeriod::Weekly => "weekly",
            LeaderboardPeriod::AllTime => "alltime",
        }
    }
}

impl FromStr for LeaderboardPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(LeaderboardPeriod::Daily),
            "weekly" => Ok(LeaderboardPeriod::Weekly),
            "alltime" | "all-time" | "all" => Ok(LeaderboardPeriod::AllTime),
            other => Err(format!("unknown leaderboard period {other:?}")),
        }
    }
}

impl fmt::Display for LeaderboardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub name: String,
    pub wins: u32,
    pub points: Points,
}

/// Ranking of users by wins, then total banked points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub period: LeaderboardPeriod,
    pub entries: Vec<LeaderboardEntry>,
    pub updated_at: UnixMillis,
}

impl Leaderboard {
    pub fn empty(period: LeaderboardPeriod) -> Self {
        Self { period, entries: Vec::new(), updated_at: 0 }
    }

    /// Credits a win to the user, inserting an entry on first sight, and
    /// re-sorts the board.
    pub fn record_win(
        &mut self,
        user_id: UserId,
        name: &str,
        points: Points,
        updated_at: UnixMillis,
    ) {
        match self.entries.iter_mut().find(|e| e.user_id == user_id) {
            Some(entry) => {
                entry.wins += 1;
                entry.points += points;
                entry.name = name.to_string();
            }
            None => self.entries.push(LeaderboardEntry {
                user_id,
                name: name.to_string(),
                wins: 1,
                points,
            }),
        }
        self.entries.sort_by(|a, b| b.wins.cmp(&a.wins).then(b.points.cmp(&a.points)));
        self.updated_at = updated_at;
    }
}
