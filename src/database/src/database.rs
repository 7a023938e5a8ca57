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

use async_trait::async_trait;
use color_eyre::Result;
use data::core::primitives::UserId;
use data::rooms::room::{Room, RoomStatus};
use data::rooms::room_code::RoomCode;
use data::users::leaderboard::{Leaderboard, LeaderboardPeriod};
use data::users::user_state::UserState;

/// The only persistence operations the core depends on.
///
/// Every room has exactly one writing orchestrator, so last-write-wins per
/// room is acceptable; implementations make no further guarantees.
#[async_trait]
pub trait Database: Send + Sync {
    async fn fetch_room(&self, code: &RoomCode) -> Result<Option<Room>>;

    /// Stores a brand-new room, failing if the code is already taken.
    async fn create_room(&self, room: &Room) -> Result<()>;

    async fn write_room(&self, room: &Room) -> Result<()>;

    /// Rooms the user belongs to that have not finished.
    async fn rooms_for_user(&self, user_id: UserId) -> Result<Vec<Room>>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserState>>;

    async fn write_user(&self, user: &UserState) -> Result<()>;

    async fn fetch_leaderboard(&self, period: LeaderboardPeriod) -> Result<Option<Leaderboard>>;

    async fn write_leaderboard(&self, leaderboard: &Leaderboard) -> Result<()>;
}

/// Shared filter for the active-rooms query.
pub(crate) fn is_active_for(room: &Room, user_id: UserId) -> bool {
    room.status != RoomStatus::Finished && room.is_member(user_id)
}
