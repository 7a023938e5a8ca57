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
use color_eyre::eyre::bail;
use color_eyre::Result;
use dashmap::DashMap;
use data::core::primitives::UserId;
use data::rooms::room::Room;
use data::rooms::room_code::RoomCode;
use data::users::leaderboard::{Leaderboard, LeaderboardPeriod};
use data::users::user_state::UserState;

use crate::database::{is_active_for, Database};

/// The default store: everything lives in process memory and vanishes on
/// restart. Suitable for development and for tests.
#[derive(Default)]
pub struct MemoryDatabase {
    rooms: DashMap<RoomCode, Room>,
    users: DashMap<UserId, UserState>,
    leaderboards: DashMap<LeaderboardPeriod, Leaderboard>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn fetch_room(&self, code: &RoomCode) -> Result<Option<Room>> {
        Ok(self.rooms.get(code).map(|entry| entry.clone()))
    }

    async fn create_room(&self, room: &Room) -> Result<()> {
        if self.rooms.contains_key(&room.code) {
            bail!("room code {} is already taken", room.code);
        }
        self.rooms.insert(room.code.clone(), room.clone());
        Ok(())
    }

    async fn write_room(&self, room: &Room) -> Result<()> {
        self.rooms.insert(room.code.clone(), room.clone());
        Ok(())
    }

    async fn rooms_for_user(&self, user_id: UserId) -> Result<Vec<Room>> {
        Ok(self
            .rooms
            .iter()
            .filter(|entry| is_active_for(entry.value(), user_id))
            .map(|entry| entry.clone())
            .collect())
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserState>> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn write_user(&self, user: &UserState) -> Result<()> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn fetch_leaderboard(&self, period: LeaderboardPeriod) -> Result<Option<Leaderboard>> {
        Ok(self.leaderboards.get(&period).map(|entry| entry.clone()))
    }

    async fn write_leaderboard(&self, leaderboard: &Leaderboard) -> Result<()> {
        self.leaderboards.insert(leaderboard.period, leaderboard.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use data::core::clock;
    use data::player_states::player_state::AiStrategy;
    use data::rooms::room::{RoomMember, RoomSettings, RoomStatus};

    use super::*;

    fn room(code: &str) -> Room {
        let host = RoomMember {
            user_id: UserId::generate(),
            name: "host".to_string(),
            is_ai: false,
            ai_strategy: AiStrategy::Balanced,
            connected: true,
            joined_at: clock::now_millis(),
        };
        Room::new(code.parse().unwrap(), host, RoomSettings::default(), clock::now_millis())
    }

    #[tokio::test]
    async fn create_rejects_duplicate_codes() {
        let db = MemoryDatabase::new();
        let first = room("ABCDEF");
        db.create_room(&first).await.unwrap();
        assert!(db.create_room(&room("ABCDEF")).await.is_err());
        assert!(db.fetch_room(&"ABCDEF".parse().unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn active_rooms_exclude_finished_games() {
        let db = MemoryDatabase::new();
        let mut first = room("ABCDEF");
        let user = first.host_id;
        db.create_room(&first).await.unwrap();
        assert_eq!(db.rooms_for_user(user).await.unwrap().len(), 1);

        first.status = RoomStatus::Finished;
        db.write_room(&first).await.unwrap();
        assert!(db.rooms_for_user(user).await.unwrap().is_empty());
    }
}
