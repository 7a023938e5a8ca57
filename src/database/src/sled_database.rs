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
use color_eyre::eyre::{bail, Context};
use color_eyre::Result;
use data::core::primitives::UserId;
use data::rooms::room::Room;
use data::rooms::room_code::RoomCode;
use data::users::leaderboard::{Leaderboard, LeaderboardPeriod};
use data::users::user_state::UserState;
use serde_json::{de, ser};
use sled::{Db, Tree};

use crate::database::{is_active_for, Database};

/// Durable store backed by an embedded sled database.
pub struct SledDatabase {
    db: Db,
}

impl SledDatabase {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        Ok(Self { db: sled::open(&path).with_context(|| format!("Error opening {path}"))? })
    }

    fn rooms(&self) -> Result<Tree> {
        self.db.open_tree("rooms").with_context(|| "Error opening the 'rooms' tree")
    }

    fn users(&self) -> Result<Tree> {
        self.db.open_tree("users").with_context(|| "Error opening the 'users' tree")
    }

    fn leaderboards(&self) -> Result<Tree> {
        self.db.open_tree("leaderboards").with_context(|| "Error opening the 'leaderboards' tree")
    }
}

#[async_trait]
impl Database for SledDatabase {
    async fn fetch_room(&self, code: &RoomCode) -> Result<Option<Room>> {
        self.rooms()?
            .get(code.as_str())
            .with_context(|| format!("Error fetching room {code}"))?
            .map(|slice| {
                de::from_slice::<Room>(&slice)
                    .with_context(|| format!("Error deserializing room {code}"))
            })
            .transpose()
    }

    async fn create_room(&self, room: &Room) -> Result<()> {
        let serialized = ser::to_vec(room)
            .with_context(|| format!("Error serializing room {}", room.code))?;
        let previous = self
            .rooms()?
            .compare_and_swap(room.code.as_str(), None::<&[u8]>, Some(serialized))
            .with_context(|| format!("Error creating room {}", room.code))?;
        if previous.is_err() {
            bail!("room code {} is already taken", room.code);
        }
        self.db.flush_async().await?;
        Ok(())
    }

    async fn write_room(&self, room: &Room) -> Result<()> {
        self.rooms()?.insert(
            room.code.as_str(),
            ser::to_vec(room).with_context(|| format!("Error serializing room {}", room.code))?,
        )?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn rooms_for_user(&self, user_id: UserId) -> Result<Vec<Room>> {
        let mut result = Vec::new();
        for entry in self.rooms()?.iter() {
            let (_, slice) = entry.with_context(|| "Error scanning the 'rooms' tree")?;
            let room =
                de::from_slice::<Room>(&slice).with_context(|| "Error deserializing a room")?;
            if is_active_for(&room, user_id) {
                result.push(room);
            }
        }
        Ok(result)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserState>> {
        self.users()?
            .get(user_key(id))
            .with_context(|| format!("Error fetching user {id}"))?
            .map(|slice| {
                de::from_slice::<UserState>(&slice)
                    .with_context(|| format!("Error deserializing user {id}"))
            })
            .transpose()
    }

    async fn write_user(&self, user: &UserState) -> Result<()> {
        self.users()?.insert(
            user_key(user.id),
            ser::to_vec(user).with_context(|| format!("Error serializing user {}", user.id))?,
        )?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn fetch_leaderboard(&self, period: LeaderboardPeriod) -> Result<Option<Leaderboard>> {
        self.leaderboards()?
            .get(period.as_str())
            .with_context(|| format!("Error fetching leaderboard {period}"))?
            .map(|slice| {
                de::from_slice::<Leaderboard>(&slice)
                    .with_context(|| format!("Error deserializing leaderboard {period}"))
            })
            .transpose()
    }

    async fn write_leaderboard(&self, leaderboard: &Leaderboard) -> Result<()> {
        self.leaderboards()?.insert(
            leaderboard.period.as_str(),
            ser::to_vec(leaderboard).with_context(|| {
                format!("Error serializing leaderboard {}", leaderboard.period)
            })?,
        )?;
        self.db.flush_async().await?;
        Ok(())
    }
}

fn user_key(user_id: UserId) -> [u8; 16] {
    user_id.0.as_u128().to_be_bytes()
}
