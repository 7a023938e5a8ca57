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

use std::sync::Arc;

use data::core::clock;
use data::events::snapshots::RoomSnapshot;
use data::player_states::player_state::AiStrategy;
use data::rooms::room::{Room, RoomMember, RoomSettings, RoomStatus};
use data::rooms::room_code::{RoomCode, MAX_CODE_ATTEMPTS};
use data::users::user_state::UserState;
use database::database::Database;
use tracing::{info, warn};
use utils::fail;
use utils::outcome::{GameError, Outcome};

use crate::rooms::orchestrator::RoomWorker;
use crate::rooms::registry::{RoomHandle, RoomRegistry};

/// Shared context for room creation and lookup.
#[derive(Clone)]
pub struct Lobby {
    pub db: Arc<dyn Database>,
    pub registry: Arc<RoomRegistry>,
    /// Dice seed for newly started games; tests inject one for
    /// reproducible rolls.
    pub game_seed: Option<u64>,
}

impl Lobby {
    pub fn new(db: Arc<dyn Database>, registry: Arc<RoomRegistry>) -> Self {
        Self { db, registry, game_seed: None }
    }

    pub fn with_game_seed(mut self, seed: u64) -> Self {
        self.game_seed = Some(seed);
        self
    }

    /// Creates a room with the caller as host and spawns its worker.
    ///
    /// Codes are drawn by rejection sampling against the store; after
    /// [MAX_CODE_ATTEMPTS] collisions the code space is declared exhausted.
    pub async fn create_room(
        &self,
        host: &UserState,
        settings: Option<RoomSettings>,
    ) -> Outcome<(RoomCode, RoomSnapshot)> {
        let settings = settings.unwrap_or_default();
        settings.validate()?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = RoomCode::generate(&mut rand::thread_rng());
            if self.fetch_room(&code).await?.is_some() {
                continue;
            }
            let member = RoomMember {
                user_id: host.id,
                name: host.name.clone(),
                is_ai: false,
                ai_strategy: AiStrategy::default(),
                connected: false,
                joined_at: clock::now_millis(),
            };
            let room = Room::new(code.clone(), member, settings, clock::now_millis());
            if let Err(error) = self.db.create_room(&room).await {
                // Lost a race for this code; try another.
                warn!(%code, ?error, "Room creation collided");
                continue;
            }
            let snapshot = RoomSnapshot::from(&room);
            RoomWorker::spawn(room, self.db.clone(), self.registry.clone(), self.game_seed);
            info!(%code, host = %host.id, "Room created");
            return Ok((code, snapshot));
        }
        fail!(GameError::CodeSpaceExhausted);
    }

    /// Returns the live handle for a room, reviving a worker from the
    /// store if the process restarted since the room was created.
    pub async fn resolve(&self, code: &RoomCode) -> Outcome<RoomHandle> {
        if let Some(handle) = self.registry.get(code) {
            return Ok(handle);
        }
        let room = self
            .fetch_room(code)
            .await?
            .ok_or_else(|| GameError::NotFound("room".to_string()))?;
        if room.status == RoomStatus::Finished {
            fail!(GameError::NotFound("room".to_string()));
        }
        info!(%code, "Reviving room worker from store");
        Ok(RoomWorker::spawn(room, self.db.clone(), self.registry.clone(), self.game_seed))
    }

    /// Reads a room record straight from the store, bypassing any worker.
    /// Used for finished rooms and for membership-gated views.
    pub async fn fetch_room(&self, code: &RoomCode) -> Outcome<Option<Room>> {
        self.db.fetch_room(code).await.map_err(|error| {
            warn!(%code, ?error, "Failed to fetch room");
            GameError::PersistenceFault("room could not be loaded".to_string())
        })
    }
}
