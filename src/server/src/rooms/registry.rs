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

use dashmap::DashMap;
use data::events::server_event::ServerEvent;
use data::rooms::room_code::RoomCode;
use tokio::sync::{broadcast, mpsc};

use crate::rooms::commands::RoomCommand;

/// Capacity of a room's event fan-out buffer. A subscriber that lags this
/// far behind starts missing events and should request a fresh snapshot.
pub const EVENT_BUFFER: usize = 256;

/// Handle to a live room worker: the command inbox plus the event fan-out.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub commands: mpsc::UnboundedSender<RoomCommand>,
    pub events: broadcast::Sender<ServerEvent>,
}

impl RoomHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }
}

/// Maps room codes to live workers. Rooms whose games have finished are
/// removed; their records remain readable through the database.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomCode, RoomHandle>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).map(|entry| entry.clone())
    }

    pub fn insert(&self, code: RoomCode, handle: RoomHandle) {
        self.rooms.insert(code, handle);
    }

    pub fn remove(&self, code: &RoomCode) {
        self.rooms.remove(code);
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
