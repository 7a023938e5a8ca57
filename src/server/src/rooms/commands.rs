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

use data::actions::game_action::GameAction;
use data::core::primitives::UserId;
use data::events::snapshots::RoomSnapshot;
use data::player_states::player_state::AiStrategy;
use data::users::user_state::UserState;
use tokio::sync::oneshot;
use utils::outcome::Outcome;

/// One-shot reply channel for commands that answer the caller directly.
pub type Reply<T> = oneshot::Sender<Outcome<T>>;

/// Everything a room's inbox accepts. The room worker dequeues and fully
/// processes one command (mutation, persistence, fan-out) before the next;
/// that FIFO discipline is the whole concurrency story for a room.
///
/// Scheduled callbacks carry the turn serial observed when they were armed;
/// the worker drops any callback whose serial no longer matches, which makes
/// stale timer fires and cancelled AI steps harmless.
#[derive(Debug)]
pub enum RoomCommand {
    // Membership and lifecycle requests.
    Join { user: UserState, reply: Reply<RoomSnapshot> },
    AddAi { caller: UserId, name: String, strategy: AiStrategy, reply: Reply<RoomSnapshot> },
    Start { caller: UserId, reply: Reply<RoomSnapshot> },
    Leave { caller: UserId, reply: Reply<()> },
    RemovePlayer { caller: UserId, target: UserId, reply: Reply<()> },
    Forfeit { caller: UserId, reply: Reply<RoomSnapshot> },
    SetTakeoverStrategy { caller: UserId, strategy: AiStrategy, reply: Reply<()> },
    Snapshot { caller: UserId, reply: Reply<RoomSnapshot> },

    // Gameplay.
    GameAction { caller: UserId, action: GameAction, reply: Reply<()> },
    ResumeControl { caller: UserId, reply: Reply<()> },
    DiceSelected { caller: UserId, indices: Vec<usize> },
    Chat { caller: UserId, text: String },

    // Connection events from the session layer.
    Connected { user_id: UserId },
    Disconnected { user_id: UserId },

    // Scheduled callbacks.
    TurnTimeout { player_id: UserId, serial: u64 },
    GraceExpired { player_id: UserId, serial: u64 },
    DebounceElapsed { player_id: UserId, serial: u64 },
    /// Post-bust delay elapsed; close out the ended turn.
    FinishTurn { serial: u64 },
    /// The AI's thinking delay elapsed; take one AI step.
    AiStep { serial: u64 },
}
