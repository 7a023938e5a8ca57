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

use crate::core::numerics::UnixMillis;
use crate::core::primitives::UserId;
use crate::events::snapshots::{GameSnapshot, LastAction, RoomSnapshot};
use crate::player_states::player_state::AiStrategy;
use crate::rooms::room::{ChatMessage, RoomMember};

/// Timer synchronization payload. All timestamps are server wall-clock
/// milliseconds; clients compute an offset from `server_time` and never
/// trust their own clock for deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSync {
    pub player_id: UserId,
    pub turn_started_at: UnixMillis,
    pub last_activity_at: UnixMillis,
    pub expires_at: UnixMillis,
    pub server_time: UnixMillis,
    pub is_in_grace_period: bool,
}

/// Events multicast to every client subscribed to a room.
///
/// Delivery is at-least-once, in the order the room's orchestrator produced
/// them. State updates are full snapshots, so clients never need to
/// reconcile deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    PlayerJoined { member: RoomMember },
    PlayerLeft { user_id: UserId, new_host_id: Option<UserId> },
    GameStarted { room: RoomSnapshot },
    GameStateUpdate { game_state: GameSnapshot, last_action: Option<LastAction> },
    TurnChanged { player_id: UserId, current_player_index: usize },
    GameEnded { winner: Option<UserId>, final_state: RoomSnapshot },
    PlayerTimedOut { player_id: UserId, ai_takeover: bool },
    TimerSync(TimerSync),
    TimerReset { player_id: UserId },
    GracePeriodStarted { player_id: UserId, expires_at: UnixMillis, server_time: UnixMillis },
    GracePeriodEnded { player_id: UserId },
    GamePaused,
    GameResumed,
    AiTakeover { player_id: UserId, ai_strategy: AiStrategy },
    PlayerResumedControl { player_id: UserId },
    ActionError { message: String },
    ChatMessage { message: ChatMessage },
    /// Mirrors the current player's tentative dice selection to the other
    /// clients. Not a state mutation.
    SelectionHint { player_id: UserId, indices: Vec<usize> },
}
