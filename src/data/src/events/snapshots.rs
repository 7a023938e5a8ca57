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

use crate::actions::game_action::GameActionKind;
use crate::core::numerics::{Points, UnixMillis};
use crate::core::primitives::{RoomId, UserId};
use crate::game_states::game_state::GameState;
use crate::game_states::turn_state::TurnState;
use crate::player_states::player_state::PlayerState;
use crate::rooms::room::{ChatMessage, Room, RoomMember, RoomSettings, RoomStatus};
use crate::rooms::room_code::RoomCode;

/// Client-facing copy of a [GameState].
///
/// Identical to the authoritative state except that the dice rng never
/// leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub players: Vec<PlayerState>,
    pub current_player_index: usize,
    pub turn: TurnState,
    pub target_score: Points,
    pub entry_threshold: Points,
    pub is_final_round: bool,
    pub final_round_triggered_by: Option<usize>,
    pub is_game_over: bool,
    pub winner_index: Option<usize>,
}

impl From<&GameState> for GameSnapshot {
    fn from(game: &GameState) -> Self {
        Self {
            players: game.players.clone(),
            current_player_index: game.current_player_index,
            turn: game.turn.clone(),
            target_score: game.target_score,
            entry_threshold: game.entry_threshold,
            is_final_round: game.is_final_round,
            final_round_triggered_by: game.final_round_triggered_by,
            is_game_over: game.is_game_over,
            winner_index: game.winner_index,
        }
    }
}

/// Client-facing copy of a [Room].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub code: RoomCode,
    pub host_id: UserId,
    pub status: RoomStatus,
    pub members: Vec<RoomMember>,
    pub settings: RoomSettings,
    pub game: Option<GameSnapshot>,
    pub ai_controlled_player: Option<UserId>,
    pub is_paused: bool,
    pub chat: Vec<ChatMessage>,
    pub winner: Option<UserId>,
    pub created_at: UnixMillis,
    pub updated_at: UnixMillis,
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            code: room.code.clone(),
            host_id: room.host_id,
            status: room.status,
            members: room.members.clone(),
            settings: room.settings,
            game: room.game.as_ref().map(GameSnapshot::from),
            ai_controlled_player: room.ai_controlled_player,
            is_paused: room.is_paused,
            chat: room.chat.clone(),
            winner: room.winner,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

/// Summary of the action that produced a state update, echoed to clients
/// alongside the snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAction {
    pub player_id: UserId,
    pub action: GameActionKind,
    /// The roll scored nothing and ended the turn.
    pub busted: bool,
    /// All five dice were kept and the hand refreshed.
    pub hot_dice: bool,
    /// This action folded the inherited pot into the turn score.
    pub claimed_carryover: bool,
}
