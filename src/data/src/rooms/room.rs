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
use utils::outcome::{GameError, Outcome};
use utils::verify;

use crate::core::numerics::{Points, UnixMillis};
use crate::core::primitives::{RoomId, UserId};
use crate::game_states::game_state::GameState;
use crate::player_states::player_state::AiStrategy;
use crate::rooms::room_code::RoomCode;

/// Maximum participants in one room.
pub const MAX_PLAYERS: usize = 6;

/// Minimum participants required to start a game.
pub const MIN_PLAYERS: usize = 2;

/// Chat log cap per room; the oldest message is evicted past this.
pub const MAX_CHAT_MESSAGES: usize = 100;

/// Status of a room: gathering players, mid-game, or done.
///
/// Rooms never re-open after finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// Host-chosen game settings, validated against fixed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomSettings {
    /// First player to bank at least this many points triggers the final
    /// round. At least 1000.
    pub target_score: Points,

    /// Minimum single-turn score before a player first appears on the
    /// board.
    pub entry_threshold: Points,

    /// Seconds a human has to act before AI takeover; 0 disables the turn
    /// timer.
    pub max_turn_timer: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self { target_score: 10_000, entry_threshold: 650, max_turn_timer: 0 }
    }
}

impl RoomSettings {
    pub fn validate(&self) -> Outcome {
        verify!(
            self.target_score >= 1000,
            GameError::BadRequest(format!("target score {} is below 1000", self.target_score))
        );
        verify!(
            self.max_turn_timer == 0 || (5..=300).contains(&self.max_turn_timer),
            GameError::BadRequest(format!(
                "turn timer {} must be 0 or within 5..=300 seconds",
                self.max_turn_timer
            ))
        );
        Ok(())
    }
}

/// One participant's membership record in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub user_id: UserId,
    pub name: String,
    pub is_ai: bool,

    /// Native strategy for AI members; declared takeover strategy for
    /// humans.
    pub ai_strategy: AiStrategy,

    /// Whether a live connection is currently attached to this member.
    /// Always false for AI members.
    pub connected: bool,

    pub joined_at: UnixMillis,
}

/// A chat line. The room keeps at most [MAX_CHAT_MESSAGES] of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub user_id: UserId,
    pub name: String,
    pub text: String,
    pub sent_at: UnixMillis,
}

/// A game room: membership, settings, chat, and (once started) the game.
///
/// Each room is exclusively owned by one orchestrator task; every mutation
/// goes through that task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    pub host_id: UserId,
    pub status: RoomStatus,
    pub members: Vec<RoomMember>,
    pub settings: RoomSettings,

    /// `None` until the host starts the game.
    pub game: Option<GameState>,

    /// Player currently driven by AI takeover, if any.
    pub ai_controlled_player: Option<UserId>,

    /// Set while every human member is disconnected mid-game.
    pub is_paused: bool,

    pub chat: Vec<ChatMessage>,

    pub winner: Option<UserId>,

    pub created_at: UnixMillis,
    pub updated_at: UnixMillis,
}

impl Room {
    pub fn new(
        code: RoomCode,
        host: RoomMember,
        settings: RoomSettings,
        created_at: UnixMillis,
    ) -> Self {
        Self {
            id: RoomId::generate(),
            code,
            host_id: host.user_id,
            status: RoomStatus::Waiting,
            members: vec![host],
            settings,
            game: None,
            ai_controlled_player: None,
            is_paused: false,
            chat: Vec::new(),
            winner: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn member(&self, user_id: UserId) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn member_mut(&mut self, user_id: UserId) -> Option<&mut RoomMember> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.member(user_id).is_some()
    }

    /// True while every human member is disconnected.
    pub fn all_humans_disconnected(&self) -> bool {
        self.members.iter().filter(|m| !m.is_ai).all(|m| !m.connected)
    }

    /// Appends a chat message, evicting the oldest past the cap.
    pub fn push_chat(&mut self, message: ChatMessage) {
        self.chat.push(message);
        if self.chat.len() > MAX_CHAT_MESSAGES {
            self.chat.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn member(name: &str) -> RoomMember {
        RoomMember {
            user_id: UserId(Uuid::new_v4()),
            name: name.to_string(),
            is_ai: false,
            ai_strategy: AiStrategy::Balanced,
            connected: true,
            joined_at: 0,
        }
    }

    #[test]
    fn settings_bounds() {
        assert!(RoomSettings::default().validate().is_ok());
        assert!(RoomSettings { target_score: 999, ..Default::default() }.validate().is_err());
        assert!(RoomSettings { max_turn_timer: 3, ..Default::default() }.validate().is_err());
        assert!(RoomSettings { max_turn_timer: 301, ..Default::default() }.validate().is_err());
        assert!(RoomSettings { max_turn_timer: 300, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn chat_evicts_oldest_past_cap() {
        let host = member("host");
        let host_id = host.user_id;
        let mut room = Room::new("ABCDEF".parse().unwrap(), host, RoomSettings::default(), 0);
        for i in 0..(MAX_CHAT_MESSAGES + 5) {
            room.push_chat(ChatMessage {
                user_id: host_id,
                name: "host".to_string(),
                text: format!("message {i}"),
                sent_at: i as u64,
            });
        }
        assert_eq!(room.chat.len(), MAX_CHAT_MESSAGES);
        assert_eq!(room.chat[0].text, "message 5");
    }
}
