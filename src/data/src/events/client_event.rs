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

use crate::actions::game_action::GameAction;

/// Messages a client may send over the duplex channel.
///
/// `authenticate` must be the first message on a fresh socket; everything
/// else is rejected until it succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    Authenticate { token: String },
    JoinGame { code: String },
    LeaveGame { code: String },
    GameAction { code: String, action: GameAction },
    RequestGameState { code: String },
    /// Debounced activity hint while the player toggles dice; not a state
    /// mutation.
    DiceSelected { code: String, indices: Vec<usize> },
    ResumeControl { code: String },
    ChatMessage { code: String, text: String },
}
