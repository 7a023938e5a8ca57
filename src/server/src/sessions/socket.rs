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

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use data::actions::game_action::GameAction;
use data::core::primitives::UserId;
use data::events::client_event::ClientEvent;
use data::events::server_event::ServerEvent;
use data::rooms::room_code::RoomCode;
use data::users::user_state::UserState;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::http::routes::AppState;
use crate::rooms::commands::{Reply, RoomCommand};
use crate::sessions::auth;

/// Upgrades the duplex event channel.
pub async fn ws_handler(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let (sink, mut stream) = socket.split();
    let (out, out_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let writer = tokio::spawn(write_events(sink, out_rx));

    let mut session = Session { app, out, user: None, room: None };
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => session.handle(event).await,
                Err(error) => {
                    debug!(?error, "Dropping malformed client message");
                    session.send_error("malformed message");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
    session.leave_room();
    writer.abort();
}

async fn write_events(
    mut sink: SplitSink<WebSocket, Message>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = events.recv().await {
        let Ok(text) = serde_json::to_string(&event) else {
            continue;
        };
        if sink.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}

/// A room this socket is currently watching.
struct JoinedRoom {
    code: RoomCode,
    commands: mpsc::UnboundedSender<RoomCommand>,
    forwarder: JoinHandle<()>,
}

/// Per-socket state: the authenticated user and at most one joined room.
///
/// Errors for this client go straight down its own socket as `actionError`;
/// everything multicast arrives through the room's broadcast channel, in
/// the order the room produced it.
struct Session {
    app: AppState,
    out: mpsc::UnboundedSender<ServerEvent>,
    user: Option<UserState>,
    room: Option<JoinedRoom>,
}

impl Session {
    async fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Authenticate { token } => self.handle_authenticate(token).await,
            ClientEvent::JoinGame { code } => self.handle_join(code).await,
            ClientEvent::LeaveGame { code } => self.handle_leave(code),
            ClientEvent::GameAction { code, action } => self.handle_action(code, action).await,
            ClientEvent::RequestGameState { code } => self.handle_request_state(code).await,
            ClientEvent::DiceSelected { code, indices } => {
                self.fire_and_forget(&code, |caller| RoomCommand::DiceSelected {
                    caller,
                    indices,
                });
            }
            ClientEvent::ResumeControl { code } => {
                self.room_request(&code, |caller, reply| RoomCommand::ResumeControl {
                    caller,
                    reply,
                })
                .await;
            }
            ClientEvent::ChatMessage { code, text } => {
                self.fire_and_forget(&code, |caller| RoomCommand::Chat { caller, text });
            }
        }
    }

    async fn handle_authenticate(&mut self, token: String) {
        let auth = match auth::authenticate(self.app.verifier.as_ref(), &token) {
            Ok(auth) => auth,
            Err(error) => {
                self.send_error(error.to_string());
                return;
            }
        };
        match auth::ensure_user(self.app.lobby.db.as_ref(), &auth).await {
            Ok(user) => {
                debug!(user = %user.id, "Socket authenticated");
                self.user = Some(user);
            }
            Err(error) => self.send_error(error.to_string()),
        }
    }

    async fn handle_join(&mut self, code: String) {
        let Some(user) = self.user.clone() else {
            self.send_error("authenticate first");
            return;
        };
        let Ok(code) = code.parse::<RoomCode>() else {
            self.send_error("invalid room code");
            return;
        };
        // One room per socket; switching rooms leaves the old one.
        self.leave_room();

        let handle = match self.app.lobby.resolve(&code).await {
            Ok(handle) => handle,
            Err(error) => {
                self.send_error(error.to_string());
                return;
            }
        };
        // Subscribe before joining so this socket sees its own join event.
        let events = handle.subscribe();
        let (reply, response) = oneshot::channel();
        if handle.commands.send(RoomCommand::Join { user: user.clone(), reply }).is_err() {
            self.send_error("room is closed");
            return;
        }
        let snapshot = match response.await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(error)) => {
                self.send_error(error.to_string());
                return;
            }
            Err(_) => {
                self.send_error("room is closed");
                return;
            }
        };

        let forwarder = tokio::spawn(forward_events(events, self.out.clone()));
        let _ = handle.commands.send(RoomCommand::Connected { user_id: user.id });
        self.room = Some(JoinedRoom { code, commands: handle.commands, forwarder });

        if let Some(game_state) = snapshot.game {
            self.send(ServerEvent::GameStateUpdate { game_state, last_action: None });
        }
    }

    fn handle_leave(&mut self, code: String) {
        if let Some(room) = &self.room {
            if room.code.as_str() == code.trim().to_ascii_uppercase() {
                self.leave_room();
            }
        }
    }

    async fn handle_action(&mut self, code: String, action: GameAction) {
        self.room_request(&code, |caller, reply| RoomCommand::GameAction {
            caller,
            action,
            reply,
        })
        .await;
    }

    async fn handle_request_state(&mut self, code: String) {
        let snapshot = self
            .room_request(&code, |caller, reply| RoomCommand::Snapshot { caller, reply })
            .await;
        if let Some(snapshot) = snapshot {
            match snapshot.game {
                Some(game_state) => {
                    self.send(ServerEvent::GameStateUpdate { game_state, last_action: None });
                }
                None => self.send_error("game has not started"),
            }
        }
    }

    /// Sends a command that answers through a reply channel; an error
    /// answer becomes an `actionError` for this socket only.
    async fn room_request<T, F>(&mut self, code: &str, build: F) -> Option<T>
    where
        F: FnOnce(UserId, Reply<T>) -> RoomCommand,
    {
        let caller = match &self.user {
            Some(user) => user.id,
            None => {
                self.send_error("authenticate first");
                return None;
            }
        };
        let Some(room) = &self.room else {
            self.send_error("join the room first");
            return None;
        };
        if room.code.as_str() != code.trim().to_ascii_uppercase() {
            self.send_error("not joined to that room");
            return None;
        }
        let (reply, response) = oneshot::channel();
        if room.commands.send(build(caller, reply)).is_err() {
            self.send_error("room is closed");
            return None;
        }
        match response.await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                self.send_error(error.to_string());
                None
            }
            Err(_) => {
                self.send_error("room is closed");
                None
            }
        }
    }

    /// Sends a command with no reply (hints, chat).
    fn fire_and_forget<F>(&mut self, code: &str, build: F)
    where
        F: FnOnce(UserId) -> RoomCommand,
    {
        let caller = match &self.user {
            Some(user) => user.id,
            None => return,
        };
        let Some(room) = &self.room else {
            return;
        };
        if room.code.as_str() != code.trim().to_ascii_uppercase() {
            return;
        }
        let _ = room.commands.send(build(caller));
    }

    /// Detaches from the current room, telling it this client is gone.
    fn leave_room(&mut self) {
        let Some(room) = self.room.take() else {
            return;
        };
        room.forwarder.abort();
        if let Some(user) = &self.user {
            let _ = room.commands.send(RoomCommand::Disconnected { user_id: user.id });
        }
    }

    fn send(&self, event: ServerEvent) {
        let _ = self.out.send(event);
    }

    fn send_error(&self, message: impl Into<String>) {
        self.send(ServerEvent::ActionError { message: message.into() });
    }
}

async fn forward_events(
    mut events: broadcast::Receiver<ServerEvent>,
    out: mpsc::UnboundedSender<ServerEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if out.send(event).is_err() {
                    break;
                }
            }
            // A lagged subscriber misses events; it can request a fresh
            // snapshot.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
