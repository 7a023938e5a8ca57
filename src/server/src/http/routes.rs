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

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use data::core::primitives::UserId;
use data::events::snapshots::RoomSnapshot;
use data::player_states::player_state::AiStrategy;
use data::rooms::room::RoomSettings;
use data::rooms::room_code::RoomCode;
use data::users::leaderboard::{Leaderboard, LeaderboardPeriod};
use data::users::user_state::{UserState, UserStats};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utils::outcome::GameError;
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::rooms::commands::{Reply, RoomCommand};
use crate::rooms::lobby::Lobby;
use crate::sessions::auth::{self, TokenVerifier};
use crate::sessions::socket;

/// Shared state for the HTTP surface and the socket layer.
#[derive(Clone)]
pub struct AppState {
    pub lobby: Lobby,
    pub verifier: Arc<dyn TokenVerifier>,
}

/// The core's front door.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/:code", get(get_game))
        .route("/games/:code/join", post(join_game))
        .route("/games/:code/ai", post(add_ai))
        .route("/games/:code/start", post(start_game))
        .route("/games/:code/leave", post(leave_game))
        .route("/games/:code/players/:pid", delete(remove_player))
        .route("/games/:code/forfeit", post(forfeit_game))
        .route("/games/:code/strategy", post(set_strategy))
        .route("/auth/me", get(auth_me))
        .route("/auth/profile", get(auth_profile))
        .route("/auth/stats", get(auth_stats))
        .route("/auth/games", get(auth_games))
        .route("/leaderboard/:period", get(leaderboard))
        .route("/ws", get(socket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bearer-token authentication for HTTP requests; accepts the same token
/// forms as the socket handshake.
pub struct AuthUser(pub UserState);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError(GameError::Unauthorized))?;
        let token = value.strip_prefix("Bearer ").unwrap_or(value);
        let auth = auth::authenticate(state.verifier.as_ref(), token)?;
        let user = auth::ensure_user(state.lobby.db.as_ref(), &auth).await?;
        Ok(AuthUser(user))
    }
}

#[derive(Debug, Deserialize, Default)]
struct CreateGameRequest {
    settings: Option<RoomSettings>,
}

#[derive(Debug, Serialize)]
struct CreateGameResponse {
    code: String,
    room: RoomSnapshot,
}

async fn create_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Option<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<CreateGameResponse>), ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let (code, room) = state.lobby.create_room(&user, request.settings).await?;
    Ok((StatusCode::CREATED, Json(CreateGameResponse { code: code.to_string(), room })))
}

async fn get_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let code = parse_code(&code)?;
    // Live rooms answer through their worker; finished rooms are read
    // straight from the store.
    match room_command(&state, &code, |reply| RoomCommand::Snapshot { caller: user.id, reply })
        .await
    {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(ApiError(GameError::NotFound(_))) => {
            let room = state
                .lobby
                .fetch_room(&code)
                .await?
                .ok_or(ApiError(GameError::NotFound("room".to_string())))?;
            if !room.is_member(user.id) {
                return Err(ApiError(GameError::Forbidden(
                    "room view is restricted to members".to_string(),
                )));
            }
            Ok(Json(RoomSnapshot::from(&room)))
        }
        Err(error) => Err(error),
    }
}

async fn join_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let code = parse_code(&code)?;
    let snapshot =
        room_command(&state, &code, |reply| RoomCommand::Join { user, reply }).await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct AddAiRequest {
    name: String,
    strategy: String,
}

async fn add_ai(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
    Json(request): Json<AddAiRequest>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let code = parse_code(&code)?;
    let strategy = parse_strategy(&request.strategy)?;
    let snapshot = room_command(&state, &code, |reply| RoomCommand::AddAi {
        caller: user.id,
        name: request.name,
        strategy,
        reply,
    })
    .await?;
    Ok(Json(snapshot))
}

async fn start_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let code = parse_code(&code)?;
    let snapshot =
        room_command(&state, &code, |reply| RoomCommand::Start { caller: user.id, reply })
            .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Serialize)]
struct Acknowledged {
    ok: bool,
}

async fn leave_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<Acknowledged>, ApiError> {
    let code = parse_code(&code)?;
    room_command(&state, &code, |reply| RoomCommand::Leave { caller: user.id, reply }).await?;
    Ok(Json(Acknowledged { ok: true }))
}

async fn remove_player(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((code, pid)): Path<(String, String)>,
) -> Result<Json<Acknowledged>, ApiError> {
    let code = parse_code(&code)?;
    let target = Uuid::parse_str(&pid)
        .map(UserId)
        .map_err(|_| ApiError(GameError::BadRequest("invalid player id".to_string())))?;
    room_command(&state, &code, |reply| RoomCommand::RemovePlayer {
        caller: user.id,
        target,
        reply,
    })
    .await?;
    Ok(Json(Acknowledged { ok: true }))
}

async fn forfeit_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let code = parse_code(&code)?;
    let snapshot =
        room_command(&state, &code, |reply| RoomCommand::Forfeit { caller: user.id, reply })
            .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct StrategyRequest {
    strategy: String,
}

async fn set_strategy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
    Json(request): Json<StrategyRequest>,
) -> Result<Json<Acknowledged>, ApiError> {
    let code = parse_code(&code)?;
    let strategy = parse_strategy(&request.strategy)?;
    room_command(&state, &code, |reply| RoomCommand::SetTakeoverStrategy {
        caller: user.id,
        strategy,
        reply,
    })
    .await?;
    Ok(Json(Acknowledged { ok: true }))
}

async fn auth_me(AuthUser(user): AuthUser) -> Json<UserState> {
    Json(user)
}

async fn auth_profile(AuthUser(user): AuthUser) -> Json<UserState> {
    Json(user)
}

async fn auth_stats(AuthUser(user): AuthUser) -> Json<UserStats> {
    Json(user.stats)
}

async fn auth_games(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RoomSnapshot>>, ApiError> {
    let rooms = state.lobby.db.rooms_for_user(user.id).await.map_err(|_| {
        ApiError(GameError::PersistenceFault("rooms could not be loaded".to_string()))
    })?;
    Ok(Json(rooms.iter().map(RoomSnapshot::from).collect()))
}

async fn leaderboard(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Json<Leaderboard>, ApiError> {
    let period: LeaderboardPeriod = period
        .parse()
        .map_err(|_| ApiError(GameError::BadRequest("unknown leaderboard period".to_string())))?;
    let board = state.lobby.db.fetch_leaderboard(period).await.map_err(|_| {
        ApiError(GameError::PersistenceFault("leaderboard could not be loaded".to_string()))
    })?;
    Ok(Json(board.unwrap_or_else(|| Leaderboard::empty(period))))
}

fn parse_code(raw: &str) -> Result<RoomCode, ApiError> {
    raw.parse::<RoomCode>()
        .map_err(|_| ApiError(GameError::BadRequest("invalid room code".to_string())))
}

fn parse_strategy(raw: &str) -> Result<AiStrategy, ApiError> {
    raw.parse::<AiStrategy>()
        .map_err(|_| ApiError(GameError::BadRequest("unknown strategy".to_string())))
}

/// Routes a request through the room's worker and waits for its answer.
async fn room_command<T, F>(state: &AppState, code: &RoomCode, build: F) -> Result<T, ApiError>
where
    F: FnOnce(Reply<T>) -> RoomCommand,
{
    let handle = state.lobby.resolve(code).await?;
    let (reply, response) = oneshot::channel();
    if handle.commands.send(build(reply)).is_err() {
        return Err(ApiError(GameError::NotFound("room".to_string())));
    }
    match response.await {
        Ok(result) => result.map_err(ApiError),
        Err(_) => Err(ApiError(GameError::NotFound("room".to_string()))),
    }
}
