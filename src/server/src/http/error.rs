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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utils::outcome::GameError;

/// HTTP rendering of a [GameError]: domain violations are 400s, missing
/// things are 404s, and persistence trouble is the server's fault.
#[derive(Debug)]
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(value: GameError) -> Self {
        Self(value)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Unauthorized => StatusCode::UNAUTHORIZED,
            GameError::Forbidden(_) => StatusCode::FORBIDDEN,
            GameError::PersistenceFault(_) | GameError::CodeSpaceExhausted => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
