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

use data::core::clock;
use data::core::primitives::UserId;
use data::users::user_state::UserState;
use database::database::Database;
use tracing::debug;
use utils::fail;
use utils::outcome::{GameError, Outcome};
use uuid::Uuid;

/// Identity attached to a connection or request after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub name: String,
    pub guest: bool,
}

/// Verifies signed tokens. The actual verification lives with the identity
/// provider; the core only depends on this seam.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<AuthenticatedUser>;
}

/// Rejects every signed token. The default until an identity provider is
/// wired in; guest tokens still work.
pub struct NullVerifier;

impl TokenVerifier for NullVerifier {
    fn verify(&self, _token: &str) -> Option<AuthenticatedUser> {
        None
    }
}

/// Authenticates a bearer-style token.
///
/// Two forms are accepted: `guest:{uuid}:{name}` is trusted literally, and
/// anything else is handed to the injected [TokenVerifier].
pub fn authenticate(verifier: &dyn TokenVerifier, token: &str) -> Outcome<AuthenticatedUser> {
    if let Some(rest) = token.strip_prefix("guest:") {
        let Some((id, name)) = rest.split_once(':') else {
            fail!(GameError::Unauthorized);
        };
        let Ok(id) = Uuid::parse_str(id) else {
            fail!(GameError::Unauthorized);
        };
        let name = name.trim();
        if name.is_empty() {
            fail!(GameError::Unauthorized);
        }
        debug!(user_id = %id, "Guest authenticated");
        return Ok(AuthenticatedUser {
            user_id: UserId(id),
            name: name.to_string(),
            guest: true,
        });
    }
    match verifier.verify(token) {
        Some(user) => Ok(user),
        None => Err(GameError::Unauthorized),
    }
}

/// Loads the user record for an authenticated identity, creating it on
/// first sight and refreshing a changed display name.
pub async fn ensure_user(
    db: &dyn Database,
    auth: &AuthenticatedUser,
) -> Outcome<UserState> {
    let fetched = db.fetch_user(auth.user_id).await.map_err(|_| {
        GameError::PersistenceFault("user record could not be loaded".to_string())
    })?;
    let mut user = fetched.unwrap_or_else(|| {
        UserState::new(auth.user_id, auth.name.clone(), auth.guest, clock::now_millis())
    });
    if user.name != auth.name {
        user.name = auth.name.clone();
    }
    db.write_user(&user).await.map_err(|_| {
        GameError::PersistenceFault("user record could not be saved".to_string())
    })?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_tokens_are_trusted_literally() {
        let id = Uuid::new_v4();
        let user = authenticate(&NullVerifier, &format!("guest:{id}:Rina")).unwrap();
        assert_eq!(user.user_id, UserId(id));
        assert_eq!(user.name, "Rina");
        assert!(user.guest);
    }

    #[test]
    fn malformed_and_unverifiable_tokens_are_rejected() {
        assert_eq!(authenticate(&NullVerifier, "guest:nope"), Err(GameError::Unauthorized));
        assert_eq!(
            authenticate(&NullVerifier, "guest:not-a-uuid:Rina"),
            Err(GameError::Unauthorized)
        );
        let id = Uuid::new_v4();
        assert_eq!(
            authenticate(&NullVerifier, &format!("guest:{id}:")),
            Err(GameError::Unauthorized)
        );
        assert_eq!(
            authenticate(&NullVerifier, "signed-token-without-verifier"),
            Err(GameError::Unauthorized)
        );
    }

    #[test]
    fn signed_tokens_go_through_the_verifier() {
        struct FixedVerifier(AuthenticatedUser);
        impl TokenVerifier for FixedVerifier {
            fn verify(&self, token: &str) -> Option<AuthenticatedUser> {
                (token == "good").then(|| self.0.clone())
            }
        }
        let expected = AuthenticatedUser {
            user_id: UserId::generate(),
            name: "Sam".to_string(),
            guest: false,
        };
        let verifier = FixedVerifier(expected.clone());
        assert_eq!(authenticate(&verifier, "good"), Ok(expected));
        assert_eq!(authenticate(&verifier, "bad"), Err(GameError::Unauthorized));
    }
}
