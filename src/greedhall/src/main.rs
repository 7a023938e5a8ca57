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

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use color_eyre::eyre::Context;
use color_eyre::Result;
use database::database::Database;
use database::memory_database::MemoryDatabase;
use database::sled_database::SledDatabase;
use server::http::routes::{router, AppState};
use server::rooms::lobby::Lobby;
use server::rooms::registry::RoomRegistry;
use server::sessions::auth::NullVerifier;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment:
/// - `GREEDHALL_ADDR`: bind address, default `0.0.0.0:3000`
/// - `GREEDHALL_DB`: sled directory; unset means the in-memory store
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = env::var("GREEDHALL_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .with_context(|| "Invalid GREEDHALL_ADDR")?;

    let db: Arc<dyn Database> = match env::var("GREEDHALL_DB") {
        Ok(path) if !path.is_empty() => {
            info!(path, "Using sled store");
            Arc::new(SledDatabase::new(path)?)
        }
        _ => {
            info!("Using in-memory store");
            Arc::new(MemoryDatabase::new())
        }
    };

    let registry = Arc::new(RoomRegistry::new());
    let state = AppState {
        lobby: Lobby::new(db, registry),
        verifier: Arc::new(NullVerifier),
    };

    info!(%addr, "greedhall listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to bind {addr}"))?;
    axum::serve(listener, router(state)).await.with_context(|| "Server terminated")?;
    Ok(())
}
