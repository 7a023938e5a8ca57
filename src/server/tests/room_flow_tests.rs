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
use std::time::Duration;

use data::core::primitives::UserId;
use data::events::server_event::ServerEvent;
use data::events::snapshots::RoomSnapshot;
use data::rooms::room::{RoomSettings, RoomStatus};
use data::rooms::room_code::RoomCode;
use data::users::user_state::UserState;
use database::database::Database;
use database::memory_database::MemoryDatabase;
use server::rooms::commands::RoomCommand;
use server::rooms::lobby::Lobby;
use server::rooms::registry::{RoomHandle, RoomRegistry};
use tokio::sync::{broadcast, oneshot};
use utils::outcome::Outcome;

struct Harness {
    lobby: Lobby,
    code: RoomCode,
    handle: RoomHandle,
    host: UserState,
    guest: UserState,
}

async fn setup(settings: RoomSettings) -> Harness {
    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let registry = Arc::new(RoomRegistry::new());
    let lobby = Lobby::new(db, registry.clone()).with_game_seed(17);

    let host = UserState::new(UserId::generate(), "host", true, 0);
    let guest = UserState::new(UserId::generate(), "guest", true, 0);
    let (code, _) = lobby.create_room(&host, Some(settings)).await.unwrap();
    let handle = registry.get(&code).unwrap();
    Harness { lobby, code, handle, host, guest }
}

async fn request<T, F>(handle: &RoomHandle, build: F) -> Outcome<T>
where
    F: FnOnce(oneshot::Sender<Outcome<T>>) -> RoomCommand,
{
    let (reply, response) = oneshot::channel();
    handle
        .commands
        .send(build(reply))
        .map_err(|_| utils::outcome::GameError::NotFound("room".to_string()))?;
    response.await.map_err(|_| utils::outcome::GameError::NotFound("room".to_string()))?
}

async fn next_event(events: &mut broadcast::Receiver<ServerEvent>) -> ServerEvent {
    loop {
        match events.recv().await {
            Ok(event) => return event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
        }
    }
}

/// Waits (with a generous auto-advanced timeout) for an event matching the
/// predicate, consuming everything before it.
async fn wait_for<F>(events: &mut broadcast::Receiver<ServerEvent>, mut predicate: F) -> ServerEvent
where
    F: FnMut(&ServerEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3600), async {
        loop {
            let event = next_event(events).await;
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("expected event never arrived")
}

async fn start_two_player_game(harness: &Harness) -> RoomSnapshot {
    request(&harness.handle, |reply| RoomCommand::Join {
        user: harness.guest.clone(),
        reply,
    })
    .await
    .unwrap();
    harness
        .handle
        .commands
        .send(RoomCommand::Connected { user_id: harness.host.id })
        .unwrap();
    harness
        .handle
        .commands
        .send(RoomCommand::Connected { user_id: harness.guest.id })
        .unwrap();
    request(&harness.handle, |reply| RoomCommand::Start { caller: harness.host.id, reply })
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn grace_period_then_ai_takeover() {
    let harness = setup(RoomSettings { max_turn_timer: 30, ..Default::default() }).await;
    let mut events = harness.handle.subscribe();
    let snapshot = start_two_player_game(&harness).await;
    assert_eq!(snapshot.status, RoomStatus::Playing);

    // First turn belongs to the host; the timer is armed.
    wait_for(&mut events, |e| matches!(e, ServerEvent::TimerSync(_))).await;

    // The host drops mid-turn: the grace clock starts.
    harness
        .handle
        .commands
        .send(RoomCommand::Disconnected { user_id: harness.host.id })
        .unwrap();
    let started = wait_for(&mut events, |e| {
        matches!(e, ServerEvent::GracePeriodStarted { .. })
    })
    .await;
    if let ServerEvent::GracePeriodStarted { player_id, .. } = started {
        assert_eq!(player_id, harness.host.id);
    }

    // Thirty seconds later the seat times out and AI takes over, in order:
    // playerTimedOut, aiTakeover, then the first update the AI produces.
    let timed_out =
        wait_for(&mut events, |e| matches!(e, ServerEvent::PlayerTimedOut { .. })).await;
    if let ServerEvent::PlayerTimedOut { player_id, ai_takeover } = timed_out {
        assert_eq!(player_id, harness.host.id);
        assert!(ai_takeover);
    }
    let takeover = wait_for(&mut events, |e| matches!(e, ServerEvent::AiTakeover { .. })).await;
    if let ServerEvent::AiTakeover { player_id, .. } = takeover {
        assert_eq!(player_id, harness.host.id);
    }
    wait_for(&mut events, |e| matches!(e, ServerEvent::GameStateUpdate { .. })).await;
}

#[tokio::test(start_paused = true)]
async fn reconnect_during_grace_restores_the_timer() {
    let harness = setup(RoomSettings { max_turn_timer: 60, ..Default::default() }).await;
    let mut events = harness.handle.subscribe();
    start_two_player_game(&harness).await;
    wait_for(&mut events, |e| matches!(e, ServerEvent::TimerSync(_))).await;

    harness
        .handle
        .commands
        .send(RoomCommand::Disconnected { user_id: harness.host.id })
        .unwrap();
    wait_for(&mut events, |e| matches!(e, ServerEvent::GracePeriodStarted { .. })).await;

    harness
        .handle
        .commands
        .send(RoomCommand::Connected { user_id: harness.host.id })
        .unwrap();
    wait_for(&mut events, |e| matches!(e, ServerEvent::GracePeriodEnded { .. })).await;
    let sync = wait_for(&mut events, |e| matches!(e, ServerEvent::TimerSync(_))).await;
    if let ServerEvent::TimerSync(sync) = sync {
        assert!(!sync.is_in_grace_period);
        assert_eq!(sync.player_id, harness.host.id);
        // A fresh full timeout, not a partial resume.
        assert_eq!(sync.expires_at - sync.last_activity_at, 60_000);
    }
}

#[tokio::test(start_paused = true)]
async fn total_disconnect_pauses_and_rejoin_resumes() {
    let harness = setup(RoomSettings::default()).await;
    let mut events = harness.handle.subscribe();
    start_two_player_game(&harness).await;

    harness
        .handle
        .commands
        .send(RoomCommand::Disconnected { user_id: harness.host.id })
        .unwrap();
    harness
        .handle
        .commands
        .send(RoomCommand::Disconnected { user_id: harness.guest.id })
        .unwrap();
    wait_for(&mut events, |e| matches!(e, ServerEvent::GamePaused)).await;

    // Actions are rejected while paused.
    let rejected = request(&harness.handle, |reply| RoomCommand::GameAction {
        caller: harness.host.id,
        action: data::actions::game_action::GameAction::Roll,
        reply,
    })
    .await;
    assert_eq!(rejected, Err(utils::outcome::GameError::Paused));

    harness
        .handle
        .commands
        .send(RoomCommand::Connected { user_id: harness.guest.id })
        .unwrap();
    wait_for(&mut events, |e| matches!(e, ServerEvent::GameResumed)).await;
}

#[tokio::test(start_paused = true)]
async fn forfeit_finishes_the_room_and_rejects_further_actions() {
    let harness = setup(RoomSettings::default()).await;
    let mut events = harness.handle.subscribe();
    start_two_player_game(&harness).await;

    let snapshot = request(&harness.handle, |reply| RoomCommand::Forfeit {
        caller: harness.host.id,
        reply,
    })
    .await
    .unwrap();
    assert_eq!(snapshot.status, RoomStatus::Finished);
    assert_eq!(snapshot.winner, Some(harness.guest.id));

    let ended = wait_for(&mut events, |e| matches!(e, ServerEvent::GameEnded { .. })).await;
    if let ServerEvent::GameEnded { winner, final_state } = ended {
        assert_eq!(winner, Some(harness.guest.id));
        assert_eq!(final_state.status, RoomStatus::Finished);
    }

    // The room is gone; nothing further is accepted.
    let after = request(&harness.handle, |reply| RoomCommand::GameAction {
        caller: harness.guest.id,
        action: data::actions::game_action::GameAction::Roll,
        reply,
    })
    .await;
    assert!(after.is_err());

    // The record survives in the store with its final status.
    let stored = harness.lobby.fetch_room(&harness.code).await.unwrap().unwrap();
    assert_eq!(stored.status, RoomStatus::Finished);
    assert_eq!(stored.winner, Some(harness.guest.id));

    // The winner is credited on every leaderboard period.
    let board = harness
        .lobby
        .db
        .fetch_leaderboard(data::users::leaderboard::LeaderboardPeriod::AllTime)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(board.entries[0].user_id, harness.guest.id);
    assert_eq!(board.entries[0].wins, 1);
}

#[tokio::test(start_paused = true)]
async fn selection_hints_debounce_into_timer_activity() {
    let harness = setup(RoomSettings { max_turn_timer: 30, ..Default::default() }).await;
    let mut events = harness.handle.subscribe();
    start_two_player_game(&harness).await;
    wait_for(&mut events, |e| matches!(e, ServerEvent::TimerSync(_))).await;

    harness
        .handle
        .commands
        .send(RoomCommand::DiceSelected { caller: harness.host.id, indices: vec![0, 1] })
        .unwrap();
    let hint = wait_for(&mut events, |e| matches!(e, ServerEvent::SelectionHint { .. })).await;
    if let ServerEvent::SelectionHint { player_id, indices } = hint {
        assert_eq!(player_id, harness.host.id);
        assert_eq!(indices, vec![0, 1]);
    }

    // Two quiet seconds later the hint is promoted to real activity and
    // the deadline resets.
    let reset = wait_for(&mut events, |e| matches!(e, ServerEvent::TimerReset { .. })).await;
    if let ServerEvent::TimerReset { player_id } = reset {
        assert_eq!(player_id, harness.host.id);
    }
}

#[tokio::test(start_paused = true)]
async fn wrong_player_and_wrong_phase_are_rejected_without_state_change() {
    let harness = setup(RoomSettings::default()).await;
    start_two_player_game(&harness).await;

    // Guest tries to act on the host's turn.
    let rejected = request(&harness.handle, |reply| RoomCommand::GameAction {
        caller: harness.guest.id,
        action: data::actions::game_action::GameAction::Bank,
        reply,
    })
    .await;
    assert_eq!(rejected, Err(utils::outcome::GameError::NotYourTurn));

    // Host banks before rolling: phase violation, state untouched.
    let rejected = request(&harness.handle, |reply| RoomCommand::GameAction {
        caller: harness.host.id,
        action: data::actions::game_action::GameAction::Bank,
        reply,
    })
    .await;
    assert!(matches!(rejected, Err(utils::outcome::GameError::PhaseViolation { .. })));

    let snapshot = request(&harness.handle, |reply| RoomCommand::Snapshot {
        caller: harness.host.id,
        reply,
    })
    .await
    .unwrap();
    let game = snapshot.game.unwrap();
    assert_eq!(game.turn.turn_score, 0);
    assert_eq!(game.current_player_index, 0);
}

#[tokio::test(start_paused = true)]
async fn a_timed_out_game_plays_itself_to_completion() {
    // Short target, short timer: the host never acts, the first deadline
    // hands their seat to AI, and the bots play the game out.
    let harness =
        setup(RoomSettings { target_score: 1000, max_turn_timer: 5, ..Default::default() }).await;
    let mut events = harness.handle.subscribe();

    request(&harness.handle, |reply| RoomCommand::AddAi {
        caller: harness.host.id,
        name: "bot-one".to_string(),
        strategy: data::player_states::player_state::AiStrategy::Aggressive,
        reply,
    })
    .await
    .unwrap();
    harness
        .handle
        .commands
        .send(RoomCommand::Connected { user_id: harness.host.id })
        .unwrap();
    request(&harness.handle, |reply| RoomCommand::Start { caller: harness.host.id, reply })
        .await
        .unwrap();

    wait_for(&mut events, |e| matches!(e, ServerEvent::AiTakeover { .. })).await;
    let ended = wait_for(&mut events, |e| matches!(e, ServerEvent::GameEnded { .. })).await;
    if let ServerEvent::GameEnded { winner, final_state } = ended {
        assert!(final_state.game.unwrap().is_game_over);
        assert!(winner.is_some());
    }
}
