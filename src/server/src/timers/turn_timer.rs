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

use std::time::Duration;

use data::core::clock;
use data::core::numerics::UnixMillis;
use data::core::primitives::UserId;
use data::events::server_event::TimerSync;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::rooms::commands::RoomCommand;

/// How long a disconnected turn player has to come back before AI takeover.
pub const GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Quiet window after a dice-selection hint before it counts as activity.
pub const SELECTION_DEBOUNCE: Duration = Duration::from_secs(2);

/// Deadline state for one active turn.
///
/// All wall-clock fields exist for client broadcasts; the deadlines
/// themselves are tokio sleeps against the monotonic clock, delivered back
/// to the room's inbox as commands carrying the turn serial they were armed
/// under.
struct TimerEntry {
    player_id: UserId,
    serial: u64,
    started_at: UnixMillis,
    last_activity_at: UnixMillis,
    timeout_ms: u64,
    expires_at: UnixMillis,
    timeout_task: Option<JoinHandle<()>>,
    grace_task: Option<JoinHandle<()>>,
    is_in_grace_period: bool,
    grace_started_at: Option<UnixMillis>,
    debounce_task: Option<JoinHandle<()>>,
}

impl TimerEntry {
    fn sync(&self) -> TimerSync {
        TimerSync {
            player_id: self.player_id,
            turn_started_at: self.started_at,
            last_activity_at: self.last_activity_at,
            expires_at: self.expires_at,
            server_time: clock::now_millis(),
            is_in_grace_period: self.is_in_grace_period,
        }
    }

    fn abort_all(&mut self) {
        for task in [
            self.timeout_task.take(),
            self.grace_task.take(),
            self.debounce_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}

impl Drop for TimerEntry {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Per-room turn deadlines: the action timeout, the disconnect grace
/// period, and the debounced selection-activity reset.
pub struct TurnTimer {
    commands: mpsc::UnboundedSender<RoomCommand>,
    entry: Option<TimerEntry>,
}

impl TurnTimer {
    pub fn new(commands: mpsc::UnboundedSender<RoomCommand>) -> Self {
        Self { commands, entry: None }
    }

    /// Whose turn the timer is currently tracking.
    pub fn tracked_player(&self) -> Option<UserId> {
        self.entry.as_ref().map(|e| e.player_id)
    }

    pub fn is_in_grace_period(&self, player_id: UserId) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.player_id == player_id && e.is_in_grace_period)
    }

    /// Starts tracking a fresh turn, replacing any prior entry.
    pub fn start_turn(&mut self, player_id: UserId, timeout_ms: u64, serial: u64) -> TimerSync {
        self.clear();
        let now = clock::now_millis();
        let mut entry = TimerEntry {
            player_id,
            serial,
            started_at: now,
            last_activity_at: now,
            timeout_ms,
            expires_at: now + timeout_ms,
            timeout_task: None,
            grace_task: None,
            is_in_grace_period: false,
            grace_started_at: None,
            debounce_task: None,
        };
        entry.timeout_task = Some(self.spawn_timeout(player_id, timeout_ms, serial));
        debug!(%player_id, timeout_ms, "Turn timer started");
        let sync = entry.sync();
        self.entry = Some(entry);
        sync
    }

    /// Resets the deadline after a successful action.
    pub fn record_activity(&mut self) -> Option<TimerSync> {
        let commands = self.commands.clone();
        let entry = self.entry.as_mut()?;
        let now = clock::now_millis();
        entry.last_activity_at = now;
        entry.expires_at = now + entry.timeout_ms;
        entry.is_in_grace_period = false;
        entry.grace_started_at = None;
        if let Some(task) = entry.grace_task.take() {
            task.abort();
        }
        if let Some(task) = entry.timeout_task.take() {
            task.abort();
        }
        entry.timeout_task = Some(spawn_send_after(
            commands,
            Duration::from_millis(entry.timeout_ms),
            RoomCommand::TurnTimeout { player_id: entry.player_id, serial: entry.serial },
        ));
        Some(entry.sync())
    }

    /// Arms (or re-arms) the 2 s selection debounce; when it elapses
    /// without further hints the worker promotes it to real activity.
    pub fn record_debounced_activity(&mut self) {
        let commands = self.commands.clone();
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if let Some(task) = entry.debounce_task.take() {
            task.abort();
        }
        entry.debounce_task = Some(spawn_send_after(
            commands,
            SELECTION_DEBOUNCE,
            RoomCommand::DebounceElapsed { player_id: entry.player_id, serial: entry.serial },
        ));
    }

    /// The turn player dropped; suspend the action deadline and start the
    /// grace countdown. Returns when the grace period will expire.
    pub fn handle_disconnect(&mut self, player_id: UserId) -> Option<UnixMillis> {
        let commands = self.commands.clone();
        let entry = self.entry.as_mut()?;
        if entry.player_id != player_id || entry.is_in_grace_period {
            return None;
        }
        if let Some(task) = entry.timeout_task.take() {
            task.abort();
        }
        let now = clock::now_millis();
        entry.is_in_grace_period = true;
        entry.grace_started_at = Some(now);
        entry.grace_task = Some(spawn_send_after(
            commands,
            GRACE_PERIOD,
            RoomCommand::GraceExpired { player_id, serial: entry.serial },
        ));
        debug!(%player_id, "Grace period started");
        Some(now + GRACE_PERIOD.as_millis() as u64)
    }

    /// The turn player came back during grace. The action deadline resumes
    /// with a fresh full timeout: fairness across flaky networks beats
    /// exact resume.
    pub fn handle_reconnect(&mut self, player_id: UserId) -> Option<TimerSync> {
        if !self.is_in_grace_period(player_id) {
            return None;
        }
        let away_ms = self
            .entry
            .as_ref()
            .and_then(|e| e.grace_started_at)
            .map(|started| clock::now_millis().saturating_sub(started));
        debug!(%player_id, ?away_ms, "Grace period ended by reconnect");
        self.record_activity()
    }

    /// Suspends all deadlines without forgetting the turn. Used when every
    /// human has disconnected and the room pauses.
    pub fn pause(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.abort_all();
            debug!(player_id = %entry.player_id, "Turn timer paused");
        }
    }

    /// Restarts the deadline after a pause, again with a full timeout.
    pub fn resume(&mut self) -> Option<TimerSync> {
        self.record_activity()
    }

    /// Stops tracking entirely (turn ended, AI in control, timer disabled).
    pub fn clear(&mut self) {
        if let Some(mut entry) = self.entry.take() {
            entry.abort_all();
        }
    }

    fn spawn_timeout(&self, player_id: UserId, timeout_ms: u64, serial: u64) -> JoinHandle<()> {
        spawn_send_after(
            self.commands.clone(),
            Duration::from_millis(timeout_ms),
            RoomCommand::TurnTimeout { player_id, serial },
        )
    }
}

fn spawn_send_after(
    commands: mpsc::UnboundedSender<RoomCommand>,
    delay: Duration,
    command: RoomCommand,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // The room may already be gone; a dead inbox is fine.
        let _ = commands.send(command);
    })
}
