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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use data::actions::game_action::{GameAction, GameActionKind};
use data::core::clock;
use data::core::dice::DICE_PER_TURN;
use data::core::numerics::Points;
use data::core::primitives::UserId;
use data::events::server_event::ServerEvent;
use data::events::snapshots::{GameSnapshot, LastAction, RoomSnapshot};
use data::game_states::game_state::GameState;
use data::player_states::player_state::AiStrategy;
use data::rooms::room::{Room, RoomMember, RoomStatus, MAX_PLAYERS, MIN_PLAYERS};
use data::users::leaderboard::{Leaderboard, LeaderboardPeriod};
use data::users::user_state::UserState;
use database::database::Database;
use enum_iterator::all;
use rules::action_handlers::{end_turn, turn_actions};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use utils::outcome::{GameError, Outcome};
use utils::{fail, verify};

use crate::rooms::commands::RoomCommand;
use crate::rooms::registry::{RoomHandle, RoomRegistry, EVENT_BUFFER};
use crate::timers::turn_timer::TurnTimer;

/// How long clients get to present a bust before the turn is closed out.
pub const BUST_DISPLAY_DELAY: Duration = Duration::from_secs(2);

/// Owns one room and serializes every mutation to it.
///
/// All input arrives through a single inbox and is processed one command at
/// a time; the only shared resource is the persisted room record, which has
/// no other writer. Scheduled work (turn deadlines, the post-bust pause,
/// AI thinking delays) is a spawned sleep that sends a command back into
/// the inbox carrying the turn serial it was armed under, so stale fires
/// are dropped instead of racing live play.
pub struct RoomWorker {
    room: Room,
    db: Arc<dyn Database>,
    registry: Arc<RoomRegistry>,
    commands: mpsc::UnboundedSender<RoomCommand>,
    inbox: mpsc::UnboundedReceiver<RoomCommand>,
    events: broadcast::Sender<ServerEvent>,
    timer: TurnTimer,
    /// Bumped whenever a new turn begins (or a game starts); scheduled
    /// callbacks must present the serial they saw.
    turn_serial: u64,
    pending_ai: Option<JoinHandle<()>>,
    pending_finish: Option<JoinHandle<()>>,
    /// Dice seed for games started in this room; injectable for tests.
    game_seed: Option<u64>,
    /// Best single banked turn per player this game, for user stats.
    best_turns: HashMap<UserId, Points>,
}

impl RoomWorker {
    /// Spawns the worker task for a room and registers its handle.
    pub fn spawn(
        room: Room,
        db: Arc<dyn Database>,
        registry: Arc<RoomRegistry>,
        game_seed: Option<u64>,
    ) -> RoomHandle {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let handle = RoomHandle { commands: commands.clone(), events: events.clone() };
        registry.insert(room.code.clone(), handle.clone());

        let timer = TurnTimer::new(commands.clone());
        let worker = Self {
            room,
            db,
            registry,
            commands,
            inbox,
            events,
            timer,
            turn_serial: 0,
            pending_ai: None,
            pending_finish: None,
            game_seed,
            best_turns: HashMap::new(),
        };
        tokio::spawn(worker.run());
        handle
    }

    async fn run(mut self) {
        info!(code = %self.room.code, "Room worker started");
        while let Some(command) = self.inbox.recv().await {
            self.handle(command).await;
            if self.room.status == RoomStatus::Finished {
                break;
            }
        }
        self.registry.remove(&self.room.code);
        self.cancel_pending();
        self.timer.clear();
        info!(code = %self.room.code, "Room worker stopped");
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { user, reply } => {
                let _ = reply.send(self.handle_join(user).await);
            }
            RoomCommand::AddAi { caller, name, strategy, reply } => {
                let _ = reply.send(self.handle_add_ai(caller, name, strategy).await);
            }
            RoomCommand::Start { caller, reply } => {
                let _ = reply.send(self.handle_start(caller).await);
            }
            RoomCommand::Leave { caller, reply } => {
                let _ = reply.send(self.handle_leave(caller).await);
            }
            RoomCommand::RemovePlayer { caller, target, reply } => {
                let _ = reply.send(self.handle_remove_player(caller, target).await);
            }
            RoomCommand::Forfeit { caller, reply } => {
                let _ = reply.send(self.handle_forfeit(caller).await);
            }
            RoomCommand::SetTakeoverStrategy { caller, strategy, reply } => {
                let _ = reply.send(self.handle_set_strategy(caller, strategy).await);
            }
            RoomCommand::Snapshot { caller, reply } => {
                let _ = reply.send(self.handle_snapshot(caller));
            }
            RoomCommand::GameAction { caller, action, reply } => {
                let _ = reply.send(self.handle_game_action(caller, action).await);
            }
            RoomCommand::ResumeControl { caller, reply } => {
                let _ = reply.send(self.handle_resume_control(caller).await);
            }
            RoomCommand::DiceSelected { caller, indices } => {
                self.handle_dice_selected(caller, indices);
            }
            RoomCommand::Chat { caller, text } => self.handle_chat(caller, text).await,
            RoomCommand::Connected { user_id } => self.handle_connected(user_id).await,
            RoomCommand::Disconnected { user_id } => self.handle_disconnected(user_id).await,
            RoomCommand::TurnTimeout { player_id, serial } => {
                self.handle_deadline_expired(player_id, serial).await;
            }
            RoomCommand::GraceExpired { player_id, serial } => {
                self.handle_deadline_expired(player_id, serial).await;
            }
            RoomCommand::DebounceElapsed { player_id, serial } => {
                self.handle_debounce_elapsed(player_id, serial);
            }
            RoomCommand::FinishTurn { serial } => self.handle_finish_turn(serial).await,
            RoomCommand::AiStep { serial } => self.handle_ai_step(serial).await,
        }
    }

    // ------------------------------------------------------------------
    // Membership and lifecycle
    // ------------------------------------------------------------------

    async fn handle_join(&mut self, user: UserState) -> Outcome<RoomSnapshot> {
        if self.room.is_member(user.id) {
            // Rejoining is idempotent at any stage.
            return Ok(self.snapshot());
        }
        verify!(
            self.room.status != RoomStatus::Finished,
            GameError::NotFound("room".to_string())
        );
        verify!(self.room.status == RoomStatus::Waiting, GameError::AlreadyStarted);
        verify!(self.room.members.len() < MAX_PLAYERS, GameError::GameFull);

        let member = RoomMember {
            user_id: user.id,
            name: user.name.clone(),
            is_ai: false,
            ai_strategy: AiStrategy::default(),
            connected: false,
            joined_at: clock::now_millis(),
        };
        let saved = self.room.clone();
        self.room.members.push(member.clone());
        if let Err(error) = self.persist().await {
            self.room = saved;
            return Err(error);
        }
        info!(code = %self.room.code, user = %user.id, "Player joined");
        self.publish(ServerEvent::PlayerJoined { member });
        Ok(self.snapshot())
    }

    async fn handle_add_ai(
        &mut self,
        caller: UserId,
        name: String,
        strategy: AiStrategy,
    ) -> Outcome<RoomSnapshot> {
        verify!(
            caller == self.room.host_id,
            GameError::Forbidden("only the host can add AI players".to_string())
        );
        verify!(self.room.status == RoomStatus::Waiting, GameError::AlreadyStarted);
        verify!(self.room.members.len() < MAX_PLAYERS, GameError::GameFull);

        let member = RoomMember {
            user_id: UserId::generate(),
            name,
            is_ai: true,
            ai_strategy: strategy,
            connected: false,
            joined_at: clock::now_millis(),
        };
        let saved = self.room.clone();
        self.room.members.push(member.clone());
        if let Err(error) = self.persist().await {
            self.room = saved;
            return Err(error);
        }
        info!(code = %self.room.code, ai = %member.user_id, ?strategy, "AI player added");
        self.publish(ServerEvent::PlayerJoined { member });
        Ok(self.snapshot())
    }

    async fn handle_start(&mut self, caller: UserId) -> Outcome<RoomSnapshot> {
        verify!(
            caller == self.room.host_id,
            GameError::Forbidden("only the host can start the game".to_string())
        );
        verify!(self.room.status == RoomStatus::Waiting, GameError::AlreadyStarted);
        verify!(
            self.room.members.len() >= MIN_PLAYERS,
            GameError::BadRequest("at least two players are required".to_string())
        );

        let saved = self.room.clone();
        let saved_serial = self.turn_serial;
        self.room.game =
            Some(rules::new_game::create(&self.room.members, &self.room.settings, self.game_seed));
        self.room.status = RoomStatus::Playing;
        self.turn_serial += 1;
        if let Err(error) = self.persist().await {
            self.room = saved;
            self.turn_serial = saved_serial;
            return Err(error);
        }
        info!(code = %self.room.code, players = self.room.members.len(), "Game started");
        self.publish(ServerEvent::GameStarted { room: self.snapshot() });
        self.arm_turn_drivers(true);
        Ok(self.snapshot())
    }

    async fn handle_leave(&mut self, caller: UserId) -> Outcome<()> {
        verify!(self.room.is_member(caller), GameError::NotFound("membership".to_string()));
        match self.room.status {
            RoomStatus::Finished => Ok(()),
            RoomStatus::Waiting => self.remove_waiting_member(caller).await,
            RoomStatus::Playing => self.convert_seat_to_ai(caller).await,
        }
    }

    async fn handle_remove_player(&mut self, caller: UserId, target: UserId) -> Outcome<()> {
        verify!(
            caller == target || caller == self.room.host_id,
            GameError::Forbidden("only the host can remove other players".to_string())
        );
        self.handle_leave(target).await
    }

    async fn remove_waiting_member(&mut self, caller: UserId) -> Outcome<()> {
        let saved = self.room.clone();
        self.room.members.retain(|m| m.user_id != caller);

        let mut new_host_id = None;
        if self.room.members.is_empty() {
            // Nobody left; retire the room.
            self.room.status = RoomStatus::Finished;
        } else if caller == self.room.host_id {
            self.room.host_id = self.room.members[0].user_id;
            new_host_id = Some(self.room.host_id);
        }
        if let Err(error) = self.persist().await {
            self.room = saved;
            return Err(error);
        }
        info!(code = %self.room.code, user = %caller, "Player left");
        self.publish(ServerEvent::PlayerLeft { user_id: caller, new_host_id });
        Ok(())
    }

    /// A player leaving mid-game hands the seat to AI for good; membership
    /// and seating order never shrink while a game is running.
    async fn convert_seat_to_ai(&mut self, caller: UserId) -> Outcome<()> {
        let saved = self.room.clone();
        let mut new_host_id = None;
        if let Some(member) = self.room.member_mut(caller) {
            member.is_ai = true;
            member.connected = false;
        }
        if let Some(game) = self.room.game.as_mut() {
            if let Some(player) = game.players.iter_mut().find(|p| p.id == caller) {
                player.is_ai = true;
            }
        }
        if self.room.ai_controlled_player == Some(caller) {
            self.room.ai_controlled_player = None;
        }
        if caller == self.room.host_id {
            if let Some(human) = self.room.members.iter().find(|m| !m.is_ai) {
                self.room.host_id = human.user_id;
                new_host_id = Some(human.user_id);
            }
        }
        if let Err(error) = self.persist().await {
            self.room = saved;
            return Err(error);
        }
        info!(code = %self.room.code, user = %caller, "Player left mid-game; seat is now AI");
        self.publish(ServerEvent::PlayerLeft { user_id: caller, new_host_id });
        self.arm_turn_drivers(false);
        Ok(())
    }

    async fn handle_forfeit(&mut self, caller: UserId) -> Outcome<RoomSnapshot> {
        self.ensure_playing()?;
        verify!(self.room.is_member(caller), GameError::NotFound("membership".to_string()));

        let Some(game) = self.room.game.as_mut() else {
            fail!(GameError::BadRequest("game is not in progress".to_string()));
        };
        // Winner is the best score among everyone but the forfeiter, the
        // earliest seat taking ties.
        let mut winner = None;
        for (index, player) in game.players.iter().enumerate() {
            if player.id == caller {
                continue;
            }
            match winner {
                None => winner = Some(index),
                Some(best) if player.score > game.players[best].score => winner = Some(index),
                _ => {}
            }
        }
        verify!(
            winner.is_some(),
            GameError::BadRequest("cannot forfeit a game with no other players".to_string())
        );
        game.is_game_over = true;
        game.winner_index = winner;
        game.turn.phase = data::game_states::turn_state::TurnPhase::Ended;
        info!(code = %self.room.code, user = %caller, "Game forfeited");
        if let Some(game_state) = self.game_snapshot() {
            self.publish(ServerEvent::GameStateUpdate { game_state, last_action: None });
        }
        self.finish_room().await;
        Ok(self.snapshot())
    }

    async fn handle_set_strategy(&mut self, caller: UserId, strategy: AiStrategy) -> Outcome<()> {
        verify!(self.room.is_member(caller), GameError::NotFound("membership".to_string()));
        let saved = self.room.clone();
        if let Some(member) = self.room.member_mut(caller) {
            member.ai_strategy = strategy;
        }
        if let Some(game) = self.room.game.as_mut() {
            if let Some(player) = game.players.iter_mut().find(|p| p.id == caller) {
                player.ai_strategy = strategy;
            }
        }
        if let Err(error) = self.persist().await {
            self.room = saved;
            return Err(error);
        }
        Ok(())
    }

    fn handle_snapshot(&self, caller: UserId) -> Outcome<RoomSnapshot> {
        verify!(
            self.room.is_member(caller),
            GameError::Forbidden("room view is restricted to members".to_string())
        );
        Ok(self.snapshot())
    }

    // ------------------------------------------------------------------
    // Gameplay
    // ------------------------------------------------------------------

    async fn handle_game_action(&mut self, caller: UserId, action: GameAction) -> Outcome<()> {
        self.ensure_playing()?;
        verify!(!self.room.is_paused, GameError::Paused);
        let game = self.game()?;
        verify!(game.current_player().id == caller, GameError::NotYourTurn);
        verify!(
            self.room.ai_controlled_player != Some(caller),
            GameError::Forbidden("seat is under AI control; resume control first".to_string())
        );
        self.apply_action(caller, action).await
    }

    /// Applies one engine action, persists, broadcasts, and arms whatever
    /// comes next (timer reset, post-bust close-out, AI step, next turn).
    async fn apply_action(&mut self, actor: UserId, action: GameAction) -> Outcome<()> {
        let saved = self.room.clone();
        let saved_serial = self.turn_serial;
        let kind = action.kind();

        let game = self.game_mut()?;
        let claimed_before = game.turn.carryover_claimed;
        turn_actions::execute(game, action)?;

        let turn = &game.turn;
        let busted = turn.busted;
        let ended = turn.is_ended();
        let banked_amount = turn.turn_score;
        let last_action = LastAction {
            player_id: actor,
            action: kind,
            busted,
            hot_dice: kind == GameActionKind::Keep
                && turn.kept_dice.is_empty()
                && turn.dice_remaining == DICE_PER_TURN,
            claimed_carryover: !claimed_before && turn.carryover_claimed,
        };
        let mut rotated = false;
        if ended && !busted {
            // A bank closes the turn immediately; busts linger so clients
            // can show the loss first.
            self.record_best_turn(actor, banked_amount);
            let game = self.game_mut()?;
            if let Err(error) = end_turn::execute(game) {
                self.room = saved;
                return Err(error);
            }
            self.turn_serial += 1;
            rotated = true;
        }

        if let Err(error) = self.persist().await {
            self.room = saved;
            self.turn_serial = saved_serial;
            return Err(error);
        }

        if let Some(game_state) = self.game_snapshot() {
            self.publish(ServerEvent::GameStateUpdate {
                game_state,
                last_action: Some(last_action),
            });
        }

        if busted {
            self.timer.clear();
            self.schedule_finish_turn();
        } else if rotated {
            self.after_rotation().await;
        } else {
            self.arm_turn_drivers(false);
        }
        Ok(())
    }

    async fn handle_resume_control(&mut self, caller: UserId) -> Outcome<()> {
        self.ensure_playing()?;
        verify!(
            self.room.ai_controlled_player == Some(caller),
            GameError::BadRequest("seat is not under AI control".to_string())
        );
        let game = self.game()?;
        verify!(game.current_player().id == caller, GameError::NotYourTurn);

        let saved = self.room.clone();
        self.room.ai_controlled_player = None;
        if let Err(error) = self.persist().await {
            self.room = saved;
            return Err(error);
        }
        self.cancel_pending_ai();
        info!(code = %self.room.code, user = %caller, "Player resumed control");
        self.publish(ServerEvent::PlayerResumedControl { player_id: caller });
        self.restart_timer_for(caller);
        Ok(())
    }

    fn handle_dice_selected(&mut self, caller: UserId, indices: Vec<usize>) {
        if self.room.status != RoomStatus::Playing || self.room.is_paused {
            return;
        }
        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        if game.current_player().id != caller || self.room.ai_controlled_player == Some(caller) {
            return;
        }
        self.publish(ServerEvent::SelectionHint { player_id: caller, indices });
        self.timer.record_debounced_activity();
    }

    async fn handle_chat(&mut self, caller: UserId, text: String) {
        let Some(member) = self.room.member(caller) else {
            return;
        };
        if text.trim().is_empty() {
            return;
        }
        let message = data::rooms::room::ChatMessage {
            user_id: caller,
            name: member.name.clone(),
            text,
            sent_at: clock::now_millis(),
        };
        self.room.push_chat(message.clone());
        if let Err(error) = self.persist().await {
            warn!(code = %self.room.code, ?error, "Failed to persist chat message");
        }
        self.publish(ServerEvent::ChatMessage { message });
    }

    // ------------------------------------------------------------------
    // Connection events
    // ------------------------------------------------------------------

    async fn handle_connected(&mut self, user_id: UserId) {
        let Some(member) = self.room.member_mut(user_id) else {
            return;
        };
        member.connected = true;

        if self.room.status == RoomStatus::Playing {
            if self.room.is_paused {
                self.resume_room().await;
            }
            if self.timer.is_in_grace_period(user_id) {
                if let Some(sync) = self.timer.handle_reconnect(user_id) {
                    self.publish(ServerEvent::GracePeriodEnded { player_id: user_id });
                    self.publish(ServerEvent::TimerSync(sync));
                }
            }
        }
        if let Err(error) = self.persist().await {
            warn!(code = %self.room.code, ?error, "Failed to persist connection state");
        }
    }

    async fn handle_disconnected(&mut self, user_id: UserId) {
        let Some(member) = self.room.member_mut(user_id) else {
            return;
        };
        member.connected = false;

        if self.room.status == RoomStatus::Playing && !self.room.is_paused {
            let is_turn_player = self
                .room
                .game
                .as_ref()
                .is_some_and(|game| game.current_player().id == user_id);
            if is_turn_player && self.timer.tracked_player() == Some(user_id) {
                if let Some(expires_at) = self.timer.handle_disconnect(user_id) {
                    self.publish(ServerEvent::GracePeriodStarted {
                        player_id: user_id,
                        expires_at,
                        server_time: clock::now_millis(),
                    });
                }
            }
            if self.room.all_humans_disconnected() {
                self.pause_room();
            }
        }
        if let Err(error) = self.persist().await {
            warn!(code = %self.room.code, ?error, "Failed to persist connection state");
        }
    }

    fn pause_room(&mut self) {
        self.room.is_paused = true;
        self.timer.pause();
        self.cancel_pending();
        info!(code = %self.room.code, "All players disconnected; game paused");
        self.publish(ServerEvent::GamePaused);
    }

    async fn resume_room(&mut self) {
        self.room.is_paused = false;
        info!(code = %self.room.code, "Game resumed");
        self.publish(ServerEvent::GameResumed);

        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        if game.turn.is_ended() {
            // The post-bust close-out was cancelled by the pause.
            self.schedule_finish_turn();
            return;
        }
        let current = game.current_player();
        let current_id = current.id;
        let ai_driven =
            current.is_ai || self.room.ai_controlled_player == Some(current_id);
        let current_connected =
            self.room.member(current_id).map(|m| m.connected).unwrap_or(false);
        if ai_driven {
            self.schedule_ai_step();
        } else if self.room.settings.max_turn_timer > 0 {
            let sync = self.timer.start_turn(
                current_id,
                self.turn_timeout_ms(),
                self.turn_serial,
            );
            self.publish(ServerEvent::TimerSync(sync));
            if !current_connected {
                // The turn player is still away; their grace clock runs.
                if let Some(expires_at) = self.timer.handle_disconnect(current_id) {
                    self.publish(ServerEvent::GracePeriodStarted {
                        player_id: current_id,
                        expires_at,
                        server_time: clock::now_millis(),
                    });
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Scheduled callbacks
    // ------------------------------------------------------------------

    /// A turn deadline or grace period ran out: the absent player's seat
    /// goes to AI for the remainder of the turn. Timer callbacks never
    /// surface errors to users; stale fires are dropped.
    async fn handle_deadline_expired(&mut self, player_id: UserId, serial: u64) {
        if serial != self.turn_serial
            || self.room.status != RoomStatus::Playing
            || self.room.is_paused
        {
            return;
        }
        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        if game.current_player().id != player_id
            || game.current_player().is_ai
            || self.room.ai_controlled_player == Some(player_id)
        {
            return;
        }
        let strategy = game.current_player().ai_strategy;

        self.publish(ServerEvent::PlayerTimedOut { player_id, ai_takeover: true });
        self.timer.clear();
        self.room.ai_controlled_player = Some(player_id);
        info!(code = %self.room.code, player = %player_id, ?strategy, "AI takeover");
        self.publish(ServerEvent::AiTakeover { player_id, ai_strategy: strategy });
        self.schedule_ai_step();
        if let Err(error) = self.persist().await {
            warn!(code = %self.room.code, ?error, "Failed to persist AI takeover");
        }
    }

    fn handle_debounce_elapsed(&mut self, player_id: UserId, serial: u64) {
        if serial != self.turn_serial
            || self.room.status != RoomStatus::Playing
            || self.room.is_paused
        {
            return;
        }
        if self.timer.tracked_player() != Some(player_id) {
            return;
        }
        if let Some(sync) = self.timer.record_activity() {
            self.publish(ServerEvent::TimerSync(sync));
            self.publish(ServerEvent::TimerReset { player_id });
        }
    }

    async fn handle_finish_turn(&mut self, serial: u64) {
        if serial != self.turn_serial
            || self.room.status != RoomStatus::Playing
            || self.room.is_paused
        {
            return;
        }
        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        if !game.turn.is_ended() {
            return;
        }

        let saved = self.room.clone();
        let game = match self.game_mut() {
            Ok(game) => game,
            Err(_) => return,
        };
        if let Err(error) = end_turn::execute(game) {
            warn!(code = %self.room.code, ?error, "Failed to close out turn");
            return;
        }
        self.turn_serial += 1;
        if let Err(error) = self.persist().await {
            // Keep the old state and try again shortly.
            error!(code = %self.room.code, ?error, "Failed to persist end of turn; retrying");
            self.room = saved;
            self.turn_serial -= 1;
            self.schedule_finish_turn();
            return;
        }
        if let Some(game_state) = self.game_snapshot() {
            self.publish(ServerEvent::GameStateUpdate { game_state, last_action: None });
        }
        self.after_rotation().await;
    }

    async fn handle_ai_step(&mut self, serial: u64) {
        if serial != self.turn_serial
            || self.room.status != RoomStatus::Playing
            || self.room.is_paused
        {
            return;
        }
        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        if game.is_game_over || game.turn.is_ended() {
            return;
        }
        let current = game.current_player();
        let ai_driven =
            current.is_ai || self.room.ai_controlled_player == Some(current.id);
        if !ai_driven {
            return;
        }

        let actor = current.id;
        let strategy = current.ai_strategy;
        let action =
            match ai::core::agent::select(game, strategy, &mut rand::thread_rng()) {
                Ok(action) => action,
                Err(error) => {
                    warn!(code = %self.room.code, ?error, "AI found no action");
                    return;
                }
            };
        if let Err(error) = self.apply_action(actor, action).await {
            warn!(code = %self.room.code, ?error, "AI action rejected");
        }
    }

    // ------------------------------------------------------------------
    // Turn drivers
    // ------------------------------------------------------------------

    /// After a rotation: announce the new turn, then start whichever driver
    /// the new current player needs (AI step or turn timer).
    async fn after_rotation(&mut self) {
        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        if game.is_game_over {
            self.finish_room().await;
            return;
        }
        let current = game.current_player();
        self.publish(ServerEvent::TurnChanged {
            player_id: current.id,
            current_player_index: game.current_player_index,
        });
        self.arm_turn_drivers(true);
    }

    /// Starts or refreshes the turn's driving machinery. `new_turn` starts
    /// the timer from scratch; otherwise a successful action just resets
    /// the deadline.
    fn arm_turn_drivers(&mut self, new_turn: bool) {
        if self.room.status != RoomStatus::Playing || self.room.is_paused {
            return;
        }
        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        if game.is_game_over || game.turn.is_ended() {
            return;
        }
        let current = game.current_player();
        let current_id = current.id;
        let ai_driven =
            current.is_ai || self.room.ai_controlled_player == Some(current_id);

        if ai_driven {
            self.timer.clear();
            self.schedule_ai_step();
            return;
        }
        if self.room.settings.max_turn_timer == 0 {
            self.timer.clear();
            return;
        }
        if new_turn || self.timer.tracked_player() != Some(current_id) {
            let sync =
                self.timer.start_turn(current_id, self.turn_timeout_ms(), self.turn_serial);
            self.publish(ServerEvent::TimerSync(sync));
        } else if let Some(sync) = self.timer.record_activity() {
            self.publish(ServerEvent::TimerSync(sync));
            self.publish(ServerEvent::TimerReset { player_id: current_id });
        }
    }

    fn restart_timer_for(&mut self, player_id: UserId) {
        if self.room.settings.max_turn_timer == 0 {
            return;
        }
        let sync = self.timer.start_turn(player_id, self.turn_timeout_ms(), self.turn_serial);
        self.publish(ServerEvent::TimerSync(sync));
    }

    fn schedule_ai_step(&mut self) {
        self.cancel_pending_ai();
        let serial = self.turn_serial;
        let commands = self.commands.clone();
        let delay = ai::core::agent::thinking_delay(&mut rand::thread_rng());
        self.pending_ai = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = commands.send(RoomCommand::AiStep { serial });
        }));
    }

    fn schedule_finish_turn(&mut self) {
        if let Some(task) = self.pending_finish.take() {
            task.abort();
        }
        let serial = self.turn_serial;
        let commands = self.commands.clone();
        self.pending_finish = Some(tokio::spawn(async move {
            tokio::time::sleep(BUST_DISPLAY_DELAY).await;
            let _ = commands.send(RoomCommand::FinishTurn { serial });
        }));
    }

    fn cancel_pending_ai(&mut self) {
        if let Some(task) = self.pending_ai.take() {
            task.abort();
        }
    }

    fn cancel_pending(&mut self) {
        self.cancel_pending_ai();
        if let Some(task) = self.pending_finish.take() {
            task.abort();
        }
    }

    // ------------------------------------------------------------------
    // Game end
    // ------------------------------------------------------------------

    async fn finish_room(&mut self) {
        self.cancel_pending();
        self.timer.clear();
        self.room.status = RoomStatus::Finished;
        let winner = self
            .room
            .game
            .as_ref()
            .and_then(|game| game.winner_index.map(|index| game.players[index].id));
        self.room.winner = winner;
        info!(code = %self.room.code, ?winner, "Game ended");
        if let Err(error) = self.persist().await {
            error!(code = %self.room.code, ?error, "Failed to persist finished game");
        }
        self.publish(ServerEvent::GameEnded { winner, final_state: self.snapshot() });
        self.record_results().await;
    }

    /// Best-effort stats and leaderboard updates once a game is over.
    /// Failures here are logged; the game result already stands.
    async fn record_results(&mut self) {
        let Some(game) = self.room.game.as_ref() else {
            return;
        };
        let winner = self.room.winner;
        for player in &game.players {
            // Seats that are AI now (native bots and mid-game leavers) have
            // no user record to credit.
            let is_human = self.room.member(player.id).map(|m| !m.is_ai).unwrap_or(false);
            if !is_human {
                continue;
            }
            let user = match self.db.fetch_user(player.id).await {
                Ok(Some(user)) => Some(user),
                Ok(None) => None,
                Err(error) => {
                    warn!(code = %self.room.code, ?error, "Failed to load user for stats");
                    continue;
                }
            };
            let Some(mut user) = user else {
                continue;
            };
            user.stats.games_played += 1;
            user.stats.total_banked += player.score;
            if winner == Some(player.id) {
                user.stats.games_won += 1;
            }
            if let Some(&best) = self.best_turns.get(&player.id) {
                user.stats.best_turn = user.stats.best_turn.max(best);
            }
            if let Err(error) = self.db.write_user(&user).await {
                warn!(code = %self.room.code, ?error, "Failed to persist user stats");
            }
        }

        if let Some(winner_id) = winner {
            let Some(winner_player) = game.players.iter().find(|p| p.id == winner_id) else {
                return;
            };
            let is_human =
                self.room.member(winner_id).map(|m| !m.is_ai).unwrap_or(false);
            if !is_human {
                return;
            }
            for period in all::<LeaderboardPeriod>() {
                let mut board = match self.db.fetch_leaderboard(period).await {
                    Ok(Some(board)) => board,
                    Ok(None) => Leaderboard::empty(period),
                    Err(error) => {
                        warn!(?error, "Failed to load leaderboard");
                        continue;
                    }
                };
                board.record_win(
                    winner_id,
                    &winner_player.name,
                    winner_player.score,
                    clock::now_millis(),
                );
                if let Err(error) = self.db.write_leaderboard(&board).await {
                    warn!(?error, "Failed to persist leaderboard");
                }
            }
        }
    }

    fn record_best_turn(&mut self, player_id: UserId, banked: Points) {
        let best = self.best_turns.entry(player_id).or_insert(0);
        *best = (*best).max(banked);
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn ensure_playing(&self) -> Outcome<()> {
        verify!(
            self.room.status == RoomStatus::Playing,
            GameError::BadRequest("game is not in progress".to_string())
        );
        Ok(())
    }

    fn game(&self) -> Outcome<&GameState> {
        self.room
            .game
            .as_ref()
            .ok_or_else(|| GameError::BadRequest("game has not started".to_string()))
    }

    fn game_mut(&mut self) -> Outcome<&mut GameState> {
        self.room
            .game
            .as_mut()
            .ok_or_else(|| GameError::BadRequest("game has not started".to_string()))
    }

    fn turn_timeout_ms(&self) -> u64 {
        self.room.settings.max_turn_timer as u64 * 1000
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::from(&self.room)
    }

    fn game_snapshot(&self) -> Option<GameSnapshot> {
        self.room.game.as_ref().map(GameSnapshot::from)
    }

    fn publish(&self, event: ServerEvent) {
        // No subscribers is fine; events are fan-out only.
        let _ = self.events.send(event);
    }

    async fn persist(&mut self) -> Outcome<()> {
        self.room.updated_at = clock::now_millis();
        self.db.write_room(&self.room).await.map_err(|error| {
            error!(code = %self.room.code, ?error, "Failed to persist room");
            GameError::PersistenceFault("room could not be saved".to_string())
        })
    }
}
