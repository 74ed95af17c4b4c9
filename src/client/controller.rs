use std::time::Instant;

use actix::prelude::*;
use actix::MessageResult;
use log::{debug, info, warn};

use crate::client::bridge::{Directive, Dispatch, EventBridge};
use crate::client::channel::{Channel, ChannelError, ChannelEvent};
use crate::client::feedback::{Cue, Feedback, CHOICE_VIBRATION};
use crate::client::guard::SubmitOutcome;
use crate::client::input;
use crate::client::messages::{
    ClientIntent, CreateRoom, GetSnapshot, JoinRoom, MakeChoice, ResetToMenu, SetSoundEnabled,
    Shutdown, StartNewGame,
};
use crate::client::table::Table;
use crate::client::timer::TimerSignal;
use crate::config::ControllerConfig;
use crate::config::round::COUNTDOWN_CUE_FROM_SECS;
use crate::error::SessionError;
use crate::game::state::{ConnectionStatus, Phase};
use crate::game::types::{Choice, PlayerId, RoundToken};

/// Drives one client session: owns the channel, the round table and every
/// scheduled callback. All mutation happens on this actor's mailbox.
pub struct SessionController {
    channel: Box<dyn Channel>,
    feedback: Box<dyn Feedback>,
    config: ControllerConfig,
    table: Table,
    bridge: Option<EventBridge>,

    tick_loop: Option<(RoundToken, SpawnHandle)>,
    pending_round: Option<(u64, SpawnHandle)>,
    next_pending_id: u64,
    reconnect: Option<SpawnHandle>,
    reconnect_attempt: u32,
    last_countdown_cue: Option<u64>,
    sound_enabled: bool,
    torn_down: bool,
}

impl SessionController {
    pub fn new(channel: Box<dyn Channel>, feedback: Box<dyn Feedback>, config: ControllerConfig) -> Self {
        Self {
            channel,
            feedback,
            table: Table::new(config.round_duration),
            sound_enabled: config.sound_enabled,
            config,
            bridge: None,
            tick_loop: None,
            pending_round: None,
            next_pending_id: 0,
            reconnect: None,
            reconnect_attempt: 0,
            last_countdown_cue: None,
            torn_down: false,
        }
    }

    fn connect(&mut self, ctx: &mut Context<Self>) {
        self.reconnect = None;
        self.table.session.connection = if self.reconnect_attempt == 0 {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Reconnecting { attempt: self.reconnect_attempt }
        };
        let _ = self.table.session.transition(Phase::Connecting);
        debug!("[Controller] Connecting ({:?})", self.table.session.connection);

        let fut = self.channel.connect();
        ctx.spawn(fut.into_actor(self).map(|result, act, ctx| act.on_connect_result(result, ctx)));
    }

    fn on_connect_result(&mut self, result: Result<PlayerId, ChannelError>, ctx: &mut Context<Self>) {
        if self.torn_down {
            return;
        }
        match result {
            Ok(local_id) => {
                info!("[Controller] Connected as {}", local_id);
                self.reconnect_attempt = 0;
                self.table.session.connection = ConnectionStatus::Connected;
                self.table.session.last_error = None;
                self.bridge = Some(EventBridge::new(local_id, &self.config));
                self.channel.subscribe(ctx.address().recipient());

                let next = if self.table.session.room_code.is_some() {
                    self.table.session.message = "Reconnected. Waiting for the room...".to_string();
                    Phase::Waiting
                } else {
                    self.table.session.message = "Connected. Create or join a room.".to_string();
                    Phase::Menu
                };
                let _ = self.table.session.transition(next);
                self.cue(Cue::Connection);
            }
            Err(e) => {
                self.reconnect_attempt += 1;
                let attempt = self.reconnect_attempt;
                warn!("[Controller] Connection attempt {} failed: {}", attempt, e);
                self.table.session.last_error = Some(SessionError::from(e).to_string());

                if self.config.max_reconnect_attempts.is_some_and(|max| attempt >= max) {
                    warn!("[Controller] Giving up after {} attempts", attempt);
                    self.table.session.connection = ConnectionStatus::Offline;
                    self.table.session.message = "Could not reach the game server.".to_string();
                    let _ = self.table.session.transition(Phase::Menu);
                    return;
                }

                self.table.session.connection = ConnectionStatus::Reconnecting { attempt };
                self.table.session.message = format!(
                    "Connection failed. Retrying in {}s...",
                    self.config.reconnect_backoff.as_secs_f32()
                );
                let handle = ctx.run_later(self.config.reconnect_backoff, |act, ctx| {
                    if act.reconnect.take().is_some() {
                        act.connect(ctx);
                    }
                });
                self.reconnect = Some(handle);
            }
        }
    }

    fn on_dropped(&mut self, reason: String, ctx: &mut Context<Self>) {
        warn!("[Controller] Channel dropped: {}", reason);
        self.table.abandon_round();
        self.cancel_scheduled(ctx);
        self.channel.unsubscribe_all();
        self.bridge = None;
        self.table.session.message = "Connection lost. Reconnecting...".to_string();
        self.table.session.last_error = Some(reason);
        self.cue(Cue::Disconnection);
        self.reconnect_attempt = 1;
        self.connect(ctx);
    }

    fn apply(&mut self, dispatch: Dispatch, ctx: &mut Context<Self>) {
        if !self.table.timer_running() {
            self.stop_tick_loop(ctx);
        }
        match dispatch.directive {
            Some(Directive::StartRound { after }) => self.schedule_round(after, ctx),
            Some(Directive::CancelScheduledRound) => self.cancel_pending_round(ctx),
            None => {}
        }
        if let Some(cue) = dispatch.cue {
            self.cue(cue);
        }
    }

    /// Open a round after `after`. Replaces any round start already scheduled.
    fn schedule_round(&mut self, after: std::time::Duration, ctx: &mut Context<Self>) {
        self.cancel_pending_round(ctx);
        self.next_pending_id += 1;
        let id = self.next_pending_id;
        let handle = ctx.run_later(after, move |act, ctx| match act.pending_round {
            Some((pending, _)) if pending == id => {
                act.pending_round = None;
                act.start_round(ctx);
            }
            _ => debug!("[Controller] Dropped stale round start {}", id),
        });
        self.pending_round = Some((id, handle));
    }

    fn start_round(&mut self, ctx: &mut Context<Self>) {
        if self.torn_down || self.table.session.phase != Phase::Playing {
            debug!("[Controller] Round start skipped while {}", self.table.session.phase);
            return;
        }
        if self.table.has_open_round() {
            debug!("[Controller] Round start skipped, round {:?} is unresolved", self.table.current_token());
            return;
        }
        self.stop_tick_loop(ctx);
        let token = self.table.open_round(Instant::now());
        self.last_countdown_cue = None;
        self.table.session.message = "Choose rock, paper or scissors!".to_string();
        info!("[Controller] Round {} open", token);

        let handle = ctx.run_interval(self.config.tick_interval, move |act, ctx| act.on_tick(token, ctx));
        self.tick_loop = Some((token, handle));
    }

    fn on_tick(&mut self, token: RoundToken, ctx: &mut Context<Self>) {
        if self.torn_down {
            return;
        }
        match self.table.poll_timer(token, Instant::now()) {
            None => {
                if matches!(self.tick_loop, Some((t, _)) if t == token) {
                    self.stop_tick_loop(ctx);
                }
            }
            Some(TimerSignal::Tick { remaining_secs }) => {
                if remaining_secs <= COUNTDOWN_CUE_FROM_SECS && self.last_countdown_cue != Some(remaining_secs) {
                    self.last_countdown_cue = Some(remaining_secs);
                    self.cue(Cue::Countdown);
                }
            }
            Some(TimerSignal::Expired) => {
                self.stop_tick_loop(ctx);
                let choice = Choice::random(&mut rand::rng());
                match self.table.submit_for(token, choice) {
                    SubmitOutcome::Accepted(choice) => {
                        info!("[Controller] Time up for round {}, auto-picked {}", token, choice);
                        self.table.session.message = format!("Time's up! {} was picked for you.", choice);
                        self.deliver_choice(choice, ctx);
                    }
                    other => debug!("[Controller] Expiry for round {} absorbed: {:?}", token, other),
                }
            }
        }
    }

    /// Send an accepted choice. A transport failure is handled as a dropped
    /// link: the round is abandoned and a reconnect starts.
    fn deliver_choice(&mut self, choice: Choice, ctx: &mut Context<Self>) -> bool {
        match self.send_choice(choice) {
            Ok(()) => true,
            Err(SessionError::Connection(e)) => {
                self.on_dropped(format!("choice not delivered: {}", e), ctx);
                false
            }
            Err(e) => {
                warn!("[Controller] Choice {} not delivered: {}", choice, e);
                false
            }
        }
    }

    fn send_choice(&mut self, choice: Choice) -> Result<(), SessionError> {
        let code = match self.table.session.room_code.clone() {
            Some(code) => code,
            None => {
                warn!("[Controller] No room code, {} not sent", choice);
                return Err(SessionError::InvalidAction { action: "send a choice", phase: self.table.session.phase });
            }
        };
        self.send(&ClientIntent::make_choice(&code, choice))
    }

    fn send(&mut self, intent: &ClientIntent) -> Result<(), SessionError> {
        self.channel.send(intent).map_err(|e| {
            warn!("[Controller] Failed to send {:?}: {}", intent, e);
            self.table.session.message = "Could not reach the game server.".to_string();
            self.table.session.last_error = Some(e.to_string());
            SessionError::from(e)
        })
    }

    fn require_connected(&self) -> Result<(), SessionError> {
        if self.bridge.is_none() || !self.table.session.connection.is_connected() {
            return Err(SessionError::NotConnected);
        }
        Ok(())
    }

    fn require_phase(&self, phase: Phase, action: &'static str) -> Result<(), SessionError> {
        let current = self.table.session.phase;
        if current != phase {
            return Err(SessionError::InvalidAction { action, phase: current });
        }
        Ok(())
    }

    fn cue(&mut self, cue: Cue) {
        if !self.sound_enabled {
            return;
        }
        if let Err(e) = self.feedback.play(cue) {
            warn!("[Controller] Cue {:?} failed: {}", cue, e);
        }
    }

    fn stop_tick_loop(&mut self, ctx: &mut Context<Self>) {
        if let Some((_, handle)) = self.tick_loop.take() {
            ctx.cancel_future(handle);
        }
    }

    fn cancel_pending_round(&mut self, ctx: &mut Context<Self>) {
        if let Some((id, handle)) = self.pending_round.take() {
            debug!("[Controller] Cancelled round start {}", id);
            ctx.cancel_future(handle);
        }
    }

    fn cancel_scheduled(&mut self, ctx: &mut Context<Self>) {
        self.stop_tick_loop(ctx);
        self.cancel_pending_round(ctx);
    }

    fn teardown(&mut self, ctx: &mut Context<Self>) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.table.close_round();
        self.cancel_scheduled(ctx);
        if let Some(handle) = self.reconnect.take() {
            ctx.cancel_future(handle);
        }
        self.channel.unsubscribe_all();
        self.channel.disconnect();
        self.bridge = None;
        self.table.session.connection = ConnectionStatus::Offline;
        info!("[Controller] Session torn down");
    }
}

impl Actor for SessionController {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.connect(ctx);
    }

    fn stopping(&mut self, ctx: &mut Self::Context) -> Running {
        self.teardown(ctx);
        Running::Stop
    }
}

impl Handler<ChannelEvent> for SessionController {
    type Result = ();

    fn handle(&mut self, msg: ChannelEvent, ctx: &mut Context<Self>) {
        if self.torn_down {
            return;
        }
        match msg {
            ChannelEvent::Server(event) => {
                let dispatch = match self.bridge.as_ref() {
                    Some(bridge) => bridge.handle(event, &mut self.table),
                    None => {
                        debug!("[Controller] {} arrived while unsubscribed, ignoring", event.name());
                        return;
                    }
                };
                self.apply(dispatch, ctx);
            }
            ChannelEvent::Dropped { reason } => self.on_dropped(reason, ctx),
        }
    }
}

impl Handler<CreateRoom> for SessionController {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: CreateRoom, _: &mut Context<Self>) -> Self::Result {
        let name = input::player_name(&msg.player_name)?;
        self.require_connected()?;
        self.require_phase(Phase::Menu, "create a room")?;
        self.cue(Cue::ButtonClick);
        self.send(&ClientIntent::create_room(&name))?;
        self.table.session.message = "Creating room...".to_string();
        Ok(())
    }
}

impl Handler<JoinRoom> for SessionController {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, msg: JoinRoom, _: &mut Context<Self>) -> Self::Result {
        let name = input::player_name(&msg.player_name)?;
        let code = input::room_code(&msg.room_code)?;
        self.require_connected()?;
        self.require_phase(Phase::Menu, "join a room")?;
        self.cue(Cue::ButtonClick);
        self.send(&ClientIntent::join_room(&code, &name))?;
        self.table.session.message = format!("Joining room {}...", code);
        self.table.session.room_code = Some(code);
        Ok(())
    }
}

impl Handler<MakeChoice> for SessionController {
    type Result = MessageResult<MakeChoice>;

    fn handle(&mut self, msg: MakeChoice, ctx: &mut Context<Self>) -> Self::Result {
        if self.torn_down || self.table.session.phase != Phase::Playing {
            return MessageResult(SubmitOutcome::Closed);
        }
        let outcome = self.table.submit(msg.choice);
        if let SubmitOutcome::Accepted(choice) = outcome {
            self.stop_tick_loop(ctx);
            self.cue(Cue::Choice);
            if let Err(e) = self.feedback.vibrate(&CHOICE_VIBRATION) {
                debug!("[Controller] Vibration failed: {}", e);
            }
            self.table.session.message = format!("You chose {}. Waiting for your opponent...", choice);
            if !self.deliver_choice(choice, ctx) {
                return MessageResult(SubmitOutcome::Closed);
            }
        }
        MessageResult(outcome)
    }
}

impl Handler<StartNewGame> for SessionController {
    type Result = Result<(), SessionError>;

    fn handle(&mut self, _: StartNewGame, ctx: &mut Context<Self>) -> Self::Result {
        self.require_phase(Phase::Finished, "start a new game")?;
        self.require_connected()?;
        let room_id = self
            .table
            .session
            .room
            .as_ref()
            .map(|r| r.id.clone())
            .or_else(|| self.table.session.room_code.clone())
            .ok_or(SessionError::InvalidAction { action: "start a new game", phase: Phase::Finished })?;
        self.cue(Cue::ButtonClick);
        self.send(&ClientIntent::start_new_game(&room_id))?;

        self.cancel_scheduled(ctx);
        self.table.abandon_round();
        self.table.session.reset_for_new_game();
        let _ = self.table.session.transition(Phase::Playing);
        self.table.session.message = "New game! Get ready...".to_string();
        self.schedule_round(self.config.new_game_round_delay, ctx);
        Ok(())
    }
}

impl Handler<ResetToMenu> for SessionController {
    type Result = ();

    fn handle(&mut self, _: ResetToMenu, ctx: &mut Context<Self>) {
        self.cancel_scheduled(ctx);
        self.table.reset();
        debug!("[Controller] Back to {}", self.table.session.phase);
    }
}

impl Handler<SetSoundEnabled> for SessionController {
    type Result = ();

    fn handle(&mut self, msg: SetSoundEnabled, _: &mut Context<Self>) {
        self.sound_enabled = msg.0;
    }
}

impl Handler<GetSnapshot> for SessionController {
    type Result = MessageResult<GetSnapshot>;

    fn handle(&mut self, _: GetSnapshot, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.table.view(self.sound_enabled))
    }
}

impl Handler<Shutdown> for SessionController {
    type Result = ();

    fn handle(&mut self, _: Shutdown, ctx: &mut Context<Self>) {
        self.teardown(ctx);
        ctx.stop();
    }
}
