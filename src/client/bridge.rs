//! Maps each inbound server event onto the session.
//!
//! One event, one state update. Anything that has to happen later (starting
//! the next round) is handed back to the controller as a [`Directive`] so the
//! bridge itself never schedules.

use std::time::Duration;
use log::{debug, info, warn};

use crate::client::feedback::Cue;
use crate::client::messages::ServerEvent;
use crate::client::table::Table;
use crate::config::ControllerConfig;
use crate::game::state::{Phase, RoundOutcome};
use crate::game::types::{Player, PlayerId, Room, RoundReport, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Open a round after the delay, replacing any scheduled start.
    StartRound { after: Duration },
    CancelScheduledRound,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub directive: Option<Directive>,
    pub cue: Option<Cue>,
}

impl Dispatch {
    fn none() -> Self {
        Self::default()
    }

    fn with_cue(cue: Cue) -> Self {
        Self { directive: None, cue: Some(cue) }
    }

    fn start_round(after: Duration) -> Self {
        Self { directive: Some(Directive::StartRound { after }), cue: None }
    }

    fn cue(mut self, cue: Cue) -> Self {
        self.cue = Some(cue);
        self
    }
}

pub struct EventBridge {
    local_id: PlayerId,
    first_round_delay: Duration,
    round_start_delay: Duration,
    result_display_delay: Duration,
}

impl EventBridge {
    pub fn new(local_id: PlayerId, config: &ControllerConfig) -> Self {
        Self {
            local_id,
            first_round_delay: config.first_round_delay,
            round_start_delay: config.round_start_delay,
            result_display_delay: config.result_display_delay,
        }
    }

    pub fn handle(&self, event: ServerEvent, table: &mut Table) -> Dispatch {
        debug!("[Bridge] {}", event.name());
        match event {
            ServerEvent::RoomCreated { room_code, player } => self.on_room_created(room_code, player, table),
            ServerEvent::RoomUpdated(room) => {
                if table.session.room_code.is_none() {
                    table.session.room_code = Some(room.id.clone());
                }
                table.session.room = Some(room);
                Dispatch::none()
            }
            ServerEvent::PlayerJoined { room, new_player } => self.on_player_joined(room, new_player, table),
            ServerEvent::RoundStarted {} => self.on_round_started(table),
            ServerEvent::PlayerMadeChoice { player_name } => {
                self.on_player_made_choice(&player_name, table);
                Dispatch::none()
            }
            ServerEvent::RoundResult(report) => self.on_round_result(report, table),
            ServerEvent::GameFinished { winner } => self.on_game_finished(winner, table),
            ServerEvent::PlayerDisconnected { player_name } => {
                table.abandon_round();
                let _ = table.session.transition(Phase::Waiting);
                table.session.opponent = None;
                table.session.message = format!("{} left the room. Waiting for a new opponent...", player_name);
                info!("[Bridge] Opponent {} disconnected", player_name);
                Dispatch {
                    directive: Some(Directive::CancelScheduledRound),
                    cue: Some(Cue::Disconnection),
                }
            }
            ServerEvent::Error { message } => {
                warn!("[Bridge] Server error: {}", message);
                // A refused join leaves no room behind.
                if table.session.phase == Phase::Menu {
                    table.session.room_code = None;
                }
                table.session.message = format!("Error: {}", message);
                table.session.last_error = Some(message);
                Dispatch::none()
            }
        }
    }

    fn on_room_created(&self, room_code: String, player: Player, table: &mut Table) -> Dispatch {
        let session = &mut table.session;
        session.message = format!("Room {} created. Share the code with your opponent.", room_code);
        session.room_code = Some(room_code);
        session.me = Some(player);
        session.last_error = None;
        let _ = session.transition(Phase::Waiting);
        Dispatch::with_cue(Cue::Connection)
    }

    fn on_player_joined(&self, room: Room, new_player: Player, table: &mut Table) -> Dispatch {
        self.mirror_players(&room.players, table);
        let session = &mut table.session;
        if session.room_code.is_none() {
            session.room_code = Some(room.id.clone());
        }
        session.room = Some(room);
        session.message = if new_player.id == self.local_id {
            "Joined the room. Get ready!".to_string()
        } else {
            format!("{} joined. Get ready!", new_player.name)
        };
        session.last_error = None;
        match session.transition(Phase::Playing) {
            // Replayed notice: the game is already under way.
            Ok(Phase::Playing) | Err(_) => Dispatch::none(),
            Ok(_) => Dispatch::start_round(self.first_round_delay).cue(Cue::GameStart),
        }
    }

    fn on_round_started(&self, table: &mut Table) -> Dispatch {
        if table.session.phase != Phase::Playing {
            debug!("[Bridge] round-started ignored while {}", table.session.phase);
            return Dispatch::none();
        }
        if table.has_open_round() {
            debug!("[Bridge] round-started ignored, a round is already open");
            return Dispatch::none();
        }
        table.session.round = None;
        table.session.message = "New round! Make your choice.".to_string();
        Dispatch::start_round(self.round_start_delay)
    }

    fn on_player_made_choice(&self, player_name: &str, table: &mut Table) {
        let session = &mut table.session;
        let names_opponent = match (&session.opponent, &session.me) {
            (Some(opponent), _) => opponent.name == player_name,
            (None, Some(me)) => me.name != player_name,
            (None, None) => true,
        };
        if !names_opponent {
            return;
        }
        match session.round.as_mut() {
            Some(round) if round.outcome.is_none() => {
                round.opponent_ready = true;
                session.message = format!("{} has made a choice.", player_name);
            }
            // Between round-started and the local countdown: carried into the next round.
            None if session.phase == Phase::Playing => {
                session.opponent_ready_pending = true;
                session.message = format!("{} has made a choice.", player_name);
            }
            _ => debug!("[Bridge] Choice notice from {} with no open round", player_name),
        }
    }

    fn on_round_result(&self, report: RoundReport, table: &mut Table) -> Dispatch {
        if table.session.has_recorded(report.round) {
            debug!("[Bridge] Result for round {} already applied, ignoring", report.round);
            return Dispatch::none();
        }
        table.close_round();
        self.mirror_players(&report.players, table);

        let outcome = RoundOutcome {
            round: report.round,
            my_choice: report.choice_of(&self.local_id).or_else(|| table.my_choice()),
            opponent_choice: report.opponent_choice(&self.local_id),
            winner: report.result,
            verdict: report.verdict_for(&self.local_id),
        };

        let session = &mut table.session;
        let mut more_rounds = false;
        if let Some(room) = session.room.as_mut() {
            room.current_round = report.round;
            room.players = report.players.clone();
            more_rounds = report.round < room.max_rounds;
        }
        match session.round.as_mut() {
            Some(round) => round.outcome = Some(outcome.clone()),
            None => debug!("[Bridge] Result for round {} arrived without a local round", report.round),
        }
        session.record_round(&outcome);
        session.message = match outcome.verdict {
            Some(Verdict::Won) => format!("You won round {}!", report.round),
            Some(Verdict::Lost) => format!("You lost round {}.", report.round),
            Some(Verdict::Tie) => format!("Round {} is a tie.", report.round),
            None => format!("Round {} is over.", report.round),
        };
        info!("[Bridge] Round {} resolved: {:?}", report.round, report.result);

        let mut dispatch = if more_rounds {
            Dispatch::start_round(self.result_display_delay)
        } else {
            Dispatch { directive: Some(Directive::CancelScheduledRound), cue: None }
        };
        dispatch.cue = outcome.verdict.map(verdict_cue);
        dispatch
    }

    fn on_game_finished(&self, winner: Option<Player>, table: &mut Table) -> Dispatch {
        table.close_round();
        let session = &mut table.session;
        if session.transition(Phase::Finished).is_err() {
            return Dispatch { directive: Some(Directive::CancelScheduledRound), cue: None };
        }
        let cue = match &winner {
            Some(w) if w.id == self.local_id => {
                session.message = "You won the game!".to_string();
                Cue::Win
            }
            Some(w) => {
                session.message = format!("{} won the game.", w.name);
                Cue::Lose
            }
            None => {
                session.message = "The game ended in a tie.".to_string();
                Cue::Tie
            }
        };
        info!("[Bridge] Game finished, winner={:?}", winner.as_ref().map(|w| &w.name));
        Dispatch {
            directive: Some(Directive::CancelScheduledRound),
            cue: Some(cue),
        }
    }

    /// Refresh the local player and the opponent from a server player list.
    fn mirror_players(&self, players: &[Player], table: &mut Table) {
        let session = &mut table.session;
        if let Some(me) = players.iter().find(|p| p.id == self.local_id) {
            session.me = Some(me.clone());
        }
        if let Some(opponent) = players.iter().find(|p| p.id != self.local_id) {
            session.opponent = Some(opponent.clone());
        }
    }
}

fn verdict_cue(verdict: Verdict) -> Cue {
    match verdict {
        Verdict::Won => Cue::Win,
        Verdict::Lost => Cue::Lose,
        Verdict::Tie => Cue::Tie,
    }
}
