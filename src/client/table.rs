//! Everything the controller mutates for one session, in one place.

use std::time::{Duration, Instant};

use crate::client::guard::{SubmissionGuard, SubmitOutcome};
use crate::client::timer::{RoundTimer, TimerSignal};
use crate::game::state::{ConnectionStatus, HistoryEntry, Phase, RoundOutcome, Session, Tally};
use crate::game::types::{Choice, Player, Room, RoundToken};

pub struct Table {
    pub session: Session,
    timer: RoundTimer,
    guard: SubmissionGuard,
}

impl Table {
    pub fn new(round_duration: Duration) -> Self {
        Self {
            session: Session::new(),
            timer: RoundTimer::new(round_duration),
            guard: SubmissionGuard::new(),
        }
    }

    /// Start a countdown and open input for it.
    pub fn open_round(&mut self, now: Instant) -> RoundToken {
        let token = self.timer.start(now);
        self.guard.open(token);
        let time_left = self.timer.remaining_secs(now);
        self.session.begin_round(token, now, time_left);
        token
    }

    /// Stop the countdown and refuse further input. The round view stays.
    pub fn close_round(&mut self) {
        self.timer.stop();
        self.guard.close();
        self.session.time_left = 0;
    }

    /// Close the round and drop its view.
    pub fn abandon_round(&mut self) {
        self.close_round();
        self.session.round = None;
        self.session.opponent_ready_pending = false;
    }

    /// A round is open while it has no result, whether or not input was given.
    pub fn has_open_round(&self) -> bool {
        self.session
            .round
            .as_ref()
            .is_some_and(|r| r.outcome.is_none())
    }

    pub fn current_token(&self) -> Option<RoundToken> {
        self.session.round.as_ref().map(|r| r.token)
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Submit for the round on the table.
    pub fn submit(&mut self, choice: Choice) -> SubmitOutcome {
        match self.current_token() {
            Some(token) => self.guard.try_submit(token, choice, &mut self.timer),
            None => SubmitOutcome::Closed,
        }
    }

    /// Submit for a specific round; used by the expiry path.
    pub fn submit_for(&mut self, token: RoundToken, choice: Choice) -> SubmitOutcome {
        self.guard.try_submit(token, choice, &mut self.timer)
    }

    /// The locally accepted choice for the round on the table.
    pub fn my_choice(&self) -> Option<Choice> {
        self.current_token().and_then(|t| self.guard.submitted(t))
    }

    /// Poll the countdown and mirror the remaining seconds into the session.
    pub fn poll_timer(&mut self, token: RoundToken, now: Instant) -> Option<TimerSignal> {
        let signal = self.timer.poll(token, now)?;
        self.session.time_left = match signal {
            TimerSignal::Tick { remaining_secs } => remaining_secs,
            TimerSignal::Expired => 0,
        };
        Some(signal)
    }

    /// Back to an empty session, keeping the connection status.
    pub fn reset(&mut self) {
        self.close_round();
        self.guard = SubmissionGuard::new();
        self.session.reset();
    }

    pub fn view(&self, sound_enabled: bool) -> SessionView {
        let round = self.session.round.as_ref().map(|r| RoundView {
            number: match &r.outcome {
                Some(outcome) => outcome.round,
                None => self.session.last_recorded_round() + 1,
            },
            my_choice: self.guard.submitted(r.token),
            accepting_input: self.guard.is_open(r.token),
            opponent_ready: r.opponent_ready,
            outcome: r.outcome.clone(),
        });
        SessionView {
            phase: self.session.phase,
            connection: self.session.connection,
            room_code: self.session.room_code.clone(),
            room: self.session.room.clone(),
            me: self.session.me.clone(),
            opponent: self.session.opponent.clone(),
            round_number: self.session.round_number(),
            round,
            time_left: self.session.time_left,
            history: self.session.history().to_vec(),
            tally: self.session.tally,
            message: self.session.message.clone(),
            last_error: self.session.last_error.clone(),
            sound_enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundView {
    pub number: u32,
    pub my_choice: Option<Choice>,
    pub accepting_input: bool,
    pub opponent_ready: bool,
    pub outcome: Option<RoundOutcome>,
}

/// Read-only copy of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: Phase,
    pub connection: ConnectionStatus,
    pub room_code: Option<String>,
    pub room: Option<Room>,
    pub me: Option<Player>,
    pub opponent: Option<Player>,
    pub round_number: u32,
    pub round: Option<RoundView>,
    pub time_left: u64,
    pub history: Vec<HistoryEntry>,
    pub tally: Tally,
    pub message: String,
    pub last_error: Option<String>,
    pub sound_enabled: bool,
}
