use std::fmt;
use std::time::{Instant, SystemTime};
use log::{debug, warn};

use crate::game::types::{Choice, Player, Room, RoundToken, RoundWinner, Verdict};

/// Player-visible phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Menu,
    Connecting,
    Waiting,
    Playing,
    Finished,
}

impl Phase {
    /// Legal transitions. Staying in the same phase is always allowed.
    pub fn can_become(self, next: Phase) -> bool {
        use Phase::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Menu, Connecting | Waiting | Playing)
                | (Connecting, Menu | Waiting | Playing)
                | (Waiting, Playing | Menu | Connecting)
                | (Playing, Waiting | Finished | Menu | Connecting)
                | (Finished, Playing | Menu | Waiting | Connecting)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Menu => "menu",
            Phase::Connecting => "connecting",
            Phase::Waiting => "waiting",
            Phase::Playing => "playing",
            Phase::Finished => "finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the channel, kept apart from the phase so that a retry is
/// distinguishable from a first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Offline,
    Connecting,
    Reconnecting { attempt: u32 },
    Connected,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: Phase,
    pub to: Phase,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal phase transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Authoritative result of one round, as revealed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub round: u32,
    pub my_choice: Option<Choice>,
    pub opponent_choice: Option<Choice>,
    pub winner: RoundWinner,
    pub verdict: Option<Verdict>,
}

/// The round on the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub token: RoundToken,
    pub started_at: Instant,
    /// The opponent has chosen; the value stays hidden until the result.
    pub opponent_ready: bool,
    pub outcome: Option<RoundOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub round: u32,
    pub my_choice: Option<Choice>,
    pub opponent_choice: Option<Choice>,
    pub winner: RoundWinner,
    pub verdict: Option<Verdict>,
    pub recorded_at: SystemTime,
}

impl From<&RoundOutcome> for HistoryEntry {
    fn from(outcome: &RoundOutcome) -> Self {
        Self {
            round: outcome.round,
            my_choice: outcome.my_choice,
            opponent_choice: outcome.opponent_choice,
            winner: outcome.winner,
            verdict: outcome.verdict,
            recorded_at: SystemTime::now(),
        }
    }
}

/// Local win/loss/tie counters. The only score this client derives itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Tally {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Won => self.wins += 1,
            Verdict::Lost => self.losses += 1,
            Verdict::Tie => self.ties += 1,
        }
    }
}

/// Aggregate root of one client session.
#[derive(Debug, Clone)]
pub struct Session {
    pub phase: Phase,
    pub connection: ConnectionStatus,
    pub room_code: Option<String>,
    pub room: Option<Room>,
    pub me: Option<Player>,
    pub opponent: Option<Player>,
    pub round: Option<Round>,
    /// The opponent chose before the local countdown opened.
    pub opponent_ready_pending: bool,
    history: Vec<HistoryEntry>,
    pub tally: Tally,
    pub time_left: u64,
    pub message: String,
    pub last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Menu,
            connection: ConnectionStatus::Offline,
            room_code: None,
            room: None,
            me: None,
            opponent: None,
            round: None,
            opponent_ready_pending: false,
            history: Vec::new(),
            tally: Tally::default(),
            time_left: 0,
            message: String::new(),
            last_error: None,
        }
    }

    /// Move to `next`, returning the previous phase.
    pub fn transition(&mut self, next: Phase) -> Result<Phase, IllegalTransition> {
        let from = self.phase;
        if !from.can_become(next) {
            warn!("[Session] Refused phase change {} -> {}", from, next);
            return Err(IllegalTransition { from, to: next });
        }
        if from != next {
            debug!("[Session] Phase {} -> {}", from, next);
        }
        self.phase = next;
        Ok(from)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Round number of the last recorded result, 0 before the first one.
    pub fn last_recorded_round(&self) -> u32 {
        self.history.last().map(|h| h.round).unwrap_or(0)
    }

    /// True when a result for `round` (or a later one) is already recorded.
    pub fn has_recorded(&self, round: u32) -> bool {
        round <= self.last_recorded_round()
    }

    /// Append a resolved round. Duplicates and stale rounds are refused.
    pub fn record_round(&mut self, outcome: &RoundOutcome) -> bool {
        if self.has_recorded(outcome.round) {
            debug!("[Session] Round {} already recorded, ignoring", outcome.round);
            return false;
        }
        self.history.push(HistoryEntry::from(outcome));
        if let Some(verdict) = outcome.verdict {
            self.tally.record(verdict);
        }
        true
    }

    pub fn begin_round(&mut self, token: RoundToken, started_at: Instant, time_left: u64) {
        self.round = Some(Round {
            token,
            started_at,
            opponent_ready: std::mem::take(&mut self.opponent_ready_pending),
            outcome: None,
        });
        self.time_left = time_left;
    }

    /// Round number shown to the player: the one being played or the last one played.
    pub fn round_number(&self) -> u32 {
        self.room
            .as_ref()
            .map(|r| r.current_round)
            .unwrap_or(0)
            .max(self.last_recorded_round())
    }

    /// Clear round number, round view and history for a restarted game.
    /// The tally and the mirrored players stay.
    pub fn reset_for_new_game(&mut self) {
        self.round = None;
        self.opponent_ready_pending = false;
        self.history.clear();
        self.time_left = 0;
        if let Some(room) = self.room.as_mut() {
            room.current_round = 0;
        }
    }

    /// Discard everything tied to the room and return to the menu.
    /// Only the connection status survives.
    pub fn reset(&mut self) {
        let connection = self.connection;
        *self = Session::new();
        self.connection = connection;
        if !connection.is_connected() {
            self.phase = Phase::Connecting;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
