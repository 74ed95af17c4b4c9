//! Error taxonomy of the round controller.
//!
//! Every error carries a stable upper-snake code (e.g. "INVALID_INPUT") so a
//! presentation layer can map it to its own wording. Duplicate or late
//! submissions and stale ticks are not errors: they are absorbed where they
//! happen and only logged.

use std::fmt;

use crate::client::channel::ChannelError;
use crate::config::input::{MAX_PLAYER_NAME_LEN, MAX_ROOM_CODE_LEN};
use crate::game::state::Phase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The channel could not be opened or dropped. Recovered by retrying.
    Connection(ChannelError),
    /// The server reported an error.
    Protocol(String),
    /// Rejected at the form boundary; nothing was sent.
    InvalidInput(InputError),
    /// The action needs a live channel.
    NotConnected,
    /// The action is not available in the current phase.
    InvalidAction { action: &'static str, phase: Phase },
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Connection(_) => "CONNECTION_FAILURE",
            SessionError::Protocol(_) => "PROTOCOL_ERROR",
            SessionError::InvalidInput(_) => "INVALID_INPUT",
            SessionError::NotConnected => "NOT_CONNECTED",
            SessionError::InvalidAction { .. } => "INVALID_ACTION",
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Connection(e) => write!(f, "connection failure: {}", e),
            SessionError::Protocol(msg) => write!(f, "server error: {}", msg),
            SessionError::InvalidInput(e) => write!(f, "invalid input: {}", e),
            SessionError::NotConnected => f.write_str("not connected to the game server"),
            SessionError::InvalidAction { action, phase } => {
                write!(f, "cannot {} while {}", action, phase)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Connection(e) => Some(e),
            SessionError::InvalidInput(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InputError> for SessionError {
    fn from(e: InputError) -> Self {
        SessionError::InvalidInput(e)
    }
}

impl From<ChannelError> for SessionError {
    fn from(e: ChannelError) -> Self {
        SessionError::Connection(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    EmptyPlayerName,
    PlayerNameTooLong,
    EmptyRoomCode,
    RoomCodeTooLong,
    RoomCodeNotAlphanumeric,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::EmptyPlayerName => f.write_str("player name is empty"),
            InputError::PlayerNameTooLong => {
                write!(f, "player name is longer than {} characters", MAX_PLAYER_NAME_LEN)
            }
            InputError::EmptyRoomCode => f.write_str("room code is empty"),
            InputError::RoomCodeTooLong => {
                write!(f, "room code is longer than {} characters", MAX_ROOM_CODE_LEN)
            }
            InputError::RoomCodeNotAlphanumeric => f.write_str("room code must be letters and digits"),
        }
    }
}

impl std::error::Error for InputError {}
