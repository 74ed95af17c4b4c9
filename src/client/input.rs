//! Form validation for the lobby actions.
//!
//! Runs before any intent is emitted; a rejected value never reaches the channel.

use crate::config::input::{MAX_PLAYER_NAME_LEN, MAX_ROOM_CODE_LEN};
use crate::error::InputError;

/// Trimmed, non-empty player name of bounded length.
pub fn player_name(raw: &str) -> Result<String, InputError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(InputError::EmptyPlayerName);
    }
    if name.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(InputError::PlayerNameTooLong);
    }
    Ok(name.to_string())
}

/// Trimmed, upper-cased alphanumeric room code of bounded length.
pub fn room_code(raw: &str) -> Result<String, InputError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(InputError::EmptyRoomCode);
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(InputError::RoomCodeNotAlphanumeric);
    }
    if code.len() > MAX_ROOM_CODE_LEN {
        return Err(InputError::RoomCodeTooLong);
    }
    Ok(code)
}
