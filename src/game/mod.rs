//! Game data module.
//!
//! Wire-facing types (choices, players, rooms, round reports) and the session
//! state machine mirrored from the server.

pub mod types;
pub mod state;
