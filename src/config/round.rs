/// Round timing constants.
///
/// This module defines the countdown length, the tick rate of the countdown
/// and the pauses inserted between rounds.
pub const ROUND_DURATION_SECS: u64 = 10; // Time a player has to pick a choice.

/// Interval between two countdown ticks (roughly ten per second).
pub const TICK_INTERVAL_MS: u64 = 100;

/// Delay between a server "round started" notice and the local countdown.
pub const ROUND_START_DELAY_MS: u64 = 100;

/// Delay before the first round once the opponent has joined.
pub const FIRST_ROUND_DELAY_MS: u64 = 2000;

/// Delay before the first round of a restarted game.
pub const NEW_GAME_ROUND_DELAY_MS: u64 = 1000;

/// Time the previous result stays on screen before the next round starts.
pub const RESULT_DISPLAY_DELAY_MS: u64 = 3000;

/// The countdown cue plays during the last seconds of a round.
pub const COUNTDOWN_CUE_FROM_SECS: u64 = 3;
