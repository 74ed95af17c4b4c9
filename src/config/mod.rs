/// Main configuration module.
///
/// Re-exports submodules for round timing, connection and input configuration,
/// and bundles them into [`ControllerConfig`] for runtime overrides.
pub mod round;
pub mod connection;
pub mod input;

use std::time::Duration;

/// Runtime settings for a session controller.
///
/// Defaults come from the constants in the submodules; tests and embedders
/// can shorten the durations without touching the constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub round_duration: Duration,
    pub tick_interval: Duration,
    pub round_start_delay: Duration,
    pub first_round_delay: Duration,
    pub new_game_round_delay: Duration,
    pub result_display_delay: Duration,
    pub reconnect_backoff: Duration,
    /// `None` keeps retrying until the user leaves.
    pub max_reconnect_attempts: Option<u32>,
    pub sound_enabled: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(round::ROUND_DURATION_SECS),
            tick_interval: Duration::from_millis(round::TICK_INTERVAL_MS),
            round_start_delay: Duration::from_millis(round::ROUND_START_DELAY_MS),
            first_round_delay: Duration::from_millis(round::FIRST_ROUND_DELAY_MS),
            new_game_round_delay: Duration::from_millis(round::NEW_GAME_ROUND_DELAY_MS),
            result_display_delay: Duration::from_millis(round::RESULT_DISPLAY_DELAY_MS),
            reconnect_backoff: Duration::from_secs(connection::RECONNECT_BACKOFF_SECS),
            max_reconnect_attempts: connection::MAX_RECONNECT_ATTEMPTS,
            sound_enabled: true,
        }
    }
}
