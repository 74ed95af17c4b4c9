//! Sound and vibration capability.
//!
//! Best effort only: the controller logs a failed cue and carries on, and no
//! state transition ever waits on one.

use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    ButtonClick,
    Connection,
    Disconnection,
    GameStart,
    Choice,
    Countdown,
    Win,
    Lose,
    Tie,
}

/// Vibration pattern for a manual choice (on, off, on, in milliseconds).
pub const CHOICE_VIBRATION: [u64; 3] = [50, 30, 50];

pub trait Feedback {
    fn play(&mut self, cue: Cue) -> Result<(), String>;

    /// Devices without a vibrator keep the default.
    fn vibrate(&mut self, _pattern: &[u64]) -> Result<(), String> {
        Ok(())
    }
}

/// Feedback that does nothing.
#[derive(Debug, Default)]
pub struct Silent;

impl Feedback for Silent {
    fn play(&mut self, _cue: Cue) -> Result<(), String> {
        Ok(())
    }
}

/// Feedback that writes each cue to the log, for terminal sessions.
#[derive(Debug, Default)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn play(&mut self, cue: Cue) -> Result<(), String> {
        info!("[Feedback] {:?}", cue);
        Ok(())
    }

    fn vibrate(&mut self, pattern: &[u64]) -> Result<(), String> {
        debug!("[Feedback] vibrate {:?}", pattern);
        Ok(())
    }
}
