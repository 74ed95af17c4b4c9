//! Countdown for a single round.
//!
//! The timer owns no scheduling of its own: the controller polls it from an
//! interval and acts on the returned [`TimerSignal`]. Every `start` mints a
//! new [`RoundToken`], and polls carrying any other token are answered with
//! `None`, so a tick that was already queued for an earlier round is dropped.

use std::time::{Duration, Instant};
use log::{debug, trace};

use crate::game::types::RoundToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    /// Whole seconds left, rounded up. Never zero.
    Tick { remaining_secs: u64 },
    /// Time is up. Emitted once per token.
    Expired,
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    token: RoundToken,
    started_at: Instant,
    active: bool,
}

#[derive(Debug)]
pub struct RoundTimer {
    duration: Duration,
    last_token: u64,
    current: Option<Countdown>,
}

impl RoundTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last_token: 0,
            current: None,
        }
    }

    /// Start a fresh countdown. Any previous token becomes stale.
    pub fn start(&mut self, now: Instant) -> RoundToken {
        self.last_token += 1;
        let token = RoundToken(self.last_token);
        if let Some(previous) = self.current.filter(|c| c.active) {
            debug!("[Timer] Countdown {} replaced by {}", previous.token, token);
        }
        self.current = Some(Countdown {
            token,
            started_at: now,
            active: true,
        });
        debug!("[Timer] Countdown {} started ({:?})", token, self.duration);
        token
    }

    /// Deactivate the running countdown. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(countdown) = self.current.as_mut() {
            if countdown.active {
                countdown.active = false;
                debug!("[Timer] Countdown {} stopped", countdown.token);
            }
        }
    }

    /// Stop only if `token` is the running countdown.
    pub fn cancel(&mut self, token: RoundToken) -> bool {
        match self.current.as_mut() {
            Some(countdown) if countdown.token == token && countdown.active => {
                countdown.active = false;
                debug!("[Timer] Countdown {} cancelled", token);
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.map(|c| c.active).unwrap_or(false)
    }

    /// Token of the running countdown, if any.
    pub fn running_token(&self) -> Option<RoundToken> {
        self.current.filter(|c| c.active).map(|c| c.token)
    }

    /// Seconds left on the running countdown, rounded up; 0 when idle.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        match self.current {
            Some(c) if c.active => self.remaining_from(c.started_at, now),
            _ => 0,
        }
    }

    /// Evaluate the countdown for `token` at `now`.
    ///
    /// Returns `None` for a stale or stopped token. Reaching zero deactivates
    /// the countdown, so `Expired` is returned at most once per token.
    pub fn poll(&mut self, token: RoundToken, now: Instant) -> Option<TimerSignal> {
        let duration = self.duration;
        let countdown = match self.current.as_mut() {
            Some(c) if c.token == token && c.active => c,
            _ => {
                trace!("[Timer] Dropped tick for stale countdown {}", token);
                return None;
            }
        };
        let remaining = duration.saturating_sub(now.saturating_duration_since(countdown.started_at));
        let remaining_secs = ceil_secs(remaining);
        if remaining_secs == 0 {
            countdown.active = false;
            debug!("[Timer] Countdown {} expired", token);
            return Some(TimerSignal::Expired);
        }
        Some(TimerSignal::Tick { remaining_secs })
    }

    fn remaining_from(&self, started_at: Instant, now: Instant) -> u64 {
        ceil_secs(self.duration.saturating_sub(now.saturating_duration_since(started_at)))
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_millis().div_ceil(1000) as u64
}
