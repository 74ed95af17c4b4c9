//! At-most-one choice per round.
//!
//! Keyed by round token: a submission is accepted only for the round that is
//! currently open and only once, whichever path it comes from (a click, the
//! expiry auto-pick, or a replayed event).

use log::debug;

use crate::client::timer::RoundTimer;
use crate::game::types::{Choice, RoundToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// First submission for the round; the caller must send it.
    Accepted(Choice),
    /// A choice was already accepted for this round.
    AlreadySubmitted,
    /// The round is not taking input (not started, resolved, or stale).
    Closed,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

#[derive(Debug, Default)]
pub struct SubmissionGuard {
    open: Option<RoundToken>,
    submitted: Option<(RoundToken, Choice)>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start taking input for `token`. Forgets the previous round's submission.
    pub fn open(&mut self, token: RoundToken) {
        self.open = Some(token);
        self.submitted = None;
    }

    /// Stop taking input. The accepted choice, if any, stays readable.
    pub fn close(&mut self) {
        if let Some(token) = self.open.take() {
            debug!("[Guard] Input closed for round {}", token);
        }
    }

    pub fn is_open(&self, token: RoundToken) -> bool {
        self.open == Some(token)
    }

    /// The accepted choice for `token`, if any.
    pub fn submitted(&self, token: RoundToken) -> Option<Choice> {
        self.submitted
            .filter(|(t, _)| *t == token)
            .map(|(_, choice)| choice)
    }

    /// Try to lock in `choice` for `token`.
    ///
    /// On acceptance the round is closed for input and the countdown for
    /// `token` is cancelled.
    pub fn try_submit(
        &mut self,
        token: RoundToken,
        choice: Choice,
        timer: &mut RoundTimer,
    ) -> SubmitOutcome {
        if self.submitted(token).is_some() {
            debug!("[Guard] Round {} already has a choice, ignoring {}", token, choice);
            return SubmitOutcome::AlreadySubmitted;
        }
        if !self.is_open(token) {
            debug!("[Guard] Round {} is not open, ignoring {}", token, choice);
            return SubmitOutcome::Closed;
        }
        self.open = None;
        self.submitted = Some((token, choice));
        timer.cancel(token);
        debug!("[Guard] Round {} locked with {}", token, choice);
        SubmitOutcome::Accepted(choice)
    }
}
