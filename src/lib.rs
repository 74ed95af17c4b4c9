//! Client-side round controller for a two-player rock/paper/scissors duel.
//!
//! The [`client::SessionController`] actor owns the realtime channel, runs the
//! per-round countdown, guards the one-choice-per-round rule and mirrors the
//! authoritative server state for a presentation layer to read.

pub mod config;
pub mod error;
pub mod game;
pub mod client;

#[cfg(test)]
mod tests;
