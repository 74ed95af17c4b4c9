use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Serialize, Deserialize};

/// Channel-assigned connection id of a player.
pub type PlayerId = String;

/// Local identifier of one countdown, minted in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundToken(pub u64);

impl fmt::Display for RoundToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// Uniform pick over the whole choice set, used when the clock runs out.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Choice {
        *Self::ALL.choose(rng).unwrap_or(&Choice::Rock)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Choice::Rock),
            "paper" => Ok(Choice::Paper),
            "scissors" => Ok(Choice::Scissors),
            other => Err(format!("unknown choice '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub score: u32,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0,
        }
    }
}

/// Server-owned room, mirrored as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub players: Vec<Player>,
    #[serde(default)]
    pub current_round: u32,
    pub max_rounds: u32,
}

/// Winner designation as sent by the server: by seat, not by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundWinner {
    Player1,
    Player2,
    Tie,
}

/// Round result seen from the local player's seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    Lost,
    Tie,
}

/// Payload of a `round-result` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    pub round: u32,
    pub player_choices: HashMap<PlayerId, Choice>,
    pub result: RoundWinner,
    pub players: Vec<Player>,
}

impl RoundReport {
    /// The winning player, `None` on a tie or when the seat is missing.
    pub fn winner(&self) -> Option<&Player> {
        match self.result {
            RoundWinner::Player1 => self.players.first(),
            RoundWinner::Player2 => self.players.get(1),
            RoundWinner::Tie => None,
        }
    }

    /// Outcome for `local`; `None` when the winning seat is not in `players`.
    pub fn verdict_for(&self, local: &PlayerId) -> Option<Verdict> {
        if self.result == RoundWinner::Tie {
            return Some(Verdict::Tie);
        }
        self.winner().map(|w| if &w.id == local { Verdict::Won } else { Verdict::Lost })
    }

    pub fn choice_of(&self, id: &PlayerId) -> Option<Choice> {
        self.player_choices.get(id).copied()
    }

    pub fn opponent_choice(&self, local: &PlayerId) -> Option<Choice> {
        self.player_choices
            .iter()
            .find(|(id, _)| *id != local)
            .map(|(_, c)| *c)
    }
}
