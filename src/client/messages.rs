use actix::prelude::*;
use serde::{Serialize, Deserialize};

use crate::client::guard::SubmitOutcome;
use crate::client::table::SessionView;
use crate::error::SessionError;
use crate::game::types::{Choice, Player, Room, RoundReport};

// Server -> client events
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoomCreated {
        room_code: String,
        player: Player,
    },
    RoomUpdated(Room),
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        room: Room,
        new_player: Player,
    },
    RoundStarted {},
    #[serde(rename_all = "camelCase")]
    PlayerMadeChoice {
        player_name: String,
    },
    RoundResult(RoundReport),
    GameFinished {
        #[serde(default)]
        winner: Option<Player>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerDisconnected {
        player_name: String,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::RoomCreated { .. } => "room-created",
            ServerEvent::RoomUpdated(_) => "room-updated",
            ServerEvent::PlayerJoined { .. } => "player-joined",
            ServerEvent::RoundStarted {} => "round-started",
            ServerEvent::PlayerMadeChoice { .. } => "player-made-choice",
            ServerEvent::RoundResult(_) => "round-result",
            ServerEvent::GameFinished { .. } => "game-finished",
            ServerEvent::PlayerDisconnected { .. } => "player-disconnected",
            ServerEvent::Error { .. } => "error",
        }
    }
}

// Client -> server intents
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientIntent {
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        player_name: String,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_code: String,
        player_name: String,
    },
    #[serde(rename_all = "camelCase")]
    MakeChoice {
        room_code: String,
        choice: Choice,
    },
    #[serde(rename_all = "camelCase")]
    StartNewGame {
        room_id: String,
    },
}

impl ClientIntent {
    pub fn create_room(player_name: &str) -> Self {
        Self::CreateRoom { player_name: player_name.to_string() }
    }
    pub fn join_room(room_code: &str, player_name: &str) -> Self {
        Self::JoinRoom {
            room_code: room_code.to_string(),
            player_name: player_name.to_string(),
        }
    }
    pub fn make_choice(room_code: &str, choice: Choice) -> Self {
        Self::MakeChoice { room_code: room_code.to_string(), choice }
    }
    pub fn start_new_game(room_id: &str) -> Self {
        Self::StartNewGame { room_id: room_id.to_string() }
    }
}

/// Decode one inbound JSON frame.
pub fn decode_event(text: &str) -> Result<ServerEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Encode one outbound intent as a JSON frame.
pub fn encode_intent(intent: &ClientIntent) -> Result<String, serde_json::Error> {
    serde_json::to_string(intent)
}

/// Message: create a room under `player_name`.
#[derive(Message)]
#[rtype(result = "Result<(), SessionError>")]
pub struct CreateRoom {
    pub player_name: String,
}

/// Message: join the room `room_code` under `player_name`.
#[derive(Message)]
#[rtype(result = "Result<(), SessionError>")]
pub struct JoinRoom {
    pub room_code: String,
    pub player_name: String,
}

/// Message: the player picked a choice for the open round.
#[derive(Message)]
#[rtype(result = "SubmitOutcome")]
pub struct MakeChoice {
    pub choice: Choice,
}

/// Message: replay with the same opponent after the game finished.
#[derive(Message)]
#[rtype(result = "Result<(), SessionError>")]
pub struct StartNewGame;

/// Message: drop the room and every session counter, back to the menu.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ResetToMenu;

#[derive(Message)]
#[rtype(result = "()")]
pub struct SetSoundEnabled(pub bool);

/// Message: read the current session view.
#[derive(Message)]
#[rtype(result = "SessionView")]
pub struct GetSnapshot;

/// Message: the user left; tear the session down and stop the controller.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;
