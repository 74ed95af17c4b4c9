//! Terminal front end for the duel client.
//!
//! Reads stdin line by line. Lines starting with `/` are player commands,
//! anything else is an inbound server frame (JSON) handed to the channel.
//! Outbound frames are printed on stdout, one per line.

use actix::Actor;
use actix::Addr;
use anyhow::{anyhow, Result};
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use rps_duel::client::feedback::LogFeedback;
use rps_duel::client::line_channel::LineChannel;
use rps_duel::client::messages::{
    CreateRoom, GetSnapshot, JoinRoom, MakeChoice, ResetToMenu, SetSoundEnabled, Shutdown,
    StartNewGame,
};
use rps_duel::client::SessionController;
use rps_duel::config::ControllerConfig;
use rps_duel::game::types::Choice;

enum Command {
    Create { name: String },
    Join { code: String, name: String },
    Choose(Choice),
    NewGame,
    Menu,
    Sound(bool),
    Status,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Command> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();
        match (cmd, rest.as_slice()) {
            ("create", [name @ ..]) if !name.is_empty() => Ok(Command::Create { name: name.join(" ") }),
            ("join", [code, name @ ..]) if !name.is_empty() => Ok(Command::Join {
                code: code.to_string(),
                name: name.join(" "),
            }),
            ("choose", [choice]) => choice.parse().map(Command::Choose).map_err(|e| anyhow!(e)),
            ("new", []) => Ok(Command::NewGame),
            ("menu", []) => Ok(Command::Menu),
            ("sound", ["on"]) => Ok(Command::Sound(true)),
            ("sound", ["off"]) => Ok(Command::Sound(false)),
            ("status", []) => Ok(Command::Status),
            ("quit", []) => Ok(Command::Quit),
            _ => Err(anyhow!(
                "usage: /create NAME | /join CODE NAME | /choose rock|paper|scissors | /new | /menu | /sound on|off | /status | /quit"
            )),
        }
    }
}

async fn run(command: Command, controller: &Addr<SessionController>) -> Result<()> {
    let result = match command {
        Command::Create { name } => controller.send(CreateRoom { player_name: name }).await?,
        Command::Join { code, name } => {
            controller.send(JoinRoom { room_code: code, player_name: name }).await?
        }
        Command::Choose(choice) => {
            let outcome = controller.send(MakeChoice { choice }).await?;
            if !outcome.is_accepted() {
                eprintln!("choice not taken: {:?}", outcome);
            }
            Ok(())
        }
        Command::NewGame => controller.send(StartNewGame).await?,
        Command::Menu => {
            controller.send(ResetToMenu).await?;
            Ok(())
        }
        Command::Sound(on) => {
            controller.send(SetSoundEnabled(on)).await?;
            Ok(())
        }
        Command::Status => {
            let view = controller.send(GetSnapshot).await?;
            eprintln!(
                "[{}] {:?} room={} round={} time={}s W{}/L{}/T{} | {}",
                view.phase,
                view.connection,
                view.room_code.as_deref().unwrap_or("-"),
                view.round_number,
                view.time_left,
                view.tally.wins,
                view.tally.losses,
                view.tally.ties,
                view.message,
            );
            if let Some(err) = view.last_error {
                eprintln!("last error: {}", err);
            }
            Ok(())
        }
        Command::Quit => Ok(()),
    };
    if let Err(e) = result {
        eprintln!("[{}] {}", e.code(), e);
    }
    Ok(())
}

#[actix::main]
async fn main() -> Result<()> {
    env_logger::init();

    let channel = LineChannel::new();
    let feed = channel.feed();
    let controller = SessionController::new(
        Box::new(channel),
        Box::new(LogFeedback),
        ControllerConfig::default(),
    )
    .start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.strip_prefix('/') {
            Some(cmd) => match Command::parse(cmd) {
                Ok(Command::Quit) => break,
                Ok(command) => run(command, &controller).await?,
                Err(e) => eprintln!("{}", e),
            },
            None => {
                if let Err(e) = feed.push_line(line) {
                    warn!("[Main] Unreadable frame: {}", e);
                }
            }
        }
    }

    controller.send(Shutdown).await?;
    Ok(())
}
