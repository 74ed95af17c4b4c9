use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix::prelude::*;
use tokio::time::sleep;

use crate::client::channel::{Channel, ChannelError, ChannelErrorKind, ChannelEvent, ConnectFuture};
use crate::client::feedback::{Cue, Feedback, Silent};
use crate::client::guard::SubmitOutcome;
use crate::client::messages::*;
use crate::client::{SessionController, SessionView};
use crate::config::ControllerConfig;
use crate::game::state::{ConnectionStatus, Phase};
use crate::game::types::{Choice, Player, PlayerId, Room, RoundReport, RoundWinner};

#[derive(Default)]
struct Wire {
    calls: Vec<String>,
    sent: Vec<ClientIntent>,
    listener: Option<Recipient<ChannelEvent>>,
    connect_results: VecDeque<Result<PlayerId, ChannelError>>,
    fail_sends: bool,
}

/// In-memory channel. Connects as "a" unless results are scripted.
#[derive(Clone, Default)]
struct MockChannel(Arc<Mutex<Wire>>);

impl MockChannel {
    fn failing_first() -> Self {
        let mock = MockChannel::default();
        mock.0.lock().unwrap().connect_results.push_back(Err(ChannelError::new(
            ChannelErrorKind::ConnectFailed,
            "refused",
        )));
        mock
    }

    fn emit(&self, event: ServerEvent) {
        self.deliver(ChannelEvent::Server(event));
    }

    fn deliver(&self, event: ChannelEvent) {
        let listener = self.0.lock().unwrap().listener.clone();
        listener.expect("no listener").do_send(event);
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    fn choices_sent(&self) -> usize {
        self.0
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|i| matches!(i, ClientIntent::MakeChoice { .. }))
            .count()
    }

    fn sent(&self) -> Vec<ClientIntent> {
        self.0.lock().unwrap().sent.clone()
    }

    fn set_fail_sends(&self, fail: bool) {
        self.0.lock().unwrap().fail_sends = fail;
    }
}

impl Channel for MockChannel {
    fn connect(&mut self) -> ConnectFuture {
        let mut wire = self.0.lock().unwrap();
        wire.calls.push("connect".into());
        let result = wire.connect_results.pop_front().unwrap_or_else(|| Ok("a".to_string()));
        Box::pin(async move { result })
    }

    fn subscribe(&mut self, listener: Recipient<ChannelEvent>) {
        let mut wire = self.0.lock().unwrap();
        wire.calls.push("subscribe".into());
        wire.listener = Some(listener);
    }

    fn unsubscribe_all(&mut self) {
        let mut wire = self.0.lock().unwrap();
        wire.calls.push("unsubscribe_all".into());
        wire.listener = None;
    }

    fn send(&mut self, intent: &ClientIntent) -> Result<(), ChannelError> {
        let mut wire = self.0.lock().unwrap();
        wire.calls.push("send".into());
        if wire.fail_sends {
            return Err(ChannelError::new(ChannelErrorKind::SendFailed, "broken pipe"));
        }
        wire.sent.push(intent.clone());
        Ok(())
    }

    fn disconnect(&mut self) {
        self.0.lock().unwrap().calls.push("disconnect".into());
    }
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Cue>>>);

impl Recorder {
    fn count(&self, cue: Cue) -> usize {
        self.0.lock().unwrap().iter().filter(|c| **c == cue).count()
    }
}

impl Feedback for Recorder {
    fn play(&mut self, cue: Cue) -> Result<(), String> {
        self.0.lock().unwrap().push(cue);
        Ok(())
    }
}

/// Broken speaker: every cue fails.
struct Broken;

impl Feedback for Broken {
    fn play(&mut self, _cue: Cue) -> Result<(), String> {
        Err("no audio device".into())
    }
}

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        round_duration: Duration::from_millis(300),
        tick_interval: Duration::from_millis(10),
        round_start_delay: Duration::from_millis(5),
        first_round_delay: Duration::from_millis(20),
        new_game_round_delay: Duration::from_millis(10),
        result_display_delay: Duration::from_millis(30),
        reconnect_backoff: Duration::from_millis(40),
        max_reconnect_attempts: None,
        sound_enabled: true,
    }
}

fn start(mock: &MockChannel, feedback: Box<dyn Feedback>, config: ControllerConfig) -> Addr<SessionController> {
    SessionController::new(Box::new(mock.clone()), feedback, config).start()
}

async fn settle(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

async fn view(addr: &Addr<SessionController>) -> SessionView {
    addr.send(GetSnapshot).await.unwrap()
}

fn alice() -> Player {
    Player::new("a", "Alice")
}

fn bob() -> Player {
    Player::new("b", "Bob")
}

fn room(max_rounds: u32) -> Room {
    Room {
        id: "AB12CD".into(),
        players: vec![alice(), bob()],
        current_round: 0,
        max_rounds,
    }
}

fn result(round: u32, winner: RoundWinner, scores: (u32, u32)) -> ServerEvent {
    let mut player_choices = HashMap::new();
    player_choices.insert("a".to_string(), Choice::Rock);
    player_choices.insert("b".to_string(), Choice::Paper);
    let mut a = alice();
    a.score = scores.0;
    let mut b = bob();
    b.score = scores.1;
    ServerEvent::RoundResult(RoundReport { round, player_choices, result: winner, players: vec![a, b] })
}

/// Connect, create a room, let Bob join and wait for the first round to open.
async fn into_first_round(mock: &MockChannel, addr: &Addr<SessionController>, max_rounds: u32) {
    settle(10).await;
    addr.send(CreateRoom { player_name: "Alice".into() }).await.unwrap().unwrap();
    mock.emit(ServerEvent::RoomCreated { room_code: "AB12CD".into(), player: alice() });
    mock.emit(ServerEvent::PlayerJoined { room: room(max_rounds), new_player: bob() });
    settle(60).await;
    let v = view(addr).await;
    assert_eq!(v.phase, Phase::Playing);
    assert!(v.round.as_ref().is_some_and(|r| r.accepting_input));
}

#[actix::test]
async fn test_connects_into_menu() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Silent), fast_config());
    settle(10).await;

    let v = view(&addr).await;
    assert_eq!(v.phase, Phase::Menu);
    assert_eq!(v.connection, ConnectionStatus::Connected);
    assert_eq!(mock.calls(), vec!["connect", "subscribe"]);
}

#[actix::test]
async fn test_connection_failure_retries_after_backoff() {
    let mock = MockChannel::failing_first();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    settle(10).await;

    let v = view(&addr).await;
    assert_eq!(v.connection, ConnectionStatus::Reconnecting { attempt: 1 });
    assert_eq!(v.phase, Phase::Connecting);
    assert!(v.last_error.is_some());
    let err = addr.send(CreateRoom { player_name: "Alice".into() }).await.unwrap().unwrap_err();
    assert_eq!(err.code(), "NOT_CONNECTED");

    settle(80).await;
    let v = view(&addr).await;
    assert_eq!(v.connection, ConnectionStatus::Connected);
    assert_eq!(v.phase, Phase::Menu);
    assert_eq!(mock.calls(), vec!["connect", "connect", "subscribe"]);
}

#[actix::test]
async fn test_gives_up_when_attempts_are_capped() {
    let mock = MockChannel::failing_first();
    let config = ControllerConfig { max_reconnect_attempts: Some(1), ..fast_config() };
    let addr = start(&mock, Box::new(Recorder::default()), config);
    settle(80).await;

    let v = view(&addr).await;
    assert_eq!(v.connection, ConnectionStatus::Offline);
    assert_eq!(v.phase, Phase::Menu);
    assert_eq!(mock.calls(), vec!["connect"]);
}

#[actix::test]
async fn test_invalid_input_emits_nothing() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    settle(10).await;

    let err = addr.send(CreateRoom { player_name: "   ".into() }).await.unwrap().unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
    let err = addr
        .send(JoinRoom { room_code: "AB-1".into(), player_name: "Alice".into() })
        .await
        .unwrap()
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
    assert!(mock.sent().is_empty());

    addr.send(JoinRoom { room_code: " ab12cd".into(), player_name: "Alice".into() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mock.sent(), vec![ClientIntent::join_room("AB12CD", "Alice")]);
}

#[actix::test]
async fn test_manual_choice_suppresses_auto_submit() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;

    let outcome = addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted(Choice::Rock));
    let again = addr.send(MakeChoice { choice: Choice::Paper }).await.unwrap();
    assert_eq!(again, SubmitOutcome::AlreadySubmitted);

    // Well past the round duration: the expiry path must not fire.
    settle(400).await;
    assert_eq!(mock.choices_sent(), 1);
    assert!(mock.sent().contains(&ClientIntent::make_choice("AB12CD", Choice::Rock)));
    let v = view(&addr).await;
    assert_eq!(v.round.and_then(|r| r.my_choice), Some(Choice::Rock));
}

#[actix::test]
async fn test_expiry_auto_submits_once() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;

    settle(400).await;
    assert_eq!(mock.choices_sent(), 1);
    let v = view(&addr).await;
    assert_eq!(v.time_left, 0);
    assert!(v.message.starts_with("Time's up"));

    let late = addr.send(MakeChoice { choice: Choice::Scissors }).await.unwrap();
    assert_eq!(late, SubmitOutcome::AlreadySubmitted);
    assert_eq!(mock.choices_sent(), 1);
}

#[actix::test]
async fn test_duplicate_result_is_recorded_once() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;

    addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
    mock.emit(result(1, RoundWinner::Player2, (0, 1)));
    mock.emit(result(1, RoundWinner::Player2, (0, 1)));
    let v = view(&addr).await;
    assert_eq!(v.history.len(), 1);
    assert_eq!(v.tally.losses, 1);
    assert_eq!(v.opponent.map(|p| p.score), Some(1));

    // Next round opens after the result delay; a late duplicate leaves it alone.
    settle(60).await;
    mock.emit(result(1, RoundWinner::Player2, (0, 1)));
    let v = view(&addr).await;
    assert_eq!(v.history.len(), 1);
    assert!(v.round.is_some_and(|r| r.accepting_input && r.number == 2));
}

#[actix::test]
async fn test_result_closes_round_before_a_late_tick() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;

    for round in 1..=2 {
        addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
        mock.emit(result(round, RoundWinner::Tie, (0, 0)));
        settle(60).await;
    }
    // Round 3 is open; its result lands before the countdown runs out.
    mock.emit(result(3, RoundWinner::Player1, (1, 0)));
    settle(400).await;

    let v = view(&addr).await;
    assert_eq!(v.history.len(), 3);
    assert_eq!(v.tally.ties, 2);
    assert_eq!(v.tally.wins, 1);
    // Two manual choices; round 3 was resolved by the server and never auto-submitted.
    assert_eq!(mock.choices_sent(), 2);
    assert!(v.round.is_some_and(|r| !r.accepting_input && r.outcome.is_some()));
}

#[actix::test]
async fn test_game_finished_freezes_submissions() {
    let mock = MockChannel::default();
    let recorder = Recorder::default();
    let addr = start(&mock, Box::new(recorder.clone()), fast_config());
    into_first_round(&mock, &addr, 1).await;

    mock.emit(ServerEvent::GameFinished { winner: Some(alice()) });
    let v = view(&addr).await;
    assert_eq!(v.phase, Phase::Finished);
    assert_eq!(v.message, "You won the game!");
    assert_eq!(recorder.count(Cue::Win), 1);

    let outcome = addr.send(MakeChoice { choice: Choice::Paper }).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Closed);
    settle(400).await;
    assert_eq!(mock.choices_sent(), 0);
}

#[actix::test]
async fn test_start_new_game_keeps_tally() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 1).await;

    let err = addr.send(StartNewGame).await.unwrap().unwrap_err();
    assert_eq!(err.code(), "INVALID_ACTION");

    addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
    mock.emit(result(1, RoundWinner::Player1, (1, 0)));
    mock.emit(ServerEvent::GameFinished { winner: Some(alice()) });
    addr.send(StartNewGame).await.unwrap().unwrap();
    assert!(mock.sent().contains(&ClientIntent::start_new_game("AB12CD")));

    settle(40).await;
    let v = view(&addr).await;
    assert_eq!(v.phase, Phase::Playing);
    assert!(v.history.is_empty());
    assert_eq!(v.tally.wins, 1);
    assert!(v.round.is_some_and(|r| r.number == 1 && r.accepting_input));
}

#[actix::test]
async fn test_opponent_leaves_and_rejoins() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 5).await;

    addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
    mock.emit(result(1, RoundWinner::Player1, (1, 0)));
    mock.emit(ServerEvent::PlayerDisconnected { player_name: "Bob".into() });
    settle(60).await;

    let v = view(&addr).await;
    assert_eq!(v.phase, Phase::Waiting);
    assert!(v.round.is_none());

    let mut rejoined = room(5);
    rejoined.current_round = 1;
    rejoined.players[0].score = 1;
    mock.emit(ServerEvent::PlayerJoined { room: rejoined, new_player: bob() });
    settle(60).await;

    let v = view(&addr).await;
    assert_eq!(v.phase, Phase::Playing);
    assert_eq!(v.history.len(), 1);
    assert_eq!(v.me.map(|p| p.score), Some(1));
    assert!(v.round.is_some_and(|r| r.number == 2));
}

#[actix::test]
async fn test_channel_drop_keeps_room_and_history() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 5).await;

    addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
    mock.emit(result(1, RoundWinner::Player1, (1, 0)));
    mock.deliver(ChannelEvent::Dropped { reason: "socket closed".into() });
    settle(10).await;

    let v = view(&addr).await;
    assert_eq!(v.phase, Phase::Waiting);
    assert_eq!(v.connection, ConnectionStatus::Connected);
    assert_eq!(v.room_code.as_deref(), Some("AB12CD"));
    assert_eq!(v.history.len(), 1);
    assert!(v.round.is_none());
    let calls = mock.calls();
    let tail: Vec<&str> = calls.iter().rev().take(3).rev().map(String::as_str).collect();
    assert_eq!(tail, vec!["unsubscribe_all", "connect", "subscribe"]);

    // Nothing was scheduled across the drop.
    settle(100).await;
    assert!(view(&addr).await.round.is_none());
}

#[actix::test]
async fn test_sound_toggle_and_broken_speaker() {
    let mock = MockChannel::default();
    let recorder = Recorder::default();
    let addr = start(&mock, Box::new(recorder.clone()), fast_config());
    settle(10).await;
    assert_eq!(recorder.count(Cue::Connection), 1);

    addr.send(SetSoundEnabled(false)).await.unwrap();
    addr.send(CreateRoom { player_name: "Alice".into() }).await.unwrap().unwrap();
    assert_eq!(recorder.count(Cue::ButtonClick), 0);
    assert!(!view(&addr).await.sound_enabled);

    // Failed cues are swallowed.
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Broken), fast_config());
    into_first_round(&mock, &addr, 3).await;
    let outcome = addr.send(MakeChoice { choice: Choice::Paper }).await.unwrap();
    assert!(outcome.is_accepted());
}

#[actix::test]
async fn test_reset_to_menu_discards_session() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;

    addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
    mock.emit(result(1, RoundWinner::Player1, (1, 0)));
    addr.send(ResetToMenu).await.unwrap();
    settle(60).await;

    let v = view(&addr).await;
    assert_eq!(v.phase, Phase::Menu);
    assert!(v.room_code.is_none());
    assert!(v.history.is_empty());
    assert_eq!(v.tally.wins, 0);
    assert!(v.round.is_none());
    assert_eq!(v.connection, ConnectionStatus::Connected);
}

#[actix::test]
async fn test_shutdown_unsubscribes_before_disconnect() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;

    addr.send(Shutdown).await.unwrap();
    settle(10).await;

    let calls = mock.calls();
    let n = calls.len();
    assert_eq!(&calls[n - 2..], &["unsubscribe_all".to_string(), "disconnect".to_string()]);
    assert!(!addr.connected());
    assert!(mock.0.lock().unwrap().listener.is_none());

    settle(400).await;
    assert_eq!(mock.choices_sent(), 0);
}

#[actix::test]
async fn test_replayed_join_keeps_submitted_round() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;
    let number = view(&addr).await.round.map(|r| r.number);

    assert!(addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap().is_accepted());
    mock.emit(ServerEvent::PlayerJoined { room: room(3), new_player: bob() });
    settle(60).await;

    let outcome = addr.send(MakeChoice { choice: Choice::Paper }).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::AlreadySubmitted);
    assert_eq!(mock.choices_sent(), 1);
    assert_eq!(view(&addr).await.round.map(|r| r.number), number);
}

#[actix::test]
async fn test_failed_choice_send_reconnects() {
    let mock = MockChannel::default();
    let addr = start(&mock, Box::new(Recorder::default()), fast_config());
    into_first_round(&mock, &addr, 3).await;

    mock.set_fail_sends(true);
    let outcome = addr.send(MakeChoice { choice: Choice::Rock }).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Closed);
    assert_eq!(mock.choices_sent(), 0);
    mock.set_fail_sends(false);
    settle(60).await;

    let v = view(&addr).await;
    assert_eq!(v.connection, ConnectionStatus::Connected);
    assert_eq!(v.phase, Phase::Waiting);
    assert_eq!(v.room_code.as_deref(), Some("AB12CD"));
    assert!(v.round.is_none());
    let calls = mock.calls();
    let dropped_at = calls.iter().rposition(|c| c == "unsubscribe_all").unwrap();
    assert_eq!(calls[dropped_at + 1], "connect");

    // The abandoned round never auto-submits.
    settle(400).await;
    assert_eq!(mock.choices_sent(), 0);
}
