//! Newline-delimited JSON channel for terminal sessions and pipes.
//!
//! Outbound intents are written as one JSON object per line on stdout.
//! Inbound frames are pushed through a [`LineFeed`] handle by whoever owns
//! the input side (the binary reads them from stdin).

use std::io::Write;
use std::sync::{Arc, Mutex};

use actix::prelude::*;
use log::{debug, warn};
use uuid::Uuid;

use crate::client::channel::{Channel, ChannelError, ChannelErrorKind, ChannelEvent, ConnectFuture};
use crate::client::messages::{decode_event, encode_intent, ClientIntent};

type Listener = Arc<Mutex<Option<Recipient<ChannelEvent>>>>;

pub struct LineChannel {
    listener: Listener,
    connected: bool,
}

impl LineChannel {
    pub fn new() -> Self {
        Self {
            listener: Arc::new(Mutex::new(None)),
            connected: false,
        }
    }

    /// Handle for pushing inbound frames to the subscribed listener.
    pub fn feed(&self) -> LineFeed {
        LineFeed { listener: self.listener.clone() }
    }

    fn set_listener(&self, listener: Option<Recipient<ChannelEvent>>) {
        let mut slot = self.listener.lock().unwrap_or_else(|p| p.into_inner());
        *slot = listener;
    }
}

impl Default for LineChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for LineChannel {
    fn connect(&mut self) -> ConnectFuture {
        self.connected = true;
        let id = Uuid::new_v4().to_string();
        debug!("[LineChannel] Open as {}", id);
        Box::pin(async move { Ok(id) })
    }

    fn subscribe(&mut self, listener: Recipient<ChannelEvent>) {
        self.set_listener(Some(listener));
    }

    fn unsubscribe_all(&mut self) {
        self.set_listener(None);
    }

    fn send(&mut self, intent: &ClientIntent) -> Result<(), ChannelError> {
        if !self.connected {
            return Err(ChannelError::new(ChannelErrorKind::NotConnected, "line channel is closed"));
        }
        let frame = encode_intent(intent)
            .map_err(|e| ChannelError::new(ChannelErrorKind::SendFailed, e.to_string()))?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", frame)
            .and_then(|_| out.flush())
            .map_err(|e| ChannelError::new(ChannelErrorKind::SendFailed, e.to_string()))
    }

    fn disconnect(&mut self) {
        if self.connected {
            debug!("[LineChannel] Closed");
        }
        self.connected = false;
    }
}

#[derive(Clone)]
pub struct LineFeed {
    listener: Listener,
}

impl LineFeed {
    /// Decode one inbound line and deliver it. Frames arriving with no
    /// listener are dropped.
    pub fn push_line(&self, line: &str) -> Result<(), serde_json::Error> {
        let event = decode_event(line)?;
        self.deliver(ChannelEvent::Server(event));
        Ok(())
    }

    /// Report that the link went down.
    pub fn drop_link(&self, reason: &str) {
        self.deliver(ChannelEvent::Dropped { reason: reason.to_string() });
    }

    fn deliver(&self, event: ChannelEvent) {
        let slot = self.listener.lock().unwrap_or_else(|p| p.into_inner());
        match slot.as_ref() {
            Some(listener) => listener.do_send(event),
            None => warn!("[LineChannel] No listener, dropping {:?}", event),
        }
    }
}
