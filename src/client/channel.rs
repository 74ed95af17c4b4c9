//! Transport contract.
//!
//! The realtime messaging client is a collaborator: the controller only needs
//! to open it, register one listener, push intents and close it. Inbound
//! traffic reaches the controller as [`ChannelEvent`] actor messages.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use actix::prelude::*;

use crate::client::messages::{ClientIntent, ServerEvent};
use crate::game::types::PlayerId;

/// Resolves to the connection id the channel assigned to this client.
pub type ConnectFuture = Pin<Box<dyn Future<Output = Result<PlayerId, ChannelError>>>>;

/// What a channel delivers to its listener.
#[derive(Message, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
pub enum ChannelEvent {
    Server(ServerEvent),
    /// The link went down after a successful connect.
    Dropped { reason: String },
}

pub trait Channel {
    /// Open the link. Calling it again after a drop opens a new link.
    fn connect(&mut self) -> ConnectFuture;

    /// Register the listener for inbound events. Replaces any previous one.
    fn subscribe(&mut self, listener: Recipient<ChannelEvent>);

    /// Remove every listener. Nothing is delivered afterwards.
    fn unsubscribe_all(&mut self);

    fn send(&mut self, intent: &ClientIntent) -> Result<(), ChannelError>;

    /// Close the link. Safe to call when already closed.
    fn disconnect(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelErrorKind {
    ConnectFailed,
    NotConnected,
    SendFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelError {
    pub kind: ChannelErrorKind,
    pub message: String,
}

impl ChannelError {
    pub fn new(kind: ChannelErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ChannelErrorKind::ConnectFailed => "connect failed",
            ChannelErrorKind::NotConnected => "not connected",
            ChannelErrorKind::SendFailed => "send failed",
        };
        write!(f, "{}: {}", kind, self.message)
    }
}

impl std::error::Error for ChannelError {}
