// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport seam used by the connection manager.

use async_trait::async_trait;

use crate::error::SauronError;

/// Protocol events surfaced by a [`ChatLink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The server accepted our registration under `nickname`.
    Registered { nickname: String },
    /// `nickname` joined `channel`. Our own joins acknowledge a join request.
    Joined { channel: String, nickname: String },
    /// A PRIVMSG (or CTCP ACTION when `action` is set) sent to `target`.
    Message {
        sender: String,
        target: String,
        text: String,
        action: bool,
    },
    /// The requested nickname was taken; the client will try an alternative.
    NicknameInUse { nickname: String },
    /// Any other protocol traffic.
    Other,
}

/// Opens chat links. Called once per connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes the transport and sends registration.
    async fn connect(&self) -> Result<Box<dyn ChatLink>, SauronError>;
}

/// A single live connection to the chat network.
#[async_trait]
pub trait ChatLink: Send {
    /// Waits for the next protocol event. `Ok(None)` means the server closed the link.
    ///
    /// Must be cancel-safe: it is polled inside `tokio::select!`.
    async fn next_event(&mut self) -> Result<Option<ChatEvent>, SauronError>;

    /// The nickname currently in use on this link.
    fn current_nickname(&self) -> String;

    /// Sends a JOIN request.
    fn join(&self, channel: &str) -> Result<(), SauronError>;

    /// Sends a keepalive PING.
    fn ping(&self) -> Result<(), SauronError>;

    /// Sends QUIT with a parting message.
    fn quit(&self, message: &str) -> Result<(), SauronError>;
}
