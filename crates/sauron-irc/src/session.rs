// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-connection protocol state.

use std::collections::BTreeSet;

use sauron_core::{normalize_channel, ConnectionState};
use tokio::sync::watch;
use tracing::debug;

/// State of the current connection. Reset on every disconnect.
#[derive(Debug)]
pub struct Session {
    state: ConnectionState,
    nickname: Option<String>,
    joined: BTreeSet<String>,
    registered: bool,
    state_tx: watch::Sender<ConnectionState>,
}

impl Session {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state: ConnectionState::Disconnected,
            nickname: None,
            joined: BTreeSet::new(),
            registered: false,
            state_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "connection state changed");
        }
        self.state = state;
        self.state_tx.send_replace(state);
    }

    /// Nickname the server registered us under, once known.
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Whether this session completed the handshake.
    pub fn registered(&self) -> bool {
        self.registered
    }

    pub(crate) fn register(&mut self, nickname: &str) {
        self.nickname = Some(nickname.to_string());
        self.registered = true;
        self.set_state(ConnectionState::Joined);
    }

    pub(crate) fn mark_joined(&mut self, channel: &str) -> bool {
        self.joined.insert(normalize_channel(channel))
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.joined.contains(&normalize_channel(channel))
    }

    /// Joined channels, normalized and sorted.
    pub fn joined(&self) -> impl Iterator<Item = &str> {
        self.joined.iter().map(String::as_str)
    }

    /// Forgets everything about the ended connection.
    pub(crate) fn reset(&mut self) {
        self.nickname = None;
        self.joined.clear();
        self.registered = false;
        self.set_state(ConnectionState::Disconnected);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
