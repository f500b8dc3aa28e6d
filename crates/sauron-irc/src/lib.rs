// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IRC side of sauron.
//!
//! [`ConnectionManager`] drives one chat connection at a time through
//! `disconnected -> connecting -> handshaking -> joined`, logs channel
//! traffic, hands detected URLs to the archival orchestrator, and applies a
//! [`ReconnectPolicy`] whenever the link is lost. [`IrcConnector`] is the
//! production transport built on the `irc` crate.

pub mod client;
pub mod manager;
pub mod policy;
pub mod session;

pub use client::IrcConnector;
pub use manager::{ConnectionManager, ManagerSettings};
pub use policy::{Backoff, ReconnectPolicy};
pub use session::Session;
