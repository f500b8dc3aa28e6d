// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the event loop and its collaborators.
//!
//! Every trait uses `#[async_trait]` so implementations can be held as
//! trait objects and swapped for test doubles.

pub mod chat;
pub mod notifier;
pub mod runner;

pub use chat::{ChatEvent, ChatLink, Connector};
pub use notifier::Notifier;
pub use runner::JobRunner;
