// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archival of URLs seen in chat.
//!
//! Every detected URL gets two independent fetcher runs: a deep same-host
//! scan started immediately and a shallow cross-host scan started after a
//! short delay. Jobs run as child processes in their own tasks and report
//! back over a channel, so the chat event loop never waits on a download.

pub mod layout;
pub mod orchestrator;
pub mod wget;

pub use layout::base_path;
pub use orchestrator::{ArchiveSettings, JobEvent, Orchestrator};
pub use wget::{WgetCommand, WgetRunner};
