// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for sauron integration tests.
//!
//! # Components
//!
//! - [`ScriptedConnector`] - chat transport replaying scripted sessions
//! - [`ScriptedRunner`] - job runner returning configured exit statuses
//! - [`RecordingNotifier`] - notifier capturing every notification

pub mod mock_chat;
pub mod mock_notifier;
pub mod mock_runner;

pub use mock_chat::{LinkRecord, LinkScript, ScriptedConnector};
pub use mock_notifier::RecordingNotifier;
pub use mock_runner::ScriptedRunner;

use chrono::{DateTime, TimeZone, Utc};

/// 2024-01-01T00:00:00Z, the timestamp used throughout the fixtures.
pub fn new_year() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}
