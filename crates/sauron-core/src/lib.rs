// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the sauron channel archiver.
//!
//! This crate provides the shared domain types, the single error enum, and
//! the trait seams (chat transport, job runner, notifier) that the other
//! workspace crates implement or consume.

pub mod error;
pub mod traits;
pub mod types;

pub use error::SauronError;
pub use traits::{ChatEvent, ChatLink, Connector, JobRunner, Notifier};
pub use types::{
    escape_component, normalize_channel, CHANNEL_ESCAPES, NICK_ESCAPES, ArchiveJob, ChatMessage, ConnectionState, JobId,
    JobStatus, Notification, ScanKind, UrlMatch,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sauron_error_variants_render() {
        let cases: Vec<(SauronError, &str)> = vec![
            (SauronError::Config("bad".into()), "configuration error: bad"),
            (
                SauronError::ChannelNotOpen("#chat".into()),
                "no open log for channel #chat",
            ),
            (
                SauronError::RetriesExhausted { attempts: 3 },
                "reconnect attempts exhausted after 3 tries",
            ),
            (SauronError::MailAuth("535".into()), "mail authentication failed: 535"),
            (SauronError::Internal("x".into()), "internal error: x"),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn all_seam_traits_are_exported() {
        fn _assert_connector<T: Connector>() {}
        fn _assert_link<T: ChatLink>() {}
        fn _assert_runner<T: JobRunner>() {}
        fn _assert_notifier<T: Notifier>() {}
    }
}
