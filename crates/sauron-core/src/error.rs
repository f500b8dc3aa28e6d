// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the sauron channel archiver.

use thiserror::Error;

use crate::types::JobStatus;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type shared by every sauron crate.
#[derive(Debug, Error)]
pub enum SauronError {
    /// Configuration errors detected after loading (missing values, bad combinations).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors, tagged with what was being attempted.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// Chat transport errors (connect failure, lost link, send failure).
    #[error("connection error: {message}")]
    Connection {
        message: String,
        source: Option<BoxError>,
    },

    /// A log write targeted a channel whose log is not open.
    #[error("no open log for channel {0}")]
    ChannelNotOpen(String),

    /// Archival job errors (spawn failure, abnormal termination).
    #[error("archive error: {message}")]
    Archive {
        message: String,
        source: Option<BoxError>,
    },

    /// A job status change that would move backwards or skip a state.
    #[error("invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// Mail transport errors other than authentication.
    #[error("mail error: {message}")]
    Mail {
        message: String,
        source: Option<BoxError>,
    },

    /// The mail server rejected our credentials.
    #[error("mail authentication failed: {0}")]
    MailAuth(String),

    /// A bounded reconnect policy gave up.
    #[error("reconnect attempts exhausted after {attempts} tries")]
    RetriesExhausted { attempts: u32 },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SauronError {
    /// Wraps an I/O error with a short description of the failed operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Builds a connection error carrying the underlying cause.
    pub fn connection<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
