// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the sauron workspace.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use strum::{Display, EnumString};

use crate::error::SauronError;

/// Normalizes a channel name for use as a map key and file name.
pub fn normalize_channel(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Bytes escaped when a channel name becomes a path component.
pub const CHANNEL_ESCAPES: &AsciiSet = &CONTROLS.add(b'%').add(b'/');

/// Nicks also escape `_`, the field separator of archive directory names.
pub const NICK_ESCAPES: &AsciiSet = &CHANNEL_ESCAPES.add(b'_');

/// Percent-encodes `s` with `escapes`. Since `%` is always in the set, the
/// result decodes back to `s` and distinct inputs stay distinct.
pub fn escape_component(s: &str, escapes: &'static AsciiSet) -> String {
    utf8_percent_encode(s, escapes).to_string()
}

/// Lifecycle states of the chat connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Handshaking,
    Joined,
}

/// A message relayed to a channel the bot is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Full sender identity, usually `nick!user@host`.
    pub sender: String,
    /// Normalized channel name.
    pub channel: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
    /// Set for CTCP ACTION (`/me`) messages.
    pub action: bool,
}

impl ChatMessage {
    pub fn new(
        sender: impl Into<String>,
        channel: &str,
        text: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            channel: normalize_channel(channel),
            text: text.into(),
            received_at,
            action: false,
        }
    }

    /// The nickname part of the sender identity.
    pub fn sender_nick(&self) -> &str {
        self.sender
            .split_once('!')
            .map(|(nick, _)| nick)
            .unwrap_or(&self.sender)
    }

    /// The line written to the channel log for this message.
    pub fn log_line(&self) -> String {
        if self.action {
            format!("* {} {}", self.sender_nick(), self.text)
        } else {
            format!("{}: {}", self.sender_nick(), self.text)
        }
    }
}

/// One URL occurrence inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    /// Byte range of the raw match within the message text.
    pub span: Range<usize>,
    /// The raw matched text.
    pub matched: String,
    /// The URL with surrounding punctuation trimmed.
    pub url: String,
}

/// The two archival passes run for every detected URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ScanKind {
    /// Recursive, same host only, high depth bound.
    DeepLocal,
    /// Recursive across hosts, low depth bound.
    ShallowOuter,
}

impl ScanKind {
    /// Directory-name suffix distinguishing the sibling jobs.
    pub fn suffix(self) -> &'static str {
        match self {
            ScanKind::DeepLocal => "_local",
            ScanKind::ShallowOuter => "_outer",
        }
    }
}

/// Unique identifier for an archival job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub uuid::Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Status of an archival job. Transitions only move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed { code: i32 },
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed { .. })
                | (JobStatus::Running, JobStatus::Completed { .. })
                | (JobStatus::Running, JobStatus::Failed { .. })
        )
    }

    /// The status as reported to operators: the exit code, or the failure reason.
    pub fn report(&self) -> String {
        match self {
            JobStatus::Pending => "pending".to_string(),
            JobStatus::Running => "running".to_string(),
            JobStatus::Completed { code } => code.to_string(),
            JobStatus::Failed { reason } => format!("failed ({reason})"),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed { code } => write!(f, "completed({code})"),
            JobStatus::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// One fetcher invocation and its tracked status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    pub id: JobId,
    pub url: String,
    pub target_dir: PathBuf,
    pub kind: ScanKind,
    status: JobStatus,
}

impl ArchiveJob {
    /// Creates a pending job. `base` is the shared prefix of the sibling jobs.
    pub fn new(url: impl Into<String>, base: &Path, kind: ScanKind) -> Self {
        let mut dir = base.as_os_str().to_owned();
        dir.push(kind.suffix());
        Self {
            id: JobId::new(),
            url: url.into(),
            target_dir: PathBuf::from(dir),
            kind,
            status: JobStatus::Pending,
        }
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    /// Moves the job to `next`, rejecting backwards or skipping transitions.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), SauronError> {
        if !self.status.can_transition_to(&next) {
            return Err(SauronError::InvalidTransition {
                from: self.status.clone(),
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Path of the fetcher transcript inside the job directory.
    pub fn transcript_path(&self) -> PathBuf {
        self.target_dir.join("wget.out")
    }
}

/// An outgoing operator notification for one terminal job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

impl Notification {
    /// Builds the notification reporting `job` to `recipients`.
    pub fn for_job(recipients: &[String], job: &ArchiveJob, message: &ChatMessage) -> Self {
        let body = format!(
            "Finished download of {url}\nStored under {dir}\nDownload return code {status}\n\t- message:\n{text}",
            url = job.url,
            dir = job.target_dir.display(),
            status = job.status().report(),
            text = message.text,
        );
        Self {
            recipients: recipients.to_vec(),
            subject: format!("Url {} detected and downloaded", job.url),
            body,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, path: PathBuf) -> Self {
        self.attachments.push(path);
        self
    }
}
