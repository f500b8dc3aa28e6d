// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building RFC 5322 messages from notifications.

use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use sauron_core::{Notification, SauronError};
use tracing::warn;

/// An attachment already read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Parses an address, mapping failures to [`SauronError::Mail`].
pub fn parse_mailbox(address: &str) -> Result<Mailbox, SauronError> {
    address.trim().parse().map_err(|e| SauronError::Mail {
        message: format!("invalid address `{address}`"),
        source: Some(Box::new(e)),
    })
}

/// Builds a multipart/mixed message: plain-text body plus attachments.
pub fn compose(
    from: &Mailbox,
    notification: &Notification,
    attachments: Vec<LoadedAttachment>,
) -> Result<Message, SauronError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(notification.subject.clone())
        .date_now();
    for recipient in &notification.recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(notification.body.clone()));
    for attachment in attachments {
        body = body.singlepart(
            Attachment::new(attachment.filename).body(attachment.content, ContentType::TEXT_PLAIN),
        );
    }

    builder.multipart(body).map_err(|e| SauronError::Mail {
        message: format!("cannot build message `{}`", notification.subject),
        source: Some(Box::new(e)),
    })
}

/// Reads attachment files. Unreadable files are skipped with a warning.
pub async fn load_attachments(paths: &[impl AsRef<Path>]) -> Vec<LoadedAttachment> {
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(content) => loaded.push(LoadedAttachment {
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "attachment".to_string()),
                content,
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "attachment skipped"),
        }
    }
    loaded
}

/// SMTP reply codes meaning the server refused our credentials.
pub fn is_auth_code(code: &str) -> bool {
    matches!(code, "530" | "534" | "535")
}
