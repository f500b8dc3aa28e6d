// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notification seam.

use async_trait::async_trait;

use crate::error::SauronError;
use crate::types::Notification;

/// Delivers notifications for finished archival jobs.
///
/// Exactly one implementation is chosen at startup and shared as
/// `Arc<dyn Notifier>` for the life of the process.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Accepts one notification. Implementations must not block the caller
    /// on network round trips or attachment reads.
    async fn notify(&self, notification: Notification) -> Result<(), SauronError>;

    /// Flushes queued notifications and releases the transport.
    async fn shutdown(&self) -> Result<(), SauronError>;
}
