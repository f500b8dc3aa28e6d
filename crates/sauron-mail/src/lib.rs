// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notifications for finished archival jobs.
//!
//! Two [`Notifier`] implementations exist: [`SmtpNotifier`], which keeps one
//! authenticated SMTP session and sends from a single queue, and
//! [`NoopNotifier`] for deployments with mail disabled. [`from_config`]
//! picks one at startup.

pub mod message;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use sauron_config::model::MailConfig;
use sauron_core::{Notification, Notifier, SauronError};
use tracing::{debug, error, info};

pub use smtp::{MailTransport, SendFailure, SmtpNotifier};

/// Accepts notifications and discards them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    async fn notify(&self, notification: Notification) -> Result<(), SauronError> {
        debug!(subject = %notification.subject, "mail disabled, notification discarded");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SauronError> {
        Ok(())
    }
}

/// Chooses the notifier for this process from `[mail]`.
///
/// An SMTP session that fails authentication at startup degrades to
/// [`NoopNotifier`] instead of stopping the bot.
pub async fn from_config(config: &MailConfig) -> Arc<dyn Notifier> {
    if !config.enabled {
        info!("mail notifications disabled");
        return Arc::new(NoopNotifier);
    }
    match SmtpNotifier::connect(config).await {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            error!(error = %e, "mail session unavailable, notifications disabled");
            Arc::new(NoopNotifier)
        }
    }
}
