// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP notifier with a single long-lived session.
//!
//! Notifications are queued as they arrive. One worker reads attachments,
//! composes each message and submits them in order. A credential rejection,
//! at startup or later, degrades the notifier to discarding messages for the
//! rest of the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sauron_config::model::{MailConfig, MailSecurity};
use sauron_core::{Notification, Notifier, SauronError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::message::{compose, is_auth_code, load_attachments, parse_mailbox};

/// Why a submission failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    /// The server rejected our credentials.
    Auth(String),
    /// Anything else; the message is dropped but the session stays usable.
    Transient(String),
}

/// Submits one composed message to a mail server.
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn submit(&self, message: Message) -> Result<(), SendFailure>;
}

#[async_trait]
impl MailTransport for AsyncSmtpTransport<Tokio1Executor> {
    async fn submit(&self, message: Message) -> Result<(), SendFailure> {
        match AsyncTransport::send(self, message).await {
            Ok(_) => Ok(()),
            Err(e) => Err(classify(&e)),
        }
    }
}

fn classify(e: &lettre::transport::smtp::Error) -> SendFailure {
    let auth = e
        .status()
        .is_some_and(|code| is_auth_code(&code.to_string()));
    if auth {
        SendFailure::Auth(e.to_string())
    } else {
        SendFailure::Transient(e.to_string())
    }
}

/// Builds a pooled transport holding at most one open session.
pub fn build_transport(
    config: &MailConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, SauronError> {
    let tls_error = |e: lettre::transport::smtp::Error| SauronError::Mail {
        message: format!("cannot set up TLS for {}", config.server),
        source: Some(Box::new(e)),
    };
    let builder = match config.security {
        MailSecurity::Starttls => {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
                .map_err(tls_error)?
        }
        MailSecurity::Tls => {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server).map_err(tls_error)?
        }
        MailSecurity::None => {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        }
    };
    let mut builder = builder
        .port(config.port)
        .pool_config(PoolConfig::new().max_size(1));
    if let (Some(user), Some(password)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }
    Ok(builder.build())
}

/// Sends notifications over SMTP from a single ordered queue.
pub struct SmtpNotifier {
    sender: Mutex<Option<mpsc::UnboundedSender<Notification>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    degraded: Arc<AtomicBool>,
}

impl SmtpNotifier {
    /// Opens and verifies the session described by `config`.
    ///
    /// Returns [`SauronError::MailAuth`] when the server rejects the
    /// credentials. Other connection problems are logged and the notifier
    /// is returned anyway; the pool reconnects on the next submission.
    pub async fn connect(config: &MailConfig) -> Result<Self, SauronError> {
        let from = parse_mailbox(&config.from)?;
        let transport = build_transport(config)?;
        match transport.test_connection().await {
            Ok(true) => info!(server = %config.server, port = config.port, "mail session ready"),
            Ok(false) => warn!(server = %config.server, "mail server did not answer NOOP"),
            Err(e) => match classify(&e) {
                SendFailure::Auth(detail) => return Err(SauronError::MailAuth(detail)),
                SendFailure::Transient(detail) => {
                    warn!(server = %config.server, error = %detail, "mail server unreachable at startup")
                }
            },
        }
        Ok(Self::with_transport(from, Arc::new(transport)))
    }

    /// Wraps an already built transport and starts the delivery worker.
    pub fn with_transport(from: Mailbox, transport: Arc<dyn MailTransport>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let degraded = Arc::new(AtomicBool::new(false));
        let worker = tokio::spawn(deliver(rx, from, transport, Arc::clone(&degraded)));
        Self {
            sender: Mutex::new(Some(tx)),
            worker: tokio::sync::Mutex::new(Some(worker)),
            degraded,
        }
    }

    /// True once the server has rejected our credentials.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }
}

async fn deliver(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    from: Mailbox,
    transport: Arc<dyn MailTransport>,
    degraded: Arc<AtomicBool>,
) {
    while let Some(notification) = rx.recv().await {
        if degraded.load(Ordering::Acquire) {
            warn!(
                subject = %notification.subject,
                "mail authentication failed earlier, notification dropped"
            );
            continue;
        }
        let attachments = load_attachments(&notification.attachments).await;
        let message = match compose(&from, &notification, attachments) {
            Ok(message) => message,
            Err(e) => {
                warn!(subject = %notification.subject, error = %e, "notification not composed");
                continue;
            }
        };
        match transport.submit(message).await {
            Ok(()) => debug!("notification sent"),
            Err(SendFailure::Auth(detail)) => {
                error!(error = %detail, "mail authentication failed, notifications disabled");
                degraded.store(true, Ordering::Release);
            }
            Err(SendFailure::Transient(detail)) => {
                warn!(error = %detail, "notification not delivered")
            }
        }
    }
    debug!("mail worker stopped");
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn notify(&self, notification: Notification) -> Result<(), SauronError> {
        if self.is_degraded() {
            debug!(subject = %notification.subject, "mail degraded, notification discarded");
            return Ok(());
        }
        let sender = self
            .sender
            .lock()
            .map_err(|_| SauronError::Internal("mail sender lock poisoned".into()))?;
        let Some(tx) = sender.as_ref() else {
            return Err(SauronError::Mail {
                message: "notifier already shut down".into(),
                source: None,
            });
        };
        tx.send(notification).map_err(|_| SauronError::Mail {
            message: "mail worker is gone".into(),
            source: None,
        })
    }

    async fn shutdown(&self) -> Result<(), SauronError> {
        // Dropping the sender lets the worker drain the queue and exit.
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        if let Some(worker) = self.worker.lock().await.take() {
            worker
                .await
                .map_err(|e| SauronError::Internal(format!("mail worker panicked: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<String>>,
        raw: Mutex<Vec<String>>,
        failures: Mutex<VecDeque<SendFailure>>,
    }

    impl FakeTransport {
        fn failing(failures: Vec<SendFailure>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                raw: Mutex::new(Vec::new()),
                failures: Mutex::new(failures.into()),
            }
        }

        fn subjects(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailTransport for FakeTransport {
        async fn submit(&self, message: Message) -> Result<(), SendFailure> {
            if let Some(failure) = self.failures.lock().unwrap().pop_front() {
                return Err(failure);
            }
            let subject = message
                .headers()
                .get_raw("Subject")
                .unwrap_or_default()
                .to_string();
            self.raw
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(&message.formatted()).into_owned());
            self.sent.lock().unwrap().push(subject);
            Ok(())
        }
    }

    fn notification(subject: &str) -> Notification {
        Notification {
            recipients: vec!["ops@example.com".into()],
            subject: subject.into(),
            body: "body".into(),
            attachments: Vec::new(),
        }
    }

    fn from() -> Mailbox {
        parse_mailbox("eye@example.com").unwrap()
    }

    #[tokio::test]
    async fn delivers_in_submission_order() {
        let transport = Arc::new(FakeTransport::default());
        let notifier = SmtpNotifier::with_transport(from(), transport.clone());
        for i in 0..4 {
            notifier.notify(notification(&format!("n{i}"))).await.unwrap();
        }
        notifier.shutdown().await.unwrap();
        assert_eq!(transport.subjects(), vec!["n0", "n1", "n2", "n3"]);
    }

    #[tokio::test]
    async fn transient_failure_keeps_session() {
        let transport = Arc::new(FakeTransport::failing(vec![SendFailure::Transient(
            "421 busy".into(),
        )]));
        let notifier = SmtpNotifier::with_transport(from(), transport.clone());
        notifier.notify(notification("lost")).await.unwrap();
        notifier.notify(notification("kept")).await.unwrap();
        notifier.shutdown().await.unwrap();
        assert_eq!(transport.subjects(), vec!["kept"]);
        assert!(!notifier.is_degraded());
    }

    #[tokio::test]
    async fn auth_failure_degrades_to_discarding() {
        let transport = Arc::new(FakeTransport::failing(vec![SendFailure::Auth(
            "535 bad credentials".into(),
        )]));
        let notifier = SmtpNotifier::with_transport(from(), transport.clone());
        notifier.notify(notification("a")).await.unwrap();
        notifier.notify(notification("b")).await.unwrap();
        notifier.shutdown().await.unwrap();
        assert!(notifier.is_degraded());
        assert!(transport.subjects().is_empty());

        // Later notifications are accepted and discarded.
        notifier.notify(notification("c")).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_recipient_drops_only_that_notification() {
        let transport = Arc::new(FakeTransport::default());
        let notifier = SmtpNotifier::with_transport(from(), transport.clone());
        let mut bad = notification("bad");
        bad.recipients = vec!["nobody".into()];
        notifier.notify(bad).await.unwrap();
        notifier.notify(notification("good")).await.unwrap();
        notifier.shutdown().await.unwrap();
        assert_eq!(transport.subjects(), vec!["good"]);
        assert!(!notifier.is_degraded());
    }

    #[tokio::test]
    async fn transcript_is_read_by_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = dir.path().join("wget.out");
        let transport = Arc::new(FakeTransport::default());
        let notifier = SmtpNotifier::with_transport(from(), transport.clone());

        // The single-threaded runtime keeps the worker idle until shutdown
        // yields, so the file is written after notify has returned.
        let mut n = notification("with transcript");
        n.attachments = vec![transcript.clone()];
        notifier.notify(n).await.unwrap();
        std::fs::write(&transcript, "Saving to: index.html\n").unwrap();
        notifier.shutdown().await.unwrap();

        let raw = transport.raw.lock().unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw[0].contains("filename=\"wget.out\""));
    }

    #[tokio::test]
    async fn notify_after_shutdown_fails() {
        let notifier = SmtpNotifier::with_transport(from(), Arc::new(FakeTransport::default()));
        notifier.shutdown().await.unwrap();
        notifier.shutdown().await.unwrap();
        assert!(notifier.notify(notification("late")).await.is_err());
    }

    #[tokio::test]
    async fn plain_transport_builds_without_tls() {
        let config = MailConfig {
            enabled: true,
            security: MailSecurity::None,
            ..MailConfig::default()
        };
        assert!(build_transport(&config).is_ok());
    }
}
