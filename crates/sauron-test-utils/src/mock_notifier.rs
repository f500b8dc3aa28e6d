// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier capturing notifications for assertions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sauron_core::{Notification, Notifier, SauronError};
use tokio::sync::{Mutex, Notify};

/// Records every notification instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
    arrived: Arc<Notify>,
    shut_down: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far, in arrival order.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.received.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.received.lock().await.len()
    }

    /// Waits until at least `n` notifications arrived or `timeout` elapses.
    /// Returns whether the count was reached.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let arrived = self.arrived.notified();
                if self.count().await >= n {
                    return;
                }
                arrived.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    pub async fn was_shut_down(&self) -> bool {
        *self.shut_down.lock().await
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, notification: Notification) -> Result<(), SauronError> {
        self.received.lock().await.push(notification);
        self.arrived.notify_waiters();
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SauronError> {
        *self.shut_down.lock().await = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(subject: &str) -> Notification {
        Notification {
            recipients: Vec::new(),
            subject: subject.into(),
            body: String::new(),
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn records_in_order_and_wakes_waiters() {
        let notifier = RecordingNotifier::new();
        let waiter = {
            let notifier = notifier.clone();
            tokio::spawn(async move { notifier.wait_for(2, Duration::from_secs(5)).await })
        };
        notifier.notify(notification("a")).await.unwrap();
        notifier.notify(notification("b")).await.unwrap();
        assert!(waiter.await.unwrap());

        let subjects: Vec<String> = notifier
            .notifications()
            .await
            .into_iter()
            .map(|n| n.subject)
            .collect();
        assert_eq!(subjects, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_times_out() {
        let notifier = RecordingNotifier::new();
        assert!(!notifier.wait_for(1, Duration::from_secs(1)).await);
    }
}
