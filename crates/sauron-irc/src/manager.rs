// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The connection manager event loop.
//!
//! One task owns the link, the channel logger, and the orchestrator, and
//! multiplexes link events, the heartbeat, job completions, and shutdown
//! with `tokio::select!`. Losing the link resets the session, closes the
//! channel logs, and consults the [`ReconnectPolicy`]. Job completions keep
//! being drained while the manager waits to reconnect.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sauron_archive::{JobEvent, Orchestrator};
use sauron_chanlog::ChannelLogger;
use sauron_config::model::IrcConfig;
use sauron_core::{
    normalize_channel, ChatEvent, ChatLink, ChatMessage, ConnectionState, Connector, SauronError,
};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::policy::ReconnectPolicy;
use crate::session::Session;

/// How long QUIT gets to reach the server before the link is dropped.
const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Connection behavior that does not depend on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Nickname requested at registration.
    pub nickname: String,
    pub channels: Vec<String>,
    pub heartbeat: Duration,
    pub quit_message: String,
}

impl ManagerSettings {
    pub fn from_config(config: &IrcConfig) -> Self {
        Self {
            nickname: config.nickname.clone(),
            channels: config.channels.clone(),
            heartbeat: Duration::from_secs(config.heartbeat_secs),
            quit_message: config.quit_message.clone(),
        }
    }
}

enum SessionEnd {
    Cancelled,
    Lost(SauronError),
}

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    settings: ManagerSettings,
    logger: ChannelLogger,
    orchestrator: Orchestrator,
    job_events: mpsc::UnboundedReceiver<JobEvent>,
    session: Session,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
        settings: ManagerSettings,
        logger: ChannelLogger,
        orchestrator: Orchestrator,
        job_events: mpsc::UnboundedReceiver<JobEvent>,
    ) -> Self {
        Self {
            connector,
            policy,
            settings,
            logger,
            orchestrator,
            job_events,
            session: Session::new(),
        }
    }

    /// Observes connection state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.session.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Runs until `cancel` fires or the reconnect policy gives up.
    ///
    /// Returns `Ok(())` on cancellation. With [`ReconnectPolicy::None`] the
    /// error that ended the first session is returned; an exhausted bounded
    /// policy yields [`SauronError::RetriesExhausted`].
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), SauronError> {
        let mut failures: u32 = 0;
        loop {
            self.session.set_state(ConnectionState::Connecting);
            info!(attempt = failures + 1, "connecting");
            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.end_session();
                    return Ok(());
                }
                result = self.connector.connect() => result,
            };

            let end = match connected {
                Ok(link) => {
                    self.session.set_state(ConnectionState::Handshaking);
                    self.drive(link, &cancel).await
                }
                Err(e) => SessionEnd::Lost(e),
            };
            let error = match end {
                SessionEnd::Cancelled => {
                    self.end_session();
                    info!("connection manager stopped");
                    return Ok(());
                }
                SessionEnd::Lost(error) => error,
            };

            if self.session.registered() {
                failures = 0;
            }
            self.end_session();
            failures = failures.saturating_add(1);
            warn!(error = %error, failures, "connection lost");

            let Some(delay) = self.policy.next_delay(failures) else {
                return Err(match self.policy {
                    ReconnectPolicy::None => error,
                    _ => SauronError::RetriesExhausted {
                        attempts: failures - 1,
                    },
                });
            };
            info!(delay_ms = delay.as_millis() as u64, "reconnecting after delay");
            if !self.wait(delay, &cancel).await {
                info!("connection manager stopped");
                return Ok(());
            }
        }
    }

    /// Sleeps for `delay` while still handling job completions.
    /// Returns `false` if cancelled.
    async fn wait(&mut self, delay: Duration, cancel: &CancellationToken) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                Some(event) = self.job_events.recv() => {
                    self.orchestrator.handle_event(event, &mut self.logger).await;
                }
            }
        }
    }

    async fn drive(
        &mut self,
        mut link: Box<dyn ChatLink>,
        cancel: &CancellationToken,
    ) -> SessionEnd {
        let period = self.settings.heartbeat;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.quit(link.as_mut()).await;
                    return SessionEnd::Cancelled;
                }
                event = link.next_event() => match event {
                    Ok(Some(event)) => {
                        if let Err(e) = self.handle_chat_event(event, link.as_ref()) {
                            return SessionEnd::Lost(e);
                        }
                    }
                    Ok(None) => {
                        return SessionEnd::Lost(SauronError::Connection {
                            message: "server closed the connection".into(),
                            source: None,
                        });
                    }
                    Err(e) => return SessionEnd::Lost(e),
                },
                _ = heartbeat.tick() => {
                    if let Err(e) = link.ping() {
                        return SessionEnd::Lost(e);
                    }
                    debug!("heartbeat sent");
                }
                Some(event) = self.job_events.recv() => {
                    self.orchestrator.handle_event(event, &mut self.logger).await;
                }
            }
        }
    }

    /// Sends QUIT and gives the transport a moment to flush it.
    async fn quit(&mut self, link: &mut dyn ChatLink) {
        if let Err(e) = link.quit(&self.settings.quit_message) {
            warn!(error = %e, "failed to send QUIT");
            return;
        }
        let flush = async {
            while let Ok(Some(_)) = link.next_event().await {}
        };
        if tokio::time::timeout(QUIT_GRACE, flush).await.is_err() {
            debug!("server did not close the link after QUIT");
        }
    }

    fn handle_chat_event(
        &mut self,
        event: ChatEvent,
        link: &dyn ChatLink,
    ) -> Result<(), SauronError> {
        match event {
            ChatEvent::Registered { nickname } => {
                if !nickname.eq_ignore_ascii_case(&self.settings.nickname) {
                    warn!(
                        requested = %self.settings.nickname,
                        assigned = %nickname,
                        "registered under alternative nickname"
                    );
                }
                info!(nickname = %nickname, "registered");
                self.session.register(&nickname);
                for channel in &self.settings.channels {
                    link.join(channel)?;
                }
            }
            ChatEvent::Joined { channel, nickname } => {
                let channel = normalize_channel(&channel);
                if !nickname.eq_ignore_ascii_case(&link.current_nickname()) {
                    debug!(channel = %channel, nickname = %nickname, "user joined");
                    return Ok(());
                }
                if !self.session.mark_joined(&channel) {
                    return Ok(());
                }
                if let Err(e) = self.logger.open(&channel) {
                    warn!(channel = %channel, error = %e, "cannot open channel log");
                    return Ok(());
                }
                info!(channel = %channel, "joined");
                self.log(&channel, &format!("[{nickname} has joined {channel}]"));
            }
            ChatEvent::Message {
                sender,
                target,
                text,
                action,
            } => {
                if !self.session.is_joined(&target) {
                    debug!(sender = %sender, target = %target, "ignoring private message");
                    return Ok(());
                }
                let mut message = ChatMessage::new(sender, &target, text, Utc::now());
                message.action = action;
                self.dispatch(&message);
            }
            ChatEvent::NicknameInUse { nickname } => {
                warn!(nickname = %nickname, "nickname in use, trying an alternative");
            }
            ChatEvent::Other => {}
        }
        Ok(())
    }

    /// Logs a channel message, then logs and schedules every URL in it.
    fn dispatch(&mut self, message: &ChatMessage) {
        self.log(&message.channel, &message.log_line());
        for url in sauron_extract::extract(&message.text) {
            info!(channel = %message.channel, url = %url.url, "url detected");
            self.log(&message.channel, &format!("url {} found in message", url.url));
            self.orchestrator.schedule(&mut self.logger, message, &url);
        }
    }

    fn log(&mut self, channel: &str, line: &str) {
        if let Err(e) = self.logger.log(channel, line) {
            warn!(channel = %channel, error = %e, "channel log write failed");
        }
    }

    fn end_session(&mut self) {
        self.logger.close();
        self.session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sauron_archive::ArchiveSettings;
    use sauron_test_utils::{LinkScript, RecordingNotifier, ScriptedConnector, ScriptedRunner};
    use tracing_test::traced_test;

    fn manager(workdir: &std::path::Path, connector: ScriptedConnector) -> ConnectionManager {
        let settings = ArchiveSettings {
            data_dir: workdir.join("data"),
            outer_delay: Duration::from_secs(3),
            recipients: Vec::new(),
            attach_transcript: false,
        };
        let (orchestrator, job_events) = Orchestrator::new(
            settings,
            Arc::new(ScriptedRunner::exiting(0)),
            Arc::new(RecordingNotifier::new()),
        );
        ConnectionManager::new(
            Arc::new(connector),
            ReconnectPolicy::None,
            ManagerSettings {
                nickname: "sauron".into(),
                channels: vec!["#chat".into(), "#ops".into()],
                heartbeat: Duration::from_secs(45),
                quit_message: "bye".into(),
            },
            ChannelLogger::new(workdir.join("logs")).unwrap(),
            orchestrator,
            job_events,
        )
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn alternative_nickname_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let connector = ScriptedConnector::new([LinkScript::session()
            .event(ChatEvent::NicknameInUse {
                nickname: "sauron".into(),
            })
            .welcome("sauron_")
            .joined("#chat", "sauron_")
            .hold()]);
        let mut manager = manager(dir.path(), connector.clone());
        let mut state = manager.subscribe();
        let cancel = CancellationToken::new();
        // Same task as the test so the captured logs carry the test span.
        let stopper = async {
            state
                .wait_for(|s| *s == ConnectionState::Joined)
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(manager.run(cancel.clone()), stopper);
        result.unwrap();

        assert!(logs_contain("registered under alternative nickname"));
        assert!(logs_contain("nickname in use"));
        assert_eq!(connector.record().joins, vec!["#chat", "#ops"]);
        assert_eq!(manager.session().nickname(), None);
        let log = std::fs::read_to_string(dir.path().join("logs/#chat.log")).unwrap();
        assert!(log.trim_end().ends_with("| [sauron_ has joined #chat]"));
        // Never acknowledged, so never opened.
        assert!(!dir.path().join("logs/#ops.log").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_waiting_to_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(dir.path(), ScriptedConnector::new(Vec::new()));
        manager.policy = ReconnectPolicy::Unbounded {
            backoff: crate::policy::Backoff {
                initial: Duration::from_secs(600),
                max: Duration::from_secs(600),
                factor: 1.0,
                jitter: 0.0,
            },
        };
        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                cancel.cancel();
            })
        };
        let start = Instant::now();
        manager.run(cancel).await.unwrap();
        canceller.await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
