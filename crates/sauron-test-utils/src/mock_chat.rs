// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted chat transport.
//!
//! Each call to [`ScriptedConnector::connect`] consumes the next
//! [`LinkScript`]. A script either refuses the connection or yields a link
//! that replays its steps and then closes or stays silent. Everything the
//! code under test sends back (joins, pings, quits) lands in a shared
//! [`LinkRecord`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use sauron_core::{ChatEvent, ChatLink, Connector, SauronError};
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Step {
    Event(ChatEvent),
    Error(String),
    Delay(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkEnd {
    Close,
    Hold,
}

/// What one connection attempt does.
#[derive(Debug, Clone)]
pub struct LinkScript {
    refuse: bool,
    steps: Vec<Step>,
    end: LinkEnd,
    ping_fails: bool,
}

impl LinkScript {
    /// The connection attempt fails.
    pub fn refuse() -> Self {
        Self {
            refuse: true,
            steps: Vec::new(),
            end: LinkEnd::Close,
            ping_fails: false,
        }
    }

    /// A link that replays no events and then closes.
    pub fn session() -> Self {
        Self {
            refuse: false,
            ..Self::refuse()
        }
    }

    pub fn event(mut self, event: ChatEvent) -> Self {
        self.steps.push(Step::Event(event));
        self
    }

    /// Server welcome under `nickname`.
    pub fn welcome(self, nickname: &str) -> Self {
        self.event(ChatEvent::Registered {
            nickname: nickname.into(),
        })
    }

    pub fn joined(self, channel: &str, nickname: &str) -> Self {
        self.event(ChatEvent::Joined {
            channel: channel.into(),
            nickname: nickname.into(),
        })
    }

    pub fn message(self, sender: &str, target: &str, text: &str) -> Self {
        self.event(ChatEvent::Message {
            sender: sender.into(),
            target: target.into(),
            text: text.into(),
            action: false,
        })
    }

    pub fn action(self, sender: &str, target: &str, text: &str) -> Self {
        self.event(ChatEvent::Message {
            sender: sender.into(),
            target: target.into(),
            text: text.into(),
            action: true,
        })
    }

    /// The next read fails with a transport error.
    pub fn error(mut self, message: &str) -> Self {
        self.steps.push(Step::Error(message.into()));
        self
    }

    /// Pause before the next step.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.steps.push(Step::Delay(delay));
        self
    }

    /// Stay connected and silent once the steps are exhausted.
    pub fn hold(mut self) -> Self {
        self.end = LinkEnd::Hold;
        self
    }

    /// Keepalive pings on this link fail.
    pub fn ping_fails(mut self) -> Self {
        self.ping_fails = true;
        self
    }
}

/// Everything sent through scripted links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRecord {
    pub attempts: usize,
    pub joins: Vec<String>,
    pub pings: usize,
    pub quits: Vec<String>,
}

type SharedRecord = Arc<Mutex<LinkRecord>>;

fn lock(record: &SharedRecord) -> MutexGuard<'_, LinkRecord> {
    record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Nickname reported by links before a welcome arrives.
const INITIAL_NICKNAME: &str = "sauron";

/// Connector replaying scripts in order. Attempts beyond the scripts are refused.
#[derive(Clone)]
pub struct ScriptedConnector {
    scripts: Arc<Mutex<VecDeque<LinkScript>>>,
    record: SharedRecord,
}

impl ScriptedConnector {
    pub fn new(scripts: impl IntoIterator<Item = LinkScript>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            record: SharedRecord::default(),
        }
    }

    pub fn record(&self) -> LinkRecord {
        lock(&self.record).clone()
    }

    pub fn attempts(&self) -> usize {
        lock(&self.record).attempts
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn ChatLink>, SauronError> {
        lock(&self.record).attempts += 1;
        let script = self
            .scripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match script {
            Some(script) if !script.refuse => Ok(Box::new(ScriptedLink {
                steps: script.steps.into(),
                end: script.end,
                ping_fails: script.ping_fails,
                nickname: INITIAL_NICKNAME.to_string(),
                deadline: None,
                record: Arc::clone(&self.record),
            })),
            _ => Err(SauronError::Connection {
                message: "connection refused".into(),
                source: None,
            }),
        }
    }
}

struct ScriptedLink {
    steps: VecDeque<Step>,
    end: LinkEnd,
    ping_fails: bool,
    nickname: String,
    // Survives cancellation of `next_event` mid-delay.
    deadline: Option<Instant>,
    record: SharedRecord,
}

#[async_trait]
impl ChatLink for ScriptedLink {
    async fn next_event(&mut self) -> Result<Option<ChatEvent>, SauronError> {
        loop {
            if let Some(deadline) = self.deadline {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }
            match self.steps.pop_front() {
                Some(Step::Delay(delay)) => self.deadline = Some(Instant::now() + delay),
                Some(Step::Error(message)) => {
                    return Err(SauronError::Connection {
                        message,
                        source: None,
                    });
                }
                Some(Step::Event(event)) => {
                    if let ChatEvent::Registered { nickname } = &event {
                        self.nickname = nickname.clone();
                    }
                    return Ok(Some(event));
                }
                None => match self.end {
                    LinkEnd::Close => return Ok(None),
                    LinkEnd::Hold => std::future::pending::<()>().await,
                },
            }
        }
    }

    fn current_nickname(&self) -> String {
        self.nickname.clone()
    }

    fn join(&self, channel: &str) -> Result<(), SauronError> {
        lock(&self.record).joins.push(channel.to_string());
        Ok(())
    }

    fn ping(&self) -> Result<(), SauronError> {
        lock(&self.record).pings += 1;
        if self.ping_fails {
            return Err(SauronError::Connection {
                message: "broken pipe".into(),
                source: None,
            });
        }
        Ok(())
    }

    fn quit(&self, message: &str) -> Result<(), SauronError> {
        lock(&self.record).quits.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_scripts_in_order() {
        let connector = ScriptedConnector::new([
            LinkScript::refuse(),
            LinkScript::session().welcome("sauron_").joined("#chat", "sauron_"),
        ]);
        assert!(connector.connect().await.is_err());

        let mut link = connector.connect().await.unwrap();
        assert_eq!(
            link.next_event().await.unwrap(),
            Some(ChatEvent::Registered {
                nickname: "sauron_".into()
            })
        );
        assert_eq!(link.current_nickname(), "sauron_");
        assert!(matches!(
            link.next_event().await.unwrap(),
            Some(ChatEvent::Joined { .. })
        ));
        assert_eq!(link.next_event().await.unwrap(), None);

        assert!(connector.connect().await.is_err());
        assert_eq!(connector.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_survives_cancellation() {
        let connector = ScriptedConnector::new([LinkScript::session()
            .delay(Duration::from_secs(10))
            .welcome("sauron")]);
        let mut link = connector.connect().await.unwrap();

        let start = Instant::now();
        let first = tokio::time::timeout(Duration::from_secs(4), link.next_event()).await;
        assert!(first.is_err());
        let event = link.next_event().await.unwrap();
        assert!(matches!(event, Some(ChatEvent::Registered { .. })));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn records_outgoing_commands() {
        let connector = ScriptedConnector::new([LinkScript::session().ping_fails()]);
        let link = connector.connect().await.unwrap();
        link.join("#a").unwrap();
        assert!(link.ping().is_err());
        link.quit("bye").unwrap();

        let record = connector.record();
        assert_eq!(record.joins, vec!["#a"]);
        assert_eq!(record.pings, 1);
        assert_eq!(record.quits, vec!["bye"]);
    }
}
