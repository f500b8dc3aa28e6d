// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production chat transport over the `irc` crate.

use async_trait::async_trait;
use futures::StreamExt;
use irc::client::prelude::{Client, Command, Config, Message, Response};
use irc::client::ClientStream;
use sauron_config::model::IrcConfig;
use sauron_core::{ChatEvent, ChatLink, Connector, SauronError};
use tracing::debug;

/// Opens IRC connections from `[irc]` settings.
pub struct IrcConnector {
    config: IrcConfig,
}

impl IrcConnector {
    pub fn new(config: IrcConfig) -> Self {
        Self { config }
    }

    fn client_config(&self) -> Config {
        let c = &self.config;
        let ping_time = u32::try_from(c.heartbeat_secs).unwrap_or(u32::MAX);
        let ping_timeout = u32::try_from(c.ping_timeout_secs).unwrap_or(u32::MAX);
        Config {
            nickname: Some(c.nickname.clone()),
            alt_nicks: alternative_nicks(c),
            username: Some(c.username.clone().unwrap_or_else(|| c.nickname.clone())),
            realname: Some(c.realname.clone()),
            password: c.password.clone(),
            server: Some(c.server.clone()),
            port: Some(c.port),
            use_tls: Some(c.use_tls),
            ping_time: Some(ping_time),
            ping_timeout: Some(ping_timeout),
            ..Config::default()
        }
    }
}

/// Configured alternatives, or `nick_`, `nick__`, `nick___` when none are set.
///
/// The client gives up on a 433 once the list is exhausted.
fn alternative_nicks(config: &IrcConfig) -> Vec<String> {
    if !config.alt_nicks.is_empty() {
        return config.alt_nicks.clone();
    }
    (1..=3)
        .map(|n| format!("{}{}", config.nickname, "_".repeat(n)))
        .collect()
}

#[async_trait]
impl Connector for IrcConnector {
    async fn connect(&self) -> Result<Box<dyn ChatLink>, SauronError> {
        debug!(
            server = %self.config.server,
            port = self.config.port,
            tls = self.config.use_tls,
            "opening irc connection"
        );
        let mut client = Client::from_config(self.client_config())
            .await
            .map_err(|e| {
                SauronError::connection(format!("cannot reach {}", self.config.server), e)
            })?;
        client
            .identify()
            .map_err(|e| SauronError::connection("registration failed", e))?;
        let stream = client
            .stream()
            .map_err(|e| SauronError::connection("irc stream unavailable", e))?;
        Ok(Box::new(IrcLink {
            client,
            stream,
            server: self.config.server.clone(),
        }))
    }
}

struct IrcLink {
    client: Client,
    stream: ClientStream,
    server: String,
}

#[async_trait]
impl ChatLink for IrcLink {
    async fn next_event(&mut self) -> Result<Option<ChatEvent>, SauronError> {
        match self.stream.next().await {
            None => Ok(None),
            Some(Err(e)) => Err(SauronError::connection("irc connection failed", e)),
            Some(Ok(message)) => Ok(Some(translate(&message, self.client.current_nickname()))),
        }
    }

    fn current_nickname(&self) -> String {
        self.client.current_nickname().to_string()
    }

    fn join(&self, channel: &str) -> Result<(), SauronError> {
        self.client
            .send_join(channel)
            .map_err(|e| SauronError::connection(format!("cannot join {channel}"), e))
    }

    fn ping(&self) -> Result<(), SauronError> {
        self.client
            .send(Command::PING(self.server.clone(), None))
            .map_err(|e| SauronError::connection("heartbeat failed", e))
    }

    fn quit(&self, message: &str) -> Result<(), SauronError> {
        self.client
            .send_quit(message)
            .map_err(|e| SauronError::connection("cannot send QUIT", e))
    }
}

const CTCP_ACTION: &str = "\u{1}ACTION ";

/// Maps a protocol message to the events the manager cares about.
fn translate(message: &Message, current_nick: &str) -> ChatEvent {
    match &message.command {
        Command::Response(Response::RPL_WELCOME, args) => ChatEvent::Registered {
            nickname: args
                .first()
                .cloned()
                .unwrap_or_else(|| current_nick.to_string()),
        },
        Command::Response(Response::ERR_NICKNAMEINUSE, args) => ChatEvent::NicknameInUse {
            nickname: args.get(1).cloned().unwrap_or_default(),
        },
        Command::JOIN(channel, _, _) => ChatEvent::Joined {
            channel: channel.clone(),
            nickname: message.source_nickname().unwrap_or_default().to_string(),
        },
        Command::PRIVMSG(target, text) => {
            let (text, action) = match text.strip_prefix(CTCP_ACTION) {
                Some(rest) => (rest.trim_end_matches('\u{1}').to_string(), true),
                None => (text.clone(), false),
            };
            ChatEvent::Message {
                sender: message
                    .prefix
                    .as_ref()
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                target: target.clone(),
                text,
                action,
            }
        }
        _ => ChatEvent::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Message {
        line.parse().unwrap()
    }

    #[test]
    fn welcome_carries_assigned_nickname() {
        let welcome = parse(":irc.example 001 sauron_ :Welcome to the network\r\n");
        let event = translate(&welcome, "sauron");
        assert_eq!(
            event,
            ChatEvent::Registered {
                nickname: "sauron_".into()
            }
        );
    }

    #[test]
    fn channel_message_keeps_full_sender() {
        let line = ":alice!u@h PRIVMSG #chat :check this http://example.com/x out\r\n";
        let event = translate(&parse(line), "sauron");
        assert_eq!(
            event,
            ChatEvent::Message {
                sender: "alice!u@h".into(),
                target: "#chat".into(),
                text: "check this http://example.com/x out".into(),
                action: false,
            }
        );
    }

    #[test]
    fn ctcp_action_is_unwrapped() {
        let line = ":bob!u@h PRIVMSG #chat :\u{1}ACTION waves at example.com/hi\u{1}\r\n";
        let event = translate(&parse(line), "sauron");
        let ChatEvent::Message { text, action, .. } = event else {
            panic!("expected a message");
        };
        assert!(action);
        assert_eq!(text, "waves at example.com/hi");
    }

    #[test]
    fn join_and_nick_collision() {
        let event = translate(&parse(":sauron!s@h JOIN #chat\r\n"), "sauron");
        assert_eq!(
            event,
            ChatEvent::Joined {
                channel: "#chat".into(),
                nickname: "sauron".into()
            }
        );
        let collision = parse(":irc.example 433 * sauron :Nickname is already in use\r\n");
        let event = translate(&collision, "sauron");
        assert_eq!(
            event,
            ChatEvent::NicknameInUse {
                nickname: "sauron".into()
            }
        );
        assert_eq!(translate(&parse("PING :irc.example\r\n"), "sauron"), ChatEvent::Other);
    }

    #[test]
    fn client_config_maps_settings() {
        let connector = IrcConnector::new(IrcConfig {
            alt_nicks: vec!["sauron_".into()],
            ..IrcConfig::default()
        });
        let config = connector.client_config();
        assert_eq!(config.nickname.as_deref(), Some("sauron"));
        assert_eq!(config.username.as_deref(), Some("sauron"));
        assert_eq!(config.alt_nicks, vec!["sauron_"]);
        assert_eq!(config.ping_time, Some(45));
        assert_eq!(config.use_tls, Some(true));
    }

    #[test]
    fn alternative_nicks_are_derived_when_unset() {
        let connector = IrcConnector::new(IrcConfig::default());
        let config = connector.client_config();
        assert_eq!(config.alt_nicks, vec!["sauron_", "sauron__", "sauron___"]);
    }
}
