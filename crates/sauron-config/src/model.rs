// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the sauron channel archiver.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level sauron configuration.
///
/// Every section is optional and falls back to defaults, except that
/// validation requires at least one channel in `[irc]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SauronConfig {
    /// Process log settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Chat network connection and identity.
    #[serde(default)]
    pub irc: IrcConfig,

    /// What to do when the connection drops.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Where and how detected URLs are mirrored.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Operator email notifications.
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat network settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IrcConfig {
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub use_tls: bool,

    /// Requested nickname.
    #[serde(default = "default_nickname")]
    pub nickname: String,

    /// Nicknames tried in order when `nickname` is taken.
    #[serde(default)]
    pub alt_nicks: Vec<String>,

    #[serde(default = "default_realname")]
    pub realname: String,

    /// Username sent in USER. Defaults to the nickname.
    #[serde(default)]
    pub username: Option<String>,

    /// Server password (PASS).
    #[serde(default)]
    pub password: Option<String>,

    /// Channels joined after every successful handshake.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Seconds between keepalive PINGs.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Seconds without a PONG before the link is considered dead.
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,

    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            use_tls: true,
            nickname: default_nickname(),
            alt_nicks: Vec::new(),
            realname: default_realname(),
            username: None,
            password: None,
            channels: Vec::new(),
            heartbeat_secs: default_heartbeat_secs(),
            ping_timeout_secs: default_ping_timeout_secs(),
            quit_message: default_quit_message(),
        }
    }
}

fn default_server() -> String {
    "irc.libera.chat".to_string()
}

fn default_port() -> u16 {
    6697
}

fn default_true() -> bool {
    true
}

fn default_nickname() -> String {
    "sauron".to_string()
}

fn default_realname() -> String {
    "The eye of Sauron".to_string()
}

fn default_heartbeat_secs() -> u64 {
    45
}

fn default_ping_timeout_secs() -> u64 {
    20
}

fn default_quit_message() -> String {
    "The eye closes".to_string()
}

/// Reconnect strategy after a lost or failed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectMode {
    /// Give up after the first disconnect; a restart is required.
    None,
    /// Retry up to `max_retries` consecutive times.
    Bounded,
    /// Retry forever.
    Unbounded,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    #[serde(default = "default_reconnect_mode")]
    pub mode: ReconnectMode,

    /// Consecutive failed attempts allowed in `bounded` mode.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in seconds.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,

    /// Upper bound on the delay, in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,

    /// Growth factor applied to the delay after each failed attempt.
    #[serde(default = "default_factor")]
    pub factor: f64,

    /// Relative random spread applied to each delay (0 disables).
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            mode: default_reconnect_mode(),
            max_retries: default_max_retries(),
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            factor: default_factor(),
            jitter: default_jitter(),
        }
    }
}

fn default_reconnect_mode() -> ReconnectMode {
    ReconnectMode::Unbounded
}

fn default_max_retries() -> u32 {
    10
}

fn default_initial_delay_secs() -> f64 {
    1.0
}

fn default_max_delay_secs() -> f64 {
    3600.0
}

fn default_factor() -> f64 {
    std::f64::consts::E
}

fn default_jitter() -> f64 {
    0.119
}

/// Archival download settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Root holding `data/` (mirrors) and `logs/` (channel logs).
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Fetcher executable.
    #[serde(default = "default_fetcher")]
    pub fetcher: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Recursion depth of the same-host scan.
    #[serde(default = "default_local_depth")]
    pub local_depth: u32,

    /// Recursion depth of the cross-host scan.
    #[serde(default = "default_outer_depth")]
    pub outer_depth: u32,

    /// Base politeness delay between requests, in seconds.
    #[serde(default = "default_wait_secs")]
    pub wait_secs: f64,

    /// Delay before the cross-host scan starts, in seconds.
    #[serde(default = "default_outer_delay_secs")]
    pub outer_delay_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            fetcher: default_fetcher(),
            user_agent: default_user_agent(),
            local_depth: default_local_depth(),
            outer_depth: default_outer_depth(),
            wait_secs: default_wait_secs(),
            outer_delay_secs: default_outer_delay_secs(),
        }
    }
}

fn default_workdir() -> String {
    ".".to_string()
}

fn default_fetcher() -> String {
    "wget".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 6.3; rv:36.0) Gecko/20100101 Firefox/36.0".to_string()
}

fn default_local_depth() -> u32 {
    10
}

fn default_outer_depth() -> u32 {
    3
}

fn default_wait_secs() -> f64 {
    0.5
}

fn default_outer_delay_secs() -> u64 {
    3
}

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailSecurity {
    /// Plain SMTP. Only sensible for a local relay.
    None,
    /// Upgrade with STARTTLS after connecting.
    Starttls,
    /// Implicit TLS from the first byte.
    Tls,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// Disabled means notifications are accepted and discarded.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_mail_from")]
    pub from: String,

    #[serde(default)]
    pub recipients: Vec<String>,

    #[serde(default = "default_mail_server")]
    pub server: String,

    #[serde(default = "default_mail_port")]
    pub port: u16,

    #[serde(default = "default_mail_security")]
    pub security: MailSecurity,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Attach the fetcher transcript to each notification.
    #[serde(default)]
    pub attach_transcript: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from: default_mail_from(),
            recipients: Vec::new(),
            server: default_mail_server(),
            port: default_mail_port(),
            security: default_mail_security(),
            username: None,
            password: None,
            attach_transcript: false,
        }
    }
}

fn default_mail_from() -> String {
    "sauron@localhost".to_string()
}

fn default_mail_server() -> String {
    "127.0.0.1".to_string()
}

fn default_mail_port() -> u16 {
    25
}

fn default_mail_security() -> MailSecurity {
    MailSecurity::Starttls
}
