// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: non-empty identities, channel
//! name syntax, sane backoff parameters, and complete mail settings.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{ReconnectMode, SauronConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing on the first one.
pub fn validate_config(config: &SauronConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    // irc
    if config.irc.server.trim().is_empty() {
        invalid("irc.server must not be empty".to_string());
    }
    for (key, nick) in std::iter::once(("irc.nickname", &config.irc.nickname))
        .chain(config.irc.alt_nicks.iter().map(|n| ("irc.alt_nicks", n)))
    {
        if nick.is_empty() || nick.contains(char::is_whitespace) {
            invalid(format!("{key} `{nick}` must be non-empty and contain no spaces"));
        }
    }
    if config.irc.channels.is_empty() {
        invalid("irc.channels must list at least one channel".to_string());
    }
    let mut seen = HashSet::new();
    for channel in &config.irc.channels {
        let name = channel.trim();
        if !(name.starts_with('#') || name.starts_with('&'))
            || name.len() < 2
            || name.contains([' ', ',', '\u{7}'])
        {
            invalid(format!("irc.channels entry `{channel}` is not a valid channel name"));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            invalid(format!("duplicate channel `{channel}` in irc.channels"));
        }
    }
    if config.irc.heartbeat_secs == 0 {
        invalid("irc.heartbeat_secs must be at least 1".to_string());
    }
    if config.irc.ping_timeout_secs == 0 {
        invalid("irc.ping_timeout_secs must be at least 1".to_string());
    }

    // reconnect
    let reconnect = &config.reconnect;
    if reconnect.mode == ReconnectMode::Bounded && reconnect.max_retries == 0 {
        invalid("reconnect.max_retries must be at least 1 in bounded mode".to_string());
    }
    if !(reconnect.initial_delay_secs >= 0.0) {
        invalid(format!(
            "reconnect.initial_delay_secs must be non-negative, got {}",
            reconnect.initial_delay_secs
        ));
    }
    if !(reconnect.max_delay_secs >= reconnect.initial_delay_secs) {
        invalid(format!(
            "reconnect.max_delay_secs ({}) must not be below initial_delay_secs ({})",
            reconnect.max_delay_secs, reconnect.initial_delay_secs
        ));
    }
    if !(reconnect.factor >= 1.0) {
        invalid(format!(
            "reconnect.factor must be at least 1.0, got {}",
            reconnect.factor
        ));
    }
    if !(0.0..1.0).contains(&reconnect.jitter) {
        invalid(format!(
            "reconnect.jitter must be in [0, 1), got {}",
            reconnect.jitter
        ));
    }

    // archive
    let archive = &config.archive;
    if archive.workdir.trim().is_empty() {
        invalid("archive.workdir must not be empty".to_string());
    }
    if archive.fetcher.trim().is_empty() {
        invalid("archive.fetcher must not be empty".to_string());
    }
    if archive.local_depth == 0 || archive.outer_depth == 0 {
        invalid("archive.local_depth and archive.outer_depth must be at least 1".to_string());
    }
    if !(archive.wait_secs >= 0.0) {
        invalid(format!(
            "archive.wait_secs must be non-negative, got {}",
            archive.wait_secs
        ));
    }

    // mail
    let mail = &config.mail;
    if mail.enabled {
        if mail.recipients.is_empty() {
            invalid("mail.recipients must not be empty when mail is enabled".to_string());
        }
        for address in std::iter::once(&mail.from).chain(&mail.recipients) {
            if !looks_like_address(address) {
                invalid(format!("mail address `{address}` is not a valid email address"));
            }
        }
        if mail.server.trim().is_empty() {
            invalid("mail.server must not be empty when mail is enabled".to_string());
        }
    }
    if mail.username.is_some() != mail.password.is_some() {
        invalid("mail.username and mail.password must be set together".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn looks_like_address(address: &str) -> bool {
    match address.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
