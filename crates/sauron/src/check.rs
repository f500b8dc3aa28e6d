// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sauron check-config` output.

use std::fmt::Write;

use sauron_config::model::{MailSecurity, ReconnectMode};
use sauron_config::SauronConfig;

/// Human-readable summary of a validated configuration. Secrets are omitted.
pub fn summary(config: &SauronConfig) -> String {
    let mut out = String::from("configuration OK\n");
    let irc = &config.irc;
    let _ = writeln!(
        out,
        "irc:       {}@{}:{}{}",
        irc.nickname,
        irc.server,
        irc.port,
        if irc.use_tls { " (tls)" } else { "" }
    );
    let _ = writeln!(out, "channels:  {}", irc.channels.join(", "));

    let reconnect = &config.reconnect;
    let policy = match reconnect.mode {
        ReconnectMode::None => "none".to_string(),
        ReconnectMode::Bounded => format!("bounded, {} retries", reconnect.max_retries),
        ReconnectMode::Unbounded => "unbounded".to_string(),
    };
    let _ = writeln!(out, "reconnect: {policy}");

    let archive = &config.archive;
    let _ = writeln!(
        out,
        "archive:   {} under {} (depth {}/{}, outer delay {}s)",
        archive.fetcher,
        archive.workdir,
        archive.local_depth,
        archive.outer_depth,
        archive.outer_delay_secs
    );

    let mail = &config.mail;
    if mail.enabled {
        let security = match mail.security {
            MailSecurity::None => "plain",
            MailSecurity::Starttls => "starttls",
            MailSecurity::Tls => "tls",
        };
        let _ = writeln!(
            out,
            "mail:      {} -> {} via {}:{} ({security})",
            mail.from,
            mail.recipients.join(", "),
            mail.server,
            mail.port
        );
    } else {
        let _ = writeln!(out, "mail:      disabled");
    }
    out
}
