// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./sauron.toml` > `~/.config/sauron/sauron.toml` >
//! `/etc/sauron/sauron.toml`, with `SAURON_*` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SauronConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/sauron/sauron.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sauron.toml";

/// Per-user configuration file, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sauron").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/sauron/sauron.toml`
/// 3. `~/.config/sauron/sauron.toml`
/// 4. `./sauron.toml`
/// 5. `SAURON_*` environment variables
pub fn load_config() -> Result<SauronConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SauronConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SauronConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
///
/// Unlike the hierarchy lookup, a missing file is an error here.
pub fn load_config_from_path(path: &Path) -> Result<SauronConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SauronConfig::default()))
        .merge(Toml::file_exact(path))
        .merge(env_provider())
        .extract()
}

/// The figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SauronConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Maps `SAURON_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after the section name is a separator, so
/// `SAURON_IRC_HEARTBEAT_SECS` becomes `irc.heartbeat_secs`.
fn env_provider() -> Env {
    Env::prefixed("SAURON_").map(|key| {
        let key_str = key.as_str();
        let mapped = ["log", "irc", "reconnect", "archive", "mail"]
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}
