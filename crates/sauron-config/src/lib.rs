// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the sauron channel archiver.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), a file hierarchy lookup, `SAURON_*` environment
//! overrides, and miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use sauron_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("joining {:?}", config.irc.channels);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SauronConfig;

/// Load configuration and validate it.
///
/// With `path` set, only that file (plus env overrides) is read; otherwise
/// the standard hierarchy is used. Returns every problem found.
pub fn load_and_validate(path: Option<&Path>) -> Result<SauronConfig, Vec<ConfigError>> {
    let loaded = match path {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(path),
        )),
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<SauronConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Reads the TOML files that may have contributed to the config, for error spans.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let mut candidates = Vec::new();
    match explicit {
        Some(path) => candidates.push(path.to_path_buf()),
        None => {
            candidates.push(loader::SYSTEM_CONFIG_PATH.into());
            candidates.extend(loader::user_config_path());
            if let Ok(cwd) = std::env::current_dir() {
                candidates.push(cwd.join(loader::LOCAL_CONFIG_FILE));
            }
        }
    }

    candidates
        .into_iter()
        .filter_map(|path| {
            // figment records files by absolute path
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
