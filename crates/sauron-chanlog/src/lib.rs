// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only per-channel event logs.
//!
//! [`ChannelLogger`] owns one open file per joined channel under
//! `<workdir>/logs/<channel>.log`. Every line is timestamped and flushed as
//! soon as it is written. Files are released by [`ChannelLogger::close`] or
//! when the logger is dropped, whichever comes first.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sauron_core::{escape_component, normalize_channel, SauronError, CHANNEL_ESCAPES};
use tracing::{debug, info};

const TIMESTAMP_FORMAT: &str = "[%m/%d/%y %H:%M:%S]";

struct ChannelLog {
    path: PathBuf,
    file: File,
}

/// Owns the log destinations of the current session.
pub struct ChannelLogger {
    log_dir: PathBuf,
    logs: HashMap<String, ChannelLog>,
}

impl ChannelLogger {
    /// Creates a logger writing under `log_dir`, creating the directory if needed.
    ///
    /// No channel file is opened until [`open`](Self::open) is called.
    pub fn new(log_dir: impl Into<PathBuf>) -> Result<Self, SauronError> {
        let log_dir = log_dir.into();
        std::fs::create_dir_all(&log_dir).map_err(|e| {
            SauronError::io(format!("creating log directory {}", log_dir.display()), e)
        })?;
        Ok(Self {
            log_dir,
            logs: HashMap::new(),
        })
    }

    /// Opens (or returns the already open) log for `channel`.
    pub fn open(&mut self, channel: &str) -> Result<&Path, SauronError> {
        let log = match self.logs.entry(normalize_channel(channel)) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = self.log_dir.join(format!("{}.log", file_stem(entry.key())));
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| SauronError::io(format!("opening {}", path.display()), e))?;
                info!(channel = %entry.key(), path = %path.display(), "channel log opened");
                entry.insert(ChannelLog { path, file })
            }
        };
        Ok(&log.path)
    }

    /// Appends one timestamped line to the log of `channel`.
    pub fn log(&mut self, channel: &str, message: &str) -> Result<(), SauronError> {
        self.log_at(channel, message, Utc::now())
    }

    /// Like [`log`](Self::log) with an explicit timestamp.
    pub fn log_at(
        &mut self,
        channel: &str,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SauronError> {
        let key = normalize_channel(channel);
        let log = self
            .logs
            .get_mut(&key)
            .ok_or_else(|| SauronError::ChannelNotOpen(key.clone()))?;

        // One event per line, whatever the message contains.
        let single_line = message.replace(['\r', '\n'], " ");
        let line = format!("{}| {}\n", at.format(TIMESTAMP_FORMAT), single_line);
        log.file
            .write_all(line.as_bytes())
            .and_then(|()| log.file.flush())
            .map_err(|e| SauronError::io(format!("writing {}", log.path.display()), e))
    }

    pub fn is_open(&self, channel: &str) -> bool {
        self.logs.contains_key(&normalize_channel(channel))
    }

    /// Normalized names of all channels with an open log, sorted.
    pub fn open_channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.logs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Releases every open destination. Safe to call repeatedly.
    pub fn close(&mut self) {
        for (channel, mut log) in self.logs.drain() {
            if let Err(e) = log.file.flush() {
                debug!(channel = %channel, error = %e, "flush on close failed");
            }
            debug!(channel = %channel, "channel log closed");
        }
    }
}

impl Drop for ChannelLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// File stem for a channel; `/` would otherwise escape the log directory.
fn file_stem(channel: &str) -> String {
    escape_component(channel, CHANNEL_ESCAPES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn writes_timestamped_lines_to_channel_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChannelLogger::new(dir.path().join("logs")).unwrap();
        logger.open("#Chat").unwrap();

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 13, 5, 9).unwrap();
        logger.log_at("#chat", "[sauron has joined #chat]", at).unwrap();
        logger.log_at("#CHAT", "alice: hi", at).unwrap();

        let content = read(&dir.path().join("logs/#chat.log"));
        assert_eq!(
            content,
            "[01/01/24 13:05:09]| [sauron has joined #chat]\n[01/01/24 13:05:09]| alice: hi\n"
        );
    }

    #[test]
    fn lines_are_visible_without_closing() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChannelLogger::new(dir.path()).unwrap();
        logger.open("#a").unwrap();
        for i in 0..5 {
            logger.log("#a", &format!("line {i}")).unwrap();
        }
        assert_eq!(read(&dir.path().join("#a.log")).lines().count(), 5);
    }

    #[test]
    fn logging_to_unopened_channel_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChannelLogger::new(dir.path()).unwrap();
        let err = logger.log("#nope", "x").unwrap_err();
        assert!(matches!(err, SauronError::ChannelNotOpen(c) if c == "#nope"));
    }

    #[test]
    fn open_is_idempotent_and_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut logger = ChannelLogger::new(dir.path()).unwrap();
            logger.open("#a").unwrap();
            logger.open("#A").unwrap();
            assert_eq!(logger.open_channels(), vec!["#a"]);
            logger.log("#a", "first").unwrap();
        }
        let mut logger = ChannelLogger::new(dir.path()).unwrap();
        logger.open("#a").unwrap();
        logger.log("#a", "second").unwrap();

        let content = read(&dir.path().join("#a.log"));
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().last().unwrap().ends_with("| second"));
    }

    #[test]
    fn close_releases_all_and_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChannelLogger::new(dir.path()).unwrap();
        logger.open("#a").unwrap();
        logger.open("#b").unwrap();
        logger.close();
        assert!(logger.open_channels().is_empty());
        logger.close();
        assert!(!logger.is_open("#a"));
    }

    #[test]
    fn close_with_no_joined_channels_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChannelLogger::new(dir.path()).unwrap();
        logger.close();
    }

    #[test]
    fn multiline_messages_stay_on_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChannelLogger::new(dir.path()).unwrap();
        logger.open("#a").unwrap();
        logger.log("#a", "one\ntwo\r\nthree").unwrap();
        assert_eq!(read(&dir.path().join("#a.log")).lines().count(), 1);
    }

    #[test]
    fn slash_in_channel_name_stays_inside_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChannelLogger::new(dir.path()).unwrap();
        let path = logger.open("#a/../b").unwrap().to_path_buf();
        assert_eq!(path.parent(), Some(dir.path()));
    }
}
