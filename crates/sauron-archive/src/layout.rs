// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk layout of archived content.
//!
//! `<data_dir>/<channel>/<%Y%m%dT%H%M%S>_<nick>_<url>` is the prefix shared
//! by the two jobs of one URL match. A leading `scheme://` is kept as is and
//! the remaining URL slashes become nested directories. Within each segment
//! `%` and `:` are percent-encoded; empty, `.` and `..` segments become
//! `%2F`, `%2E` and `%2E%2E`. Every input tuple therefore maps to its own
//! directory, and no segment can climb out of the data directory.

use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sauron_core::{escape_component, ChatMessage, CHANNEL_ESCAPES, NICK_ESCAPES};

const DIR_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// `:` is reserved for the scheme separator.
const URL_SEGMENT_ESCAPES: &AsciiSet = &CONTROLS.add(b'%').add(b':');

/// Prefix of the job directories for `url` mentioned in `message`.
pub fn base_path(data_dir: &Path, message: &ChatMessage, url: &str) -> PathBuf {
    let leaf = format!(
        "{}_{}_{}",
        message.received_at.format(DIR_TIMESTAMP_FORMAT),
        escape_component(message.sender_nick(), NICK_ESCAPES),
        url_path(url),
    );
    data_dir
        .join(path_segment(&escape_component(&message.channel, CHANNEL_ESCAPES)))
        .join(leaf)
}

fn url_path(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => (Some(scheme), rest),
        _ => (None, url),
    };
    let path = rest
        .split('/')
        .map(|segment| {
            path_segment(&utf8_percent_encode(segment, URL_SEGMENT_ESCAPES).to_string())
        })
        .collect::<Vec<_>>()
        .join("/");
    match scheme {
        Some(scheme) => format!("{scheme}://{path}"),
        None => path,
    }
}

fn is_scheme(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Replaces segments the filesystem would collapse or resolve.
fn path_segment(encoded: &str) -> String {
    match encoded {
        "" => "%2F".to_string(),
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use std::path::Component;

    fn components(path: &Path) -> Vec<Component<'_>> {
        path.components().collect()
    }

    fn message(sender: &str, channel: &str, secs: i64) -> ChatMessage {
        let at = Utc.timestamp_opt(1_704_067_200 + secs, 0).unwrap();
        ChatMessage::new(sender, channel, "text", at)
    }

    #[test]
    fn follows_channel_timestamp_sender_url_layout() {
        let base = base_path(
            Path::new("/w/data"),
            &message("alice!u@h", "#chat", 0),
            "http://example.com/x",
        );
        assert_eq!(
            base.to_string_lossy(),
            "/w/data/#chat/20240101T000000_alice_http://example.com/x"
        );
    }

    #[test]
    fn dot_segments_cannot_escape_data_dir() {
        let base = base_path(
            Path::new("/w/data"),
            &message("bob", "#chat", 0),
            "example.com/../../../etc",
        );
        assert!(!base.components().any(|c| c == Component::ParentDir));
        assert!(base.starts_with("/w/data/#chat"));
        assert!(base.to_string_lossy().ends_with("example.com/%2E%2E/%2E%2E/%2E%2E/etc"));
    }

    #[test]
    fn encoded_lookalikes_do_not_collide() {
        let msg = message("bob", "#chat", 0);
        let data = Path::new("/w/data");
        let dot = base_path(data, &msg, "a.com/./x");
        let literal = base_path(data, &msg, "a.com/%2E/x");
        assert_ne!(dot, literal);
        assert!(literal.to_string_lossy().ends_with("a.com/%252E/x"));
    }

    #[test]
    fn empty_segments_are_kept_distinct() {
        let msg = message("bob", "#chat", 0);
        let data = Path::new("/w/data");
        let doubled = base_path(data, &msg, "a.com//x");
        let single = base_path(data, &msg, "a.com/x");
        assert_ne!(components(&doubled), components(&single));
        assert!(doubled.to_string_lossy().ends_with("a.com/%2F/x"));
    }

    #[test]
    fn scheme_separator_is_told_apart_from_single_slash() {
        let msg = message("bob", "#chat", 0);
        let data = Path::new("/w/data");
        let schemed = base_path(data, &msg, "http://a.com");
        let slash = base_path(data, &msg, "http:/a.com");
        assert_ne!(components(&schemed), components(&slash));
        assert!(slash.to_string_lossy().ends_with("_http%3A/a.com"));
    }

    #[test]
    fn dot_channel_stays_inside_data_dir() {
        let base = base_path(Path::new("/d"), &message("bob", "..", 0), "x.com");
        assert!(!base.components().any(|c| c == Component::ParentDir));
        assert!(base.starts_with("/d/%2E%2E"));
    }

    #[test]
    fn slash_in_channel_stays_one_component() {
        let base = base_path(Path::new("/d"), &message("bob", "#a/b", 0), "x.com/");
        assert_eq!(base.parent().unwrap().parent(), Some(Path::new("/d")));
    }

    proptest! {
        #[test]
        fn distinct_inputs_give_distinct_dirs(
            a in ("[a-z_%]{1,6}", "#[a-z/%]{1,4}", 0i64..3, "(http://)?[a-z.:/%]{1,8}"),
            b in ("[a-z_%]{1,6}", "#[a-z/%]{1,4}", 0i64..3, "(http://)?[a-z.:/%]{1,8}"),
        ) {
            prop_assume!(a != b);
            let data = Path::new("/data");
            let pa = base_path(data, &message(&a.0, &a.1, a.2), &a.3);
            let pb = base_path(data, &message(&b.0, &b.1, b.2), &b.3);
            prop_assert_ne!(components(&pa), components(&pb));
        }
    }
}
