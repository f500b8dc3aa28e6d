// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! URL detection in chat message text.
//!
//! [`extract`] makes one left-to-right pass over a message and returns every
//! URL-like substring in order of occurrence. Two kinds are recognized:
//! 1. **Schemed**: `http://`, `https://`, `ftp://`, `ftps://` followed by a host.
//! 2. **Bare**: `host.tld` forms, accepted when they carry a path, a port,
//!    a `www.` prefix, or a well-known top-level domain.
//!
//! Repeated URLs are reported once per occurrence.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use sauron_core::UrlMatch;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)",
        r"(?P<schemed>\b(?:https?|ftps?)://[^\s<>`]+)",
        r"|",
        r"(?P<bare>\b(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?P<tld>[a-z]{2,63})\b",
        r"(?P<port>:\d{1,5})?(?P<path>/[^\s<>`]*)?)",
    ))
    .expect("URL pattern is a valid regex")
});

/// Top-level domains accepted for bare `host.tld` mentions without a path.
const COMMON_TLDS: &[&str] = &[
    "com", "org", "net", "edu", "gov", "mil", "int", "info", "biz", "io", "dev", "app", "co",
    "me", "tv", "eu", "uk", "de", "fr", "pl", "nl", "ru", "us", "ca", "au", "jp", "cn", "ch",
    "se", "no", "fi", "it", "es", "cz", "at", "be", "br", "in",
];

/// Returns every URL occurrence in `text`, left to right.
pub fn extract(text: &str) -> Vec<UrlMatch> {
    URL_PATTERN
        .captures_iter(text)
        .filter_map(|caps| to_match(text, &caps))
        .collect()
}

fn to_match(text: &str, caps: &Captures<'_>) -> Option<UrlMatch> {
    if let Some(m) = caps.name("schemed") {
        let url = trim_trailing(m.as_str());
        let (_, rest) = url.split_once("://")?;
        if rest.is_empty() {
            return None;
        }
        return Some(UrlMatch {
            span: m.range(),
            matched: m.as_str().to_string(),
            url: url.to_string(),
        });
    }

    let m = caps.name("bare")?;
    if is_email_part(text, m.start(), m.end()) {
        return None;
    }
    let tld = caps.name("tld")?.as_str().to_ascii_lowercase();
    let host_is_www = m.as_str().get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www."));
    let accepted = caps.name("path").is_some()
        || caps.name("port").is_some()
        || host_is_www
        || COMMON_TLDS.contains(&tld.as_str());
    if !accepted {
        return None;
    }

    Some(UrlMatch {
        span: m.range(),
        matched: m.as_str().to_string(),
        url: trim_trailing(m.as_str()).to_string(),
    })
}

/// A bare host glued to `@` is the domain of an email address.
fn is_email_part(text: &str, start: usize, end: usize) -> bool {
    text[..start].ends_with('@') || text[end..].starts_with('@')
}

/// Strips sentence punctuation and unbalanced closing brackets from the end.
fn trim_trailing(raw: &str) -> &str {
    let mut end = raw.len();
    while let Some(last) = raw[..end].chars().next_back() {
        let head = &raw[..end];
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' => true,
            ')' => unbalanced(head, '(', ')'),
            ']' => unbalanced(head, '[', ']'),
            '}' => unbalanced(head, '{', '}'),
            _ => false,
        };
        if !strip {
            break;
        }
        end -= last.len_utf8();
    }
    &raw[..end]
}

fn unbalanced(s: &str, open: char, close: char) -> bool {
    s.matches(close).count() > s.matches(open).count()
}
