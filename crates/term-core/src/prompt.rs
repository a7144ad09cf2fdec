//! Shell-prompt tail detection, shared by the reader task's prompt-completion
//! log and the Command Engine's poll loop.
//!
//! The marker set is a heuristic: it covers the default `PS1` of the
//! supported shells and nothing more. A customized prompt can defeat it; the
//! poll loop's timeout is the backstop.

use std::sync::OnceLock;

use regex::bytes::Regex;

/// Exact two-byte literal markers, checked before the regex fallback.
const LITERAL_MARKERS: &[&[u8]] = &[b"$ ", b"# ", b"> ", b"% ", "❯ ".as_bytes()];

#[allow(clippy::expect_used)] // pattern is a fixed literal, compiled once
fn fallback_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)\n.*[@$#%>]\s*$").expect("prompt fallback pattern is valid")
    })
}

/// Does `tail` end in something that looks like a shell prompt?
#[must_use]
pub fn matches(tail: &[u8]) -> bool {
    if LITERAL_MARKERS.iter().any(|marker| tail.ends_with(marker)) {
        return true;
    }
    fallback_pattern().is_match(tail)
}

/// If `text` ends with a recognized prompt marker, return the byte offset
/// where that marker begins (so the caller can truncate it off).
#[must_use]
pub fn trailing_marker_start(text: &[u8]) -> Option<usize> {
    if let Some(marker) = LITERAL_MARKERS
        .iter()
        .find(|marker| text.ends_with(marker))
    {
        return Some(text.len() - marker.len());
    }

    let last_match = fallback_pattern().find_iter(text).last()?;
    (last_match.end() == text.len()).then_some(last_match.start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_bash_style_dollar_prompt() {
        assert!(matches(b"user@host:~$ "));
    }

    #[test]
    fn matches_root_style_hash_prompt() {
        assert!(matches(b"root@host:/# "));
    }

    #[test]
    fn matches_powerlevel_style_arrow_prompt() {
        assert!(matches("❯ ".as_bytes()));
    }

    #[test]
    fn does_not_match_plain_program_output() {
        assert!(!matches(b"hello world\n"));
    }

    #[test]
    fn matches_via_regex_fallback_for_embedded_newline() {
        assert!(matches(b"step1\nuser@host% "));
    }

    #[test]
    fn trailing_marker_start_finds_literal_marker() {
        let text = b"hello\r\nuser@host:~$ ";
        let start = trailing_marker_start(text).expect("marker present");
        assert_eq!(text.get(start..), Some(b"$ ".as_slice()));
    }

    #[test]
    fn trailing_marker_start_is_none_without_a_trailing_prompt() {
        assert_eq!(trailing_marker_start(b"hello world\n"), None);
    }
}
