//! Line-windowing helpers for `get_terminal_content`/`get_terminal_buffer`
//! both accept a "last N lines" cap that this module applies uniformly
//! after the ANSI stripper has already run.

/// Keep only the trailing `n` lines of `text`, split on `\n`. `n == 0` or
/// `n >= ` the line count returns `text` unchanged.
#[must_use]
pub fn last_n_lines(text: &str, n: usize) -> &str {
    if n == 0 {
        return text;
    }
    let mut newline_positions = text.rmatch_indices('\n').map(|(i, _)| i);
    let mut boundary = None;
    for _ in 0..n {
        match newline_positions.next() {
            Some(pos) => boundary = Some(pos),
            None => return text,
        }
    }
    match boundary {
        Some(pos) => text.get(pos + 1..).unwrap_or(text),
        None => text,
    }
}

/// Number of lines `text` contains, counting a trailing partial line without
/// a final `\n`.
#[must_use]
pub fn line_count(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let newlines = text.matches('\n').count();
    if text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_all_lines_when_n_exceeds_count() {
        assert_eq!(last_n_lines("a\nb\nc", 10), "a\nb\nc");
    }

    #[test]
    fn keeps_trailing_n_lines() {
        assert_eq!(last_n_lines("a\nb\nc\nd", 2), "c\nd");
    }

    #[test]
    fn zero_means_unbounded() {
        assert_eq!(last_n_lines("a\nb\nc", 0), "a\nb\nc");
    }

    #[test]
    fn line_count_handles_trailing_newline() {
        assert_eq!(line_count("a\nb\n"), 2);
        assert_eq!(line_count("a\nb"), 2);
        assert_eq!(line_count(""), 0);
    }
}
