//! ANSI escape sequence stripping.
//!
//! Removes, in order, CSI sequences, OSC sequences, DCS/APC/PM/SOS string
//! sequences, any remaining two-byte escape, and the low control-character
//! range. The order matters: the multi-byte sequences must be consumed whole
//! before the generic two-byte catch-all runs, or a payload's interior bytes
//! leak into the stripped output as literal text.

const BEL: u8 = 0x07;
const ESC: u8 = 0x1B;

/// Strip ANSI/VT escape sequences and control characters from `input`.
///
/// Idempotent: `strip(&strip(x)) == strip(x)` for all `x`.
#[must_use]
pub fn strip(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while let Some(&byte) = input.get(i) {
        if byte == ESC {
            i = skip_escape(input, i);
            continue;
        }
        if is_control_byte(byte) {
            i += 1;
            continue;
        }
        out.push(byte);
        i += 1;
    }
    out
}

fn skip_escape(input: &[u8], i: usize) -> usize {
    match input.get(i + 1) {
        Some(b'[') => skip_csi(input, i),
        Some(b']') => skip_osc(input, i),
        Some(b'P' | b'X' | b'^' | b'_') => skip_string_sequence(input, i),
        Some(_) => i + 2,
        None => i + 1, // trailing lone ESC, drop it
    }
}

/// `ESC [ <0-9;>* <letter>`. A run that never reaches an ASCII letter is
/// treated as malformed: only the introducer is dropped so the remainder is
/// rescanned as plain text.
fn skip_csi(input: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while matches!(input.get(j), Some(b) if b.is_ascii_digit() || *b == b';') {
        j += 1;
    }
    match input.get(j) {
        Some(b) if b.is_ascii_alphabetic() => j + 1,
        _ => j.min(input.len()),
    }
}

/// `ESC ] <payload> BEL`.
fn skip_osc(input: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while matches!(input.get(j), Some(b) if *b != BEL) {
        j += 1;
    }
    if input.get(j).is_some() {
        j + 1
    } else {
        j
    }
}

/// `ESC (P|X|^|_) <payload> ESC \` (string terminator).
fn skip_string_sequence(input: &[u8], i: usize) -> usize {
    let mut j = i + 2;
    while j + 1 < input.len() {
        if input.get(j) == Some(&ESC) && input.get(j + 1) == Some(&b'\\') {
            return j + 2;
        }
        j += 1;
    }
    input.len()
}

fn is_control_byte(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_csi_sequence() {
        let stripped = strip(b"\x1b[1mBold\x1b[0m plain");
        assert_eq!(stripped, b"Bold plain");
    }

    #[test]
    fn strips_osc_sequence_terminated_by_bel() {
        let stripped = strip(b"\x1b]0;window title\x07visible");
        assert_eq!(stripped, b"visible");
    }

    #[test]
    fn strips_dcs_string_sequence() {
        let mut input = b"before\x1bPsome dcs payload".to_vec();
        input.extend_from_slice(b"\x1b\\after");
        let stripped = strip(&input);
        assert_eq!(stripped, b"beforeafter");
    }

    #[test]
    fn strips_generic_two_byte_escape() {
        let stripped = strip(b"a\x1bMb");
        assert_eq!(stripped, b"ab");
    }

    #[test]
    fn strips_control_characters_but_keeps_newline_tab_and_cr() {
        let stripped = strip(b"a\x00\x01b\tc\nd\re\x7f");
        assert_eq!(stripped, b"ab\tc\nd\re");
    }

    #[test]
    fn preserves_prompt_markers() {
        let stripped = strip(b"\x1b[32muser@host\x1b[0m:~$ ");
        assert_eq!(stripped, b"user@host:~$ ");
    }

    #[test]
    fn idempotent_on_curated_inputs() {
        let samples: &[&[u8]] = &[
            b"",
            b"plain text",
            b"\x1b[1;31mred bold\x1b[0m",
            b"\x1b]2;title\x07rest",
            b"\x1b[?25h",
            b"\x1b[999",
            b"trailing esc\x1b",
            b"\x07\x1b\x00mixed\x1b[m",
        ];
        for sample in samples {
            let once = strip(sample);
            let twice = strip(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn idempotent_on_pseudo_random_bytes() {
        // Deterministic xorshift PRNG; no external fuzzing crate needed for
        // this focused property check.
        let mut state: u32 = 0x9e37_79b9;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        for _ in 0..200 {
            let len = (next() % 64) as usize;
            let bytes: Vec<u8> = (0..len).map(|_| (next() % 256) as u8).collect();
            let once = strip(&bytes);
            let twice = strip(&once);
            assert_eq!(once, twice, "not idempotent for {bytes:?}");
        }
    }

    #[test]
    fn stripped_output_never_contains_control_bytes() {
        let mut state: u32 = 12345;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        for _ in 0..200 {
            let len = (next() % 64) as usize;
            let bytes: Vec<u8> = (0..len).map(|_| (next() % 256) as u8).collect();
            let stripped = strip(&bytes);
            for byte in stripped {
                assert!(!is_control_byte(byte) && byte != ESC);
            }
        }
    }
}
