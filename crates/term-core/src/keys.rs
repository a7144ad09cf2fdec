//! Symbolic key name to byte sequence mapping.
//!
//! Backs the `send_keys` tool: a caller names a key (`"enter"`, `"ctrl+c"`,
//! `"arrow_up"`, `"f5"`, ...) from this closed set and the server writes the
//! corresponding bytes to the session's PTY.

use crate::error::CoreError;

/// Resolve a symbolic key name to the raw bytes to write to the PTY.
///
/// # Errors
/// Returns `INVALID_PARAMETER` if `name` is not one of the recognized keys.
pub fn resolve(name: &str) -> Result<Vec<u8>, CoreError> {
    let bytes: &[u8] = match name {
        "enter" => b"\r",
        "tab" => b"\t",
        "space" => b" ",
        "backspace" => b"\x08",
        "delete" => b"\x7f",
        "escape" => b"\x1b",
        "ctrl+c" => b"\x03",
        "ctrl+d" => b"\x04",
        "ctrl+z" => b"\x1a",
        "ctrl+l" => b"\x0c",
        "arrow_up" => b"\x1b[A",
        "arrow_down" => b"\x1b[B",
        "arrow_right" => b"\x1b[C",
        "arrow_left" => b"\x1b[D",
        "home" => b"\x1b[H",
        "end" => b"\x1b[F",
        "page_up" => b"\x1b[5~",
        "page_down" => b"\x1b[6~",
        "f1" => b"\x1bOP",
        "f2" => b"\x1bOQ",
        "f3" => b"\x1bOR",
        "f4" => b"\x1bOS",
        "f5" => b"\x1b[15~",
        "f6" => b"\x1b[17~",
        "f7" => b"\x1b[18~",
        "f8" => b"\x1b[19~",
        "f9" => b"\x1b[20~",
        "f10" => b"\x1b[21~",
        "f11" => b"\x1b[23~",
        "f12" => b"\x1b[24~",
        other => {
            return Err(CoreError::invalid_parameter(format!(
                "unrecognized key name '{other}'"
            )))
        }
    };
    Ok(bytes.to_vec())
}

/// Byte sequence for `interrupt_command`: equivalent to sending `0x03`.
pub const INTERRUPT: &[u8] = b"\x03";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_maps_to_carriage_return() {
        assert_eq!(resolve("enter").expect("known key"), b"\r");
    }

    #[test]
    fn ctrl_c_maps_to_0x03() {
        assert_eq!(resolve("ctrl+c").expect("known key"), vec![0x03]);
    }

    #[test]
    fn arrow_keys_map_to_csi_sequences() {
        assert_eq!(resolve("arrow_up").expect("known key"), b"\x1b[A");
        assert_eq!(resolve("arrow_down").expect("known key"), b"\x1b[B");
        assert_eq!(resolve("arrow_right").expect("known key"), b"\x1b[C");
        assert_eq!(resolve("arrow_left").expect("known key"), b"\x1b[D");
    }

    #[test]
    fn function_keys_f1_to_f4_use_ss3() {
        assert_eq!(resolve("f1").expect("known key"), b"\x1bOP");
        assert_eq!(resolve("f4").expect("known key"), b"\x1bOS");
    }

    #[test]
    fn function_keys_f5_to_f12_use_csi_tilde() {
        assert_eq!(resolve("f5").expect("known key"), b"\x1b[15~");
        assert_eq!(resolve("f12").expect("known key"), b"\x1b[24~");
    }

    #[test]
    fn unknown_key_is_invalid_parameter() {
        let err = resolve("super+tab").expect_err("unknown key must fail");
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidParameter);
    }
}
