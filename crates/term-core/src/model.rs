//! Shared data types returned across the core's public API.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Terminal dimensions in columns and rows. Default is 80x24.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub cols: u16,
    pub rows: u16,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

/// Minimum and maximum accepted values for `resize`.
pub const MIN_DIMENSION: u16 = 1;
pub const MAX_DIMENSION: u16 = 1000;

/// Best-effort cursor position. The Session runs no VT state machine, so
/// this is always `(0, 0, visible=true)` today (a placeholder, not a bug).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: u16,
    pub y: u16,
    pub visible: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            visible: true,
        }
    }
}

/// Lifecycle state of a [`crate::session::Session`]. Transitions are one-way:
/// `Creating -> Active -> Closing -> Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Creating,
    Active,
    Closing,
    Closed,
}

/// Milliseconds since the Unix epoch, used for all timestamp fields in the
/// public API. Monotonic wall-clock ordering is not guaranteed across
/// processes, only within one; that is sufficient for `lastActivity`.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| {
            let millis = d.as_millis();
            u64::try_from(millis).unwrap_or(u64::MAX)
        })
        .unwrap_or(0)
}

/// Public snapshot of a session's metadata, returned by `create`, `get`, and
/// `list`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub pid: u32,
    pub dimensions: Dimensions,
    pub shell: String,
    pub cwd: String,
    pub title: Option<String>,
    pub state: SessionState,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
}

/// Result of `execute_command`. `exit_code` is always `None`: a bare
/// PTY does not yield a per-command exit status without mutating shell state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandResult {
    pub command: String,
    #[serde(with = "bytes_as_lossy_string")]
    pub output: Vec<u8>,
    #[serde(with = "duration_as_millis")]
    pub duration: Duration,
    #[serde(rename = "completedAt")]
    pub completed_at_ms: u64,
    #[serde(rename = "exitCode")]
    pub exit_code: Option<i32>,
}

/// Snapshot of a session's observable terminal state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerminalState {
    #[serde(with = "bytes_as_lossy_string")]
    pub content: Vec<u8>,
    pub cursor: Cursor,
    pub dimensions: Dimensions,
}

/// Result of `watch_terminal_output`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchResult {
    pub matched: bool,
    pub pattern: String,
    #[serde(with = "bytes_as_lossy_string")]
    pub content: Vec<u8>,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

/// Image formats supported by the screenshot renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::Png
    }
}

/// Color theme for the screenshot renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Dark,
    Light,
}

impl Default for Theme {
    fn default() -> Self {
        Self::Dark
    }
}

/// Serde helper: the wire contract's `duration` field is a plain
/// millisecond count, not `serde`'s default `{secs, nanos}` representation.
mod duration_as_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Serde helper: PTY buffers are raw bytes (may not be valid UTF-8 mid-escape
/// sequence); the wire format is a lossy string, matching how MCP/JSON expects
/// textual content.
mod bytes_as_lossy_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.into_bytes())
    }
}
