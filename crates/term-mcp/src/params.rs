//! Typed argument records for every tool in the surface, paired with
//! `schemars::JsonSchema` so `rmcp` can publish a schema to clients.
//!
//! Field names are camelCase on the wire even
//! though Rust identifiers are snake_case; `#[serde(rename = "...")]` bridges
//! the two.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema, Default)]
pub struct CreateTerminalSessionParams {
    #[schemars(description = "Terminal width in columns. Defaults to 80.")]
    pub cols: Option<u16>,
    #[schemars(description = "Terminal height in rows. Defaults to 24.")]
    pub rows: Option<u16>,
    #[schemars(description = "Shell executable. Must be on the allow-list. Defaults to the server's configured shell.")]
    pub shell: Option<String>,
    #[serde(rename = "workingDirectory")]
    #[schemars(description = "Initial working directory. Defaults to the server process's cwd.")]
    pub working_directory: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SessionIdParams {
    #[serde(rename = "sessionId")]
    #[schemars(description = "The session to operate on.")]
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResizeTerminalParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[schemars(description = "New width in columns, 1..=1000.")]
    pub cols: u16,
    #[schemars(description = "New height in rows, 1..=1000.")]
    pub rows: u16,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteCommandParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[schemars(description = "Command line to run. A trailing Enter is appended automatically.")]
    pub command: String,
    #[schemars(description = "Milliseconds to wait for a prompt before failing with TIMEOUT_ERROR. Defaults to 30000.")]
    pub timeout: Option<u64>,
    #[serde(rename = "expectOutput")]
    #[schemars(description = "Whether to wait for prompt-detected completion. Defaults to true.")]
    pub expect_output: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SendInputParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[schemars(description = "Raw bytes (as UTF-8 text) to write to the PTY verbatim; no newline is appended.")]
    pub input: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SendKeysParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[schemars(description = "A symbolic key name, e.g. \"enter\", \"ctrl+c\", \"arrow_up\", \"f5\".")]
    pub keys: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTerminalContentParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "lastNLines")]
    #[schemars(description = "If set, return only the trailing N lines of content.")]
    pub last_n_lines: Option<usize>,
    #[serde(rename = "includeFormatting")]
    #[schemars(description = "If true, content keeps ANSI escape sequences instead of being stripped.")]
    pub include_formatting: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ScreenshotTerminalParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[schemars(description = "\"png\" or \"jpeg\". Defaults to \"png\".")]
    pub format: Option<String>,
    #[schemars(description = "\"dark\" or \"light\". Defaults to \"dark\".")]
    pub theme: Option<String>,
    #[serde(rename = "fontSize")]
    #[schemars(description = "Font size in pixels, used for canvas geometry. Defaults to 14.")]
    pub font_size: Option<u32>,
    #[serde(rename = "fontFamily")]
    #[schemars(description = "Accepted for client compatibility; the renderer does not shape glyphs so this has no visible effect.")]
    pub font_family: Option<String>,
    #[schemars(description = "Hex color (#rrggbb) overriding the theme's background.")]
    pub background: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTerminalBufferParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "includeScrollback")]
    #[schemars(description = "Accepted for client compatibility; the buffer is always the retained 64 KiB window.")]
    pub include_scrollback: Option<bool>,
    #[serde(rename = "maxLines")]
    #[schemars(description = "If set, caps the number of lines returned, keeping the most recent ones.")]
    pub max_lines: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WatchTerminalOutputParams {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[schemars(description = "A regular expression matched against the session's buffer. Empty matches immediately.")]
    pub pattern: String,
    #[schemars(description = "Milliseconds to wait for a match before failing with TIMEOUT_ERROR. Defaults to 30000.")]
    pub timeout: Option<u64>,
}
