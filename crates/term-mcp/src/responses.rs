//! Wire-shape response records for tool results that are richer than a bare
//! `term_core` type (composite shapes such as `resize_terminal`,
//! `get_terminal_content`, `screenshot_terminal`, and `get_terminal_buffer`)
//! plus the empty `{}` acknowledgements several tools return.

use serde::Serialize;
use serde_json::Value;
use term_core::{Cursor, Dimensions};

/// The `{}` a void tool call returns (`close_terminal_session`, `send_input`,
/// `send_keys`, `interrupt_command`).
#[derive(Debug, Default, Serialize)]
pub struct EmptyResult {}

/// `resize_terminal` echoes back the dimensions it applied.
#[derive(Debug, Serialize)]
pub struct ResizeResult {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub cols: u16,
    pub rows: u16,
}

/// `get_terminal_content` result.
#[derive(Debug, Serialize)]
pub struct ContentResult {
    pub content: String,
    pub cursor: Cursor,
    pub dimensions: Dimensions,
    /// Reserved; not currently populated. Lets clients written against the
    /// full contract still deserialize cleanly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

/// `screenshot_terminal` result: a base64-encoded image plus its metadata.
#[derive(Debug, Serialize)]
pub struct ScreenshotResult {
    pub screenshot: String,
    pub format: String,
    pub size: usize,
}

/// `get_terminal_buffer` result.
#[derive(Debug, Serialize)]
pub struct BufferResult {
    pub buffer: String,
    #[serde(rename = "lineCount")]
    pub line_count: usize,
    pub truncated: bool,
}
