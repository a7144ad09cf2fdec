//! RPC Dispatch: maps the 13 tool names onto typed `term-core`
//! calls, wrapping every call in the global deadline and `{success, data|error}`
//! envelope via [`crate::error::dispatch`].

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rmcp::model::{CallToolResult, ServerCapabilities, ServerInfo};
use rmcp::{tool, Error as McpError, ServerHandler};
use term_core::{
    ansi, command, keys, render, watcher, CoreError, CoreResult, Dimensions, ImageFormat,
    Supervisor, Theme,
};

use crate::error::{dispatch, parse_session_id, unknown_enum_value};
use crate::lines::{last_n_lines, line_count};
use crate::params::{
    CreateTerminalSessionParams, ExecuteCommandParams, GetTerminalBufferParams,
    GetTerminalContentParams, ResizeTerminalParams, ScreenshotTerminalParams, SendInputParams,
    SendKeysParams, SessionIdParams, WatchTerminalOutputParams,
};
use crate::responses::{BufferResult, ContentResult, EmptyResult, ResizeResult, ScreenshotResult};

/// Default `execute_command`/`watch_terminal_output` timeout (ms) applied
/// when the caller doesn't name one.
const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

/// The MCP-facing terminal automation server: one [`Supervisor`] shared
/// across every tool call, dependency-injected at construction rather than
/// held as a process-wide singleton.
#[derive(Clone)]
pub struct TerminalServer {
    supervisor: Arc<Supervisor>,
}

impl TerminalServer {
    #[must_use]
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self { supervisor }
    }
}

#[tool(tool_box)]
impl TerminalServer {
    #[tool(description = "Create a new PTY-backed terminal session and start its shell.")]
    async fn create_terminal_session(
        &self,
        #[tool(aggr)] params: CreateTerminalSessionParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let opts = term_core::supervisor::CreateOptions {
                cols: params.cols,
                rows: params.rows,
                shell: params.shell,
                cwd: params.working_directory,
                env: Vec::new(),
                title: None,
            };
            supervisor.create(opts).await
        })
        .await
    }

    #[tool(description = "List every currently registered terminal session.")]
    async fn list_terminal_sessions(&self) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move { Ok::<_, CoreError>(supervisor.list().await) }).await
    }

    #[tool(description = "Fetch a single terminal session's metadata by id.")]
    async fn get_terminal_session(
        &self,
        #[tool(aggr)] params: SessionIdParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            Ok(session.info())
        })
        .await
    }

    #[tool(description = "Close a terminal session and release its PTY and child process.")]
    async fn close_terminal_session(
        &self,
        #[tool(aggr)] params: SessionIdParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            supervisor.close(id).await?;
            Ok(EmptyResult::default())
        })
        .await
    }

    #[tool(description = "Resize a terminal session's PTY to new columns/rows.")]
    async fn resize_terminal(
        &self,
        #[tool(aggr)] params: ResizeTerminalParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            session.resize(Dimensions {
                cols: params.cols,
                rows: params.rows,
            })?;
            Ok(ResizeResult {
                session_id: params.session_id,
                cols: params.cols,
                rows: params.rows,
            })
        })
        .await
    }

    #[tool(
        description = "Write a command line to a session and wait for the next prompt or a timeout."
    )]
    async fn execute_command(
        &self,
        #[tool(aggr)] params: ExecuteCommandParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            let timeout = Duration::from_millis(params.timeout.unwrap_or(DEFAULT_TOOL_TIMEOUT_MS));
            let expect_output = params.expect_output.unwrap_or(true);
            command::execute(&session, &params.command, timeout, expect_output).await
        })
        .await
    }

    #[tool(description = "Write raw bytes to a session's PTY verbatim (no newline appended).")]
    async fn send_input(
        &self,
        #[tool(aggr)] params: SendInputParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            session.send_input(params.input.as_bytes())?;
            Ok(EmptyResult::default())
        })
        .await
    }

    #[tool(
        description = "Send a named key (e.g. \"enter\", \"ctrl+c\", \"arrow_up\", \"f5\") to a session."
    )]
    async fn send_keys(
        &self,
        #[tool(aggr)] params: SendKeysParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            let bytes = keys::resolve(&params.keys)?;
            session.send_input(&bytes)?;
            Ok(EmptyResult::default())
        })
        .await
    }

    #[tool(description = "Send Ctrl-C (0x03) to interrupt a session's foreground command.")]
    async fn interrupt_command(
        &self,
        #[tool(aggr)] params: SessionIdParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            command::interrupt(&session)?;
            Ok(EmptyResult::default())
        })
        .await
    }

    #[tool(
        description = "Read a session's buffered terminal content, optionally windowed to the last N lines."
    )]
    async fn get_terminal_content(
        &self,
        #[tool(aggr)] params: GetTerminalContentParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            let state = session.snapshot()?;
            let include_formatting = params.include_formatting.unwrap_or(false);
            let raw = if include_formatting {
                state.content
            } else {
                ansi::strip(&state.content)
            };
            let text = String::from_utf8_lossy(&raw).into_owned();
            let windowed = last_n_lines(&text, params.last_n_lines.unwrap_or(0));
            Ok(ContentResult {
                content: windowed.to_string(),
                cursor: state.cursor,
                dimensions: state.dimensions,
                attributes: None,
            })
        })
        .await
    }

    #[tool(description = "Render a session's current buffer to a PNG or JPEG screenshot.")]
    async fn screenshot_terminal(
        &self,
        #[tool(aggr)] params: ScreenshotTerminalParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            let state = session.snapshot()?;

            let format = parse_format(params.format.as_deref())?;
            let theme = parse_theme(params.theme.as_deref())?;
            let opts = render::RenderOptions {
                format,
                quality: 90,
                font_size: params.font_size.unwrap_or(14),
                theme,
                background: params.background,
            };
            let bytes = render::render(&state.content, state.cursor, state.dimensions, &opts)?;
            let format_name = match format {
                ImageFormat::Png => "png",
                ImageFormat::Jpeg => "jpeg",
            };
            Ok(ScreenshotResult {
                size: bytes.len(),
                screenshot: BASE64.encode(&bytes),
                format: format_name.to_string(),
            })
        })
        .await
    }

    #[tool(description = "Read a session's retained output buffer, optionally capped to N lines.")]
    async fn get_terminal_buffer(
        &self,
        #[tool(aggr)] params: GetTerminalBufferParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            let raw = ansi::strip(&session.full_buffer());
            let text = String::from_utf8_lossy(&raw).into_owned();
            let total_lines = line_count(&text);
            let max_lines = params.max_lines.unwrap_or(0);
            let windowed = last_n_lines(&text, max_lines);
            Ok(BufferResult {
                truncated: max_lines > 0 && max_lines < total_lines,
                line_count: line_count(windowed),
                buffer: windowed.to_string(),
            })
        })
        .await
    }

    #[tool(description = "Poll a session's buffer for a regex match, up to a timeout.")]
    async fn watch_terminal_output(
        &self,
        #[tool(aggr)] params: WatchTerminalOutputParams,
    ) -> Result<CallToolResult, McpError> {
        let supervisor = Arc::clone(&self.supervisor);
        dispatch(async move {
            let id = parse_session_id(&params.session_id)?;
            let session = supervisor.get(id).await?;
            let timeout = Duration::from_millis(params.timeout.unwrap_or(DEFAULT_TOOL_TIMEOUT_MS));
            watcher::watch(&session, &params.pattern, timeout, None).await
        })
        .await
    }
}

fn parse_format(raw: Option<&str>) -> CoreResult<ImageFormat> {
    match raw {
        None => Ok(ImageFormat::default()),
        Some("png") => Ok(ImageFormat::Png),
        Some("jpeg") | Some("jpg") => Ok(ImageFormat::Jpeg),
        Some(other) => Err(unknown_enum_value("format", other)),
    }
}

fn parse_theme(raw: Option<&str>) -> CoreResult<Theme> {
    match raw {
        None => Ok(Theme::default()),
        Some("dark") => Ok(Theme::Dark),
        Some("light") => Ok(Theme::Light),
        Some(other) => Err(unknown_enum_value("theme", other)),
    }
}

#[tool(tool_box)]
impl ServerHandler for TerminalServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Spawn and drive headless PTY terminal sessions: create a session, execute \
                 commands with prompt-detection timeout, watch output for a pattern, and \
                 render screenshots of the current buffer."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_format_defaults_to_png() {
        assert_eq!(parse_format(None).expect("default"), ImageFormat::Png);
    }

    #[test]
    fn parse_format_accepts_jpeg_and_jpg() {
        assert_eq!(parse_format(Some("jpeg")).expect("jpeg"), ImageFormat::Jpeg);
        assert_eq!(parse_format(Some("jpg")).expect("jpg"), ImageFormat::Jpeg);
    }

    #[test]
    fn parse_format_rejects_unknown_value() {
        let err = parse_format(Some("gif")).expect_err("gif must be rejected");
        assert_eq!(err.kind, term_core::ErrorKind::InvalidParameter);
    }

    #[test]
    fn parse_theme_defaults_to_dark() {
        assert_eq!(parse_theme(None).expect("default"), Theme::Dark);
    }

    #[test]
    fn parse_theme_rejects_unknown_value() {
        let err = parse_theme(Some("solarized")).expect_err("must be rejected");
        assert_eq!(err.kind, term_core::ErrorKind::InvalidParameter);
    }
}
