//! Command Engine: writes a command line and blocks until prompt-detected
//! output or timeout.

use std::time::{Duration, Instant};

use crate::ansi;
use crate::error::{CoreError, CoreResult};
use crate::model::{now_millis, CommandResult};
use crate::prompt;
use crate::session::Session;

/// How often the engine polls the session buffer while waiting for a prompt
/// or a watch pattern.
pub const POLL_PERIOD: Duration = Duration::from_millis(100);

/// Default timeout applied when a caller does not name one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `command` on `session` and wait for prompt-detected completion or
/// `timeout`.
///
/// # Errors
/// `SESSION_NOT_FOUND` if the session is not `Active`; `TIMEOUT_ERROR` if no
/// prompt marker appears before the deadline; `UNKNOWN_ERROR` from the
/// underlying write.
pub async fn execute(
    session: &Session,
    command: &str,
    timeout: Duration,
    expect_output: bool,
) -> CoreResult<CommandResult> {
    // Serializes concurrent Execute calls on this session: the
    // engine queues callers rather than rejecting them.
    let _lane = session.command_lane().lock().await;

    let started = Instant::now();
    let baseline_len = session.buffer_len();

    session.send_input(format!("{command}\r").as_bytes())?;

    if !expect_output {
        return Ok(CommandResult {
            command: command.to_string(),
            output: Vec::new(),
            duration: Duration::ZERO,
            completed_at_ms: now_millis(),
            exit_code: None,
        });
    }

    loop {
        let delta = session.slice_from(baseline_len);
        if prompt_tail_matches(&delta) {
            return Ok(CommandResult {
                command: command.to_string(),
                output: trim_prompt(&delta),
                duration: started.elapsed(),
                completed_at_ms: now_millis(),
                exit_code: None,
            });
        }

        if started.elapsed() >= timeout {
            return Err(CoreError::timeout(
                format!("command '{command}' timed out waiting for a prompt"),
                duration_millis(started.elapsed()),
                duration_millis(timeout),
            ));
        }

        tokio::time::sleep(POLL_PERIOD).await;
    }
}

/// Send `0x03` (SIGINT equivalent at the terminal driver level) to interrupt
/// the foreground command.
///
/// # Errors
/// `SESSION_NOT_FOUND` if the session is not `Active`.
pub fn interrupt(session: &Session) -> CoreResult<()> {
    session.send_input(crate::keys::INTERRUPT)
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn prompt_tail_matches(delta: &[u8]) -> bool {
    let stripped = ansi::strip(delta);
    prompt::matches(&stripped)
}

/// Trim a successful command's delta: ANSI-strip it, drop a trailing prompt
/// marker, and drop trailing whitespace. The returned output never ends
/// with a prompt marker or trailing whitespace.
fn trim_prompt(delta: &[u8]) -> Vec<u8> {
    let mut out = ansi::strip(delta);
    if let Some(start) = prompt::trailing_marker_start(&out) {
        out.truncate(start);
    }
    while matches!(out.last(), Some(b) if b.is_ascii_whitespace()) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimensions;

    async fn spawn_sh() -> std::sync::Arc<Session> {
        Session::spawn("sh", Dimensions::default(), "/", &[], None, None).expect("spawn sh")
    }

    #[tokio::test]
    async fn echo_round_trip_returns_output_without_trailing_prompt() {
        let session = spawn_sh().await;
        let result = execute(&session, "echo hello", Duration::from_secs(5), true)
            .await
            .expect("execute");
        let text = String::from_utf8_lossy(&result.output);
        assert!(text.contains("hello"));
        assert!(!text.trim_end().ends_with("$ "));
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn timeout_fires_when_no_prompt_appears() {
        let session = spawn_sh().await;
        let err = execute(&session, "sleep 2", Duration::from_millis(300), true)
            .await
            .expect_err("must time out");
        assert_eq!(err.kind, crate::error::ErrorKind::TimeoutError);
        assert!(session.is_active());
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn expect_output_false_returns_immediately() {
        let session = spawn_sh().await;
        let result = execute(&session, "echo hi", Duration::from_secs(5), false)
            .await
            .expect("execute");
        assert!(result.output.is_empty());
        assert_eq!(result.duration, Duration::ZERO);
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn trim_prompt_strips_trailing_marker_and_whitespace() {
        let trimmed = trim_prompt(b"hello\r\nuser@host:~$ ");
        assert_eq!(trimmed, b"hello\r\nuser@host:~");
    }
}
