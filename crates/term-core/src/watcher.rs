//! Output Watcher: polls a session's buffer against a compiled pattern
//! until match or timeout.

use std::time::{Duration, Instant};

use regex::bytes::Regex;
use tokio::sync::watch;

use crate::command::POLL_PERIOD;
use crate::error::{CoreError, CoreResult};
use crate::model::{now_millis, WatchResult};
use crate::session::Session;

/// Watch `session`'s full buffer for `pattern`, polling every
/// [`POLL_PERIOD`] until a match or `timeout` elapses.
///
/// An empty `pattern` succeeds immediately with the current content.
/// `cancel`, if provided, short-circuits the loop at the next tick boundary
/// once it observes a `true` value.
///
/// # Errors
/// `PARSING_ERROR` if `pattern` does not compile; `TIMEOUT_ERROR` if no match
/// appears before the deadline.
pub async fn watch(
    session: &Session,
    pattern: &str,
    timeout: Duration,
    cancel: Option<watch::Receiver<bool>>,
) -> CoreResult<WatchResult> {
    if pattern.is_empty() {
        return Ok(WatchResult {
            matched: true,
            pattern: pattern.to_string(),
            content: session.full_buffer(),
            timestamp_ms: now_millis(),
        });
    }

    let regex = Regex::new(pattern)
        .map_err(|err| CoreError::new(crate::error::ErrorKind::ParsingError, err.to_string()))?;

    let started = Instant::now();
    loop {
        let content = session.full_buffer();
        if regex.is_match(&content) {
            return Ok(WatchResult {
                matched: true,
                pattern: pattern.to_string(),
                content,
                timestamp_ms: now_millis(),
            });
        }

        if let Some(cancel) = &cancel {
            if *cancel.borrow() {
                return Ok(WatchResult {
                    matched: false,
                    pattern: pattern.to_string(),
                    content,
                    timestamp_ms: now_millis(),
                });
            }
        }

        if started.elapsed() >= timeout {
            return Err(CoreError::timeout(
                format!("watch for pattern '{pattern}' timed out"),
                u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ));
        }

        tokio::time::sleep(POLL_PERIOD).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimensions;

    async fn spawn_sh() -> std::sync::Arc<Session> {
        Session::spawn("sh", Dimensions::default(), "/", &[], None, None).expect("spawn sh")
    }

    #[tokio::test]
    async fn empty_pattern_succeeds_immediately() {
        let session = spawn_sh().await;
        let result = watch(&session, "", Duration::from_secs(5), None)
            .await
            .expect("watch");
        assert!(result.matched);
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn matches_pattern_produced_by_a_concurrent_command() {
        let session = spawn_sh().await;
        session
            .send_input(b"printf 'step1\\nREADY\\n'\r")
            .expect("write");
        let result = watch(&session, "READY", Duration::from_secs(5), None)
            .await
            .expect("watch");
        assert!(result.matched);
        assert!(String::from_utf8_lossy(&result.content).contains("READY"));
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn times_out_when_pattern_never_appears() {
        let session = spawn_sh().await;
        let err = watch(&session, "NEVER_APPEARS_XYZ", Duration::from_millis(250), None)
            .await
            .expect_err("must time out");
        assert_eq!(err.kind, crate::error::ErrorKind::TimeoutError);
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn invalid_pattern_is_a_parsing_error() {
        let session = spawn_sh().await;
        let err = watch(&session, "(unterminated", Duration::from_secs(1), None)
            .await
            .expect_err("must fail to compile");
        assert_eq!(err.kind, crate::error::ErrorKind::ParsingError);
        session.close().await.expect("close");
    }
}
