//! Session: one PTY, its rolling output buffer, and its metadata.

use std::io::Write;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use portable_pty::{Child, MasterPty};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::ids::SessionId;
use crate::model::{
    now_millis, Cursor, Dimensions, SessionInfo, SessionState as Lifecycle, TerminalState,
    MAX_DIMENSION, MIN_DIMENSION,
};
use crate::prompt;
use crate::pty;

/// Default soft cap on a session's output buffer. Once exceeded, the
/// earliest half is discarded; absolute offsets remain monotonic, so callers
/// must treat them as opaque rather than stable indices into a fixed-size
/// array.
pub const HISTORY_MAX: usize = 64 * 1024;

static HISTORY_MAX_OVERRIDE: std::sync::OnceLock<usize> = std::sync::OnceLock::new();

/// Override [`HISTORY_MAX`] for the process, e.g. from the `--history-max-bytes`
/// startup flag. Must be called before any session is spawned; later calls
/// are ignored.
pub fn set_history_max(bytes: usize) {
    let _ = HISTORY_MAX_OVERRIDE.set(bytes);
}

fn history_max() -> usize {
    HISTORY_MAX_OVERRIDE.get().copied().unwrap_or(HISTORY_MAX)
}

/// Grace period the Supervisor waits after a successful spawn.
pub const SPAWN_GRACE: Duration = Duration::from_millis(100);

struct Shared {
    buffer: Vec<u8>,
    /// Monotonic count of bytes discarded from the front of `buffer` so far;
    /// lets callers translate an old absolute offset into a current index.
    discarded: usize,
    prompt_log: Vec<u8>,
    last_activity_ms: u64,
    title: Option<String>,
    lifecycle: Lifecycle,
    dimensions: Dimensions,
}

/// A PTY-backed shell session: owned PTY handle, child process, reader task,
/// and output buffer, guarded by per-field locks.
pub struct Session {
    id: SessionId,
    pid: u32,
    shell: String,
    cwd: String,
    created_at_ms: u64,
    shared: StdMutex<Shared>,
    writer: StdMutex<Box<dyn Write + Send>>,
    master: StdMutex<Box<dyn MasterPty + Send>>,
    child: StdMutex<Box<dyn Child + Send + Sync>>,
    /// Serializes `Execute` calls on this session: not reentrant.
    /// Concurrent Execute calls are queued, not rejected.
    command_lane: AsyncMutex<()>,
    reader_handle: StdMutex<Option<JoinHandle<()>>>,
    /// Fired by the reader task when the shell exits on its own, so whoever
    /// registered this session (the Supervisor) can drop it and reap the
    /// child without waiting for an explicit `close`.
    on_exit: Option<tokio::sync::mpsc::UnboundedSender<SessionId>>,
}

impl Session {
    /// Spawn a new session: opens a PTY, starts the shell, and launches the
    /// background reader task.
    ///
    /// # Errors
    /// Propagates [`pty::spawn`]'s errors (`INVALID_SHELL`, I/O failures).
    pub fn spawn(
        shell: &str,
        dimensions: Dimensions,
        cwd: &str,
        env: &[(String, String)],
        title: Option<String>,
        on_exit: Option<tokio::sync::mpsc::UnboundedSender<SessionId>>,
    ) -> CoreResult<std::sync::Arc<Self>> {
        let process = pty::spawn(shell, dimensions, Some(cwd), env)?;
        let now = now_millis();

        let session = std::sync::Arc::new(Self {
            id: SessionId::new(),
            pid: process.pid,
            shell: shell.to_string(),
            cwd: cwd.to_string(),
            created_at_ms: now,
            shared: StdMutex::new(Shared {
                buffer: Vec::new(),
                discarded: 0,
                prompt_log: Vec::new(),
                last_activity_ms: now,
                title,
                lifecycle: Lifecycle::Active,
                dimensions,
            }),
            writer: StdMutex::new(process.writer),
            master: StdMutex::new(process.master),
            child: StdMutex::new(process.child),
            command_lane: AsyncMutex::new(()),
            reader_handle: StdMutex::new(None),
            on_exit,
        });

        let reader_session = std::sync::Arc::clone(&session);
        let handle = tokio::task::spawn_blocking(move || reader_loop(&reader_session, process.reader));
        *session
            .reader_handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(handle);

        tracing::info!(session_id = %session.id, pid = session.pid, shell = %session.shell, "session spawned");
        Ok(session)
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    fn lock_shared(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Access to the per-session command serialization lock used by the
    /// Command Engine.
    pub(crate) fn command_lane(&self) -> &AsyncMutex<()> {
        &self.command_lane
    }

    #[must_use]
    pub fn info(&self) -> SessionInfo {
        let shared = self.lock_shared();
        SessionInfo {
            id: self.id,
            pid: self.pid,
            dimensions: shared.dimensions,
            shell: self.shell.clone(),
            cwd: self.cwd.clone(),
            title: shared.title.clone(),
            state: shared.lifecycle,
            created_at_ms: self.created_at_ms,
            last_activity_ms: shared.last_activity_ms,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.lock_shared().lifecycle, Lifecycle::Active)
    }

    /// Current length of the live buffer, for baselining in `Execute`/`Watch`.
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        let shared = self.lock_shared();
        shared.discarded + shared.buffer.len()
    }

    /// Bytes from absolute offset `from` to the current end of the buffer.
    /// `from` values that fall before the earliest retained byte are clamped,
    /// since discarded history cannot be recovered; callers must treat
    /// offsets as opaque.
    #[must_use]
    pub fn slice_from(&self, from: usize) -> Vec<u8> {
        let shared = self.lock_shared();
        let relative = from.saturating_sub(shared.discarded).min(shared.buffer.len());
        shared.buffer.get(relative..).unwrap_or_default().to_vec()
    }

    #[must_use]
    pub fn full_buffer(&self) -> Vec<u8> {
        self.lock_shared().buffer.clone()
    }

    pub fn set_title(&self, title: Option<String>) {
        self.lock_shared().title = title;
    }

    /// Write `bytes` to the PTY.
    ///
    /// # Errors
    /// `SESSION_NOT_FOUND` if the session is not `Active`; `UNKNOWN_ERROR` if
    /// the underlying write fails.
    pub fn send_input(&self, bytes: &[u8]) -> CoreResult<()> {
        self.ensure_active()?;
        {
            let mut writer = self
                .writer
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            writer
                .write_all(bytes)
                .map_err(|err| CoreError::from_io("failed to write to pty", &err))?;
            writer
                .flush()
                .map_err(|err| CoreError::from_io("failed to flush pty", &err))?;
        }
        self.lock_shared().last_activity_ms = now_millis();
        Ok(())
    }

    /// Validate and apply a resize: `cols`/`rows` in `[1, 1000]`.
    ///
    /// # Errors
    /// `INVALID_PARAMETER` if out of range; `SESSION_NOT_FOUND` if not
    /// `Active`; `UNKNOWN_ERROR` if the kernel resize call fails.
    pub fn resize(&self, dimensions: Dimensions) -> CoreResult<()> {
        self.ensure_active()?;
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&dimensions.cols)
            || !(MIN_DIMENSION..=MAX_DIMENSION).contains(&dimensions.rows)
        {
            return Err(CoreError::invalid_parameter(format!(
                "dimensions must be within [{MIN_DIMENSION}, {MAX_DIMENSION}], got {}x{}",
                dimensions.cols, dimensions.rows
            )));
        }
        {
            let mut master = self
                .master
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            pty::resize(master.as_mut(), dimensions)?;
        }
        self.lock_shared().dimensions = dimensions;
        Ok(())
    }

    /// Snapshot the session's observable terminal state.
    ///
    /// # Errors
    /// `SESSION_NOT_FOUND` if the session is not `Active`.
    pub fn snapshot(&self) -> CoreResult<TerminalState> {
        self.ensure_active()?;
        let shared = self.lock_shared();
        Ok(TerminalState {
            content: shared.buffer.clone(),
            cursor: Cursor::default(),
            dimensions: shared.dimensions,
        })
    }

    fn ensure_active(&self) -> CoreResult<()> {
        if matches!(self.lock_shared().lifecycle, Lifecycle::Active) {
            Ok(())
        } else {
            Err(CoreError::session_not_found(self.id))
        }
    }

    /// Close the session: idempotent. Kills the child process group, joins
    /// the reader task, and transitions to `Closed`.
    ///
    /// # Errors
    /// `UNKNOWN_ERROR` if signaling or waiting on the child fails.
    pub async fn close(&self) -> CoreResult<()> {
        {
            let mut shared = self.lock_shared();
            if matches!(shared.lifecycle, Lifecycle::Closing | Lifecycle::Closed) {
                return Ok(());
            }
            shared.lifecycle = Lifecycle::Closing;
        }

        let kill_result = {
            let mut child = self
                .child
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            kill_child(child.as_mut())
        };

        let handle = self
            .reader_handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.lock_shared().lifecycle = Lifecycle::Closed;
        kill_result
    }
}

#[cfg(unix)]
fn kill_child(child: &mut (dyn Child + Send + Sync)) -> CoreResult<()> {
    pty::kill(child, Duration::from_millis(500))
}

#[cfg(not(unix))]
fn kill_child(child: &mut (dyn Child + Send + Sync)) -> CoreResult<()> {
    child
        .kill()
        .map_err(|err| CoreError::from_io("failed to kill child", &err))
}

/// Runs on a blocking task for the lifetime of the session: reads PTY chunks,
/// appends them to the buffer under the session lock, detects prompt tails,
/// and enforces the history cap. Terminates on EOF or read error,
/// transitioning the session to `Closed`, reaping the child, and notifying
/// `on_exit` so a registered Supervisor drops its entry.
fn reader_loop(session: &Session, mut reader: Box<dyn std::io::Read + Send>) {
    let mut chunk = [0_u8; 4096];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(count) => {
                let bytes = chunk.get(..count).unwrap_or(&[]);
                let mut shared = session.lock_shared();
                shared.buffer.extend_from_slice(bytes);
                shared.last_activity_ms = now_millis();

                if bytes.contains(&b'\n') && prompt::matches(bytes) {
                    shared.prompt_log.extend_from_slice(bytes);
                }

                if shared.buffer.len() > history_max() {
                    let drop_len = shared.buffer.len() / 2;
                    shared.buffer.drain(0..drop_len);
                    shared.discarded += drop_len;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }

    {
        let mut shared = session.lock_shared();
        if matches!(shared.lifecycle, Lifecycle::Active) {
            shared.lifecycle = Lifecycle::Closed;
        }
    }

    // The PTY read side closes when the shell itself has exited, so the
    // child is already gone; reap it here so it doesn't linger as a zombie
    // until some later explicit `close`.
    {
        let mut child = session
            .child
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = child.try_wait();
    }

    tracing::info!(session_id = %session.id, "reader task exited, session closed");

    if let Some(tx) = &session.on_exit {
        let _ = tx.send(session.id);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("shell", &self.shell)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_sh() -> std::sync::Arc<Session> {
        Session::spawn("sh", Dimensions::default(), "/", &[], None, None).expect("spawn sh")
    }

    #[tokio::test]
    async fn spawn_creates_active_session() {
        let session = spawn_sh();
        assert_eq!(session.info().state, Lifecycle::Active);
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn send_input_updates_last_activity() {
        let session = spawn_sh();
        let before = session.info().last_activity_ms;
        session.send_input(b"echo hi\r").expect("write");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(session.info().last_activity_ms >= before);
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn resize_rejects_out_of_range_dimensions() {
        let session = spawn_sh();
        let err = session
            .resize(Dimensions { cols: 0, rows: 24 })
            .expect_err("zero cols must be rejected");
        assert_eq!(err.kind, ErrorKind::InvalidParameter);
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn resize_echoes_dimensions() {
        let session = spawn_sh();
        session
            .resize(Dimensions { cols: 100, rows: 40 })
            .expect("resize");
        let info = session.info();
        assert_eq!(info.dimensions.cols, 100);
        assert_eq!(info.dimensions.rows, 40);
        session.close().await.expect("close");
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let session = spawn_sh();
        session.close().await.expect("first close");
        session.close().await.expect("second close is a no-op");
        assert_eq!(session.info().state, Lifecycle::Closed);
    }

    #[tokio::test]
    async fn operations_on_closed_session_fail_session_not_found() {
        let session = spawn_sh();
        session.close().await.expect("close");
        let err = session
            .send_input(b"echo hi\r")
            .expect_err("closed session must reject input");
        assert_eq!(err.kind, ErrorKind::SessionNotFound);
    }
}
