//! Session Supervisor: registry of sessions, creation, lookup, and
//! fan-out cleanup.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::{CoreError, CoreResult};
use crate::ids::SessionId;
use crate::model::{Dimensions, SessionInfo};
use crate::session::{Session, SPAWN_GRACE};

/// Parameters accepted by [`Supervisor::create`]; all optional.
#[derive(Clone, Debug, Default)]
pub struct CreateOptions {
    pub cols: Option<u16>,
    pub rows: Option<u16>,
    pub shell: Option<String>,
    pub cwd: Option<String>,
    pub env: Vec<(String, String)>,
    pub title: Option<String>,
}

/// Registry of live sessions. One value, constructed at startup and
/// dependency-injected into the RPC dispatch layer (no process-wide
/// singleton).
pub struct Supervisor {
    sessions: Arc<Mutex<HashMap<SessionId, Arc<Session>>>>,
    default_shell: String,
    default_cols: u16,
    default_rows: u16,
    exit_tx: mpsc::UnboundedSender<SessionId>,
}

impl Supervisor {
    /// Build an empty supervisor with the standard 80x24 dimension
    /// defaults. `default_shell` is used by `create` when the caller does
    /// not name one.
    #[must_use]
    pub fn new(default_shell: impl Into<String>) -> Self {
        Self::with_defaults(default_shell, 80, 24)
    }

    /// Build an empty supervisor with explicit dimension defaults (the
    /// `--default-cols`/`--default-rows` startup flags).
    ///
    /// Spawns a background task that drains sessions which exited on their
    /// own (shell exit, crash) from the registry, mirroring what an
    /// explicit `close` does, so a naturally-dead session doesn't linger
    /// as a stale `list`/`get` entry or a zombie child.
    #[must_use]
    pub fn with_defaults(default_shell: impl Into<String>, default_cols: u16, default_rows: u16) -> Self {
        let sessions: Arc<Mutex<HashMap<SessionId, Arc<Session>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<SessionId>();

        let reaper_sessions = Arc::clone(&sessions);
        tokio::spawn(async move {
            while let Some(id) = exit_rx.recv().await {
                let session = reaper_sessions.lock().await.remove(&id);
                if let Some(session) = session {
                    tracing::info!(session_id = %id, "reaping session that exited on its own");
                    let _ = session.close().await;
                }
            }
        });

        Self {
            sessions,
            default_shell: default_shell.into(),
            default_cols,
            default_rows,
            exit_tx,
        }
    }

    /// Create a session, waiting the fixed post-spawn grace period
    /// before returning.
    ///
    /// # Errors
    /// `INVALID_SHELL`, `INVALID_PARAMETER` (bad dimensions), or an I/O
    /// failure from the adapter.
    pub async fn create(&self, opts: CreateOptions) -> CoreResult<SessionInfo> {
        let dimensions = Dimensions {
            cols: opts.cols.unwrap_or(self.default_cols),
            rows: opts.rows.unwrap_or(self.default_rows),
        };
        let shell = opts.shell.unwrap_or_else(|| self.default_shell.clone());
        let cwd = opts.cwd.unwrap_or_else(default_cwd);

        let session = Session::spawn(
            &shell,
            dimensions,
            &cwd,
            &opts.env,
            opts.title,
            Some(self.exit_tx.clone()),
        )?;
        let info = session.info();

        self.sessions.lock().await.insert(session.id(), session);
        tokio::time::sleep(SPAWN_GRACE).await;

        Ok(info)
    }

    /// Look up a session by id.
    ///
    /// # Errors
    /// `SESSION_NOT_FOUND` if no such session is registered, or if it has
    /// exited on its own but the background reaper hasn't yet drained it.
    pub async fn get(&self, id: SessionId) -> CoreResult<Arc<Session>> {
        let session = self
            .sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::session_not_found(id))?;
        if session.is_active() {
            Ok(session)
        } else {
            Err(CoreError::session_not_found(id))
        }
    }

    /// List every registered, still-`Active` session's metadata. A session
    /// that exited on its own but hasn't yet been drained by the reaper is
    /// omitted rather than reported as a stale `closed` entry.
    pub async fn list(&self) -> Vec<SessionInfo> {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|s| s.is_active())
            .map(|s| s.info())
            .collect()
    }

    /// Close and deregister a session.
    ///
    /// # Errors
    /// `SESSION_NOT_FOUND` if no such session is registered.
    pub async fn close(&self, id: SessionId) -> CoreResult<()> {
        let session = self
            .sessions
            .lock()
            .await
            .remove(&id)
            .ok_or_else(|| CoreError::session_not_found(id))?;
        tracing::info!(session_id = %id, "closing session");
        session.close().await
    }

    /// Close every registered session. Best-effort: a single session's
    /// failure to close does not stop the rest.
    pub async fn close_all(&self) {
        let sessions: Vec<Arc<Session>> = {
            let mut guard = self.sessions.lock().await;
            guard.drain().map(|(_, session)| session).collect()
        };
        tracing::info!(count = sessions.len(), "closing all sessions");
        for session in sessions {
            let _ = session.close().await;
        }
    }

    /// Number of currently registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether the supervisor currently holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

fn default_cwd() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| "/".to_string())
}
