//! PTY Adapter: the thin boundary between `term-core` and the OS's
//! pseudo-terminal and process APIs.
//!
//! Wraps `portable_pty` so the rest of the crate only ever sees typed errors
//! and owns handles it can move into a blocking reader task.

use std::io::{Read, Write};
use std::path::Path;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use crate::error::{CoreError, CoreResult};
use crate::model::Dimensions;

/// Shell executables recognized by basename, independent of the directory
/// they are invoked from.
const ALLOWED_SHELL_BASENAMES: &[&str] = &[
    "bash",
    "zsh",
    "sh",
    "fish",
    "powershell",
    "powershell.exe",
    "cmd",
    "cmd.exe",
];

/// Directories an absolute shell path must be rooted under.
const ALLOWED_SHELL_ROOTS: &[&str] = &["/bin", "/usr/bin"];

/// Validate `shell` against the allow-list: either a bare recognized
/// basename, or an absolute path rooted at one of `ALLOWED_SHELL_ROOTS` whose
/// own basename is recognized.
///
/// # Errors
/// Returns `INVALID_SHELL` if neither condition holds.
pub fn validate_shell(shell: &str) -> CoreResult<()> {
    let path = Path::new(shell);
    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(shell);

    if !ALLOWED_SHELL_BASENAMES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(basename))
    {
        return Err(CoreError::invalid_shell(shell));
    }

    if path.is_absolute() {
        let has_parent_component = path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
        let rooted = ALLOWED_SHELL_ROOTS
            .iter()
            .any(|root| path.starts_with(root));
        if has_parent_component || !rooted {
            return Err(CoreError::invalid_shell(shell));
        }
    }

    Ok(())
}

/// A freshly spawned PTY and the child shell running inside it.
pub struct PtyProcess {
    pub master: Box<dyn MasterPty + Send>,
    pub writer: Box<dyn Write + Send>,
    pub reader: Box<dyn Read + Send>,
    pub child: Box<dyn Child + Send + Sync>,
    pub pid: u32,
}

/// Open a PTY of `dimensions` and spawn `shell` inside it with `cwd` and
/// `env` applied.
///
/// # Errors
/// `INVALID_SHELL` if `shell` fails [`validate_shell`]; `UNKNOWN_ERROR` (via
/// [`CoreError::from_io`]) if PTY allocation or the spawn itself fails at the
/// OS level.
pub fn spawn(
    shell: &str,
    dimensions: Dimensions,
    cwd: Option<&str>,
    env: &[(String, String)],
) -> CoreResult<PtyProcess> {
    validate_shell(shell)?;

    let system = native_pty_system();
    let pair = system
        .openpty(PtySize {
            rows: dimensions.rows,
            cols: dimensions.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|err| CoreError::from_io("failed to open pty", &to_io_error(&err)))?;

    let mut cmd = CommandBuilder::new(shell);
    if let Some(cwd) = cwd {
        cmd.cwd(cwd);
    }
    cmd.env("TERM", "xterm-256color");
    for (key, value) in env {
        cmd.env(key, value);
    }

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|err| CoreError::from_io("failed to spawn shell", &to_io_error(&err)))?;
    let pid = child.process_id().unwrap_or(0);

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|err| CoreError::from_io("failed to clone pty reader", &to_io_error(&err)))?;
    let writer = pair
        .master
        .take_writer()
        .map_err(|err| CoreError::from_io("failed to take pty writer", &to_io_error(&err)))?;

    Ok(PtyProcess {
        master: pair.master,
        writer,
        reader,
        child,
        pid,
    })
}

/// Resize the PTY to `dimensions`. Ordering guarantee: resize requests
/// are applied before any subsequently queued write is flushed, since the
/// caller holds the session lock across both.
///
/// # Errors
/// `UNKNOWN_ERROR` if the OS resize call fails.
pub fn resize(master: &mut (dyn MasterPty + Send), dimensions: Dimensions) -> CoreResult<()> {
    master
        .resize(PtySize {
            rows: dimensions.rows,
            cols: dimensions.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|err| CoreError::from_io("failed to resize pty", &to_io_error(&err)))
}

/// Terminate the child's process group: SIGTERM first, then SIGKILL if it
/// has not exited within `grace`.
///
/// # Errors
/// `UNKNOWN_ERROR` if signaling or waiting on the child fails.
#[cfg(unix)]
pub fn kill(child: &mut (dyn Child + Send + Sync), grace: std::time::Duration) -> CoreResult<()> {
    use nix::sys::signal::Signal;
    use nix::unistd::Pid;

    if let Some(pid) = child.process_id() {
        // Process IDs are always positive and fit in i32.
        #[allow(clippy::cast_possible_wrap)]
        let pgid = Pid::from_raw(pid as i32);
        signal_process_group(pgid, Signal::SIGTERM)?;
        if wait_for_exit(child, grace)?.is_some() {
            return Ok(());
        }
        signal_process_group(pgid, Signal::SIGKILL)?;
        let _ = wait_for_exit(child, std::time::Duration::from_millis(200))?;
        return Ok(());
    }

    child
        .kill()
        .map_err(|err| CoreError::from_io("failed to kill child", &err))
}

#[cfg(unix)]
fn signal_process_group(pgid: nix::unistd::Pid, signal: nix::sys::signal::Signal) -> CoreResult<()> {
    use nix::sys::signal::killpg;

    match killpg(pgid, signal) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(err) => Err(CoreError::new(
            crate::error::ErrorKind::UnknownError,
            format!("failed to signal process group: {err}"),
        )),
    }
}

fn wait_for_exit(
    child: &mut (dyn Child + Send + Sync),
    timeout: std::time::Duration,
) -> CoreResult<Option<portable_pty::ExitStatus>> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {
                if std::time::Instant::now() >= deadline {
                    return Ok(None);
                }
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
            Err(err) => return Err(CoreError::from_io("failed to wait for child", &err)),
        }
    }
}

fn to_io_error(err: &(dyn std::error::Error + Send + Sync)) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_recognized_shell_names() {
        for shell in ["bash", "zsh", "sh", "fish"] {
            validate_shell(shell).unwrap_or_else(|_| panic!("{shell} should be allowed"));
        }
    }

    #[test]
    fn accepts_absolute_path_rooted_at_allowed_directory() {
        validate_shell("/bin/bash").expect("/bin/bash should be allowed");
        validate_shell("/usr/bin/zsh").expect("/usr/bin/zsh should be allowed");
    }

    #[test]
    fn rejects_unrecognized_shell_name() {
        let err = validate_shell("python3").expect_err("python3 must not be a shell");
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidShell);
    }

    #[test]
    fn rejects_absolute_path_outside_allowed_roots() {
        let err =
            validate_shell("/opt/evil/bash").expect_err("non-rooted absolute path must be rejected");
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidShell);
    }

    #[test]
    fn rejects_path_traversal_attempt() {
        let err = validate_shell("/bin/../etc/bash").expect_err("traversal must be rejected");
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidShell);
    }
}
