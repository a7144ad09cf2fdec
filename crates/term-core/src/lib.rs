//! Terminal Session Core: a headless PTY automation harness.
//!
//! Spawns shells behind a pseudo-terminal, executes commands with
//! prompt-detection timeout, watches output for a regex match, and renders
//! ANSI-aware screenshots. Callers drive sessions through [`supervisor::Supervisor`];
//! the RPC surface that exposes these operations over MCP lives in the
//! `term-mcp` binary crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod ansi;
pub mod command;
pub mod error;
pub mod ids;
pub mod keys;
pub mod model;
pub mod prompt;
pub mod pty;
pub mod render;
pub mod session;
pub mod supervisor;
pub mod watcher;

pub use error::{CoreError, CoreResult, ErrorInfo, ErrorKind};
pub use ids::SessionId;
pub use model::{
    CommandResult, Cursor, Dimensions, ImageFormat, SessionInfo, SessionState, TerminalState,
    Theme, WatchResult,
};
pub use supervisor::Supervisor;
