//! Startup configuration: process flags only, no persisted or
//! network-loaded config. Session storage itself is in-memory and
//! ephemeral; this just covers the flags the binary needs to start.

use clap::Parser;

/// `term-mcp`: an MCP server exposing PTY-backed terminal sessions as tool
/// calls over stdio.
#[derive(Debug, Parser)]
#[command(name = "term-mcp", version, about = "PTY terminal automation over MCP")]
pub struct Cli {
    /// Log verbosity, forwarded to `tracing_subscriber`'s `EnvFilter` as a
    /// default when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Shell used by `create_terminal_session` calls that don't name one.
    /// Must be on the allow-list or every session creation fails.
    #[arg(long, default_value = "/bin/bash")]
    pub default_shell: String,

    /// Default terminal width in columns for new sessions.
    #[arg(long, default_value_t = 80)]
    pub default_cols: u16,

    /// Default terminal height in rows for new sessions.
    #[arg(long, default_value_t = 24)]
    pub default_rows: u16,

    /// Overrides the per-session output buffer cap (`HISTORY_MAX`,
    /// default 64 KiB).
    #[arg(long)]
    pub history_max_bytes: Option<usize>,
}
