//! `term-mcp`: an MCP server exposing `term-core`'s PTY terminal sessions as
//! tool calls over stdio.
//!
//! `stdout` is reserved for the JSON-RPC/MCP wire protocol; all logging goes
//! to `stderr` via `tracing-subscriber`, honoring `RUST_LOG` with `--log-level`
//! as the fallback default.

mod config;
mod error;
mod lines;
mod params;
mod responses;
mod server;

use std::sync::Arc;

use clap::Parser;
use miette::IntoDiagnostic;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::config::Cli;
use crate::server::TerminalServer;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Some(history_max) = cli.history_max_bytes {
        term_core::session::set_history_max(history_max);
    }

    let supervisor = Arc::new(term_core::Supervisor::with_defaults(
        cli.default_shell.clone(),
        cli.default_cols,
        cli.default_rows,
    ));
    tracing::info!(
        default_shell = %cli.default_shell,
        default_cols = cli.default_cols,
        default_rows = cli.default_rows,
        "starting term-mcp"
    );

    let server = TerminalServer::new(supervisor.clone());
    let service = server
        .serve(stdio())
        .await
        .inspect_err(|err| {
            tracing::error!(%err, "failed to start MCP service over stdio");
        })
        .into_diagnostic()?;

    service.waiting().await.into_diagnostic()?;
    supervisor.close_all().await;
    Ok(())
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
