//! Typed error taxonomy shared by every core component.
//!
//! Mirrors the closed set of error kinds in the tool surface contract: every
//! fallible core operation returns a [`CoreError`] carrying one of
//! [`ErrorKind`]'s ten variants, a human-readable message, and an optional
//! structured detail payload. The RPC dispatch layer (`term-mcp`) translates
//! these directly into the `{success: false, error: {...}}` envelope.

use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of error kinds a tool call can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    SessionNotFound,
    CommandFailed,
    TimeoutError,
    PermissionDenied,
    InvalidShell,
    ScreenshotError,
    ParsingError,
    ResourceError,
    InvalidParameter,
    UnknownError,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::CommandFailed => "COMMAND_FAILED",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::InvalidShell => "INVALID_SHELL",
            Self::ScreenshotError => "SCREENSHOT_ERROR",
            Self::ParsingError => "PARSING_ERROR",
            Self::ResourceError => "RESOURCE_ERROR",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The `{kind, message, details?}` error value returned by every fallible
/// core operation.
#[derive(Debug)]
pub struct CoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CoreError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_details(kind: ErrorKind, message: impl Into<String>, details: Value) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Some(details),
            source: None,
        }
    }

    /// Wrap a source error, preserving it for `Error::source()` chaining.
    pub fn from_source<E>(kind: ErrorKind, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind,
            message: message.into(),
            details: Some(serde_json::json!({ "source": source.to_string() })),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::with_details(
            ErrorKind::SessionNotFound,
            format!("session {session_id} not found"),
            serde_json::json!({ "sessionId": session_id.to_string() }),
        )
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>, elapsed_ms: u64, limit_ms: u64) -> Self {
        Self::with_details(
            ErrorKind::TimeoutError,
            message,
            serde_json::json!({ "elapsedMs": elapsed_ms, "limitMs": limit_ms }),
        )
    }

    #[must_use]
    pub fn invalid_shell(shell: impl fmt::Display) -> Self {
        Self::with_details(
            ErrorKind::InvalidShell,
            format!("shell '{shell}' is not in the allow-list"),
            serde_json::json!({ "shell": shell.to_string() }),
        )
    }

    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    /// Map a system-level I/O error onto the adapter-boundary taxonomy:
    /// `ENOENT -> SESSION_NOT_FOUND`, `EACCES -> PERMISSION_DENIED`, a message
    /// containing "timeout" -> `TIMEOUT_ERROR`, everything else -> `UNKNOWN_ERROR`.
    #[must_use]
    pub fn from_io(message: impl Into<String>, err: &std::io::Error) -> Self {
        let message = message.into();
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::SessionNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ if err.to_string().to_ascii_lowercase().contains("timeout") => {
                ErrorKind::TimeoutError
            }
            _ => ErrorKind::UnknownError,
        };
        Self::with_details(
            kind,
            message,
            serde_json::json!({ "source": err.to_string() }),
        )
    }

    #[must_use]
    pub fn to_details(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind.as_str().to_string(),
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl Diagnostic for CoreError {}

/// Serializable projection of a [`CoreError`] used inside the RPC envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Result type alias used throughout `term-core`.
pub type CoreResult<T> = Result<T, CoreError>;
