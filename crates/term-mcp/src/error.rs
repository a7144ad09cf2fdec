//! RPC Dispatch error handling: translates [`term_core::CoreError`] into
//! the `{success: false, error: {...}}` envelope, and distinguishes that from
//! genuine transport-level failures (global deadline expiry, envelope
//! serialization failure) that `rmcp` surfaces as protocol errors instead.

use rmcp::model::{CallToolResult, Content};
use rmcp::Error as McpError;
use serde::Serialize;
use term_core::{CoreError, CoreResult};

/// `{success, data|error}` envelope. `success` is carried
/// explicitly (rather than left implicit in `Result`'s tagging) so the wire
/// shape matches the contract exactly regardless of `serde`'s enum
/// representation choices.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Envelope<T> {
    Success { success: bool, data: T },
    Failure {
        success: bool,
        error: term_core::ErrorInfo,
    },
}

/// Run a core call under the global 60 s deadline and translate
/// its outcome into a tool result.
///
/// A core-level failure (including `TIMEOUT_ERROR` from a per-tool timeout)
/// becomes `{success: false, error}` (a normal, successful tool *call*). Only
/// the global deadline itself expiring, or the envelope failing to
/// serialize, surfaces as a protocol-level [`McpError`] instead.
pub async fn dispatch<F, T>(fut: F) -> Result<CallToolResult, McpError>
where
    F: std::future::Future<Output = CoreResult<T>>,
    T: Serialize,
{
    match tokio::time::timeout(GLOBAL_DEADLINE, fut).await {
        Ok(Ok(data)) => to_call_result(Envelope::Success {
            success: true,
            data,
        }),
        Ok(Err(err)) => {
            tracing::warn!(kind = %err.kind, message = %err.message, "tool call failed");
            to_call_result(Envelope::Failure {
                success: false,
                error: err.to_details(),
            })
        }
        Err(_elapsed) => Err(McpError::internal_error(
            "global 60s per-call deadline exceeded",
            None,
        )),
    }
}

/// Global deadline composing with any per-tool timeout.
pub const GLOBAL_DEADLINE: std::time::Duration = std::time::Duration::from_secs(60);

fn to_call_result<T: Serialize>(envelope: Envelope<T>) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(&envelope)
        .map_err(|err| McpError::internal_error(format!("failed to encode envelope: {err}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Parse a wire-format session id, turning a malformed UUID into
/// `INVALID_PARAMETER` rather than a `SESSION_NOT_FOUND` or a parser panic.
pub fn parse_session_id(raw: &str) -> CoreResult<term_core::SessionId> {
    raw.parse()
        .map_err(|_| CoreError::invalid_parameter(format!("'{raw}' is not a valid session id")))
}

/// Map an unrecognized `format`/`theme` string to `INVALID_PARAMETER`, for
/// enum-like string fields that `schemars` cannot itself constrain without
/// widening the published JSON schema to an explicit enum.
pub fn unknown_enum_value(field: &str, value: &str) -> CoreError {
    CoreError::invalid_parameter(format!("unrecognized value for '{field}': '{value}'"))
}
