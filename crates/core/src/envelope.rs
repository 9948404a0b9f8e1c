//! Wire envelopes written to pull clients.
//!
//! Every write on a pull response is one of two fixed JSON shapes:
//!
//! ```text
//! {"status":"Pulling busybox:latest from s3://images/..."}
//! {"error":"...","errorDetail":{"message":"..."}}
//! ```
//!
//! Documents are written back to back with no separator; clients decode them
//! as a JSON stream.

use serde::Serialize;

/// Message of the status envelope that terminates a successful pull.
pub const STATUS_DONE: &str = "Done";

/// Hand-built documents written when serde cannot encode an envelope.
const FALLBACK_STATUS: &[u8] = br#"{"status":""}"#;
const FALLBACK_ERROR: &[u8] =
    br#"{"error":"unreportable error","errorDetail":{"message":"unreportable error"}}"#;

/// One progress update, or the terminal [`STATUS_DONE`] marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEnvelope<'a> {
    pub status: &'a str,
}

/// A terminal failure. Both message fields always carry the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub error: &'a str,
    #[serde(rename = "errorDetail")]
    pub error_detail: ErrorDetail<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail<'a> {
    pub message: &'a str,
}

impl<'a> ErrorEnvelope<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            error: message,
            error_detail: ErrorDetail { message },
        }
    }
}

/// Encode `message` as a status envelope.
pub fn encode_status(message: &str) -> Vec<u8> {
    serde_json::to_vec(&StatusEnvelope { status: message }).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to serialize status envelope");
        FALLBACK_STATUS.to_vec()
    })
}

/// Encode `message` as an error envelope.
///
/// Never fails: reporting a failure must not itself produce one.
pub fn encode_error(message: &str) -> Vec<u8> {
    serde_json::to_vec(&ErrorEnvelope::new(message)).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to serialize error envelope");
        FALLBACK_ERROR.to_vec()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
