//! Response envelope and the parser that produces it.
//!
//! The parser runs once at the transport boundary. It turns a raw HTTP status
//! and body into a [`ResponseEnvelope`] or rejects the payload with an
//! [`EnvelopeError`]. Nothing downstream inspects raw bodies.

use super::constants::{MALFORMED_ENVELOPE_STATUS, SYNTHETIC_FAILURE_STATUS};
use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Uniform result of every transport call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Payload, `null` when absent
    #[serde(default)]
    pub data: Value,
    /// Failure message, empty on success
    #[serde(default)]
    pub error: String,
    /// Numeric status
    pub status: u16,
}

impl ResponseEnvelope {
    /// Successful envelope carrying `data`.
    pub fn success(status: u16, data: Value) -> Self {
        ResponseEnvelope {
            data,
            error: String::new(),
            status,
        }
    }

    /// Failed envelope with no data.
    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        ResponseEnvelope {
            data: Value::Null,
            error: error.into(),
            status,
        }
    }

    /// The `204 No Content` envelope.
    pub fn no_content() -> Self {
        ResponseEnvelope::success(204, Value::Null)
    }

    /// Synthetic envelope for a request that never got a response.
    pub fn from_transport_error(err: &TransportError) -> Self {
        ResponseEnvelope::failure(SYNTHETIC_FAILURE_STATUS, err.to_string())
    }

    /// Whether the envelope signals failure.
    pub fn is_failure(&self) -> bool {
        !self.error.is_empty() || self.status >= 400
    }

    /// Whether the envelope signals success.
    pub fn is_success(&self) -> bool {
        !self.is_failure()
    }

    /// Message to report for a failed envelope.
    pub fn failure_message(&self) -> String {
        if self.error.is_empty() {
            reason_phrase(self.status)
        } else {
            self.error.clone()
        }
    }
}

/// A response body the parser refused to accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The body claims the envelope shape but its fields have the wrong types
    #[error("malformed response envelope: {0}")]
    Malformed(String),

    /// The body is not JSON
    #[error("invalid JSON in response body: {0}")]
    InvalidJson(String),
}

impl EnvelopeError {
    /// Convert the rejection into a failure envelope.
    ///
    /// A failing HTTP status is kept; a succeeding one is replaced by 502
    /// because the service answered with something unusable.
    pub fn into_envelope(self, http_status: u16) -> ResponseEnvelope {
        let status = if http_status >= 400 {
            http_status
        } else {
            MALFORMED_ENVELOPE_STATUS
        };
        ResponseEnvelope::failure(status, self.to_string())
    }
}

/// Parse an HTTP status and body into an envelope.
///
/// - `204` and empty bodies carry `null` data.
/// - A JSON object with `status` and either `data` or `error` is taken as an
///   envelope and validated strictly.
/// - Any other JSON is wrapped: as `data` on success, or with its `message`
///   / `error` field as the error on failure.
pub fn parse_body(http_status: u16, body: &[u8]) -> Result<ResponseEnvelope, EnvelopeError> {
    if http_status == 204 {
        return Ok(ResponseEnvelope::no_content());
    }

    let trimmed = body.trim_ascii();
    if trimmed.is_empty() {
        return Ok(wrap(http_status, Value::Null));
    }

    let value: Value = serde_json::from_slice(trimmed).map_err(|e| {
        EnvelopeError::InvalidJson(e.to_string())
    })?;

    match value {
        Value::Object(map) if looks_like_envelope(&map) => validate_envelope(map),
        other => Ok(wrap(http_status, other)),
    }
}

fn looks_like_envelope(map: &Map<String, Value>) -> bool {
    map.contains_key("status") && (map.contains_key("data") || map.contains_key("error"))
}

fn validate_envelope(mut map: Map<String, Value>) -> Result<ResponseEnvelope, EnvelopeError> {
    let status = match map.get("status") {
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|s| (100..=599).contains(s))
            .ok_or_else(|| EnvelopeError::Malformed(format!("status out of range: {}", n)))?
            as u16,
        Some(other) => {
            return Err(EnvelopeError::Malformed(format!(
                "status must be an integer, got {}",
                other
            )))
        }
        None => return Err(EnvelopeError::Malformed("missing status".to_string())),
    };

    let error = match map.remove("error") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(EnvelopeError::Malformed(format!(
                "error must be a string, got {}",
                other
            )))
        }
    };

    let data = map.remove("data").unwrap_or(Value::Null);

    Ok(ResponseEnvelope {
        data,
        error,
        status,
    })
}

fn wrap(http_status: u16, body: Value) -> ResponseEnvelope {
    if http_status < 400 {
        return ResponseEnvelope::success(http_status, body);
    }
    let message = error_message(&body).unwrap_or_else(|| reason_phrase(http_status));
    ResponseEnvelope::failure(http_status, message)
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": ".."}`, `{"error": ".."}` and
/// `{"error": {"message": ".."}}`.
fn error_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error"),
        body.get("error").and_then(|e| e.get("message")),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn reason_phrase(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_passthrough() {
        let env = parse_body(200, br#"{"data": {"id": "1"}, "error": "", "status": 201}"#).unwrap();
        assert_eq!(env.status, 201);
        assert_eq!(env.data, json!({"id": "1"}));
        assert!(env.is_success());
    }

    #[test]
    fn test_envelope_error_wins_over_status() {
        let env = parse_body(200, br#"{"data": null, "error": "quota exceeded", "status": 200}"#).unwrap();
        assert!(env.is_failure());
        assert_eq!(env.failure_message(), "quota exceeded");
    }

    #[test]
    fn test_malformed_envelope_rejected() {
        let err = parse_body(200, br#"{"data": [], "status": "ok"}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));

        let env = err.into_envelope(200);
        assert_eq!(env.status, MALFORMED_ENVELOPE_STATUS);
        assert!(env.is_failure());
    }

    #[test]
    fn test_envelope_with_non_string_error_rejected() {
        let err = parse_body(400, br#"{"error": {"code": 1}, "status": 400}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
        assert_eq!(err.into_envelope(400).status, 400);
    }

    #[test]
    fn test_plain_success_body_wrapped() {
        let env = parse_body(200, br#"[{"id": "1"}, {"id": "2"}]"#).unwrap();
        assert_eq!(env.status, 200);
        assert_eq!(env.data.as_array().map(Vec::len), Some(2));
        assert!(env.error.is_empty());
    }

    #[test]
    fn test_plain_failure_body_message() {
        let env = parse_body(422, br#"{"message": "name is required"}"#).unwrap();
        assert_eq!(env.status, 422);
        assert_eq!(env.error, "name is required");
    }

    #[test]
    fn test_nested_error_message() {
        let body = br#"{"error": {"code": "not_found", "message": "table 9 not found"}}"#;
        let env = parse_body(404, body).unwrap();
        assert_eq!(env.error, "table 9 not found");
    }

    #[test]
    fn test_failure_without_message_uses_reason() {
        let env = parse_body(503, b"{}").unwrap();
        assert_eq!(env.error, "Service Unavailable");
    }

    #[test]
    fn test_no_content() {
        let env = parse_body(204, b"").unwrap();
        assert_eq!(env, ResponseEnvelope::no_content());
        assert!(env.is_success());
    }

    #[test]
    fn test_empty_success_body() {
        let env = parse_body(200, b"  ").unwrap();
        assert_eq!(env.data, Value::Null);
        assert!(env.is_success());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_body(500, b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidJson(_)));
        let env = err.into_envelope(500);
        assert_eq!(env.status, 500);
    }

    #[test]
    fn test_transport_error_envelope() {
        let err = TransportError::Network("connection refused".to_string());
        let env = ResponseEnvelope::from_transport_error(&err);
        assert_eq!(env.status, 500);
        assert_eq!(env.error, "network error: connection refused");
    }
}
