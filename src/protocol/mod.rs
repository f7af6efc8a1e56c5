//! Wire-level contract shared by both transport strategies.
//!
//! # Envelope
//!
//! Every transport call produces a [`ResponseEnvelope`]:
//!
//! ```text
//! { "data": <any>, "error": "<string, empty on success>", "status": <integer> }
//! ```
//!
//! | Condition | Meaning |
//! |-----------|---------|
//! | `error` non-empty | failure, whatever `status` says |
//! | `status >= 400` | failure |
//! | otherwise | success, `data` is the payload |
//!
//! # Examples
//!
//! ```
//! use console_client::protocol::{parse_body, ResponseEnvelope};
//!
//! // Bodies already in envelope shape pass through
//! let env = parse_body(200, br#"{"data": [1, 2], "error": "", "status": 200}"#).unwrap();
//! assert!(env.is_success());
//!
//! // Plain bodies are wrapped
//! let env = parse_body(404, br#"{"message": "no such table"}"#).unwrap();
//! assert_eq!(env.error, "no such table");
//!
//! // 204 has no body
//! assert_eq!(ResponseEnvelope::no_content().status, 204);
//! ```

pub mod constants;
mod envelope;
mod headers;

pub use envelope::{parse_body, EnvelopeError, ResponseEnvelope};
pub use headers::format_bearer;
