//! Authorization header formatting.
//!
//! # Examples
//!
//! ```
//! use console_client::protocol::format_bearer;
//!
//! assert_eq!(format_bearer("abc123"), "Bearer abc123");
//! ```

use super::constants::headers::BEARER_PREFIX;

/// Format an `Authorization` header value for a bearer credential.
#[inline]
pub fn format_bearer(token: &str) -> String {
    format!("{}{}", BEARER_PREFIX, token)
}
