//! Status classification helpers.

use crate::error::ErrorKind;

/// Check if status code indicates access denied
pub fn is_access_denied_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// Failure class for a status reported by the service itself.
///
/// Synthetic failures (loop guard, network) are classified where they are
/// produced, not here.
pub fn classify_status(status: u16) -> ErrorKind {
    if is_access_denied_status(status) {
        ErrorKind::Unauthorized
    } else {
        ErrorKind::Application
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_access_denied_status() {
        assert!(is_access_denied_status(401));
        assert!(is_access_denied_status(403));
        assert!(!is_access_denied_status(404));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(403), ErrorKind::Unauthorized);
        assert_eq!(classify_status(422), ErrorKind::Application);
        assert_eq!(classify_status(500), ErrorKind::Application);
    }
}
