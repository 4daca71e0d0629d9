//! Error types shared across durablewit crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised by the shared utilities
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fingerprint '{0}': expected 64 lowercase hex characters")]
    InvalidFingerprint(String),
}

impl CommonError {
    /// True when the error means the file was not there to begin with.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CommonError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let missing = CommonError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(missing.is_not_found());

        let denied = CommonError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!denied.is_not_found());

        assert!(!CommonError::InvalidFingerprint("xyz".into()).is_not_found());
    }
}
