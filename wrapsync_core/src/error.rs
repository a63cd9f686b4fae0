//! Error types for the wrapsync core library
//!
//! Errors are grouped by where they originate so callers can decide whether a
//! failure is worth another attempt.

use thiserror::Error;

pub mod io;
pub mod store;
pub mod validation;

pub use self::io::{IoError, IoErrorKind};
pub use self::store::StoreError;
pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the wrapsync core library
///
/// - I/O errors: local file system operations
/// - Store errors: anything the content store or gateway reported
/// - Validation errors: inputs rejected before touching the network
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Content store and gateway errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Whether the failure is likely to clear on another attempt
    ///
    /// Only transient store errors qualify. The retry loop still retries the
    /// rest, but reports them as unclassified.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(s) if s.is_transient())
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(StoreError::malformed(format!("invalid JSON: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io_error.into();

        match error {
            Error::Io(io_err) => assert_eq!(io_err.kind, IoErrorKind::FileNotFound),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_from_json_error_is_malformed_store_response() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: Error = json_error.into();

        assert!(matches!(error, Error::Store(StoreError::MalformedResponse { .. })));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_only_transient_store_errors_are_retryable() {
        assert!(Error::Store(StoreError::Timeout(Duration::from_secs(1))).is_retryable());
        assert!(Error::Store(StoreError::http(503, "busy")).is_retryable());
        assert!(!Error::Store(StoreError::http(404, "no link named")).is_retryable());
        assert!(!Error::Validation(ValidationError::EmptyFileSet).is_retryable());
        assert!(!Error::Io(IoError::file_not_found(Path::new("/x"))).is_retryable());
    }

    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = Error::Io(IoError::permission_denied(Path::new("/locked"), io_error));

        assert!(error.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
