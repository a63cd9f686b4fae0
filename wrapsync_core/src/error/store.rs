//! Content store and gateway error types

use std::time::Duration;
use thiserror::Error;

/// Errors reported while talking to the content store or the gateway
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached at all
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    /// The store answered with a non-success HTTP status
    #[error("Store returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A single attempt ran longer than allowed
    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    /// The store answered, but the body could not be understood
    #[error("Malformed store response: {message}")]
    MalformedResponse { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Check if this error is transient and likely to clear on its own
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } | Self::Timeout(_) => true,
            Self::Http { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::MalformedResponse { .. } => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::http(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            Self::malformed(err.to_string())
        } else {
            Self::unavailable(err.to_string())
        }
    }
}
