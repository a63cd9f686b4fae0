//! Validation related error types

use thiserror::Error;

/// Inputs rejected before any store attempt is made
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A content identifier was empty or otherwise unusable
    #[error("Invalid content identifier '{cid}': {reason}")]
    InvalidIdentifier { cid: String, reason: String },

    /// Nothing to publish
    #[error("Cannot publish an empty file set")]
    EmptyFileSet,

    /// A file entry path would escape or ignore its tree root
    #[error("Unsafe entry path '{path}': {reason}")]
    UnsafePath { path: String, reason: String },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    pub fn invalid_identifier(cid: &str, reason: &str) -> Self {
        Self::InvalidIdentifier {
            cid: cid.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unsafe_path(path: &str, reason: &str) -> Self {
        Self::UnsafePath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
