//! I/O related error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O error with additional context
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// File or directory not found
    FileNotFound,
    /// Permission denied
    PermissionDenied,
    /// The path exists but is not a directory
    NotADirectory,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create a file not found error
    pub fn file_not_found(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::FileNotFound,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: &Path, source: std::io::Error) -> Self {
        Self {
            kind: IoErrorKind::PermissionDenied,
            path: Some(path.to_path_buf()),
            source: Some(source),
        }
    }

    pub fn not_a_directory(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::NotADirectory,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            std::io::ErrorKind::NotADirectory => IoErrorKind::NotADirectory,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            source: Some(source),
        }
    }

    /// Attach the path the failed operation was working on
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    match (&error.kind, &error.path) {
        (IoErrorKind::FileNotFound, Some(path)) => format!("Not found: {}", path.display()),
        (IoErrorKind::FileNotFound, None) => "Not found".to_string(),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("Permission denied: {}", path.display())
        }
        (IoErrorKind::PermissionDenied, None) => "Permission denied".to_string(),
        (IoErrorKind::NotADirectory, Some(path)) => {
            format!("Not a directory: {}", path.display())
        }
        (IoErrorKind::NotADirectory, None) => "Not a directory".to_string(),
        (IoErrorKind::Other, path) => {
            let location = path
                .as_ref()
                .map(|p| format!(" on {}", p.display()))
                .unwrap_or_default();
            match &error.source {
                Some(source) => format!("I/O error{location}: {source}"),
                None => format!("I/O error{location}"),
            }
        }
    }
}
