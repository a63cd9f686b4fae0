use colored::*;
use std::error::Error as StdError;
use std::fmt;
use wrapsync_core::error::ValidationError;

/// CLI-specific error type with semantic exit codes
#[derive(Debug)]
pub struct CliError {
    /// The main error message
    message: String,

    /// Error category for exit code determination
    category: ErrorCategory,

    /// Additional context information
    context: Vec<(String, String)>,

    /// Suggestions for recovery
    pub suggestions: Vec<String>,

    /// Source error if any
    source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Error categories that map to exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    General,
    Misuse,
    Network,
    Filesystem,
    Integrity,
}

/// Semantic exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    Misuse = 2,
    NetworkError = 3,
    FilesystemError = 4,
    IntegrityError = 5,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Extension trait for adding context to errors
pub trait ErrorContext {
    fn with_context(self, key: &str, value: &str) -> Self;
    fn with_suggestion(self, suggestion: &str) -> Self;
    fn with_source(self, source: Box<dyn StdError + Send + Sync>) -> Self;
}

impl CliError {
    fn new(message: &str, category: ErrorCategory) -> Self {
        Self {
            message: message.to_string(),
            category,
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Create a general error
    pub fn general(message: &str) -> Self {
        Self::new(message, ErrorCategory::General)
    }

    /// Create a command misuse error
    pub fn misuse(message: &str) -> Self {
        Self::new(message, ErrorCategory::Misuse)
            .with_suggestion("Run 'wrapsync --help' for usage information")
    }

    /// Create a network error
    pub fn network(message: &str) -> Self {
        Self::new(message, ErrorCategory::Network)
            .with_suggestion("Check your internet connection")
            .with_suggestion("Verify the gateway URL with 'wrapsync config get client.gateway_url'")
    }

    /// Create a filesystem error
    pub fn filesystem(message: &str) -> Self {
        let mut error = Self::new(message, ErrorCategory::Filesystem);

        if message.contains("not found") || message.contains("Not found") {
            error
                .suggestions
                .push("Check if the target directory exists".to_string());
        } else if message.contains("permission") || message.contains("denied") {
            error.suggestions.push("Check file permissions".to_string());
        }

        error
    }

    /// Create an integrity error: the store disagrees with local content
    pub fn integrity(message: &str) -> Self {
        Self::new(message, ErrorCategory::Integrity)
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self.category {
            ErrorCategory::General => ExitCode::GeneralError,
            ErrorCategory::Misuse => ExitCode::Misuse,
            ErrorCategory::Network => ExitCode::NetworkError,
            ErrorCategory::Filesystem => ExitCode::FilesystemError,
            ErrorCategory::Integrity => ExitCode::IntegrityError,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Look up a context value by key
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn label(&self) -> &'static str {
        match self.category {
            ErrorCategory::General => "Error",
            ErrorCategory::Misuse => "Usage Error",
            ErrorCategory::Network => "Network Error",
            ErrorCategory::Filesystem => "File Error",
            ErrorCategory::Integrity => "Integrity Error",
        }
    }

    /// Format the error for user display
    pub fn format_for_user(&self, debug: bool) -> String {
        let mut output = String::new();

        let prefix = match self.category {
            ErrorCategory::Misuse => self.label().yellow(),
            _ => self.label().red(),
        };
        output.push_str(&format!("{}: {}\n", prefix, self.message));

        if !self.context.is_empty() {
            output.push_str("\nContext:\n");
            for (key, value) in &self.context {
                output.push_str(&format!("  {}: {}\n", key.bold(), value));
            }
        }

        // Error chain in debug mode
        if debug && let Some(source) = &self.source {
            output.push_str("\nCaused by:\n");
            let mut current: Option<&dyn StdError> = Some(source.as_ref());
            let mut level = 1;

            while let Some(err) = current {
                output.push_str(&format!("  {level}: {err}\n"));
                current = err.source();
                level += 1;
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in &self.suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.message)?;

        for (key, value) in &self.context {
            write!(f, " ({key}: {value})")?;
        }

        Ok(())
    }
}

impl StdError for CliError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl ErrorContext for CliError {
    fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.push((key.to_string(), value.to_string()));
        self
    }

    fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestions.push(suggestion.to_string());
        self
    }

    fn with_source(mut self, source: Box<dyn StdError + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }
}

/// Classify core library errors by where they came from
impl From<wrapsync_core::Error> for CliError {
    fn from(error: wrapsync_core::Error) -> Self {
        use wrapsync_core::Error;

        let message = error.to_string();
        let cli_error = match &error {
            Error::Io(_) => Self::filesystem(&message),
            Error::Store(_) => Self::network(&message),
            Error::Validation(ValidationError::UnsafePath { .. }) => Self::integrity(&message),
            Error::Validation(ValidationError::EmptyFileSet) => Self::filesystem(&message),
            Error::Validation(_) => Self::misuse(&message),
        };
        cli_error.with_source(Box::new(error))
    }
}

/// Convert anyhow errors to CLI errors
impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<CliError>() {
            Ok(cli_error) => cli_error,
            Err(error) => Self::general(&format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wrapsync_core::error::{IoError, StoreError};

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::general("x").exit_code() as u8, 1);
        assert_eq!(CliError::misuse("x").exit_code() as u8, 2);
        assert_eq!(CliError::network("x").exit_code() as u8, 3);
        assert_eq!(CliError::filesystem("x").exit_code() as u8, 4);
        assert_eq!(CliError::integrity("x").exit_code() as u8, 5);
    }

    #[test]
    fn test_core_error_classification() {
        let store: CliError = wrapsync_core::Error::from(StoreError::http(503, "busy")).into();
        assert_eq!(store.exit_code(), ExitCode::NetworkError);

        let io: CliError =
            wrapsync_core::Error::from(IoError::file_not_found(Path::new("wrappers"))).into();
        assert_eq!(io.exit_code(), ExitCode::FilesystemError);

        let unsafe_path: CliError =
            wrapsync_core::Error::from(ValidationError::unsafe_path("../x", "escapes")).into();
        assert_eq!(unsafe_path.exit_code(), ExitCode::IntegrityError);

        let config: CliError =
            wrapsync_core::Error::from(ValidationError::invalid_configuration("bad")).into();
        assert_eq!(config.exit_code(), ExitCode::Misuse);
    }

    #[test]
    fn test_format_for_user_includes_context_and_chain() {
        let error: CliError = wrapsync_core::Error::from(StoreError::http(503, "busy")).into();
        let error = error.with_context("wrapper", "foo");

        let plain = error.format_for_user(false);
        assert!(plain.contains("Network Error"));
        assert!(plain.contains("foo"));
        assert!(plain.contains("Suggestions:"));
        assert!(!plain.contains("Caused by:"));

        assert!(error.format_for_user(true).contains("Caused by:"));
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_category() {
        let original = CliError::integrity("mismatch");
        let wrapped = anyhow::Error::new(original);
        let back = CliError::from(wrapped);
        assert_eq!(back.exit_code(), ExitCode::IntegrityError);

        let plain = CliError::from(anyhow::anyhow!("boom"));
        assert_eq!(plain.exit_code(), ExitCode::GeneralError);
        assert_eq!(plain.message(), "boom");
    }

    #[test]
    fn test_display_includes_context() {
        let error = CliError::integrity("identifier mismatch")
            .with_context("expected", "bafyXYZ")
            .with_context("actual", "bafyABC");
        assert_eq!(
            error.to_string(),
            "Integrity Error: identifier mismatch (expected: bafyXYZ) (actual: bafyABC)"
        );
        assert_eq!(error.context_value("actual"), Some("bafyABC"));
    }
}
