use thiserror::Error;

/// Unified error type for patch-check operations
#[derive(Error, Debug)]
pub enum PatchCheckError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Parse(String),

    #[error("Patch error: {0}")]
    Patch(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in patch-check
pub type Result<T> = std::result::Result<T, PatchCheckError>;

impl PatchCheckError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        PatchCheckError::Config(msg.into())
    }

    /// Create a version parsing error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        PatchCheckError::Parse(msg.into())
    }

    /// Create a patch error with context
    pub fn patch(msg: impl Into<String>) -> Self {
        PatchCheckError::Patch(msg.into())
    }

    /// Create a sandbox error with context
    pub fn sandbox(msg: impl Into<String>) -> Self {
        PatchCheckError::Sandbox(msg.into())
    }

    /// Whether this error came out of sandbox setup or teardown.
    ///
    /// Teardown failures risk losing the caller's original edits, so callers
    /// treat this class as the most severe one.
    pub fn is_sandbox(&self) -> bool {
        matches!(self, PatchCheckError::Sandbox(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PatchCheckError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PatchCheckError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(PatchCheckError::parse("test")
            .to_string()
            .contains("Version"));
        assert!(PatchCheckError::patch("test").to_string().contains("Patch"));
        assert!(PatchCheckError::sandbox("test")
            .to_string()
            .contains("Sandbox"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (PatchCheckError::config("x"), "Configuration error"),
            (PatchCheckError::parse("x"), "Version parsing error"),
            (PatchCheckError::patch("x"), "Patch error"),
            (PatchCheckError::sandbox("x"), "Sandbox error"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_is_sandbox() {
        assert!(PatchCheckError::sandbox("x").is_sandbox());
        assert!(!PatchCheckError::config("x").is_sandbox());
        assert!(!PatchCheckError::parse("x").is_sandbox());
    }
}
