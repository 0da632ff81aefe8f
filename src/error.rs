use thiserror::Error;

/// Main error type for PRBench
#[derive(Error, Debug)]
pub enum PrbenchError {
    /// GitHub / judge API errors (non-quota HTTP failures are fatal)
    #[error("API error: {0}")]
    Api(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parse errors (malformed judge responses, bad dates, bad globs)
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using PrbenchError
pub type Result<T> = std::result::Result<T, PrbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrbenchError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let prbench_err: PrbenchError = io_err.into();
        assert!(matches!(prbench_err, PrbenchError::Io(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let prbench_err: PrbenchError = json_err.into();
        assert!(matches!(prbench_err, PrbenchError::Json(_)));
    }
}
