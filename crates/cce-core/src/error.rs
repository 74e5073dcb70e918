//! Error types for cce-core.

use thiserror::Error;

/// Top-level error type for cce-core.
///
/// The pipeline math is total over its domain, so these errors only arise at
/// construction time (invalid configuration) or when parsing external data.
#[derive(Debug, Error)]
pub enum CceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CceError {
    /// Create a ValidationError for a named config field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CceError {
    fn from(err: serde_json::Error) -> Self {
        CceError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for CceError {
    fn from(err: toml::de::Error) -> Self {
        CceError::ConfigError(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CceResult<T> = Result<T, CceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = CceError::validation("crystallization.cooling_rate", "must be > 0");
        let display = err.to_string();
        assert!(display.contains("cooling_rate"));
        assert!(display.contains("must be > 0"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = CceError::DimensionMismatch {
            expected: 10_000,
            actual: 512,
        };
        assert!(err.to_string().contains("10000"));
        assert!(err.to_string().contains("512"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<Vec<u32>, _> = serde_json::from_str("[1, 2,");
        let err: CceError = parse.unwrap_err().into();
        assert!(matches!(err, CceError::SerializationError(_)));
    }
}
