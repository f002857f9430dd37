//! Error types for nutrirag

use thiserror::Error;

/// Result type alias using NutriRagError
pub type Result<T> = std::result::Result<T, NutriRagError>;

/// Error type alias for convenience
pub type Error = NutriRagError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_INPUT: i32 = 3;
    pub const SERVICE_UNAVAILABLE: i32 = 4;
}

/// Main error type for nutrirag
#[derive(Debug, Error)]
pub enum NutriRagError {
    /// Bad physiological or request input (user-correctable)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl NutriRagError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// External-dependency failures that the calling layer may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_) | Self::IndexUnavailable(_) | Self::Generation(_)
        )
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ if self.is_retryable() => exit_codes::SERVICE_UNAVAILABLE,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_failures_are_retryable() {
        assert!(NutriRagError::Embedding("down".into()).is_retryable());
        assert!(NutriRagError::IndexUnavailable("down".into()).is_retryable());
        assert!(NutriRagError::Generation("timeout".into()).is_retryable());
        assert!(!NutriRagError::validation("age").is_retryable());
        assert!(!NutriRagError::Config("url".into()).is_retryable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            NutriRagError::validation("age").exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            NutriRagError::Generation("x".into()).exit_code(),
            exit_codes::SERVICE_UNAVAILABLE
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(NutriRagError::from(io).exit_code(), exit_codes::GENERAL_ERROR);
    }
}
