//! Error types for the PrepEase AI service
//!
//! Every failure a request can hit is one of a handful of conditions.
//! The HTTP layer maps each of them to a status code; nothing is retried.

use thiserror::Error;

/// Main error type for the retrieval, answering and quiz pipeline
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unknown material or lecture id, or a missing input file
    #[error("{0}")]
    NotFound(String),

    /// Request input that can never succeed (unsupported file, empty chunks)
    #[error("{0}")]
    InvalidInput(String),

    /// Chunking produced nothing to embed
    #[error("No valid text chunks generated")]
    EmptyContent,

    /// A model failed to load or is still loading
    #[error("{0}")]
    ModelUnavailable(String),

    /// Extraction, embedding or generation failed unexpectedly
    #[error("{0}")]
    ProcessingFailure(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Tensor errors raised inside the local models
    #[error("Model error: {0}")]
    TensorError(#[from] candle_core::Error),
}

impl ServiceError {
    pub fn material_not_found(id: &str) -> Self {
        ServiceError::NotFound(format!("Material {} not found", id))
    }

    /// True for conditions caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(_) | ServiceError::InvalidInput(_)
        )
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Convert anyhow errors to ServiceError
impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::ProcessingFailure(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::material_not_found("lec-42");
        assert_eq!(err.to_string(), "Material lec-42 not found");
        assert_eq!(
            ServiceError::EmptyContent.to_string(),
            "No valid text chunks generated"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(ServiceError::InvalidInput("bad".into()).is_client_error());
        assert!(ServiceError::NotFound("gone".into()).is_client_error());
        assert!(!ServiceError::EmptyContent.is_client_error());
        assert!(!ServiceError::ModelUnavailable("loading".into()).is_client_error());
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let err = anyhow::anyhow!("root cause").context("Failed to load tokenizer");
        let converted = ServiceError::from(err);
        let message = converted.to_string();
        assert!(message.contains("Failed to load tokenizer"));
        assert!(message.contains("root cause"));
    }
}
