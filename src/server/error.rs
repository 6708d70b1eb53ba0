// ServiceError -> HTTP status + {"detail": ...} body
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::types::ErrorBody;
use crate::errors::ServiceError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Standard mapping; server-side failures get `context` prefixed
    pub fn with_context(err: ServiceError, context: &str) -> Self {
        let status = status_for(&err);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            Self::new(status, format!("{}: {}", context, err))
        } else {
            Self::new(status, err.to_string())
        }
    }

    /// Ingestion reports everything except a missing model as a 500
    pub fn ingestion(err: ServiceError) -> Self {
        match err {
            ServiceError::ModelUnavailable(_) => err.into(),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Ingestion failed: {}", other),
            ),
        }
    }
}

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::EmptyContent
        | ServiceError::ProcessingFailure(_)
        | ServiceError::IoError(_)
        | ServiceError::SerializationError(_)
        | ServiceError::TensorError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ServiceError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&ServiceError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ServiceError::ModelUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(&ServiceError::EmptyContent), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_context_only_on_server_errors() {
        let err = ApiError::with_context(ServiceError::ProcessingFailure("boom".into()), "Chat failed");
        assert_eq!(err.detail, "Chat failed: boom");

        let err = ApiError::with_context(ServiceError::material_not_found("m"), "Chat failed");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.detail, "Material m not found");
    }

    #[test]
    fn test_ingestion_mapping() {
        let err = ApiError::ingestion(ServiceError::EmptyContent);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail, "Ingestion failed: No valid text chunks generated");

        let err = ApiError::ingestion(ServiceError::ModelUnavailable("Embedding model not loaded".into()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
