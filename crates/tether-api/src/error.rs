use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tether_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("No active stream")]
    NoActiveStream,

    #[error(transparent)]
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NoActiveStream(_) => ApiError::NoActiveStream,
            other => ApiError::Engine(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NoActiveStream => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Engine(ref e) => match e {
                EngineError::UnknownProvider(_)
                | EngineError::InvalidRequest(_)
                | EngineError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                EngineError::StreamInProgress(_) => (StatusCode::CONFLICT, e.to_string()),
                EngineError::NoActiveStream(_) => (StatusCode::NOT_FOUND, "No active stream".to_string()),
                EngineError::Attachment(_) => {
                    tracing::error!("Attachment store error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
                }
                EngineError::Persist(_) => {
                    tracing::error!("Persistence error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
                }
                EngineError::Config(_) => {
                    tracing::error!("Config error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
                }
            },
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tether_attachments::AttachmentError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
            (ApiError::from(EngineError::NoActiveStream("t1".to_string())), StatusCode::NOT_FOUND),
            (
                ApiError::from(EngineError::StreamInProgress("t1".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(EngineError::from(AttachmentError::UnsupportedMimeType(
                    "text/plain".to_string(),
                ))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(EngineError::Config("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
