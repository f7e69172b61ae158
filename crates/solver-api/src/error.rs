use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use solver_core::SolverError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Turn already in progress: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Persist(#[from] solver_persist::PersistError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SolverError> for ApiError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            SolverError::Forbidden(msg) => ApiError::Forbidden(msg),
            SolverError::NotFound(id) => ApiError::ThreadNotFound(id),
            SolverError::Conflict(turn_id) => ApiError::Conflict(turn_id),
            SolverError::Upstream(e) => ApiError::Persist(e),
            SolverError::Unknown(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::ThreadNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::BAD_GATEWAY, "Storage error".to_string())
            }
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
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

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SolverError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (SolverError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (SolverError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SolverError::Conflict("turn-1".into()), StatusCode::CONFLICT),
            (
                SolverError::Upstream(solver_persist::PersistError::Connection("down".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (SolverError::Unknown("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
