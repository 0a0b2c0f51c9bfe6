use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Incomplete submission: {0}")]
    IncompleteSubmission(String),

    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    #[error("Test type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Generator failure: {0}")]
    Generator(String),

    #[error("Generator contract violation: {0}")]
    ContractViolation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Error::IncompleteSubmission(_) => "INCOMPLETE_SUBMISSION",
            Error::UnknownReference(_) => "UNKNOWN_REFERENCE",
            Error::BadRequest(_) | Error::Validation(_) => "VALIDATION_ERROR",
            Error::TypeMismatch(_) => "TYPE_MISMATCH",
            Error::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Error::NotFound(_) => "ENTITY_NOT_FOUND",
            Error::Generator(_) | Error::Reqwest(_) => "GENERATOR_FAILURE",
            Error::ContractViolation(_) => "CONTRACT_VIOLATION",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Config(_)
            | Error::Database(_)
            | Error::Json(_)
            | Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::IncompleteSubmission(_)
            | Error::UnknownReference(_)
            | Error::BadRequest(_)
            | Error::Validation(_)
            | Error::TypeMismatch(_) => StatusCode::BAD_REQUEST,
            Error::PreconditionFailed(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Generator(_) | Error::Reqwest(_) | Error::ContractViolation(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::Config(_)
            | Error::Database(_)
            | Error::Json(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the caller may simply retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Generator(_) | Error::Reqwest(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            Error::Database(err) => {
                tracing::error!(error = ?err, "database error");
                "An unexpected error occurred".to_string()
            }
            Error::Config(_) | Error::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": code, "message": message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_classes_are_distinguishable() {
        let validation = Error::IncompleteSubmission("2 of 3 answered".into());
        let precondition = Error::PreconditionFailed("no evaluations".into());
        let missing = Error::NotFound("user".into());
        let upstream = Error::Generator("timeout".into());

        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(precondition.status(), StatusCode::CONFLICT);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        assert!(upstream.is_retryable());
        assert!(!validation.is_retryable());
        assert!(!precondition.is_retryable());
    }

    #[test]
    fn row_not_found_maps_to_entity_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), "ENTITY_NOT_FOUND");
    }
}
