//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use quill_core::error::DomainError;
use quill_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Too many requests")]
    TooManyRequests,

    /// An upstream provider (storage, email) failed.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized(),
            AppError::Forbidden(detail) => ErrorResponse::forbidden().with_detail(detail),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Validation(errors) => ErrorResponse::unprocessable(errors.clone()),
            AppError::TooManyRequests => ErrorResponse::too_many_requests(),
            AppError::BadGateway(detail) => ErrorResponse::bad_gateway(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::NotFound { entity, key } => {
                AppError::NotFound(format!("{entity} not found: {key}"))
            }
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Permission(msg) => AppError::Forbidden(msg),
            DomainError::Storage(msg) | DomainError::Provider(msg) => AppError::BadGateway(msg),
            DomainError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("Title is required"), 422),
            (DomainError::not_found("Post", "hello"), 404),
            (DomainError::Duplicate("slug".into()), 409),
            (DomainError::Permission("rls".into()), 403),
            (DomainError::Storage("down".into()), 502),
            (DomainError::Provider("rejected".into()), 502),
            (DomainError::Backend("pool".into()), 500),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code().as_u16(), status);
        }
    }

    #[test]
    fn test_validation_error_keeps_every_message() {
        let err = AppError::from(DomainError::Validation(vec!["a".into(), "b".into()]));
        assert!(matches!(err, AppError::Validation(ref list) if list.len() == 2));
    }
}
