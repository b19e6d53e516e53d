use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::ordering::OrderingError;

/// Error surfaced by services and handlers.
///
/// `Backend` keeps the underlying failure only for logging; clients get the
/// static message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{message}")]
    Backend {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn backend(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        error!(error = %format!("{source:#}"), "{message}");
        AppError::Backend { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OrderingError> for AppError {
    fn from(e: OrderingError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Maps any failing backend call to [`AppError::Backend`], logging the cause.
pub trait OrBackend<T> {
    fn or_backend(self, message: &'static str) -> AppResult<T>;
}

impl<T, E> OrBackend<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_backend(self, message: &'static str) -> AppResult<T> {
        self.map_err(|e| AppError::backend(message, e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_hides_source_detail() {
        let err: AppResult<()> =
            Err(anyhow::anyhow!("connection reset by peer")).or_backend("Failed to load gallery");
        let err = err.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to load gallery");
    }

    #[test]
    fn statuses_match_variants() {
        assert_eq!(AppError::NotFound("Menu item").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound("Menu item").to_string(), "Menu item not found");
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Unauthorized("x").status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn ordering_errors_are_validation_errors() {
        let err: AppError = OrderingError::OutOfRange { requested: 9, max: 3 }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
