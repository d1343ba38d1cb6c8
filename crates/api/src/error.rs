use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use newsreel_core::error::CoreError;
use serde_json::json;

/// Error returned by handlers, rendered as `{"error": .., "code": ..}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(CoreError::NotFound { .. })
            | AppError::Database(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Core(CoreError::Validation(_)) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Core(CoreError::Conflict(_)) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            AppError::Database(sqlx::Error::Database(db)) if db.is_check_violation() => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        // Database details stay in the log.
        let message = match &self {
            AppError::Core(core) => core.to_string(),
            AppError::Database(_) if status == StatusCode::NOT_FOUND => "Entry not found".to_string(),
            AppError::Database(e) => {
                if status.is_server_error() {
                    tracing::error!(error = %e, "Database error");
                }
                "Request could not be completed".to_string()
            }
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_is_404() {
        let err = AppError::Core(CoreError::NotFound {
            entity: "Entry",
            id: 3,
        });
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "NOT_FOUND"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_row_is_404() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn settled_entry_is_409() {
        let err = AppError::Core(CoreError::Conflict("already has a video".into()));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_database_errors_are_500() {
        let err = AppError::Database(sqlx::Error::PoolClosed);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
