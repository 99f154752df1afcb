use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Request body failed to parse or violated a field constraint.
    Validation(String),
    /// Request refused before parsing (wrong content type, body too large).
    Rejected {
        status: StatusCode,
        message: String,
    },
    /// The persistence gateway rejected or could not store a record.
    Persistence(String),
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Invalid startup configuration (knowledge base, schema name, ...).
    Configuration(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// HTTP status this error renders as.
    ///
    /// Only request failures are client errors; everything else collapses
    /// into a flat 500.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Rejected { status, .. } => *status,
            AppError::WithContext { source, .. } => source.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to the caller as `detail`.
    pub fn detail(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Persistence(msg)
            | AppError::Configuration(msg)
            | AppError::InternalError(msg)
            | AppError::Rejected { message: msg, .. } => msg.clone(),
            AppError::DatabaseError(e) => e.to_string(),
            AppError::WithContext { source, context } => {
                format!("{}: {}", context, source.detail())
            }
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Rejected { status, message } => {
                write!(f, "Request rejected ({}): {}", status, message)
            }
            AppError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::DatabaseError(e) => Some(e),
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// The body is always `{"detail": "<message>"}`. Server-side failures are
    /// logged with their full context chain before being flattened.
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "detail": self.detail(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    /// Converts a `sqlx::Error` into an `AppError`.
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_unprocessable() {
        let err = AppError::Validation("email: invalid".to_string());
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail(), "email: invalid");
    }

    #[test]
    fn test_rejected_keeps_its_status() {
        let err = AppError::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".to_string(),
        };
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(err.detail().contains("Content-Type"));
    }

    #[test]
    fn test_persistence_maps_to_internal_error() {
        let err = AppError::Persistence("Database not available".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Database not available");
    }

    #[test]
    fn test_context_keeps_source_status() {
        let err: Result<(), AppError> = Err(AppError::Validation("too short".to_string()));
        let err = err.context("question").unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail(), "question: too short");
        assert_eq!(err.to_string(), "question: Validation error: too short");
    }

    #[test]
    fn test_sqlx_context_is_server_error() {
        let err: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        let err = err.with_context(|| "insert into lead".to_string()).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.detail().starts_with("insert into lead: "));
    }
}
