use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures that end an HTTP request outside GraphQL execution.
///
/// GraphQL field errors never become an `AppError`; they are reported inside
/// the 200 response body instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TooManyRequests(..) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code, in the same vocabulary as GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::TooManyRequests(..) => "RATE_LIMITED",
            AppError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => "INTERNAL",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::EmailError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Server-side failures are logged in full and reported generically.
        let (message, retry_after) = match self {
            AppError::TooManyRequests(msg, retry) => (msg, retry),
            AppError::ServiceUnavailable => ("Service unavailable".to_string(), None),
            AppError::InternalError(err)
            | AppError::DatabaseError(err)
            | AppError::ConfigError(err) => {
                tracing::error!(error = %err, code, "Request failed");
                ("Internal server error".to_string(), None)
            }
            AppError::EmailError(msg) => {
                tracing::error!(error = %msg, code, "Mail delivery failed");
                ("Internal server error".to_string(), None)
            }
        };

        let mut res = (
            status,
            Json(ErrorBody {
                error: message,
                code,
            }),
        )
            .into_response();

        if let Some(secs) = retry_after {
            res.headers_mut().insert(header::RETRY_AFTER, secs.into());
        }

        res
    }
}
