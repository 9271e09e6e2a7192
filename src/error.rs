use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Failures surfaced to callers.
///
/// Storage details never reach the response body, they are logged where the
/// failure is first observed and collapsed into [`ApiError::Persistence`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("token missing or invalid")]
    Unauthorized,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("request could not be completed")]
    Persistence,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Validation(_) => "validation_error",
            Self::NotFound => "not_found",
            Self::Persistence => "persistence_failure",
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            // no separate 5xx path, storage failures are reported as bad requests
            Self::Validation(_) | Self::Persistence => StatusCode::BAD_REQUEST,
        }
    }
}

/// Logs a storage failure under `context` and collapses it for the caller.
pub(crate) fn persistence(context: &str) -> impl FnOnce(eyre::Report) -> ApiError + '_ {
    move |e| {
        error!("{context}: {e:?}");
        ApiError::Persistence
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
