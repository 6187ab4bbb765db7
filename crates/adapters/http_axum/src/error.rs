//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use iopanel_domain::error::PanelError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps handler failures to an HTTP response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Panel(PanelError),
    /// The path names no resource (unknown kind, bad id, missing page).
    NotFound(String),
    Io(std::io::Error),
}

impl From<PanelError> for ApiError {
    fn from(err: PanelError) -> Self {
        Self::Panel(err)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Io(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Panel(PanelError::UnknownEntity(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Panel(
                err @ (PanelError::MalformedMessage(_)
                | PanelError::UnrecognizedCommand
                | PanelError::Validation(_)),
            ) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Panel(PanelError::Driver(err)) => {
                tracing::error!(error = %err, "output driver error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            Self::Io(err) => {
                tracing::error!(error = %err, "asset read failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
