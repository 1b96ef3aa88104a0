use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use boothbook_service::ServiceError;
use serde_json::json;
use thiserror::Error;

/// Failures while configuring or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] boothbook_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// An error response: `{"error": ...}` plus `details` for server faults.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            details: None,
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            error: "only POST is allowed".into(),
            details: None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::InvalidInput(_) | ServiceError::UnknownVendor { .. } | ServiceError::NoOpRelocation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::VendorAlreadyBooked { .. }
            | ServiceError::BoothAlreadyTaken { .. }
            | ServiceError::StoreConflict { .. } => StatusCode::CONFLICT,
            ServiceError::StoreUnavailable(_)
            | ServiceError::AuthFailure(_)
            | ServiceError::Corrupt(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %e, "request failed");
            Self {
                status,
                error: "server error".into(),
                details: Some(e.to_string()),
            }
        } else {
            Self {
                status,
                error: e.to_string(),
                details: None,
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
