//! Mapping of ticket and extractor failures to HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use helpdesk_core::{TicketError, ValidationError};

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

/// Failure of an API request.
#[derive(Debug)]
pub enum ApiError {
    /// A field failed validation (422).
    Validation(ValidationError),
    /// Ticket does not exist (404).
    NotFound(i64),
    /// Request could not be extracted; carries the rejection's own status.
    BadRequest { status: StatusCode, message: String },
    /// Unexpected failure; details are logged, not returned (500).
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::Validation(e) => Self::Validation(e),
            TicketError::NotFound(id) => Self::NotFound(id),
            TicketError::Storage(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Data errors (missing field, wrong type) are already 422; syntax
        // errors stay 400 and a missing content type stays 415.
        Self::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: e.message().to_string(),
                    field: Some(e.field()),
                },
            ),
            ApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: format!("Ticket not found: {}", id),
                    field: None,
                },
            ),
            ApiError::BadRequest { status, message } => (
                status,
                ErrorResponse {
                    error: message,
                    field: None,
                },
            ),
            ApiError::Internal(message) => {
                error!("Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal server error".to_string(),
                        field: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
