//! Uniform JSON error envelope for the read API.

use crate::service::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub status_code: u16,
    pub status_message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Maps a service error, using `context` as the message for internal failures.
    pub fn from_service(err: ServiceError, context: &str) -> Self {
        match err {
            ServiceError::NotFound(id) => {
                warn!(%id, "Order not found");
                Self::not_found(format!("order {id} is not found"))
            }
            ServiceError::Storage(e) => {
                error!(error = %e, "{context}");
                Self::internal(context)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            status_code: self.status.as_u16(),
            status_message: self
                .status
                .canonical_reason()
                .unwrap_or_default()
                .to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
