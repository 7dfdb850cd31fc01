//! Response handling.
//!
//! # Responsibilities
//! - Map dispatch errors to HTTP status codes
//! - Render the JSON error payload
//!
//! # Design Decisions
//! - Error statuses below 400 are reported as 500
//! - Hook and handler errors expose their own message, not the wrapper text

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::DispatchError;
use crate::wire::{ErrorBody, ErrorDetail};

impl DispatchError {
    /// Message shown to the client.
    pub fn public_message(&self) -> String {
        match self {
            DispatchError::Invocation(e) => e.details().message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status())
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Method call failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                status: status.as_u16(),
                method: self.method().map(str::to_string),
                message: self.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}
