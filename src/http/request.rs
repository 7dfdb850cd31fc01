//! Request handling.
//!
//! # Responsibilities
//! - Generate and propagate a unique request ID (UUID v4)
//! - Turn a routed request body into positional arguments
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body rules: empty → no args, array → spread, other JSON → one arg

use axum::http::{HeaderMap, HeaderValue, Request};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use uuid::Uuid;

use crate::error::DispatchError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Layer assigning an `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::x_request_id(UuidRequestId)
}

/// Layer copying the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// The request ID header, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Decode a routed request body into handler arguments.
pub fn body_args(body: &[u8]) -> Result<Vec<Value>, DispatchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| DispatchError::BadRequest(format!("body is not valid JSON: {}", e)))?;
    Ok(match value {
        Value::Array(items) => items,
        other => vec![other],
    })
}
