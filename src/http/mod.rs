//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers: request ID, trace, timeout, body limit)
//!     → POST {base}/invoke   → dispatcher.invoke_named
//!     → GET  {base}/_methods → dispatcher.manifest
//!     → anything else        → request.rs (body → args) → dispatcher.dispatch
//!     → response.rs (JSON result, or JSON error with status)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{body_args, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
