//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline after-hooks:
//!     → logging.rs (one structured event per call)
//!     → metrics.rs (counter + latency histogram)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Hooks are plain functions, registered by the binary, not by the library
//! - Request ID is added by the HTTP layer and shows up in tower-http spans

pub mod logging;
pub mod metrics;

pub use self::logging::log_invocation;
pub use self::metrics::{init_metrics, record_invocation};
