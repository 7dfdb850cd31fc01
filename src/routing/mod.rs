//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at setup):
//!     method name or explicit url
//!     → url.rs (canonical {base_path}/{path})
//!     → pattern.rs (compile to fixed-arity segments)
//!     → stored on the MethodDescriptor
//!
//! Incoming request (path, verb):
//!     → registry lookup walks methods in insertion order
//!     → pattern.rs (structural match, captures in declared order)
//!     → Return: matched descriptor + params, or None
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once, immutable afterwards
//! - No regex in the hot path
//! - Deterministic: first registered match wins

pub mod pattern;
pub mod url;

pub use self::pattern::{RouteParams, RoutePattern, CAPTURE_PREFIX};
pub use self::url::{method_url, normalize_base_path};
