//! Server Methods Library
//!
//! Name-based remote procedure calls over HTTP: register named handlers on a
//! server, reach them by URL or through `/invoke`, and call them from a client
//! that queues calls until it knows the server's method set.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod methods;
pub mod pipeline;
pub mod routing;
pub mod wire;

// Transports
pub mod client;
pub mod http;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use client::{ClientDispatch, HttpTransport, MethodProxy};
pub use config::schema::ServerConfig;
pub use dispatch::Dispatcher;
pub use error::{ClientError, DispatchError, RegistryError, ServerMethodError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use methods::{handler_fn, sync_handler, HandlerError, HandlerSpec, Verb, VerbHandlers};
