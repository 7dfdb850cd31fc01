//! Type-erased method handlers.
//!
//! Handlers take positional JSON arguments and settle asynchronously.
//! Synchronous functions are wrapped with [`sync_handler`] so the pipeline
//! only ever awaits a single future shape.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use serde_json::Value;
use thiserror::Error;

/// Result of one handler invocation.
pub type HandlerResult = Result<Value, HandlerError>;

/// Failure reported by a handler, with the HTTP status to surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub status: u16,
    pub message: String,
}

impl HandlerError {
    /// A 500 error.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(500, message)
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::with_status(400, format!("Invalid arguments: {}", e))
    }
}

/// A callable bound to one or more method descriptors.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, args: Vec<Value>) -> BoxFuture<'static, HandlerResult>;
}

/// Adapter for async functions.
pub struct AsyncHandler<F>(F);

impl<F, Fut> Handler for AsyncHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, args: Vec<Value>) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.0)(args))
    }
}

/// Adapter for functions that return their result immediately.
pub struct SyncHandler<F>(F);

impl<F> Handler for SyncHandler<F>
where
    F: Fn(Vec<Value>) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, args: Vec<Value>) -> BoxFuture<'static, HandlerResult> {
        Box::pin(future::ready((self.0)(args)))
    }
}

pub fn handler_fn<F, Fut>(f: F) -> AsyncHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    AsyncHandler(f)
}

pub fn sync_handler<F>(f: F) -> SyncHandler<F>
where
    F: Fn(Vec<Value>) -> HandlerResult + Send + Sync + 'static,
{
    SyncHandler(f)
}

/// A handler plus its declared parameter names.
#[derive(Clone)]
pub struct HandlerSpec {
    handler: Arc<dyn Handler>,
    params: Vec<String>,
}

impl HandlerSpec {
    pub fn new(handler: impl Handler) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            params: Vec::new(),
        }
    }

    /// Set the ordered parameter names advertised to clients.
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl std::fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
