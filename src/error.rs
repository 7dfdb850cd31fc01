//! Error taxonomies for registration, dispatch and the client.
//!
//! # Propagation
//! - `RegistryError` is a setup-time configuration mistake; callers refuse to start.
//! - `InvocationError` is the settled failure of one pipeline run.
//! - `DispatchError` is what the HTTP surface turns into an error response.
//! - `ClientError` is the failure channel of a client-side call.

use serde_json::Value;
use thiserror::Error;

use crate::methods::Verb;

/// Configuration errors raised while building the method registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Method name not specified.")]
    EmptyName,

    #[error("Method \"{0}\" already exists.")]
    DuplicateMethod(String),

    /// A per-verb definition supplied no handler at all.
    #[error("No handler specified for the method '{0}'.")]
    NoHandlers(String),

    #[error("Invalid route pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two routes for the same verb can match the same concrete path.
    #[error("Route {verb} {url} of method \"{method}\" overlaps {existing_url} of method \"{existing}\"")]
    RouteConflict {
        method: String,
        verb: Verb,
        url: String,
        existing: String,
        existing_url: String,
    },
}

/// A failed server method call, carrying the HTTP status to report.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Method '{method}' failed with status {status}: {message}")]
pub struct ServerMethodError {
    pub status: u16,
    pub method: String,
    pub args: Vec<Value>,
    pub message: String,
}

impl ServerMethodError {
    pub fn new(status: u16, method: impl Into<String>, args: Vec<Value>, message: impl Into<String>) -> Self {
        Self {
            status,
            method: method.into(),
            args,
            message: message.into(),
        }
    }
}

/// How a single pipeline run failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvocationError {
    /// A before-hook rejected the call; the handler never ran.
    #[error("Aborted: {0}")]
    Aborted(ServerMethodError),

    /// The handler returned an error or panicked.
    #[error(transparent)]
    Handler(ServerMethodError),
}

impl InvocationError {
    pub fn details(&self) -> &ServerMethodError {
        match self {
            InvocationError::Aborted(e) | InvocationError::Handler(e) => e,
        }
    }

    pub fn status(&self) -> u16 {
        self.details().status
    }
}

/// Errors surfaced by the server-side dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("No method matches {verb} {url}")]
    RouteNotFound { verb: Verb, url: String },

    #[error("Method '{0}' does not exist.")]
    MethodNotFound(String),

    #[error("Method '{method}' does not support {verb}")]
    VerbNotSupported { method: String, verb: Verb },

    #[error("HTTP verb {0} is not supported")]
    VerbNotAllowed(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl DispatchError {
    /// HTTP status code reported for this error.
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::RouteNotFound { .. } | DispatchError::MethodNotFound(_) => 404,
            DispatchError::VerbNotSupported { .. } | DispatchError::VerbNotAllowed(_) => 405,
            DispatchError::BadRequest(_) => 400,
            DispatchError::Invocation(e) => e.status(),
        }
    }

    /// Name of the method involved, when one was resolved.
    pub fn method(&self) -> Option<&str> {
        match self {
            DispatchError::MethodNotFound(name) => Some(name),
            DispatchError::VerbNotSupported { method, .. } => Some(method),
            DispatchError::Invocation(e) => Some(&e.details().method),
            _ => None,
        }
    }
}

/// Errors of the client-side proxy and dispatch state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("Method '{0}' does not exist.")]
    MethodNotFound(String),

    /// The server answered with an error status.
    #[error("Request failed with status {status}: {body}")]
    Transport { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The request never produced a response.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Calls queued before readiness named methods the server does not have.
    #[error("Queued calls reference unknown methods: {}", .0.join(", "))]
    QueuedMethodsNotFound(Vec<String>),

    #[error("Call was dropped before it settled")]
    Dropped,
}

impl ClientError {
    /// HTTP status of a transport failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}
