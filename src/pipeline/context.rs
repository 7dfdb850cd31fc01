//! Per-call invocation context and its before/after views.

use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::{InvocationError, ServerMethodError};
use crate::methods::{MethodDescriptor, Verb};

/// Ephemeral record of one call. Never shared across calls.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub name: String,
    pub verb: Verb,
    pub url: String,
    pub args: Vec<Value>,
    pub started_at: Instant,
}

impl InvocationContext {
    pub fn new(descriptor: &MethodDescriptor, args: Vec<Value>, url: String) -> Self {
        Self {
            name: descriptor.name().to_string(),
            verb: descriptor.verb(),
            url,
            args,
            started_at: Instant::now(),
        }
    }
}

/// View handed to before-hooks. Fields may be mutated; `throw` aborts.
#[derive(Debug)]
pub struct BeforeContext {
    call: InvocationContext,
}

impl BeforeContext {
    pub(crate) fn new(call: InvocationContext) -> Self {
        Self { call }
    }

    /// Build the error that aborts this call before the handler runs.
    ///
    /// ```ignore
    /// dispatcher.before(|ctx| Err(ctx.throw(403, "nope")));
    /// ```
    pub fn throw(&self, status: u16, message: impl Into<String>) -> ServerMethodError {
        ServerMethodError::new(status, self.call.name.clone(), self.call.args.clone(), message)
    }

    pub(crate) fn into_inner(self) -> InvocationContext {
        self.call
    }
}

impl Deref for BeforeContext {
    type Target = InvocationContext;

    fn deref(&self) -> &Self::Target {
        &self.call
    }
}

impl DerefMut for BeforeContext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.call
    }
}

/// Read-only view handed to after-hooks once the call has settled.
#[derive(Debug, Clone)]
pub struct AfterContext {
    call: InvocationContext,
    pub result: Option<Value>,
    pub error: Option<InvocationError>,
    pub elapsed: Duration,
}

impl AfterContext {
    pub(crate) fn settle(call: InvocationContext, outcome: &Result<Value, InvocationError>) -> Self {
        let elapsed = call.started_at.elapsed();
        let (result, error) = match outcome {
            Ok(value) => (Some(value.clone()), None),
            Err(e) => (None, Some(e.clone())),
        };
        Self {
            call,
            result,
            error,
            elapsed,
        }
    }

    /// Whole milliseconds between `started_at` and settlement.
    pub fn msecs(&self) -> u128 {
        self.elapsed.as_millis()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl Deref for AfterContext {
    type Target = InvocationContext;

    fn deref(&self) -> &Self::Target {
        &self.call
    }
}
