//! Invocation pipeline.
//!
//! # Data Flow
//! ```text
//! invoke(descriptor, args, url)
//!     PENDING       build InvocationContext (started_at = now)
//!     BEFORE_HOOKS  run in registration order; `throw` → Aborted
//!     HANDLER       skipped when aborted; sync and async settle alike
//!     AFTER_HOOKS   run in registration order with result | error, elapsed
//!     SETTLED       caller gets the handler/abort outcome
//! ```
//!
//! # Design Decisions
//! - Hooks are synchronous and never interleave within a phase
//! - After-hooks observe aborted calls too
//! - Panics in handlers become 500 handler errors; panics in after-hooks
//!   are logged and never change the outcome

pub mod context;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;

use crate::error::{InvocationError, ServerMethodError};
use crate::methods::MethodDescriptor;

pub use context::{AfterContext, BeforeContext, InvocationContext};

pub type BeforeHook = Arc<dyn Fn(&mut BeforeContext) -> Result<(), ServerMethodError> + Send + Sync>;
pub type AfterHook = Arc<dyn Fn(&AfterContext) + Send + Sync>;

/// Ordered before/after hooks wrapped around every handler call.
#[derive(Clone, Default)]
pub struct Pipeline {
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook run before every handler.
    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut BeforeContext) -> Result<(), ServerMethodError> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Append a hook run after every call settles.
    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&AfterContext) + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Run one call through before-hooks, the handler and after-hooks.
    pub async fn invoke(
        &self,
        descriptor: &MethodDescriptor,
        args: Vec<Value>,
        url: String,
    ) -> Result<Value, InvocationError> {
        let mut before = BeforeContext::new(InvocationContext::new(descriptor, args, url));

        let outcome = match self.run_before(&mut before) {
            Err(e) => {
                tracing::debug!(method = %before.name, status = e.status, "Call aborted by before-hook");
                Err(InvocationError::Aborted(e))
            }
            Ok(()) => call_handler(descriptor, before.args.clone()).await,
        };

        let after = AfterContext::settle(before.into_inner(), &outcome);
        self.run_after(&after);
        outcome
    }

    fn run_before(&self, ctx: &mut BeforeContext) -> Result<(), ServerMethodError> {
        for hook in &self.before {
            match panic::catch_unwind(AssertUnwindSafe(|| hook(ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(payload) => {
                    let message = format!("before-hook panicked: {}", panic_message(&*payload));
                    return Err(ctx.throw(500, message));
                }
            }
        }
        Ok(())
    }

    fn run_after(&self, ctx: &AfterContext) {
        for hook in &self.after {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| hook(ctx))) {
                tracing::warn!(
                    method = %ctx.name,
                    panic = %panic_message(&*payload),
                    "After-hook panicked"
                );
            }
        }
    }
}

async fn call_handler(descriptor: &MethodDescriptor, args: Vec<Value>) -> Result<Value, InvocationError> {
    let failed = |status: u16, message: String, args: Vec<Value>| {
        InvocationError::Handler(ServerMethodError::new(status, descriptor.name(), args, message))
    };

    let handler = descriptor.handler();
    let future = match panic::catch_unwind(AssertUnwindSafe(|| handler.call(args.clone()))) {
        Ok(future) => future,
        Err(payload) => return Err(failed(500, panic_message(&*payload), args)),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(failed(e.status, e.message, args)),
        Err(payload) => Err(failed(500, panic_message(&*payload), args)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
