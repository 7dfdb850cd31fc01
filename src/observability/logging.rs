//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Log every settled method call from an after-hook
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Success logs at info, failure at warn; both carry name, verb, url, msecs

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::pipeline::AfterContext;

/// Install the global subscriber. Safe to call more than once.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("server_methods={level},tower_http={level}").into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// After-hook: one structured event per call.
pub fn log_invocation(ctx: &AfterContext) {
    match &ctx.error {
        None => tracing::info!(
            method = %ctx.name,
            verb = %ctx.verb,
            url = %ctx.url,
            msecs = ctx.msecs() as u64,
            "Method call completed"
        ),
        Some(error) => tracing::warn!(
            method = %ctx.name,
            verb = %ctx.verb,
            url = %ctx.url,
            msecs = ctx.msecs() as u64,
            status = error.status(),
            error = %error,
            "Method call failed"
        ),
    }
}
