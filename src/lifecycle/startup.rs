//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the dispatcher and attach observability hooks
//! - Bind the listener last, so traffic only arrives once methods are registered
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Registration happens before bind; the registry is not mutated while serving

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, ServerConfig};
use crate::dispatch::Dispatcher;
use crate::observability;

/// Load from `path`, or fall back to defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(ServerConfig::default()),
    }
}

/// Build a dispatcher with logging (and metrics, if enabled) wired in.
pub fn build_dispatcher(config: &ServerConfig) -> Arc<Dispatcher> {
    let dispatcher = Dispatcher::from_config(config);
    dispatcher.after(observability::log_invocation);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                observability::init_metrics(addr);
                dispatcher.after(observability::record_invocation);
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    Arc::new(dispatcher)
}

/// Bind the configured listener.
pub async fn bind(config: &ServerConfig) -> std::io::Result<TcpListener> {
    TcpListener::bind(&config.listener.bind_address).await
}

/// Log the service identity and what it serves.
pub fn announce(dispatcher: &Dispatcher, addr: SocketAddr) {
    let registry = dispatcher.registry();
    tracing::info!(
        service = dispatcher.name(),
        version = dispatcher.version(),
        base_path = dispatcher.base_path(),
        methods = registry.len(),
        address = %addr,
        "HTTP server starting"
    );
    for set in registry.iter() {
        let verbs: Vec<&str> = set.verbs().map(|v| v.as_str()).collect();
        tracing::debug!(method = set.name(), url = set.url(), verbs = ?verbs, "Serving method");
    }
}
