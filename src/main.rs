//! Server Methods (v1)
//!
//! A name-based RPC server built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routing (pattern match)
//!                         │                 │
//!                         │ /invoke         ▼
//!                         └────────▶ methods registry ──▶ pipeline
//!                                                        before → handler → after
//!     Client Response                                         │
//!     ◀────────────── http response ◀─────────────────────────┘
//!
//!     Cross-cutting: config, observability (logs + metrics), lifecycle
//! ```
//!
//! Usage: `server-methods [config.toml]`

use std::path::PathBuf;

use serde_json::{json, Value};

use server_methods::dispatch::Dispatcher;
use server_methods::lifecycle::{self, startup, Shutdown};
use server_methods::methods::{sync_handler, HandlerError, HandlerSpec, VerbHandlers};
use server_methods::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = startup::load(config_path.as_deref())?;

    server_methods::observability::logging::init(&config.observability.log_level);

    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let dispatcher = startup::build_dispatcher(&config);
    register_builtin_methods(&dispatcher)?;

    let listener = startup::bind(&config).await?;

    let shutdown = Shutdown::new();
    lifecycle::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, dispatcher);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Methods every server exposes out of the box.
fn register_builtin_methods(dispatcher: &Dispatcher) -> Result<(), server_methods::RegistryError> {
    dispatcher.register(
        "echo",
        HandlerSpec::new(sync_handler(|args| Ok(Value::Array(args)))).with_params(["...args"]),
    )?;

    dispatcher.register(
        "user",
        VerbHandlers::new()
            .get(HandlerSpec::new(sync_handler(|args| {
                let id = args.first().cloned().unwrap_or(Value::Null);
                Ok(json!({ "id": id }))
            }))
            .with_params(["id"]))
            .put(HandlerSpec::new(sync_handler(|args| {
                let mut args = args.into_iter();
                let id = args.next().ok_or_else(|| HandlerError::with_status(400, "missing id"))?;
                let fields = args.next().unwrap_or_else(|| json!({}));
                Ok(json!({ "id": id, "updated": fields }))
            }))
            .with_params(["id", "fields"]))
            .url("/user/:id")
            .docs("Read or update a user record."),
    )?;

    Ok(())
}
