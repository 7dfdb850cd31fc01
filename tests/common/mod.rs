//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::net::TcpListener;

use server_methods::config::ServerConfig;
use server_methods::dispatch::Dispatcher;
use server_methods::methods::{sync_handler, HandlerSpec};
use server_methods::{HttpServer, Shutdown};

/// Config with the given base path and defaults elsewhere.
pub fn config(base_path: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.service.base_path = base_path.to_string();
    config
}

/// Handler returning its arguments as an array.
pub fn echo() -> HandlerSpec {
    HandlerSpec::new(sync_handler(|args| Ok(Value::Array(args))))
}

/// Serve `dispatcher` on an ephemeral local port.
pub async fn spawn_server(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, dispatcher);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

pub fn base_url(addr: SocketAddr, base_path: &str) -> String {
    format!("http://{}{}", addr, base_path.trim_end_matches('/'))
}
