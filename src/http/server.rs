//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the invoke, manifest, and route handlers
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener and stop on the shutdown broadcast
//! - Hand every request to the dispatcher

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::http::request::{body_args, propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::startup;
use crate::methods::Verb;
use crate::routing::method_url;
use crate::wire::{InvokeRequest, MethodManifest, INVOKE_PATH, MANIFEST_PATH};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server exposing a dispatcher's methods.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher: dispatcher.clone(),
        };
        let router = Self::build_router(&config, dispatcher.base_path(), state);
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, base_path: &str, state: AppState) -> Router {
        Router::new()
            .route(&method_url(base_path, INVOKE_PATH), post(invoke_handler))
            .route(&method_url(base_path, MANIFEST_PATH), get(manifest_handler))
            .fallback(route_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving on a custom listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        startup::announce(&self.dispatcher, addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// `POST {base}/invoke` with `{"method": name, "args": [...]}`.
async fn invoke_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, DispatchError> {
    let request: InvokeRequest = serde_json::from_slice(&body)
        .map_err(|e| DispatchError::BadRequest(format!("invalid invoke request: {}", e)))?;

    tracing::debug!(
        request_id = request_id(&headers),
        method = %request.method,
        args = request.args.len(),
        "Invoke request"
    );

    let result = state.dispatcher.invoke_named(request).await?;
    Ok(Json(result))
}

/// `GET {base}/_methods`.
async fn manifest_handler(State(state): State<AppState>) -> Json<MethodManifest> {
    Json(state.dispatcher.manifest())
}

/// Everything else: match the path against registered routes.
async fn route_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, DispatchError> {
    let verb = Verb::try_from(&method)?;
    let args = body_args(&body)?;

    tracing::debug!(
        request_id = request_id(&headers),
        verb = %verb,
        path = uri.path(),
        "Routed request"
    );

    let result = state.dispatcher.dispatch(uri.path(), verb, args).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::{sync_handler, HandlerSpec, VerbHandlers};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn server(base_path: &str) -> HttpServer {
        let mut config = ServerConfig::default();
        config.service.base_path = base_path.to_string();
        let dispatcher = Arc::new(Dispatcher::from_config(&config));
        dispatcher
            .register("echo", HandlerSpec::new(sync_handler(|args| Ok(Value::Array(args)))))
            .unwrap();
        dispatcher
            .register(
                "user",
                VerbHandlers::new()
                    .get(HandlerSpec::new(sync_handler(|args| Ok(json!({ "id": args[0] })))))
                    .url("/user/:id"),
            )
            .unwrap();
        HttpServer::new(config, dispatcher)
    }

    async fn send(server: &HttpServer, request: Request<Body>) -> (StatusCode, Value) {
        let response = server.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn test_invoke_endpoint_under_base_path() {
        let server = server("v1");
        let request = Request::post("/v1/invoke")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"method":"echo","args":[1,"a"]}"#))
            .unwrap();
        let (status, body) = send(&server, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([1, "a"]));
    }

    #[tokio::test]
    async fn test_routed_request_and_errors() {
        let server = server("/");

        let (status, body) = send(&server, Request::get("/user/7").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": "7" }));

        let (status, body) = send(&server, Request::get("/nowhere").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["status"], json!(404));

        let request = Request::patch("/echo").body(Body::empty()).unwrap();
        let (status, _) = send(&server, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let request = Request::post("/echo").body(Body::from("{nope")).unwrap();
        let (status, _) = send(&server, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let server = server("/");
        let response = server
            .router()
            .oneshot(Request::get("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(crate::http::X_REQUEST_ID));
    }
}
