//! Client transport seam and its HTTP implementation.

use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::Client;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::wire::{InvokeRequest, INVOKE_PATH, MANIFEST_PATH};

/// Raw response handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves wire requests to the server. One attempt per call, no retries.
pub trait Transport: Send + Sync + 'static {
    /// Send `request` to the invoke endpoint.
    fn invoke(&self, request: InvokeRequest) -> BoxFuture<'static, Result<TransportResponse, ClientError>>;

    /// Fetch the server's method manifest.
    fn manifest(&self) -> BoxFuture<'static, Result<TransportResponse, ClientError>>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    invoke_url: Url,
    manifest_url: Url,
}

impl HttpTransport {
    /// `base_url` is the server root including its base path.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let join = |path: &str| {
            base.join(path)
                .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            invoke_url: join(INVOKE_PATH)?,
            manifest_url: join(MANIFEST_PATH)?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn invoke_url(&self) -> &Url {
        &self.invoke_url
    }

    pub fn manifest_url(&self) -> &Url {
        &self.manifest_url
    }

    async fn read(response: reqwest::Response) -> Result<TransportResponse, ClientError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn invoke(&self, request: InvokeRequest) -> BoxFuture<'static, Result<TransportResponse, ClientError>> {
        let client = self.client.clone();
        let url = self.invoke_url.clone();
        Box::pin(async move {
            tracing::debug!(method = %request.method, url = %url, "Invoking remote method");
            let response = client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| ClientError::Connection(e.to_string()))?;
            Self::read(response).await
        })
    }

    fn manifest(&self) -> BoxFuture<'static, Result<TransportResponse, ClientError>> {
        let client = self.client.clone();
        let url = self.manifest_url.clone();
        Box::pin(async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| ClientError::Connection(e.to_string()))?;
            Self::read(response).await
        })
    }
}
