//! Client-side stand-in for one server method.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::client::transport::{Transport, TransportResponse};
use crate::error::ClientError;
use crate::wire::InvokeRequest;

#[derive(Clone)]
pub struct MethodProxy {
    name: String,
    params: Vec<String>,
    transport: Arc<dyn Transport>,
}

impl MethodProxy {
    pub fn new(name: impl Into<String>, params: Vec<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: name.into(),
            params,
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Send `{method, args}` to the invoke endpoint and decode the result.
    pub fn invoke(&self, args: Vec<Value>) -> BoxFuture<'static, Result<Value, ClientError>> {
        let request = InvokeRequest::new(self.name.clone(), args);
        let sent = self.transport.invoke(request);
        Box::pin(async move { decode(sent.await?) })
    }
}

impl fmt::Debug for MethodProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodProxy")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Status >= 400 is a transport error; an empty body decodes to `null`.
pub(crate) fn decode(response: TransportResponse) -> Result<Value, ClientError> {
    if response.status >= 400 {
        return Err(ClientError::Transport {
            status: response.status,
            body: response.body,
        });
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ClientError::Parse(e.to_string()))
}
