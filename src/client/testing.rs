//! In-memory transport for unit tests.

use std::sync::{Arc, Mutex};

use futures_util::future::{self, BoxFuture};

use crate::client::transport::{Transport, TransportResponse};
use crate::error::ClientError;
use crate::wire::InvokeRequest;

type Responder = Arc<dyn Fn(&InvokeRequest) -> TransportResponse + Send + Sync>;

/// Records every request and answers from a configurable responder.
pub struct MockTransport {
    sent: Mutex<Vec<InvokeRequest>>,
    responder: Mutex<Responder>,
    manifest: Mutex<TransportResponse>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            responder: Mutex::new(Arc::new(|_| TransportResponse::ok("null"))),
            manifest: Mutex::new(TransportResponse::ok("{}")),
        }
    }
}

impl MockTransport {
    pub fn respond_with<F>(&self, f: F)
    where
        F: Fn(&InvokeRequest) -> TransportResponse + Send + Sync + 'static,
    {
        *self.responder.lock().unwrap() = Arc::new(f);
    }

    pub fn set_manifest(&self, response: TransportResponse) {
        *self.manifest.lock().unwrap() = response;
    }

    pub fn sent(&self) -> Vec<InvokeRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_methods(&self) -> Vec<String> {
        self.sent().into_iter().map(|r| r.method).collect()
    }
}

impl Transport for MockTransport {
    fn invoke(&self, request: InvokeRequest) -> BoxFuture<'static, Result<TransportResponse, ClientError>> {
        let responder = self.responder.lock().unwrap().clone();
        let response = responder(&request);
        self.sent.lock().unwrap().push(request);
        Box::pin(future::ready(Ok(response)))
    }

    fn manifest(&self) -> BoxFuture<'static, Result<TransportResponse, ClientError>> {
        let response = self.manifest.lock().unwrap().clone();
        Box::pin(future::ready(Ok(response)))
    }
}
