//! Client dispatch state: readiness gating and the pre-readiness queue.
//!
//! # State Machine
//! ```text
//! NotReady { queue, on_ready }
//!     call/apply → enqueue PendingCall, return a pending future
//!     register_methods → swap to Ready, run on_ready, drain queue (FIFO)
//! Ready { methods }
//!     call/apply → unknown name fails synchronously, else proxy.invoke
//!     register_methods → replace methods
//! ```
//!
//! # Design Decisions
//! - The state swap happens under one lock, so "check ready" and "enqueue"
//!   can never race with the transition
//! - The drain awaits queued calls one at a time, in arrival order, on a
//!   spawned task so a cancelled registration cannot strand them
//! - There is no way back to NotReady outside of tests

use std::collections::{HashMap, VecDeque};
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::client::proxy::{decode, MethodProxy};
use crate::client::transport::Transport;
use crate::error::ClientError;
use crate::wire::MethodManifest;

/// Settlement of one client call.
pub type CallFuture = BoxFuture<'static, Result<Value, ClientError>>;

type ReadyCallback = Box<dyn FnOnce() + Send>;

struct PendingCall {
    method_name: String,
    args: Vec<Value>,
    reply: oneshot::Sender<Result<Value, ClientError>>,
}

enum DispatchState {
    NotReady {
        queue: VecDeque<PendingCall>,
        on_ready: Vec<ReadyCallback>,
    },
    Ready {
        methods: HashMap<String, MethodProxy>,
    },
}

impl Default for DispatchState {
    fn default() -> Self {
        DispatchState::NotReady {
            queue: VecDeque::new(),
            on_ready: Vec::new(),
        }
    }
}

pub struct ClientDispatch {
    transport: Arc<dyn Transport>,
    state: Mutex<DispatchState>,
}

impl ClientDispatch {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Mutex::new(DispatchState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state(), DispatchState::Ready { .. })
    }

    /// Number of calls waiting for readiness.
    pub fn queued(&self) -> usize {
        match &*self.state() {
            DispatchState::NotReady { queue, .. } => queue.len(),
            DispatchState::Ready { .. } => 0,
        }
    }

    /// Method names waiting in the queue, in arrival order.
    pub fn queued_methods(&self) -> Vec<String> {
        match &*self.state() {
            DispatchState::NotReady { queue, .. } => queue.iter().map(|p| p.method_name.clone()).collect(),
            DispatchState::Ready { .. } => Vec::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<MethodProxy> {
        match &*self.state() {
            DispatchState::Ready { methods } => methods.get(name).cloned(),
            DispatchState::NotReady { .. } => None,
        }
    }

    /// Call `name` with positional `args`.
    ///
    /// Once ready, an unknown name fails here rather than in the returned
    /// future. Before readiness the call is queued unvalidated.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<CallFuture, ClientError> {
        let mut state = self.state();
        match &mut *state {
            DispatchState::Ready { methods } => {
                let proxy = methods
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ClientError::MethodNotFound(name.to_string()))?;
                drop(state);
                Ok(proxy.invoke(args))
            }
            DispatchState::NotReady { queue, .. } => {
                let (reply, settled) = oneshot::channel();
                queue.push_back(PendingCall {
                    method_name: name.to_string(),
                    args,
                    reply,
                });
                tracing::debug!(method = %name, queued = queue.len(), "Call queued until methods are known");
                Ok(Box::pin(async move { settled.await.unwrap_or(Err(ClientError::Dropped)) }))
            }
        }
    }

    /// Call `name` with an argument list given as one JSON value.
    ///
    /// An array is spread into positional arguments and `null` means no
    /// arguments. Any other value becomes a single argument: it is not spread.
    pub fn apply(&self, name: &str, args: Value) -> Result<CallFuture, ClientError> {
        let args = match args {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        self.call(name, args)
    }

    /// Run `callback` once methods are registered, or now if already ready.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state();
        match &mut *state {
            DispatchState::NotReady { on_ready, .. } => on_ready.push(Box::new(callback)),
            DispatchState::Ready { .. } => {
                drop(state);
                callback();
            }
        }
    }

    /// Install the server's method set, become ready and drain the queue.
    ///
    /// Queued calls run one after another in arrival order. A queued call
    /// naming an unknown method is rejected with `MethodNotFound`, and the
    /// registration itself then fails with `QueuedMethodsNotFound`.
    ///
    /// The drain runs on its own task: dropping the returned future (e.g.
    /// under a timeout) does not lose the queued calls. Must be called from
    /// within a Tokio runtime.
    pub async fn register_methods(&self, manifest: MethodManifest) -> Result<(), ClientError> {
        let methods: HashMap<String, MethodProxy> = manifest
            .iter()
            .map(|(name, info)| {
                let proxy = MethodProxy::new(name, info.params.clone(), self.transport.clone());
                (name.to_string(), proxy)
            })
            .collect();

        let previous = mem::replace(
            &mut *self.state(),
            DispatchState::Ready {
                methods: methods.clone(),
            },
        );

        let (queue, on_ready) = match previous {
            DispatchState::NotReady { queue, on_ready } => (queue, on_ready),
            DispatchState::Ready { .. } => (VecDeque::new(), Vec::new()),
        };

        tracing::info!(methods = methods.len(), queued = queue.len(), "Client methods registered");

        for callback in on_ready {
            callback();
        }

        if queue.is_empty() {
            return Ok(());
        }

        tokio::spawn(drain(queue, methods)).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Queue drain task failed");
            Err(ClientError::Dropped)
        })
    }

    /// Fetch the manifest through the transport and register it.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let body = decode(self.transport.manifest().await?)?;
        let manifest: MethodManifest =
            serde_json::from_value(body).map_err(|e| ClientError::Parse(e.to_string()))?;
        self.register_methods(manifest).await
    }

    /// Back to the initial state. Pending calls are dropped.
    #[cfg(test)]
    pub(crate) fn reset(&self) {
        *self.state() = DispatchState::default();
    }
}

/// Settle queued calls in arrival order; names that are still unknown are rejected.
async fn drain(
    queue: VecDeque<PendingCall>,
    methods: HashMap<String, MethodProxy>,
) -> Result<(), ClientError> {
    let mut unknown = Vec::new();
    for pending in queue {
        let outcome = match methods.get(&pending.method_name) {
            Some(proxy) => proxy.invoke(pending.args).await,
            None => {
                tracing::warn!(method = %pending.method_name, "Queued call names an unknown method");
                unknown.push(pending.method_name.clone());
                Err(ClientError::MethodNotFound(pending.method_name))
            }
        };
        let _ = pending.reply.send(outcome);
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ClientError::QueuedMethodsNotFound(unknown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::MockTransport;
    use crate::client::transport::TransportResponse;
    use crate::wire::MethodInfo;
    use futures_util::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manifest(names: &[&str]) -> MethodManifest {
        names.iter().map(|n| (*n, MethodInfo::default())).collect()
    }

    fn setup() -> (Arc<MockTransport>, ClientDispatch) {
        let transport = Arc::new(MockTransport::default());
        transport.respond_with(|req| TransportResponse::ok(Value::Array(req.args.clone()).to_string()));
        let dispatch = ClientDispatch::new(transport.clone());
        (transport, dispatch)
    }

    #[test]
    fn test_not_ready_upon_creation() {
        let (_, dispatch) = setup();
        assert!(!dispatch.is_ready());
        assert_eq!(dispatch.queued(), 0);
    }

    #[tokio::test]
    async fn test_stores_method_proxies() {
        let (_, dispatch) = setup();
        let mut m = MethodManifest::new();
        m.insert("foo", MethodInfo::default());
        m.insert("foo/bar", MethodInfo::with_params(["p1"]));
        dispatch.register_methods(m).await.unwrap();

        assert!(dispatch.is_ready());
        assert!(dispatch.method("foo").unwrap().params().is_empty());
        assert_eq!(dispatch.method("foo/bar").unwrap().params(), ["p1".to_string()]);
    }

    #[tokio::test]
    async fn test_on_ready_callbacks() {
        let (_, dispatch) = setup();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        dispatch.on_ready(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);

        dispatch.register_methods(manifest(&["foo"])).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let c = count.clone();
        dispatch.on_ready(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_call_and_apply_when_ready() {
        let (transport, dispatch) = setup();
        dispatch.register_methods(manifest(&["foo"])).await.unwrap();

        assert_eq!(dispatch.call("foo", vec![]).unwrap().await.unwrap(), json!([]));
        assert_eq!(
            dispatch.call("foo", vec![json!(1), json!(2), json!(3)]).unwrap().await.unwrap(),
            json!([1, 2, 3])
        );
        assert_eq!(dispatch.apply("foo", Value::Null).unwrap().await.unwrap(), json!([]));
        assert_eq!(dispatch.apply("foo", json!([1, 2, 3])).unwrap().await.unwrap(), json!([1, 2, 3]));
        assert_eq!(transport.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_apply_does_not_spread_scalars() {
        let (transport, dispatch) = setup();
        dispatch.register_methods(manifest(&["foo"])).await.unwrap();

        dispatch.apply("foo", json!(1)).unwrap().await.unwrap();
        assert_eq!(transport.sent()[0].args, vec![json!(1)]);
    }

    #[tokio::test]
    async fn test_unknown_method_fails_synchronously_once_ready() {
        let (transport, dispatch) = setup();
        dispatch.register_methods(manifest(&["foo"])).await.unwrap();

        let err = dispatch.call("not-exist", vec![]).err().unwrap();
        assert_eq!(err.to_string(), "Method 'not-exist' does not exist.");
        assert!(dispatch.apply("not-exist", Value::Null).is_err());

        dispatch.call("foo", vec![]).unwrap().await.unwrap();
        assert_eq!(dispatch.queued(), 0);
        assert_eq!(transport.sent_methods(), vec!["foo"]);
    }

    #[tokio::test]
    async fn test_calls_queue_before_ready() {
        let (transport, dispatch) = setup();

        let _call = dispatch.call("foo", vec![json!(1), json!(2), json!(3)]).unwrap();
        let _apply = dispatch.apply("bar", json!([4])).unwrap();

        assert_eq!(dispatch.queued(), 2);
        assert_eq!(dispatch.queued_methods(), vec!["foo", "bar"]);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_queue_drains_in_fifo_order() {
        let (transport, dispatch) = setup();

        let a = dispatch.call("a", vec![json!("a")]).unwrap();
        let b = dispatch.call("b", vec![json!("b")]).unwrap();
        let c = dispatch.call("c", vec![json!("c")]).unwrap();

        dispatch.register_methods(manifest(&["c", "b", "a"])).await.unwrap();

        assert_eq!(transport.sent_methods(), vec!["a", "b", "c"]);
        assert_eq!(dispatch.queued(), 0);
        assert_eq!(a.await.unwrap(), json!(["a"]));
        assert_eq!(b.await.unwrap(), json!(["b"]));
        assert_eq!(c.await.unwrap(), json!(["c"]));
    }

    #[tokio::test]
    async fn test_queued_call_resolves_with_server_result() {
        let (transport, dispatch) = setup();
        transport.respond_with(|_| TransportResponse::ok(r#"{"number":123}"#));

        let pending = dispatch.call("foo", vec![json!(1), json!(2)]).unwrap();
        dispatch.register_methods(manifest(&["foo"])).await.unwrap();

        assert_eq!(pending.await.unwrap(), json!({"number": 123}));
    }

    #[tokio::test]
    async fn test_queued_unknown_method_rejects_and_fails_registration() {
        let (transport, dispatch) = setup();

        let missing = dispatch.call("x", vec![]).unwrap();
        let known = dispatch.call("foo", vec![]).unwrap();

        let err = dispatch.register_methods(manifest(&["foo"])).await.unwrap_err();
        assert_eq!(err, ClientError::QueuedMethodsNotFound(vec!["x".into()]));

        assert_eq!(missing.await.unwrap_err(), ClientError::MethodNotFound("x".into()));
        assert!(known.await.is_ok());
        assert_eq!(transport.sent_methods(), vec!["foo"]);
        assert!(dispatch.is_ready());
    }

    #[tokio::test]
    async fn test_queued_unknown_with_empty_manifest() {
        let (_, dispatch) = setup();
        let missing = dispatch.call("x", vec![]).unwrap();

        assert!(dispatch.register_methods(MethodManifest::new()).await.is_err());
        assert!(matches!(missing.await, Err(ClientError::MethodNotFound(_))));
    }

    #[tokio::test]
    async fn test_connect_fetches_manifest() {
        let (transport, dispatch) = setup();
        transport.set_manifest(TransportResponse::ok(r#"{"foo":{"params":["id"]}}"#));

        dispatch.connect().await.unwrap();
        assert_eq!(dispatch.method("foo").unwrap().params(), ["id".to_string()]);

        let (transport, dispatch) = setup();
        transport.set_manifest(TransportResponse { status: 503, body: String::new() });
        assert_eq!(dispatch.connect().await.unwrap_err().status(), Some(503));
    }

    #[tokio::test]
    async fn test_reset_returns_to_not_ready() {
        let (_, dispatch) = setup();
        dispatch.register_methods(manifest(&["foo"])).await.unwrap();
        dispatch.reset();

        assert!(!dispatch.is_ready());
        let _pending = dispatch.call("foo", vec![]).unwrap();
        assert_eq!(dispatch.queued(), 1);
    }

    #[tokio::test]
    async fn test_dropped_registration_still_settles_queue() {
        let (transport, dispatch) = setup();
        let first = dispatch.call("foo", vec![json!(1)]).unwrap();
        let second = dispatch.call("foo", vec![json!(2)]).unwrap();

        // Poll the registration once, then abandon it.
        let _ = dispatch.register_methods(manifest(&["foo"])).now_or_never();
        assert!(dispatch.is_ready());

        assert_eq!(first.await.unwrap(), json!([1]));
        assert_eq!(second.await.unwrap(), json!([2]));
        assert_eq!(transport.sent_methods(), vec!["foo", "foo"]);
    }
}
