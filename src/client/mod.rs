//! Client subsystem.
//!
//! # Data Flow
//! ```text
//! caller: dispatch.call(name, args)
//!     → dispatch.rs (NotReady: queue | Ready: look up proxy)
//!     → proxy.rs (serialize {method, args})
//!     → transport.rs (POST {base}/invoke, one attempt)
//!     → proxy.rs (status >= 400 → Transport, bad JSON → Parse)
//!     → caller's future settles
//!
//! connect():
//!     transport.rs (GET {base}/_methods)
//!     → dispatch.rs register_methods → Ready, FIFO drain
//! ```

pub mod dispatch;
pub mod proxy;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{CallFuture, ClientDispatch};
pub use proxy::MethodProxy;
pub use transport::{HttpTransport, Transport, TransportResponse};
