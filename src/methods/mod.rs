//! Method registration subsystem.
//!
//! # Data Flow
//! ```text
//! register(name, definition)
//!     → definition.rs (Single | PerVerb → MethodSet)
//!     → descriptor.rs (one immutable descriptor per verb)
//!     → registry.rs (duplicate / overlap checks, insertion-ordered store)
//!
//! lookup(url, verb)
//!     → registry.rs walks sets in order
//!     → Return: descriptor + captured params, or None
//! ```

pub mod definition;
pub mod descriptor;
pub mod handler;
pub mod registry;
pub mod verb;

pub use definition::{MethodDefinition, MethodSet, VerbHandlers};
pub use descriptor::MethodDescriptor;
pub use handler::{handler_fn, sync_handler, Handler, HandlerError, HandlerResult, HandlerSpec};
pub use registry::{MethodRegistry, RouteMatch};
pub use verb::Verb;
