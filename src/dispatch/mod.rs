//! Server-side composition root.
//!
//! # Data Flow
//! ```text
//! setup:   methods()/register() → MethodRegistry snapshot swap
//!          before()/after()     → Pipeline snapshot swap
//!
//! request: dispatch(url, verb, body args)
//!     → registry.resolve (RouteNotFound if none)
//!     → captures prepended to body args
//!     → pipeline.invoke (before → handler → after)
//!
//! invoke:  invoke_named({method, args}) → invoke target of the set → pipeline
//! local:   call(name, verb, args) → leading args fill captures → pipeline
//! ```
//!
//! # Design Decisions
//! - Registry and hooks live behind `ArcSwap`: readers take a lock-free
//!   snapshot, setup code swaps in a new one
//! - Mutation is single-writer; concurrent registration is not supported
//! - No implicit globals: the binary owns one `Arc<Dispatcher>`

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

use crate::config::{RegistryConfig, ServerConfig, ServiceConfig};
use crate::error::{DispatchError, InvocationError, RegistryError, ServerMethodError};
use crate::methods::{MethodDefinition, MethodDescriptor, MethodRegistry, MethodSet, RouteMatch, Verb};
use crate::pipeline::{AfterContext, BeforeContext, Pipeline};
use crate::routing::normalize_base_path;
use crate::wire::{InvokeRequest, MethodInfo, MethodManifest};

pub struct Dispatcher {
    name: String,
    version: String,
    base_path: String,
    docs: bool,
    registry: ArcSwap<MethodRegistry>,
    pipeline: ArcSwap<Pipeline>,
}

impl Dispatcher {
    pub fn new(service: &ServiceConfig, registry: &RegistryConfig) -> Self {
        let base_path = normalize_base_path(&service.base_path);
        let methods = MethodRegistry::new(&base_path)
            .reject_overlapping_routes(registry.reject_overlapping_routes);

        Self {
            name: service.name.clone(),
            version: service.version.clone(),
            base_path,
            docs: service.docs,
            registry: ArcSwap::from_pointee(methods),
            pipeline: ArcSwap::from_pointee(Pipeline::new()),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.service, &config.registry)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Register one method.
    pub fn register(
        &self,
        name: &str,
        definition: impl Into<MethodDefinition>,
    ) -> Result<Arc<MethodSet>, RegistryError> {
        let mut next = MethodRegistry::clone(&self.registry.load());
        let set = next.register(name, definition)?;
        self.registry.store(Arc::new(next));
        Ok(set)
    }

    /// Register a batch of methods. Either all are stored or none.
    pub fn methods<I, S, D>(&self, definitions: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (S, D)>,
        S: AsRef<str>,
        D: Into<MethodDefinition>,
    {
        let mut next = MethodRegistry::clone(&self.registry.load());
        for (name, definition) in definitions {
            next.register(name.as_ref(), definition)?;
        }
        self.registry.store(Arc::new(next));
        Ok(())
    }

    /// Register a hook run before every method call.
    pub fn before<F>(&self, hook: F) -> &Self
    where
        F: Fn(&mut BeforeContext) -> Result<(), ServerMethodError> + Send + Sync + 'static,
    {
        let mut next = Pipeline::clone(&self.pipeline.load());
        next.before(hook);
        self.pipeline.store(Arc::new(next));
        self
    }

    /// Register a hook run after every method call settles.
    pub fn after<F>(&self, hook: F) -> &Self
    where
        F: Fn(&AfterContext) + Send + Sync + 'static,
    {
        let mut next = Pipeline::clone(&self.pipeline.load());
        next.after(hook);
        self.pipeline.store(Arc::new(next));
        self
    }

    /// Current registry snapshot.
    pub fn registry(&self) -> Arc<MethodRegistry> {
        self.registry.load_full()
    }

    pub fn lookup(&self, url: &str, verb: Verb) -> Option<RouteMatch> {
        self.registry.load().resolve(url, verb)
    }

    /// Run `descriptor` through the pipeline.
    pub async fn invoke(
        &self,
        descriptor: &MethodDescriptor,
        args: Vec<Value>,
        url: String,
    ) -> Result<Value, InvocationError> {
        let pipeline = self.pipeline.load_full();
        pipeline.invoke(descriptor, args, url).await
    }

    /// Serve a routed request: captures are prepended to the body arguments.
    pub async fn dispatch(&self, url: &str, verb: Verb, body_args: Vec<Value>) -> Result<Value, DispatchError> {
        let RouteMatch { descriptor, params } =
            self.lookup(url, verb).ok_or_else(|| DispatchError::RouteNotFound {
                verb,
                url: url.to_string(),
            })?;

        let mut args: Vec<Value> = params.values().map(|v| Value::String(v.to_string())).collect();
        args.extend(body_args);

        Ok(self.invoke(&descriptor, args, url.to_string()).await?)
    }

    /// Serve a name-based `/invoke` request.
    pub async fn invoke_named(&self, request: InvokeRequest) -> Result<Value, DispatchError> {
        let descriptor = self
            .registry
            .load()
            .get(&request.method)
            .and_then(|set| set.invoke_target().cloned())
            .ok_or_else(|| DispatchError::MethodNotFound(request.method.clone()))?;

        let url = descriptor
            .route()
            .resolve(&request.args)
            .unwrap_or_else(|| descriptor.url().to_string());

        Ok(self.invoke(&descriptor, request.args, url).await?)
    }

    /// Call a method in-process, as a remote client would through its URL.
    ///
    /// The leading arguments fill the route's captures and are not passed on.
    pub async fn call(&self, name: &str, verb: Verb, args: Vec<Value>) -> Result<Value, DispatchError> {
        let descriptor = {
            let registry = self.registry.load();
            let set = registry
                .get(name)
                .ok_or_else(|| DispatchError::MethodNotFound(name.to_string()))?;
            set.get(verb)
                .cloned()
                .ok_or_else(|| DispatchError::VerbNotSupported {
                    method: name.to_string(),
                    verb,
                })?
        };

        let captures = descriptor.route().capture_count();
        let url = descriptor.route().resolve(&args).ok_or_else(|| {
            DispatchError::BadRequest(format!(
                "method '{}' needs {} URL argument(s), got {}",
                name,
                captures,
                args.len()
            ))
        })?;

        let args = args.into_iter().skip(captures).collect();
        Ok(self.invoke(&descriptor, args, url).await?)
    }

    /// Advertised method set, in registration order.
    pub fn manifest(&self) -> MethodManifest {
        self.registry
            .load()
            .iter()
            .filter_map(|set| {
                let target = set.invoke_target()?;
                let info = MethodInfo {
                    params: target.params().to_vec(),
                    docs: if self.docs { target.docs().map(str::to_string) } else { None },
                    url: Some(set.url().to_string()),
                    verbs: set.verbs().collect(),
                };
                Some((set.name().to_string(), info))
            })
            .collect()
    }
}
