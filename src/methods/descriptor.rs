//! Method descriptors: one handler bound to one verb and URL pattern.

use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::methods::handler::{Handler, HandlerSpec};
use crate::methods::verb::Verb;
use crate::routing::RoutePattern;

/// Immutable binding of name, verb, route and handler.
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    verb: Verb,
    route: RoutePattern,
    handler: Arc<dyn Handler>,
    params: Vec<String>,
    docs: Option<String>,
}

impl MethodDescriptor {
    /// Bind `spec` to `verb` at `url`, compiling the route.
    pub fn new(
        name: impl Into<String>,
        verb: Verb,
        url: &str,
        spec: &HandlerSpec,
        docs: Option<String>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        Ok(Self {
            name,
            verb,
            route: RoutePattern::compile(url)?,
            handler: spec.handler().clone(),
            params: spec.params().to_vec(),
            docs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// The canonical URL pattern, e.g. `/v1/user/:id`.
    pub fn url(&self) -> &str {
        self.route.as_str()
    }

    pub fn route(&self) -> &RoutePattern {
        &self.route
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }

    /// True when both descriptors share the same handler instance.
    pub fn shares_handler(&self, other: &MethodDescriptor) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("verb", &self.verb)
            .field("url", &self.route.as_str())
            .field("params", &self.params)
            .field("docs", &self.docs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::handler::sync_handler;
    use serde_json::Value;

    fn spec() -> HandlerSpec {
        HandlerSpec::new(sync_handler(|_| Ok(Value::Null))).with_params(["id"])
    }

    #[test]
    fn test_stores_binding() {
        let d = MethodDescriptor::new("user", Verb::Get, "/v1/user/:id", &spec(), Some("Docs".into())).unwrap();
        assert_eq!(d.name(), "user");
        assert_eq!(d.verb(), Verb::Get);
        assert_eq!(d.url(), "/v1/user/:id");
        assert_eq!(d.params(), ["id".to_string()]);
        assert_eq!(d.docs(), Some("Docs"));
        assert_eq!(d.route().capture_count(), 1);
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = MethodDescriptor::new("", Verb::Get, "/", &spec(), None).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
        assert_eq!(err.to_string(), "Method name not specified.");
    }
}
