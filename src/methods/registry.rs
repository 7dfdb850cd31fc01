//! Method registry.
//!
//! # Responsibilities
//! - Store method sets keyed by name, in insertion order
//! - Reject duplicate names and (optionally) overlapping routes
//! - Look up the descriptor serving a (url, verb) pair
//!
//! # Design Decisions
//! - Lookup walks names in insertion order; the first match wins
//! - Cheap to clone (sets are behind `Arc`), so callers can swap snapshots
//! - Registration is single-writer; readers never see a half-built set

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::methods::definition::{MethodDefinition, MethodSet};
use crate::methods::descriptor::MethodDescriptor;
use crate::methods::verb::Verb;
use crate::routing::{normalize_base_path, RouteParams};

/// A descriptor matched against a concrete URL.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub descriptor: Arc<MethodDescriptor>,
    pub params: RouteParams,
}

#[derive(Debug, Clone)]
pub struct MethodRegistry {
    base_path: String,
    reject_overlapping_routes: bool,
    sets: Vec<Arc<MethodSet>>,
    index: HashMap<String, usize>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MethodRegistry {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: normalize_base_path(base_path),
            reject_overlapping_routes: true,
            sets: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// When disabled, overlapping routes are accepted and the first
    /// registered one shadows the rest.
    pub fn reject_overlapping_routes(mut self, reject: bool) -> Self {
        self.reject_overlapping_routes = reject;
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Register a method under `name`. Fails if the name already exists.
    pub fn register(
        &mut self,
        name: &str,
        definition: impl Into<MethodDefinition>,
    ) -> Result<Arc<MethodSet>, RegistryError> {
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateMethod(name.to_string()));
        }

        let set = definition.into().resolve(name, &self.base_path)?;
        if self.reject_overlapping_routes {
            self.check_overlaps(&set)?;
        }

        let set = Arc::new(set);
        self.index.insert(name.to_string(), self.sets.len());
        self.sets.push(set.clone());

        tracing::debug!(
            method = %name,
            url = %set.url(),
            verbs = ?set.verbs().collect::<Vec<_>>(),
            "Method registered"
        );
        Ok(set)
    }

    fn check_overlaps(&self, candidate: &MethodSet) -> Result<(), RegistryError> {
        for descriptor in candidate.descriptors() {
            let verb = descriptor.verb();
            let clash = self
                .sets
                .iter()
                .filter_map(|set| set.get(verb))
                .find(|existing| existing.route().overlaps(descriptor.route()));

            if let Some(existing) = clash {
                return Err(RegistryError::RouteConflict {
                    method: candidate.name().to_string(),
                    verb,
                    url: descriptor.url().to_string(),
                    existing: existing.name().to_string(),
                    existing_url: existing.url().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MethodSet>> {
        self.index.get(name).map(|&i| &self.sets[i])
    }

    /// Method sets in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MethodSet>> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Find the descriptor serving `verb` at `url`.
    pub fn lookup(&self, url: &str, verb: Verb) -> Option<Arc<MethodDescriptor>> {
        self.resolve(url, verb).map(|m| m.descriptor)
    }

    /// Like [`lookup`](Self::lookup), also returning the captured params.
    pub fn resolve(&self, url: &str, verb: Verb) -> Option<RouteMatch> {
        self.sets.iter().find_map(|set| {
            let descriptor = set.get(verb)?;
            let params = descriptor.route().matches(url)?;
            Some(RouteMatch {
                descriptor: descriptor.clone(),
                params,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::definition::VerbHandlers;
    use crate::methods::handler::{sync_handler, HandlerSpec};
    use serde_json::Value;

    fn spec() -> HandlerSpec {
        HandlerSpec::new(sync_handler(|_| Ok(Value::Null)))
    }

    #[test]
    fn test_register_then_lookup_round_trip() {
        let mut registry = MethodRegistry::new("/v1");
        let set = registry.register("foo/bar", spec()).unwrap();

        for verb in Verb::ALL {
            let found = registry.lookup("/v1/foo/bar", verb).unwrap();
            assert!(Arc::ptr_eq(&found, set.get(verb).unwrap()));
        }
        assert!(registry.lookup("/foo/bar", Verb::Get).is_none());
    }

    #[test]
    fn test_duplicate_name_fails_regardless_of_verbs() {
        let mut registry = MethodRegistry::new("/");
        registry.register("foo", VerbHandlers::new().get(spec())).unwrap();

        let err = registry
            .register("foo", VerbHandlers::new().post(spec()).url("/other"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateMethod("foo".into()));
        assert_eq!(err.to_string(), "Method \"foo\" already exists.");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_extracts_params() {
        let mut registry = MethodRegistry::new("/v1");
        registry
            .register("bar", VerbHandlers::new().get(spec()).url("/user/:id"))
            .unwrap();

        let m = registry.resolve("/v1/user/42", Verb::Get).unwrap();
        assert_eq!(m.descriptor.name(), "bar");
        assert_eq!(m.params.get("id"), Some("42"));
        assert!(registry.resolve("/v1/user/42", Verb::Put).is_none());
    }

    #[test]
    fn test_overlapping_routes_rejected_by_default() {
        let mut registry = MethodRegistry::new("/");
        registry
            .register("by-id", VerbHandlers::new().get(spec()).url("/user/:id"))
            .unwrap();

        let err = registry
            .register("me", VerbHandlers::new().get(spec()).url("/user/me"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::RouteConflict { verb: Verb::Get, .. }));

        // Same pattern on a different verb does not clash.
        registry
            .register("update", VerbHandlers::new().put(spec()).url("/user/:id"))
            .unwrap();
    }

    #[test]
    fn test_first_registered_wins_when_overlaps_allowed() {
        let mut registry = MethodRegistry::new("/").reject_overlapping_routes(false);
        registry
            .register("by-id", VerbHandlers::new().get(spec()).url("/user/:id"))
            .unwrap();
        registry
            .register("me", VerbHandlers::new().get(spec()).url("/user/me"))
            .unwrap();

        let found = registry.lookup("/user/me", Verb::Get).unwrap();
        assert_eq!(found.name(), "by-id");
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let mut registry = MethodRegistry::new("/");
        for name in ["zeta", "alpha", "mid"] {
            registry.register(name, spec()).unwrap();
        }
        let names: Vec<_> = registry.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
