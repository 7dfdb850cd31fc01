//! Registration-time method definitions.
//!
//! A definition is either a single handler (bound to every verb) or an
//! explicit per-verb set. Both resolve once into a [`MethodSet`], a uniform
//! verb → descriptor mapping, before anything is stored.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::methods::descriptor::MethodDescriptor;
use crate::methods::handler::HandlerSpec;
use crate::methods::verb::Verb;
use crate::routing::method_url;

/// What a caller hands to the registry under a method name.
#[derive(Debug, Clone)]
pub enum MethodDefinition {
    /// Shorthand: the same handler serves GET, PUT, POST and DELETE.
    Single(HandlerSpec),
    PerVerb(VerbHandlers),
}

impl From<HandlerSpec> for MethodDefinition {
    fn from(spec: HandlerSpec) -> Self {
        MethodDefinition::Single(spec)
    }
}

impl From<VerbHandlers> for MethodDefinition {
    fn from(handlers: VerbHandlers) -> Self {
        MethodDefinition::PerVerb(handlers)
    }
}

/// Explicit per-verb handlers, with optional URL and docs.
#[derive(Debug, Clone, Default)]
pub struct VerbHandlers {
    pub get: Option<HandlerSpec>,
    pub put: Option<HandlerSpec>,
    pub post: Option<HandlerSpec>,
    pub delete: Option<HandlerSpec>,
    /// Route pattern used instead of the method name, e.g. `/user/:id`.
    pub url: Option<String>,
    pub docs: Option<String>,
}

impl VerbHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(mut self, spec: HandlerSpec) -> Self {
        self.get = Some(spec);
        self
    }

    pub fn put(mut self, spec: HandlerSpec) -> Self {
        self.put = Some(spec);
        self
    }

    pub fn post(mut self, spec: HandlerSpec) -> Self {
        self.post = Some(spec);
        self
    }

    pub fn delete(mut self, spec: HandlerSpec) -> Self {
        self.delete = Some(spec);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    pub fn handler_for(&self, verb: Verb) -> Option<&HandlerSpec> {
        match verb {
            Verb::Get => self.get.as_ref(),
            Verb::Put => self.put.as_ref(),
            Verb::Post => self.post.as_ref(),
            Verb::Delete => self.delete.as_ref(),
        }
    }
}

/// All descriptors registered under one method name.
#[derive(Debug, Clone)]
pub struct MethodSet {
    name: String,
    url: String,
    descriptors: BTreeMap<Verb, Arc<MethodDescriptor>>,
}

impl MethodSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical URL pattern shared by every verb of the set.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn get(&self, verb: Verb) -> Option<&Arc<MethodDescriptor>> {
        self.descriptors.get(&verb)
    }

    /// Verbs present, in canonical order.
    pub fn verbs(&self) -> impl Iterator<Item = Verb> + '_ {
        self.descriptors.keys().copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.descriptors.values()
    }

    /// Descriptor targeted by name-based invocation: POST when present,
    /// otherwise the first defined of GET, PUT, DELETE.
    pub fn invoke_target(&self) -> Option<&Arc<MethodDescriptor>> {
        self.get(Verb::Post)
            .or_else(|| self.descriptors.values().next())
    }
}

impl MethodDefinition {
    /// Resolve into a method set rooted at `base_path`.
    pub fn resolve(&self, name: &str, base_path: &str) -> Result<MethodSet, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut descriptors = BTreeMap::new();
        let url = match self {
            MethodDefinition::Single(spec) => {
                let url = method_url(base_path, name);
                for verb in Verb::ALL {
                    let descriptor = MethodDescriptor::new(name, verb, &url, spec, None)?;
                    descriptors.insert(verb, Arc::new(descriptor));
                }
                url
            }
            MethodDefinition::PerVerb(handlers) => {
                let url = method_url(base_path, handlers.url.as_deref().unwrap_or(name));
                for verb in Verb::ALL {
                    if let Some(spec) = handlers.handler_for(verb) {
                        let descriptor =
                            MethodDescriptor::new(name, verb, &url, spec, handlers.docs.clone())?;
                        descriptors.insert(verb, Arc::new(descriptor));
                    }
                }
                url
            }
        };

        if descriptors.is_empty() {
            return Err(RegistryError::NoHandlers(name.to_string()));
        }

        Ok(MethodSet {
            name: name.to_string(),
            url,
            descriptors,
        })
    }
}
