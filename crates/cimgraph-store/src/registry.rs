//! Explicit backend registry.
//!
//! Backends register by name at process start; callers select one by name,
//! by capability, or by taking the sole registered implementation.
//! Resolving an unknown name is a configuration error, never a silent
//! default.

use crate::error::StoreError;
use crate::oxigraph_store::OxigraphFactory;
use crate::store::{StoreOptions, TripleStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a backend engine can do natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    /// Whether the engine evaluates `GRAPH`-scoped queries against its own
    /// named-graph dataset, or needs the aggregate-view fallback.
    pub native_graph_scoped_queries: bool,
}

/// Creates backend instances and declares what they can do.
pub trait TripleStoreFactory {
    fn name(&self) -> &str;

    fn capabilities(&self) -> BackendCapabilities;

    fn create(&self, options: StoreOptions) -> Result<Box<dyn TripleStore>, StoreError>;
}

/// Name-keyed factory registry.
#[derive(Default)]
pub struct TripleStoreRegistry {
    factories: BTreeMap<String, Box<dyn TripleStoreFactory>>,
}

impl TripleStoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in reference backend registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(OxigraphFactory));
        registry
    }

    /// Register a factory under its own name; a factory registered later
    /// under the same name replaces the earlier one.
    pub fn register(&mut self, factory: Box<dyn TripleStoreFactory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn TripleStoreFactory, StoreError> {
        self.factories
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| StoreError::UnknownBackend {
                name: name.to_string(),
            })
    }

    /// The sole registered implementation, when exactly one is registered.
    pub fn sole(&self) -> Option<&dyn TripleStoreFactory> {
        if self.factories.len() == 1 {
            self.factories.values().next().map(Box::as_ref)
        } else {
            None
        }
    }

    /// First factory (in name order) whose capabilities satisfy `predicate`.
    pub fn resolve_by_capability(
        &self,
        predicate: impl Fn(&BackendCapabilities) -> bool,
    ) -> Option<&dyn TripleStoreFactory> {
        self.factories
            .values()
            .map(Box::as_ref)
            .find(|f| predicate(&f.capabilities()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
