//! The backend contract every triple-store engine implements.

use crate::error::StoreError;
use crate::property_bag::PropertyBags;
use crate::sink::OutputSink;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Backend configuration knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Group serialized statements by subject with the type triple first, so
    /// RDF/XML output uses typed nodes instead of flat descriptions.
    pub write_by_subject: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            write_by_subject: true,
        }
    }
}

/// A prefix → namespace IRI binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixNamespace {
    pub prefix: String,
    pub namespace: String,
}

/// A store of triples partitioned into named graphs ("contexts"), plus an
/// aggregate view equal to the union of all of them.
///
/// One instance is owned by one model for its lifetime. Operations are
/// synchronous and block the calling thread; there is no internal locking
/// and no supported concurrent access.
pub trait TripleStore {
    /// Parse one document into the named graph `context_name`, creating the
    /// graph if needed and merging into it otherwise. The serialization
    /// format is chosen from the context name: `.ttl` is Turtle, anything
    /// else RDF/XML. `base` is the document's base IRI; it is also bound to
    /// the `data` prefix for the write-back path.
    ///
    /// Malformed input surfaces the engine's parse error as
    /// [`StoreError::Parse`]. The reader stays caller-owned.
    fn read(
        &mut self,
        base: &str,
        context_name: &str,
        reader: &mut dyn Read,
    ) -> Result<(), StoreError>;

    /// Evaluate a SPARQL SELECT.
    ///
    /// A query containing an explicit `GRAPH` clause runs against the
    /// per-graph dataset; any other query runs against the aggregate view,
    /// so cross-profile queries need no graph scoping. Declared prefixes are
    /// prepended as `PREFIX` lines. Rows duplicated across contexts are
    /// collapsed.
    fn query(&self, text: &str) -> Result<PropertyBags, StoreError>;

    /// Insert one object per row into the named graph `context_name`,
    /// creating the graph if needed. Every row gets a fresh subject, an
    /// `rdf:type` of `<object_ns><object_type>` and one triple per bound
    /// field; resource values resolve through the declared prefixes, literal
    /// values are asserted as-is. Visible to the very next query.
    fn add(
        &mut self,
        context_name: &str,
        object_ns: &str,
        object_type: &str,
        objects: &PropertyBags,
    ) -> Result<(), StoreError>;

    /// Remove the named graph and its contribution to the aggregate view.
    fn clear(&mut self, context_name: &str) -> Result<(), StoreError>;

    /// Serialize every named graph, one sink stream per graph. Streams are
    /// opened one at a time and closed before the next one opens.
    fn write(&self, sink: &mut dyn OutputSink) -> Result<(), StoreError>;

    /// Serialize a single named graph.
    fn write_context(&self, sink: &mut dyn OutputSink, context_name: &str)
        -> Result<(), StoreError>;

    /// Names of all loaded contexts, sorted. No side effects.
    fn context_names(&self) -> Vec<String>;

    /// Human-readable summary of the store, one line at a time.
    fn dump(&self, liner: &mut dyn FnMut(&str));

    /// Bind a prefix for query headers and write-path IRI resolution.
    fn add_namespace(&mut self, prefix: &str, namespace: &str);

    fn namespaces(&self) -> Vec<PrefixNamespace>;
}
