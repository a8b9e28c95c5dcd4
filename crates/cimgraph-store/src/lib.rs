//! Pluggable triple-store storage for CIM/CGMES grid models.
//!
//! A grid-model case arrives as a handful of RDF documents, one per semantic
//! profile (equipment, topology, state variables). Each document is loaded
//! into its own named graph so it stays independently addressable, while
//! most queries run against the aggregate union of all graphs and join
//! across profiles freely.
//!
//! The pieces:
//!
//! - [`TripleStore`]: the backend contract to load, query, write back,
//!   serialize, and introspect.
//! - [`TripleStoreRegistry`]: explicit name-keyed backend selection with
//!   capability flags.
//! - [`OxigraphStore`]: the reference backend over Oxigraph's in-memory
//!   store.
//! - [`PropertyBag`] / [`PropertyBags`]: tabular rows projected out of
//!   SPARQL SELECT results, each value classified resource-vs-literal.
//! - [`OutputSink`]: one named output stream per graph for serialization.

pub mod error;
pub mod oxigraph_store;
pub mod property_bag;
pub mod registry;
pub mod sink;
pub mod store;

pub use error::StoreError;
pub use oxigraph_store::{OxigraphFactory, OxigraphStore, OXIGRAPH_BACKEND};
pub use property_bag::{PropertyBag, PropertyBags, PropertyValue};
pub use registry::{BackendCapabilities, TripleStoreFactory, TripleStoreRegistry};
pub use sink::{DirectorySink, MemorySink, OutputSink};
pub use store::{PrefixNamespace, StoreOptions, TripleStore};
