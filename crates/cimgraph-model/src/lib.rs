//! CGMES query facade over `cimgraph-store`.
//!
//! Binds an ontology namespace and its versioned query catalog to a triple
//! store, exposes one accessor per semantic concept, derives a few facts
//! from model metadata (topology style, identifiers, timestamps, schema
//! version), and writes computed state-variable results back into the
//! matching named graph.

pub mod catalog;
pub mod error;
pub mod model;

pub use catalog::{inject_params, CimVersion, QueryCatalog};
pub use error::ModelError;
pub use model::{CgmesModel, ProfileKind, CIM_PREFIX};
