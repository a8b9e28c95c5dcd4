//! Model-layer error taxonomy.

use cimgraph_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The ontology namespace matches no supported schema version.
    #[error("unsupported CIM namespace: {namespace}")]
    UnknownVersionNamespace { namespace: String },

    /// A defective catalog resource (unnamed block, duplicate query name).
    #[error("query catalog {catalog}: {reason}")]
    Catalog { catalog: String, reason: String },

    /// A query every catalog must define is missing. Unlike the optional
    /// probes, this is a defect of the catalog, not of the loaded model.
    #[error("query catalog {catalog} does not define mandatory query \"{query}\"")]
    CatalogIntegrity { catalog: String, query: String },

    /// The write-back path needs at least one loaded document to resolve
    /// its destination graph.
    #[error("cannot add computed results before any document has been read")]
    UpdateBeforeLoad,

    #[error(transparent)]
    Store(#[from] StoreError),
}
