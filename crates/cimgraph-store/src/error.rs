//! Storage-layer error taxonomy.

use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the storage layer.
///
/// Operation failures (`Add`, `Write`, `Clear`) carry the identity of the
/// graph or sink stream that failed, so storage faults stay distinguishable
/// from upstream logic faults. Malformed input documents surface the
/// engine's own parse error, untranslated.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No backend registered under the requested name.
    #[error("unknown triple-store backend: {name}")]
    UnknownBackend { name: String },

    /// The backend could not be brought up.
    #[error("backend initialization failed: {source}")]
    Init {
        #[source]
        source: Source,
    },

    /// A context name that cannot be turned into a graph identifier.
    #[error("invalid context name: {name}")]
    InvalidContextName { name: String },

    /// Malformed input document: the engine's parse error, as-is.
    #[error(transparent)]
    Parse(Source),

    /// SPARQL parse or evaluation failure.
    #[error("query failed: {source}")]
    Query {
        #[source]
        source: Source,
    },

    #[error("adding objects of type {object_type} to context {context}: {source}")]
    Add {
        context: String,
        object_type: String,
        #[source]
        source: Source,
    },

    #[error("clearing context {context}: {source}")]
    Clear {
        context: String,
        #[source]
        source: Source,
    },

    #[error("writing context {context}: {source}")]
    Write {
        context: String,
        #[source]
        source: Source,
    },
}
