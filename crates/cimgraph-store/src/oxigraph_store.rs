//! Reference backend over the Oxigraph in-memory store.
//!
//! Each source document lands in its own named graph under the internal
//! `contexts:` namespace. The aggregate view is never materialized: queries
//! without an explicit `GRAPH` clause are evaluated with the default graph
//! set to the union of all named graphs, so the view is consistent with the
//! per-graph store by construction.

use crate::error::StoreError;
use crate::property_bag::{PropertyBag, PropertyBags, PropertyValue};
use crate::registry::{BackendCapabilities, TripleStoreFactory};
use crate::sink::OutputSink;
use crate::store::{PrefixNamespace, StoreOptions, TripleStore};
use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{
    GraphName, GraphNameRef, Literal, NamedNode, NamedOrBlankNode, Quad, QuadRef, Term,
};
use oxigraph::sparql::{Query, QueryResults};
use oxigraph::store::Store;
use regex::Regex;
use std::collections::HashSet;
use std::io::Read;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Registry name of this backend.
pub const OXIGRAPH_BACKEND: &str = "oxigraph";

/// Internal namespace turning context names into graph IRIs.
const CONTEXTS_NAMESPACE: &str = "contexts:";

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Factory for [`OxigraphStore`].
pub struct OxigraphFactory;

impl TripleStoreFactory for OxigraphFactory {
    fn name(&self) -> &str {
        OXIGRAPH_BACKEND
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            native_graph_scoped_queries: true,
        }
    }

    fn create(&self, options: StoreOptions) -> Result<Box<dyn TripleStore>, StoreError> {
        Ok(Box::new(OxigraphStore::with_options(options)?))
    }
}

/// The reference [`TripleStore`] implementation.
pub struct OxigraphStore {
    store: Store,
    options: StoreOptions,
    namespaces: Vec<PrefixNamespace>,
}

impl OxigraphStore {
    pub fn new() -> Result<Self, StoreError> {
        Self::with_options(StoreOptions::default())
    }

    pub fn with_options(options: StoreOptions) -> Result<Self, StoreError> {
        let store = Store::new().map_err(|e| StoreError::Init {
            source: Box::new(e),
        })?;
        Ok(Self {
            store,
            options,
            namespaces: Vec::new(),
        })
    }

    fn set_namespace(&mut self, prefix: &str, namespace: &str) {
        if let Some(existing) = self.namespaces.iter_mut().find(|ns| ns.prefix == prefix) {
            existing.namespace = namespace.to_string();
        } else {
            self.namespaces.push(PrefixNamespace {
                prefix: prefix.to_string(),
                namespace: namespace.to_string(),
            });
        }
    }

    fn namespace_of(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|ns| ns.prefix == prefix)
            .map(|ns| ns.namespace.as_str())
    }

    fn prefix_header(&self, text: &str) -> String {
        let mut out = String::new();
        for ns in &self.namespaces {
            out.push_str("PREFIX ");
            out.push_str(&ns.prefix);
            out.push_str(": <");
            out.push_str(&ns.namespace);
            out.push_str(">\n");
        }
        out.push_str(text);
        out
    }

    /// Resolve a resource value from a write batch to an IRI: `cim:`-prefixed
    /// values through the cim namespace, absolute IRIs as-is, bare
    /// identifiers through the `data` namespace of the last read document.
    fn resolve_resource(&self, value: &str) -> Result<NamedNode, BoxedError> {
        for ns in &self.namespaces {
            if let Some(local) = value.strip_prefix(&format!("{}:", ns.prefix)) {
                return Ok(NamedNode::new(format!("{}{local}", ns.namespace))?);
            }
        }
        if value.starts_with("urn:") || value.contains("://") {
            return Ok(NamedNode::new(value)?);
        }
        let data = self.namespace_of("data").unwrap_or_default();
        Ok(NamedNode::new(format!("{data}{value}"))?)
    }

    fn add_object(
        &self,
        graph: &NamedNode,
        object_ns: &str,
        object_type: &str,
        object: &PropertyBag,
    ) -> Result<(), BoxedError> {
        let subject = NamedNode::new(format!("urn:uuid:{}", Uuid::new_v4()))?;
        let rdf_type = NamedNode::new(RDF_TYPE)?;
        let type_iri = NamedNode::new(format!("{object_ns}{object_type}"))?;
        self.store.insert(&Quad::new(
            subject.clone(),
            rdf_type,
            type_iri,
            graph.clone(),
        ))?;
        for (name, value) in object.fields() {
            let predicate = NamedNode::new(format!("{object_ns}{object_type}.{name}"))?;
            let term: Term = match value {
                PropertyValue::Resource(v) => self.resolve_resource(v)?.into(),
                PropertyValue::Literal(v) => Literal::new_simple_literal(v.as_str()).into(),
            };
            self.store
                .insert(&Quad::new(subject.clone(), predicate, term, graph.clone()))?;
        }
        Ok(())
    }

    fn write_one(&self, sink: &mut dyn OutputSink, name: &str) -> Result<(), StoreError> {
        let wrap = |source: BoxedError| StoreError::Write {
            context: name.to_string(),
            source,
        };
        tracing::info!(context = %name, "writing context");
        let graph = context_iri(name)?;
        let mut quads = Vec::new();
        for quad in self.store.quads_for_pattern(
            None,
            None,
            None,
            Some(GraphNameRef::NamedNode(graph.as_ref())),
        ) {
            quads.push(quad.map_err(|e| wrap(Box::new(e)))?);
        }
        if self.options.write_by_subject {
            // Type triples first per subject, so the serializer can emit
            // typed nodes instead of flat rdf:Description elements.
            quads.sort_by_key(|q| {
                (
                    q.subject.to_string(),
                    q.predicate.as_str() != RDF_TYPE,
                    q.predicate.to_string(),
                    q.object.to_string(),
                )
            });
        }
        let mut serializer = RdfSerializer::from_format(RdfFormat::RdfXml);
        for ns in &self.namespaces {
            serializer = serializer
                .with_prefix(&ns.prefix, &ns.namespace)
                .map_err(|e| wrap(Box::new(e)))?;
        }
        let mut writer = sink.open(name).map_err(|e| wrap(Box::new(e)))?;
        let mut quad_serializer = serializer.for_writer(&mut *writer);
        for quad in &quads {
            // Serialized per graph, so the output document itself is
            // graph-unaware.
            quad_serializer
                .serialize_quad(QuadRef::new(
                    quad.subject.as_ref(),
                    quad.predicate.as_ref(),
                    quad.object.as_ref(),
                    GraphNameRef::DefaultGraph,
                ))
                .map_err(|e| wrap(Box::new(e)))?;
        }
        quad_serializer.finish().map_err(|e| wrap(Box::new(e)))?;
        Ok(())
    }
}

impl TripleStore for OxigraphStore {
    fn read(
        &mut self,
        base: &str,
        context_name: &str,
        reader: &mut dyn Read,
    ) -> Result<(), StoreError> {
        let graph = context_iri(context_name)?;
        let parser = RdfParser::from_format(format_for(context_name))
            .with_base_iri(base)
            .map_err(|e| StoreError::Parse(Box::new(e)))?
            .without_named_graphs()
            .rename_blank_nodes()
            .with_default_graph(GraphName::NamedNode(graph));
        self.store
            .load_from_reader(parser, reader)
            .map_err(|e| StoreError::Parse(Box::new(e)))?;
        self.set_namespace("data", &format!("{base}#"));
        Ok(())
    }

    fn query(&self, text: &str) -> Result<PropertyBags, StoreError> {
        let wrap = |source: BoxedError| StoreError::Query { source };
        let mut query = Query::parse(&self.prefix_header(text), None)
            .map_err(|e| wrap(Box::new(e)))?;
        if !has_graph_clause(text) {
            query.dataset_mut().set_default_graph_as_union();
        }
        let results = self.store.query(query).map_err(|e| wrap(Box::new(e)))?;
        let QueryResults::Solutions(solutions) = results else {
            return Err(wrap("only SELECT queries are supported".into()));
        };
        let names: Arc<[String]> = solutions
            .variables()
            .iter()
            .map(|v| v.as_str().to_string())
            .collect();
        let mut bags = PropertyBags::new(Arc::clone(&names));
        // The same statement asserted in several contexts yields duplicated
        // solutions under union evaluation; collapse them.
        let mut seen: HashSet<Vec<(String, String, bool)>> = HashSet::new();
        for solution in solutions {
            let solution = solution.map_err(|e| wrap(Box::new(e)))?;
            let mut bag = PropertyBag::new(Arc::clone(&names));
            for name in names.iter() {
                let Some(term) = solution.get(name.as_str()) else {
                    continue;
                };
                match term {
                    Term::NamedNode(n) => bag.put_resource(name, n.as_str()),
                    Term::BlankNode(b) => bag.put_resource(name, b.as_str()),
                    Term::Literal(l) => bag.put(name, l.value()),
                    Term::Triple(t) => bag.put_resource(name, t.to_string()),
                }
            }
            if bag.is_empty() {
                continue;
            }
            let key = bag
                .fields()
                .map(|(n, v)| (n.to_string(), v.as_str().to_string(), v.is_resource()))
                .collect();
            if seen.insert(key) {
                bags.push(bag);
            }
        }
        Ok(bags)
    }

    fn add(
        &mut self,
        context_name: &str,
        object_ns: &str,
        object_type: &str,
        objects: &PropertyBags,
    ) -> Result<(), StoreError> {
        let graph = context_iri(context_name)?;
        for object in objects {
            self.add_object(&graph, object_ns, object_type, object)
                .map_err(|source| StoreError::Add {
                    context: context_name.to_string(),
                    object_type: object_type.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn clear(&mut self, context_name: &str) -> Result<(), StoreError> {
        let graph = context_iri(context_name)?;
        self.store
            .remove_named_graph(graph.as_ref())
            .map_err(|e| StoreError::Clear {
                context: context_name.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    fn write(&self, sink: &mut dyn OutputSink) -> Result<(), StoreError> {
        for name in self.context_names() {
            self.write_one(sink, &name)?;
        }
        Ok(())
    }

    fn write_context(
        &self,
        sink: &mut dyn OutputSink,
        context_name: &str,
    ) -> Result<(), StoreError> {
        for name in self.context_names() {
            if name == context_name {
                self.write_one(sink, &name)?;
            }
        }
        Ok(())
    }

    fn context_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for graph in self.store.named_graphs() {
            match graph {
                Ok(NamedOrBlankNode::NamedNode(n)) => {
                    let iri = n.as_str();
                    names.push(
                        iri.strip_prefix(CONTEXTS_NAMESPACE)
                            .unwrap_or(iri)
                            .to_string(),
                    );
                }
                Ok(NamedOrBlankNode::BlankNode(_)) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable graph name"),
            }
        }
        names.sort();
        names
    }

    fn dump(&self, liner: &mut dyn FnMut(&str)) {
        liner("triple store backend: oxigraph; context names and sizes");
        for name in self.context_names() {
            let size = match context_iri(&name) {
                Ok(graph) => self
                    .store
                    .quads_for_pattern(
                        None,
                        None,
                        None,
                        Some(GraphNameRef::NamedNode(graph.as_ref())),
                    )
                    .count(),
                Err(_) => 0,
            };
            liner(&format!("    {name} : {size}"));
        }
    }

    fn add_namespace(&mut self, prefix: &str, namespace: &str) {
        self.set_namespace(prefix, namespace);
    }

    fn namespaces(&self) -> Vec<PrefixNamespace> {
        self.namespaces.clone()
    }
}

fn context_iri(context_name: &str) -> Result<NamedNode, StoreError> {
    let name = context_name
        .strip_prefix(CONTEXTS_NAMESPACE)
        .unwrap_or(context_name);
    NamedNode::new(format!("{CONTEXTS_NAMESPACE}{name}")).map_err(|_| {
        StoreError::InvalidContextName {
            name: context_name.to_string(),
        }
    })
}

fn format_for(context_name: &str) -> RdfFormat {
    if context_name.ends_with(".ttl") {
        RdfFormat::Turtle
    } else {
        RdfFormat::RdfXml
    }
}

/// An explicit graph-scoping clause means the query addresses the per-graph
/// store instead of the aggregate view.
fn has_graph_clause(text: &str) -> bool {
    static GRAPH_CLAUSE: OnceLock<Regex> = OnceLock::new();
    GRAPH_CLAUSE
        .get_or_init(|| Regex::new(r"(?i)\bGRAPH\s*[?$<]").expect("static pattern"))
        .is_match(text)
}
