//! Versioned SPARQL query catalogs.
//!
//! One plain-text resource per ontology version holds the named query
//! templates. Blocks are introduced by `# query: <name>` lines; other `#`
//! lines are comments. Templates carry positional `{0}`, `{1}`, …
//! placeholders that are substituted by literal text replacement.

use crate::error::ModelError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// The schema versions this layer ships catalogs for.
///
/// The version is an explicit constructor parameter; nothing in this layer
/// guesses it from the namespace behind the caller's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CimVersion {
    Cim14,
    Cim16,
}

impl CimVersion {
    /// Probe a CIM namespace IRI for a known schema version, e.g.
    /// `http://iec.ch/TC57/2013/CIM-schema-cim16#`. Returns `None` for
    /// anything unrecognized instead of guessing.
    pub fn from_namespace(namespace: &str) -> Option<CimVersion> {
        static VERSION: OnceLock<Regex> = OnceLock::new();
        let re = VERSION
            .get_or_init(|| Regex::new(r"CIM-schema-cim(\d+)#$").expect("static pattern"));
        match re.captures(namespace)?.get(1)?.as_str() {
            "14" => Some(CimVersion::Cim14),
            "16" => Some(CimVersion::Cim16),
            _ => None,
        }
    }

    pub fn catalog_name(self) -> &'static str {
        match self {
            CimVersion::Cim14 => "CIM14",
            CimVersion::Cim16 => "CIM16",
        }
    }
}

impl std::fmt::Display for CimVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.catalog_name())
    }
}

/// An immutable mapping from query name to SPARQL template text, bound to
/// one ontology version for the lifetime of the model.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    name: String,
    queries: HashMap<String, String>,
}

impl QueryCatalog {
    /// The embedded catalog for one schema version.
    pub fn for_version(version: CimVersion) -> Result<Self, ModelError> {
        let text = match version {
            CimVersion::Cim14 => include_str!("../queries/CIM14.sparql"),
            CimVersion::Cim16 => include_str!("../queries/CIM16.sparql"),
        };
        Self::parse(version.catalog_name(), text)
    }

    /// Parse a catalog resource. Blocks start at `# query: <name>`; any
    /// other `#` line is a comment. Duplicate names are a catalog defect.
    pub fn parse(name: &str, text: &str) -> Result<Self, ModelError> {
        let mut queries = HashMap::new();
        let mut current: Option<(String, String)> = None;
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("# query:") {
                if let Some((query_name, body)) = current.take() {
                    Self::finish_block(name, &mut queries, query_name, body)?;
                }
                let query_name = rest.trim().to_string();
                if query_name.is_empty() {
                    return Err(ModelError::Catalog {
                        catalog: name.to_string(),
                        reason: "unnamed query block".to_string(),
                    });
                }
                current = Some((query_name, String::new()));
            } else if line.starts_with('#') {
                continue;
            } else if let Some((_, body)) = current.as_mut() {
                body.push_str(line);
                body.push('\n');
            }
        }
        if let Some((query_name, body)) = current.take() {
            Self::finish_block(name, &mut queries, query_name, body)?;
        }
        Ok(Self {
            name: name.to_string(),
            queries,
        })
    }

    fn finish_block(
        catalog: &str,
        queries: &mut HashMap<String, String>,
        query_name: String,
        body: String,
    ) -> Result<(), ModelError> {
        let body = body.trim().to_string();
        if queries.insert(query_name.clone(), body).is_some() {
            return Err(ModelError::Catalog {
                catalog: catalog.to_string(),
                reason: format!("duplicate query name {query_name}"),
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template for a named query; `None` when this catalog version
    /// does not define it. Most domain queries are optional probes.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn query_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// Replace positional `{0}`, `{1}`, … placeholders with the given values by
/// literal text substitution. Every occurrence is replaced; no quoting or
/// escaping is applied, so callers supply values that are safe inside the
/// template.
pub fn inject_params(template: &str, params: &[&str]) -> String {
    let mut injected = template.to_string();
    for (k, param) in params.iter().enumerate() {
        injected = injected.replace(&format!("{{{k}}}"), param);
    }
    injected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_namespace_recognizes_known_versions_only() {
        assert_eq!(
            CimVersion::from_namespace("http://iec.ch/TC57/2009/CIM-schema-cim14#"),
            Some(CimVersion::Cim14)
        );
        assert_eq!(
            CimVersion::from_namespace("http://iec.ch/TC57/2013/CIM-schema-cim16#"),
            Some(CimVersion::Cim16)
        );
        assert_eq!(
            CimVersion::from_namespace("http://iec.ch/TC57/CIM100#"),
            None
        );
        assert_eq!(CimVersion::from_namespace("http://example.com/ns#"), None);
    }

    #[test]
    fn inject_replaces_every_occurrence_without_escaping() {
        let injected = inject_params("a {0} b {1} c {0}", &["T1", "x\"y"]);
        assert_eq!(injected, "a T1 b x\"y c T1");
    }

    #[test]
    fn inject_with_no_params_is_identity() {
        assert_eq!(inject_params("SELECT ?s { ?s ?p ?o }", &[]), "SELECT ?s { ?s ?p ?o }");
    }
}
