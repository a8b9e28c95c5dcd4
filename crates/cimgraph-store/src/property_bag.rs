//! Tabular query results.
//!
//! A SPARQL SELECT projects a fixed list of variable names; each result row
//! binds a subset of them. [`PropertyBag`] keeps that projection next to the
//! bound values so fields iterate in a stable order, and every value carries
//! its resource-vs-literal classification from the originating RDF term.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A bound value, classified by the kind of RDF term it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    /// IRI or blank-node identifier.
    Resource(String),
    /// Literal lexical form.
    Literal(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyValue::Resource(s) | PropertyValue::Literal(s) => s,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, PropertyValue::Resource(_))
    }
}

/// One result row: declared field names mapped to classified values.
///
/// A field that was not bound in the row is simply absent; there are no null
/// values. The set of bound names is always a subset of the projection.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBag {
    names: Arc<[String]>,
    values: HashMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new(names: Arc<[String]>) -> Self {
        Self {
            names,
            values: HashMap::new(),
        }
    }

    /// Convenience constructor building the projection from string slices.
    pub fn with_names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| n.to_string()).collect())
    }

    /// The declared projection, in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn projection(&self) -> Arc<[String]> {
        Arc::clone(&self.names)
    }

    /// Bind a literal value. The field must be part of the projection.
    pub fn put(&mut self, name: &str, value: impl Into<String>) {
        self.insert(name, PropertyValue::Literal(value.into()));
    }

    /// Bind a resource value. The field must be part of the projection.
    pub fn put_resource(&mut self, name: &str, value: impl Into<String>) {
        self.insert(name, PropertyValue::Resource(value.into()));
    }

    fn insert(&mut self, name: &str, value: PropertyValue) {
        assert!(
            self.names.iter().any(|n| n == name),
            "field {name} is not part of the projection"
        );
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(PropertyValue::as_str)
    }

    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn is_resource(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(PropertyValue::is_resource)
    }

    pub fn as_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.parse().ok()
    }

    pub fn as_int(&self, name: &str) -> Option<i64> {
        self.get(name)?.parse().ok()
    }

    pub fn as_double(&self, name: &str) -> Option<f64> {
        self.get(name)?.parse().ok()
    }

    /// Local identifier of a resource field: the fragment after the last `#`
    /// (or `/`), without the leading `_` that rdf:ID-style identifiers carry.
    pub fn id(&self, name: &str) -> Option<String> {
        let value = self.get(name)?;
        let local = value.rsplit(['#', '/']).next().unwrap_or(value);
        Some(local.strip_prefix('_').unwrap_or(local).to_string())
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound fields in projection order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.names
            .iter()
            .filter_map(|n| self.values.get(n).map(|v| (n.as_str(), v)))
    }
}

/// An ordered sequence of rows sharing one projection. May be empty, never
/// null.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBags {
    names: Arc<[String]>,
    bags: Vec<PropertyBag>,
}

impl Default for PropertyBags {
    fn default() -> Self {
        Self::new(Vec::new().into())
    }
}

impl PropertyBags {
    pub fn new(names: Arc<[String]>) -> Self {
        Self {
            names,
            bags: Vec::new(),
        }
    }

    pub fn with_names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| n.to_string()).collect())
    }

    /// The shared projection.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn push(&mut self, bag: PropertyBag) {
        debug_assert_eq!(self.names, bag.projection(), "projection mismatch");
        self.bags.push(bag);
    }

    /// A fresh row bound to this projection; push it back once filled.
    pub fn new_bag(&self) -> PropertyBag {
        PropertyBag::new(Arc::clone(&self.names))
    }

    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    pub fn first(&self) -> Option<&PropertyBag> {
        self.bags.first()
    }

    pub fn get(&self, index: usize) -> Option<&PropertyBag> {
        self.bags.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyBag> {
        self.bags.iter()
    }

    /// All values of one column, in row order; unbound rows are skipped.
    pub fn pluck(&self, name: &str) -> Vec<String> {
        self.bags
            .iter()
            .filter_map(|b| b.get(name))
            .map(str::to_string)
            .collect()
    }

    /// Tab-separated rendering for debug logs; absent fields print as `-`.
    pub fn tabulate(&self) -> String {
        let mut out = self.names.join("\t");
        for bag in &self.bags {
            out.push('\n');
            let row: Vec<&str> = self
                .names
                .iter()
                .map(|n| bag.get(n).unwrap_or("-"))
                .collect();
            out.push_str(&row.join("\t"));
        }
        out
    }
}

impl<'a> IntoIterator for &'a PropertyBags {
    type Item = &'a PropertyBag;
    type IntoIter = std::slice::Iter<'a, PropertyBag>;

    fn into_iter(self) -> Self::IntoIter {
        self.bags.iter()
    }
}

impl IntoIterator for PropertyBags {
    type Item = PropertyBag;
    type IntoIter = std::vec::IntoIter<PropertyBag>;

    fn into_iter(self) -> Self::IntoIter {
        self.bags.into_iter()
    }
}
