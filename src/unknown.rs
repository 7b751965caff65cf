//! Unknown-attribute store
//!
//! Every model instance carries the input keys its schema does not declare,
//! verbatim and in the order they arrived.

use serde::Serialize;
use serde_json::{map, Map, Value};

/// Insertion-ordered bag of undeclared attributes
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct UnknownAttributes(Map<String, Value>);

impl UnknownAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys are only ever added while an instance is being cast
    pub(crate) fn insert(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> map::Iter<'_> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of the entries as a JSON map
    pub fn to_map(&self) -> Map<String, Value> {
        self.0.clone()
    }
}

/// Equality is order-sensitive
impl PartialEq for UnknownAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl<'a> IntoIterator for &'a UnknownAttributes {
    type Item = (&'a String, &'a Value);
    type IntoIter = map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
