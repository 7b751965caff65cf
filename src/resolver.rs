//! Polymorphic schema resolution
//!
//! A [`Resolver`] inspects the raw key/value map about to be cast and names
//! the schema to instantiate. The engine matches on the returned
//! [`Resolution`] tag; it never introspects types.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Outcome of resolving a raw map
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Name of the schema to instantiate
    Schema(String),
    /// Anything that does not name a schema, kept for the error message
    Invalid(Value),
}

impl From<&str> for Resolution {
    fn from(name: &str) -> Self {
        Resolution::Schema(name.to_string())
    }
}

impl From<String> for Resolution {
    fn from(name: String) -> Self {
        Resolution::Schema(name)
    }
}

impl<T: Into<Resolution>> From<Option<T>> for Resolution {
    fn from(resolved: Option<T>) -> Self {
        resolved.map(Into::into).unwrap_or(Resolution::Invalid(Value::Null))
    }
}

type ResolveFn = dyn Fn(&Map<String, Value>) -> Resolution + Send + Sync;

/// User-supplied function from raw input to a schema identity
#[derive(Clone)]
pub struct Resolver {
    resolve: Arc<ResolveFn>,
    /// Schemas this resolver can produce; an already typed instance only
    /// passes through a polymorphic slot if its schema is listed here
    candidates: Vec<String>,
}

impl Resolver {
    /// Wrap a resolving closure
    ///
    /// ```ignore
    /// let resolver = Resolver::new(|raw| match raw.get("type").and_then(|t| t.as_str()) {
    ///     Some("circle") => Resolution::from("Circle"),
    ///     Some("square") => Resolution::from("Square"),
    ///     _ => Resolution::Invalid(raw.get("type").cloned().unwrap_or_default()),
    /// });
    /// ```
    pub fn new<F, R>(resolve: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> R + Send + Sync + 'static,
        R: Into<Resolution>,
    {
        Self {
            resolve: Arc::new(move |raw: &Map<String, Value>| -> Resolution { resolve(raw).into() }),
            candidates: Vec::new(),
        }
    }

    /// Declare the schemas this resolver can produce
    pub fn candidates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn candidate_names(&self) -> &[String] {
        &self.candidates
    }

    /// Whether an instance of `schema` fits this resolver's range
    pub fn accepts(&self, schema: &str) -> bool {
        self.candidates.iter().any(|c| c == schema)
    }

    /// Resolve by reading a discriminator key and mapping its string value
    /// through `table`
    ///
    /// The table's schemas become the resolver's candidates.
    pub fn by_key<I, K, S>(key: impl Into<String>, table: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<String>,
    {
        let key = key.into();
        let table: Vec<(String, String)> = table
            .into_iter()
            .map(|(k, s)| (k.into(), s.into()))
            .collect();

        let candidates: Vec<String> = table.iter().map(|(_, schema)| schema.clone()).collect();

        Self::new(move |raw: &Map<String, Value>| {
            let tag = raw.get(&key).cloned().unwrap_or(Value::Null);
            tag.as_str()
                .and_then(|t| table.iter().find(|(k, _)| k == t))
                .map(|(_, schema)| Resolution::Schema(schema.clone()))
                .unwrap_or(Resolution::Invalid(tag))
        })
        .candidates(candidates)
    }

    pub fn resolve(&self, raw: &Map<String, Value>) -> Resolution {
        (self.resolve)(raw)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_closure_returning_option() {
        let resolver = Resolver::new(|raw: &Map<String, Value>| {
            raw.contains_key("radius").then_some("Circle")
        });

        assert_eq!(
            resolver.resolve(&map(json!({"radius": 2}))),
            Resolution::Schema("Circle".to_string())
        );
        assert_eq!(
            resolver.resolve(&map(json!({"side": 2}))),
            Resolution::Invalid(Value::Null)
        );
    }

    #[test]
    fn test_by_key_reports_unmatched_tag() {
        let resolver = Resolver::by_key("type", [("circle", "Circle"), ("square", "Square")]);

        assert_eq!(
            resolver.resolve(&map(json!({"type": "square"}))),
            Resolution::Schema("Square".to_string())
        );
        assert_eq!(
            resolver.resolve(&map(json!({"type": 5}))),
            Resolution::Invalid(json!(5))
        );
        assert!(resolver.accepts("Circle"));
        assert!(!resolver.accepts("Triangle"));
    }

    #[test]
    fn test_closure_resolver_has_no_candidates_until_declared() {
        let resolver = Resolver::new(|_: &Map<String, Value>| "Circle");
        assert!(!resolver.accepts("Circle"));

        let resolver = resolver.candidates(["Circle"]);
        assert_eq!(resolver.candidate_names(), ["Circle".to_string()]);
        assert!(resolver.accepts("Circle"));
    }
}
