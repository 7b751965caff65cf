//! Schema Registry
//!
//! Holds the declared schemas models are cast into, plus the scalar coercer
//! used for primitive attributes. Registration is append-only.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::scalar::{ScalarCoercion, StandardCoercion};
use crate::schema::{AttributeType, Schema};

/// The main schema registry
pub struct SchemaRegistry {
    /// Registered schemas by name
    schemas: HashMap<String, Arc<Schema>>,
    /// Coercer for scalar and enum attributes
    coercion: Arc<dyn ScalarCoercion>,
}

impl SchemaRegistry {
    /// Create an empty registry using [`StandardCoercion`]
    pub fn new() -> Self {
        Self::with_coercion(StandardCoercion)
    }

    /// Create an empty registry with a custom scalar coercer
    pub fn with_coercion(coercion: impl ScalarCoercion + 'static) -> Self {
        Self {
            schemas: HashMap::new(),
            coercion: Arc::new(coercion),
        }
    }

    /// Register a schema
    ///
    /// Names are unique; an existing schema is never replaced.
    pub fn register(&mut self, schema: Schema) -> Result<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(ModelError::AlreadyExists {
                name: schema.name().to_string(),
            });
        }

        if let Some(duplicate) = schema.duplicate_attribute() {
            return Err(ModelError::InvalidFormat(format!(
                "{} declares attribute '{}' more than once",
                schema.name(),
                duplicate
            )));
        }

        for def in schema.attributes() {
            if let AttributeType::Enum(mapping) = &def.ty {
                if let Some(reason) = mapping.ambiguity() {
                    return Err(ModelError::InvalidFormat(format!(
                        "{} enum attribute '{}' is ambiguous: {}",
                        schema.name(),
                        def.name,
                        reason
                    )));
                }
            }
        }

        debug!(
            schema = schema.name(),
            attributes = schema.attributes().len(),
            "registered schema"
        );
        self.schemas
            .insert(schema.name().to_string(), Arc::new(schema));
        Ok(())
    }

    /// Get a schema by name
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Get a schema by name, failing if it is not registered
    pub fn schema(&self, name: &str) -> Result<Arc<Schema>> {
        self.get(name).cloned().ok_or_else(|| ModelError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// All registered schema names, sorted
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.schemas.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn coercion(&self) -> &dyn ScalarCoercion {
        self.coercion.as_ref()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::{EnumMapping, ScalarKind};

    #[test]
    fn test_create_registry() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.schema_names().is_empty());
    }

    #[test]
    fn test_register_schema() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(Schema::new("Paint").attribute("hue", ScalarKind::String))
            .unwrap();
        registry.register(Schema::new("Configuration")).unwrap();

        assert_eq!(registry.schema_names(), vec!["Configuration", "Paint"]);
        assert!(registry.contains("Paint"));
        assert_eq!(registry.schema("Paint").unwrap().attributes().len(), 1);
    }

    #[test]
    fn test_immutability() {
        let mut registry = SchemaRegistry::new();
        registry.register(Schema::new("Paint")).unwrap();

        // Registering the same name again must fail
        let result = registry.register(Schema::new("Paint").attribute("hue", ScalarKind::String));
        assert!(matches!(result, Err(ModelError::AlreadyExists { name }) if name == "Paint"));
        assert!(registry.schema("Paint").unwrap().attributes().is_empty());
    }

    #[test]
    fn test_rejects_duplicate_attribute() {
        let mut registry = SchemaRegistry::new();
        let result = registry.register(
            Schema::new("Paint")
                .attribute("hue", ScalarKind::String)
                .attribute("hue", ScalarKind::Integer),
        );
        assert!(matches!(result, Err(ModelError::InvalidFormat(_))));
        assert!(!registry.contains("Paint"));
    }

    #[test]
    fn test_rejects_ambiguous_enum() {
        let mut registry = SchemaRegistry::new();
        let result = registry.register(
            Schema::new("Switch").attribute(
                "state",
                EnumMapping::new(ScalarKind::String)
                    .variant("a", "b")
                    .variant("b", "c"),
            ),
        );
        match result {
            Err(ModelError::InvalidFormat(message)) => assert!(message.contains("state")),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
        assert!(!registry.contains("Switch"));
    }

    #[test]
    fn test_missing_schema() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.schema("Ghost"),
            Err(ModelError::NotFound { name }) if name == "Ghost"
        ));
    }
}
