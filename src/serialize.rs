//! Serialize Engine
//!
//! Emits canonical JSON for model instances: declared attributes in
//! declaration order, then (when the resolved policy says so) the unknown
//! attributes verbatim in their original order. Every node resolves its own
//! policy; nothing is inherited from the parent model.

use serde_json::{Map, Value};
use tracing::trace;

use crate::cast::{self, CastInput, Normalized};
use crate::error::Result;
use crate::model::{AttributeValue, ModelInstance};
use crate::policy::{self, PolicyConfig};

const SERIALIZE_TARGET: &str = "serialized model";

/// Serializes models against a given policy
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'p> {
    policy: &'p PolicyConfig,
}

impl<'p> Serializer<'p> {
    pub fn new(policy: &'p PolicyConfig) -> Self {
        Self { policy }
    }

    /// JSON value of a model
    pub fn to_value(&self, model: &ModelInstance) -> Value {
        let enums_as_json = model.serialize_enums_using_as_json_with(self.policy);
        let include_unknown = model.serialize_unknown_attributes_with(self.policy);
        trace!(
            schema = model.schema_name(),
            enums_as_json,
            include_unknown,
            "serializing model"
        );

        let mut out: Map<String, Value> = model
            .known_attributes()
            .map(|(name, value)| (name.to_string(), self.attribute_value(value, enums_as_json)))
            .collect();

        if include_unknown {
            for (key, value) in model.unknown_attributes() {
                out.insert(key.clone(), value.clone());
            }
        }

        Value::Object(out)
    }

    fn attribute_value(&self, value: &AttributeValue, enums_as_json: bool) -> Value {
        match value {
            AttributeValue::Null => Value::Null,
            AttributeValue::Scalar(scalar) => scalar.to_json(),
            AttributeValue::Enum(e) if enums_as_json => Value::String(e.label().to_string()),
            AttributeValue::Enum(e) => e.value().to_json(),
            AttributeValue::Model(model) => self.to_value(model),
            AttributeValue::Models(models) => {
                Value::Array(models.iter().map(|m| self.to_value(m)).collect())
            }
        }
    }

    /// JSON text of a model
    pub fn serialize(&self, model: &ModelInstance) -> String {
        self.to_value(model).to_string()
    }

    /// JSON text of a model array
    pub fn serialize_array(&self, models: &[ModelInstance]) -> String {
        Value::Array(models.iter().map(|m| self.to_value(m)).collect()).to_string()
    }

    /// JSON text of any input the cast engine accepts
    ///
    /// Maps and JSON text are re-emitted as-is in canonical form, without
    /// schema resolution and without dropping keys.
    pub fn serialize_input(&self, input: impl Into<CastInput>) -> Result<String> {
        let value = match cast::normalize(input.into(), SERIALIZE_TARGET)? {
            Normalized::Null => Value::Null,
            Normalized::Instance(model) => self.to_value(&model),
            Normalized::Map(map) => Value::Object(map),
        };
        Ok(value.to_string())
    }
}

/// Serialize a model against the process-wide policy
pub fn serialize(model: &ModelInstance) -> String {
    Serializer::new(policy::policy()).serialize(model)
}

/// Serialize a model array against the process-wide policy
pub fn serialize_array(models: &[ModelInstance]) -> String {
    Serializer::new(policy::policy()).serialize_array(models)
}

/// Serialize any castable input against the process-wide policy
pub fn serialize_input(input: impl Into<CastInput>) -> Result<String> {
    Serializer::new(policy::policy()).serialize_input(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::registry::SchemaRegistry;
    use crate::scalar::{EnumMapping, ScalarKind};
    use crate::schema::{ModelRef, Schema};
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                Schema::new("Order")
                    .attribute("status", EnumMapping::new(ScalarKind::Integer).variant("active", 1))
                    .attribute("note", ScalarKind::String)
                    .models("lines", ModelRef::fixed("Line")),
            )
            .unwrap();
        registry
            .register(Schema::new("Line").attribute("sku", ScalarKind::String))
            .unwrap();
        registry
    }

    fn order(raw: Value) -> ModelInstance {
        registry().cast(&ModelRef::fixed("Order"), raw).unwrap().unwrap()
    }

    #[test]
    fn test_known_in_declaration_order_then_unknown() {
        let model = order(json!({"extra": true, "note": "n", "status": 1}));
        let policy = PolicyConfig::new(true, true);
        assert_eq!(
            Serializer::new(&policy).serialize(&model),
            r#"{"status":"active","note":"n","extra":true}"#
        );
    }

    #[test]
    fn test_policy_controls_unknown_and_enums() {
        let model = order(json!({"status": "active", "extra": 1}));
        let policy = PolicyConfig::new(false, false);
        assert_eq!(Serializer::new(&policy).to_value(&model), json!({"status": 1}));
    }

    #[test]
    fn test_nested_nodes_resolve_their_own_flags() {
        let mut model = order(json!({"lines": [{"sku": "a", "gift": true}], "memo": "m"}));
        model.set_serialize_unknown_attributes(Some(true));
        let policy = PolicyConfig::new(false, true);

        // Parent override does not leak into the nested line
        assert_eq!(
            Serializer::new(&policy).to_value(&model),
            json!({"lines": [{"sku": "a"}], "memo": "m"})
        );
    }

    #[test]
    fn test_wrapped_items_serialize_flat() {
        let model = order(json!({"lines": [{"attributes": {"sku": "a"}}]}));
        let policy = PolicyConfig::default();
        assert_eq!(
            Serializer::new(&policy).serialize(&model),
            r#"{"lines":[{"sku":"a"}]}"#
        );
    }

    #[test]
    fn test_serialize_input_reemits_maps_and_text() {
        let policy = PolicyConfig::default();
        let serializer = Serializer::new(&policy);

        assert_eq!(
            serializer.serialize_input(json!({"b": 1, "a": [2]})).unwrap(),
            r#"{"b":1,"a":[2]}"#
        );
        assert_eq!(
            serializer.serialize_input(r#"{ "b" : 1,  "a": null }"#).unwrap(),
            r#"{"b":1,"a":null}"#
        );
        assert_eq!(serializer.serialize_input(Value::Null).unwrap(), "null");
        assert!(matches!(
            serializer.serialize_input("not json"),
            Err(ModelError::Parse(_))
        ));
    }
}
