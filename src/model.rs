//! Model instances
//!
//! A [`ModelInstance`] is one schema instantiated from input: coerced values
//! for the declared attributes, the untouched remainder in an
//! [`UnknownAttributes`] bag, and optional per-instance serialization
//! overrides. Instances own their nested instances outright.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::policy::{self, PolicyConfig};
use crate::scalar::{EnumValue, ScalarValue};
use crate::schema::Schema;
use crate::serialize::Serializer;
use crate::unknown::UnknownAttributes;

/// Coerced value of a declared attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Scalar(ScalarValue),
    Enum(EnumValue),
    Model(Box<ModelInstance>),
    Models(Vec<ModelInstance>),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            AttributeValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            AttributeValue::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            AttributeValue::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_models(&self) -> Option<&[ModelInstance]> {
        match self {
            AttributeValue::Models(ms) => Some(ms),
            _ => None,
        }
    }

    /// Raw structural form: enums as their backing value, nested models as
    /// their exported attribute maps
    pub fn to_raw_json(&self) -> Value {
        match self {
            AttributeValue::Null => Value::Null,
            AttributeValue::Scalar(v) => v.to_json(),
            AttributeValue::Enum(e) => e.value().to_json(),
            AttributeValue::Model(m) => Value::Object(m.to_attributes()),
            AttributeValue::Models(ms) => {
                Value::Array(ms.iter().map(|m| Value::Object(m.to_attributes())).collect())
            }
        }
    }
}

impl From<ScalarValue> for AttributeValue {
    fn from(value: ScalarValue) -> Self {
        AttributeValue::Scalar(value)
    }
}

impl From<EnumValue> for AttributeValue {
    fn from(value: EnumValue) -> Self {
        AttributeValue::Enum(value)
    }
}

impl From<ModelInstance> for AttributeValue {
    fn from(model: ModelInstance) -> Self {
        AttributeValue::Model(Box::new(model))
    }
}

impl From<Vec<ModelInstance>> for AttributeValue {
    fn from(models: Vec<ModelInstance>) -> Self {
        AttributeValue::Models(models)
    }
}

/// An instantiation of one schema
#[derive(Debug, Clone)]
pub struct ModelInstance {
    schema: Arc<Schema>,
    known: HashMap<String, AttributeValue>,
    unknown: UnknownAttributes,
    serialize_unknown_override: Option<bool>,
    serialize_enums_override: Option<bool>,
}

impl ModelInstance {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            known: HashMap::new(),
            unknown: UnknownAttributes::new(),
            serialize_unknown_override: None,
            serialize_enums_override: None,
        }
    }

    pub(crate) fn insert_known(&mut self, name: String, value: AttributeValue) {
        self.known.insert(name, value);
    }

    pub(crate) fn insert_unknown(&mut self, key: String, value: Value) {
        self.unknown.insert(key, value);
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_name(&self) -> &str {
        self.schema.name()
    }

    /// Value of a declared attribute, if the input supplied one
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.known.get(name)
    }

    /// Replace the value of a declared attribute
    ///
    /// Undeclared names are rejected: a key never moves between the known and
    /// unknown bags after casting.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<Option<AttributeValue>> {
        if !self.schema.declares(name) {
            return Err(ModelError::UnknownAttribute {
                schema: self.schema.name().to_string(),
                attribute: name.to_string(),
            });
        }
        Ok(self.known.insert(name.to_string(), value.into()))
    }

    /// Whether the schema declares `name`
    pub fn has_attribute(&self, name: &str) -> bool {
        self.schema.declares(name)
    }

    /// Known attributes in declaration order
    pub fn known_attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.schema
            .attributes()
            .iter()
            .filter_map(|def| self.known.get(&def.name).map(|v| (def.name.as_str(), v)))
    }

    pub fn unknown_attributes(&self) -> &UnknownAttributes {
        &self.unknown
    }

    pub fn serialize_unknown_attributes_override(&self) -> Option<bool> {
        self.serialize_unknown_override
    }

    /// Override (or with `None`, clear the override of) the unknown-attribute policy
    pub fn set_serialize_unknown_attributes(&mut self, value: Option<bool>) {
        self.serialize_unknown_override = value;
    }

    pub fn serialize_enums_using_as_json_override(&self) -> Option<bool> {
        self.serialize_enums_override
    }

    /// Override (or with `None`, clear the override of) the enum policy
    pub fn set_serialize_enums_using_as_json(&mut self, value: Option<bool>) {
        self.serialize_enums_override = value;
    }

    /// Resolved unknown-attribute flag against the process-wide policy
    pub fn serialize_unknown_attributes(&self) -> bool {
        self.serialize_unknown_attributes_with(policy::policy())
    }

    pub fn serialize_unknown_attributes_with(&self, policy: &PolicyConfig) -> bool {
        self.serialize_unknown_override
            .unwrap_or_else(|| policy.serialize_unknown_attributes())
    }

    /// Resolved enum flag against the process-wide policy
    pub fn serialize_enums_using_as_json(&self) -> bool {
        self.serialize_enums_using_as_json_with(policy::policy())
    }

    pub fn serialize_enums_using_as_json_with(&self, policy: &PolicyConfig) -> bool {
        self.serialize_enums_override
            .unwrap_or_else(|| policy.serialize_enums_using_as_json())
    }

    /// Export known and unknown attributes as one raw JSON map
    ///
    /// Enums export their backing value. The cast engine never calls this on
    /// an instance it can hand back unchanged.
    pub fn to_attributes(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .known_attributes()
            .map(|(name, value)| (name.to_string(), value.to_raw_json()))
            .collect();
        for (key, value) in &self.unknown {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Structural equality: schema, known and unknown attributes; overrides are
/// not part of the data
impl PartialEq for ModelInstance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name()
            && self.known == other.known
            && self.unknown == other.unknown
    }
}

impl fmt::Display for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = Serializer::new(policy::policy()).to_value(self);
        write!(f, "{}", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::ScalarKind;
    use serde_json::json;

    fn instance() -> ModelInstance {
        let schema = Schema::new("Configuration")
            .attribute("model", ScalarKind::String)
            .attribute("color", ScalarKind::String);
        let mut model = ModelInstance::new(Arc::new(schema));
        model.insert_known("color".into(), ScalarValue::from("red").into());
        model.insert_known("model".into(), ScalarValue::from("spaceship").into());
        model.insert_unknown("wheels".into(), json!(4));
        model
    }

    #[test]
    fn test_known_attributes_follow_declaration_order() {
        let model = instance();
        let names: Vec<_> = model.known_attributes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["model", "color"]);
    }

    #[test]
    fn test_set_rejects_undeclared_name() {
        let mut model = instance();
        let previous = model.set("color", ScalarValue::from("blue")).unwrap();
        assert_eq!(previous, Some(AttributeValue::Scalar("red".into())));

        let err = model.set("wheels", ScalarValue::from(6)).unwrap_err();
        assert!(matches!(err, ModelError::UnknownAttribute { .. }));
        assert_eq!(model.unknown_attributes().get("wheels"), Some(&json!(4)));
    }

    #[test]
    fn test_to_attributes_exports_both_bags() {
        let model = instance();
        assert_eq!(
            Value::Object(model.to_attributes()),
            json!({"model": "spaceship", "color": "red", "wheels": 4})
        );
    }

    #[test]
    fn test_overrides_win_over_policy() {
        let mut model = instance();
        let policy = PolicyConfig::new(false, false);
        assert!(!model.serialize_unknown_attributes_with(&policy));

        model.set_serialize_unknown_attributes(Some(true));
        model.set_serialize_enums_using_as_json(Some(true));
        assert!(model.serialize_unknown_attributes_with(&policy));
        assert!(model.serialize_enums_using_as_json_with(&policy));

        model.set_serialize_unknown_attributes(None);
        assert!(!model.serialize_unknown_attributes_with(&policy));
    }

    #[test]
    fn test_equality_ignores_overrides() {
        let a = instance();
        let mut b = instance();
        b.set_serialize_unknown_attributes(Some(false));
        assert_eq!(a, b);
    }
}
