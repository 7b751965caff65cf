//! Cast Engine
//!
//! Turns loosely structured input into [`ModelInstance`]s. Input is first
//! normalized (JSON text is parsed, maps pass through, instances are kept),
//! then the target schema is resolved (fixed, or through a [`Resolver`])
//! and each input key is either coerced into its declared attribute type or
//! kept verbatim as an unknown attribute.
//!
//! [`Resolver`]: crate::resolver::Resolver

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{ModelError, Result};
use crate::model::{AttributeValue, ModelInstance};
use crate::registry::SchemaRegistry;
use crate::resolver::Resolution;
use crate::schema::{AttributeType, ModelRef, Schema};

/// Accepted input categories for a single model
pub const ACCEPTED_MODEL_INPUTS: &str =
    "a key/value map, JSON text encoding a map, an existing compatible model instance, or null";

/// Accepted input categories for a model array
pub const ACCEPTED_ARRAY_INPUTS: &str = "a JSON array, JSON text encoding an array, or null";

/// Accepted input categories for one element of a model array
pub const ACCEPTED_ELEMENT_INPUTS: &str =
    "a key/value map, a map wrapped as {\"attributes\": ...}, or JSON text encoding a map";

/// Wrapper key recognised on model array elements
pub const ATTRIBUTES_KEY: &str = "attributes";

/// Raw input to a cast
#[derive(Debug, Clone)]
pub enum CastInput {
    /// An already typed instance
    Instance(ModelInstance),
    /// Structural input; strings are treated as JSON text
    Value(Value),
}

impl From<ModelInstance> for CastInput {
    fn from(model: ModelInstance) -> Self {
        CastInput::Instance(model)
    }
}

impl From<Value> for CastInput {
    fn from(value: Value) -> Self {
        CastInput::Value(value)
    }
}

impl From<Map<String, Value>> for CastInput {
    fn from(map: Map<String, Value>) -> Self {
        CastInput::Value(Value::Object(map))
    }
}

impl From<&str> for CastInput {
    fn from(text: &str) -> Self {
        CastInput::Value(Value::String(text.to_string()))
    }
}

impl From<String> for CastInput {
    fn from(text: String) -> Self {
        CastInput::Value(Value::String(text))
    }
}

/// Input after normalization
pub(crate) enum Normalized {
    Null,
    Instance(ModelInstance),
    Map(Map<String, Value>),
}

/// Normalize raw input into null, an instance, or a string-keyed map
pub(crate) fn normalize(input: CastInput, target: &str) -> Result<Normalized> {
    match input {
        CastInput::Instance(model) => Ok(Normalized::Instance(model)),
        CastInput::Value(Value::Null) => Ok(Normalized::Null),
        CastInput::Value(Value::Object(map)) => Ok(Normalized::Map(map)),
        CastInput::Value(Value::String(text)) => match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(Normalized::Map(map)),
            _ => Err(cast_error(Value::String(text), target, ACCEPTED_MODEL_INPUTS)),
        },
        CastInput::Value(other) => Err(cast_error(other, target, ACCEPTED_MODEL_INPUTS)),
    }
}

fn cast_error(value: Value, target: &str, accepted: &'static str) -> ModelError {
    ModelError::Cast {
        value,
        target: target.to_string(),
        accepted,
    }
}

/// Strip an `{"attributes": {...}}` wrapper from a model array element
fn unwrap_attributes(item: Value) -> Value {
    match item {
        Value::Object(map)
            if map.len() == 1 && matches!(map.get(ATTRIBUTES_KEY), Some(Value::Object(_))) =>
        {
            map.into_iter().next().map(|(_, inner)| inner).unwrap_or(Value::Null)
        }
        other => other,
    }
}

impl SchemaRegistry {
    /// Cast raw input into a model of `target`
    ///
    /// `null` casts to `None` without consulting any resolver. An instance
    /// that already fits `target` (same schema for a fixed target, one of the
    /// resolver's candidates for a polymorphic one) is handed back as is: it
    /// is never exported and rebuilt, so its unknown attributes and overrides
    /// survive. Any other instance is re-cast from its exported attributes.
    pub fn cast(&self, target: &ModelRef, input: impl Into<CastInput>) -> Result<Option<ModelInstance>> {
        match normalize(input.into(), &target.describe())? {
            Normalized::Null => Ok(None),
            Normalized::Instance(model) => self.cast_instance(target, model).map(Some),
            Normalized::Map(map) => self.cast_map(target, map).map(Some),
        }
    }

    /// Cast raw input into an array of models of `target`
    ///
    /// Elements may be wrapped as `{"attributes": {...}}`.
    pub fn cast_array(&self, target: &ModelRef, input: impl Into<Value>) -> Result<Option<Vec<ModelInstance>>> {
        let items = match input.into() {
            Value::Null => return Ok(None),
            Value::Array(items) => items,
            Value::String(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Array(items) => items,
                _ => {
                    return Err(cast_error(
                        Value::String(text),
                        &target.describe(),
                        ACCEPTED_ARRAY_INPUTS,
                    ))
                }
            },
            other => return Err(cast_error(other, &target.describe(), ACCEPTED_ARRAY_INPUTS)),
        };

        items
            .into_iter()
            .map(|item| self.cast_element(target, item))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn cast_element(&self, target: &ModelRef, item: Value) -> Result<ModelInstance> {
        match self.cast(target, unwrap_attributes(item))? {
            Some(model) => Ok(model),
            None => Err(cast_error(Value::Null, &target.describe(), ACCEPTED_ELEMENT_INPUTS)),
        }
    }

    fn cast_instance(&self, target: &ModelRef, model: ModelInstance) -> Result<ModelInstance> {
        let compatible = match target {
            ModelRef::Fixed(name) => model.schema_name() == name,
            ModelRef::OneOf(resolver) => {
                resolver.accepts(model.schema_name()) && self.contains(model.schema_name())
            }
        };

        if compatible {
            debug!(schema = model.schema_name(), "instance already fits target, passing through");
            return Ok(model);
        }

        debug!(
            schema = model.schema_name(),
            target = %target.describe(),
            "instance does not fit target, re-casting from its attributes"
        );
        self.cast_map(target, model.to_attributes())
    }

    fn cast_map(&self, target: &ModelRef, map: Map<String, Value>) -> Result<ModelInstance> {
        let schema = self.resolve_schema(target, &map)?;
        self.build(schema, map)
    }

    fn resolve_schema(&self, target: &ModelRef, map: &Map<String, Value>) -> Result<Arc<Schema>> {
        match target {
            ModelRef::Fixed(name) => self.schema(name),
            ModelRef::OneOf(resolver) => match resolver.resolve(map) {
                Resolution::Schema(name) => match self.get(&name) {
                    Some(schema) => {
                        debug!(schema = %name, "resolved polymorphic model");
                        Ok(Arc::clone(schema))
                    }
                    None => Err(ModelError::Resolution {
                        value: Value::String(name),
                    }),
                },
                Resolution::Invalid(value) => Err(ModelError::Resolution { value }),
            },
        }
    }

    fn build(&self, schema: Arc<Schema>, map: Map<String, Value>) -> Result<ModelInstance> {
        let mut model = ModelInstance::new(Arc::clone(&schema));

        for (key, raw) in map {
            match schema.attribute_def(&key) {
                Some(def) => {
                    let value = self.cast_attribute(&def.ty, raw)?;
                    model.insert_known(key, value);
                }
                None => {
                    trace!(schema = schema.name(), attribute = %key, "captured unknown attribute");
                    model.insert_unknown(key, raw);
                }
            }
        }

        Ok(model)
    }

    fn cast_attribute(&self, ty: &AttributeType, raw: Value) -> Result<AttributeValue> {
        if raw.is_null() {
            return Ok(AttributeValue::Null);
        }

        let value = match ty {
            AttributeType::Scalar(kind) => AttributeValue::Scalar(self.coercion().coerce(*kind, &raw)?),
            AttributeType::Enum(mapping) => {
                AttributeValue::Enum(self.coercion().coerce_enum(mapping, &raw)?)
            }
            AttributeType::Model(target) => match self.cast(target, raw)? {
                Some(model) => AttributeValue::Model(Box::new(model)),
                None => AttributeValue::Null,
            },
            AttributeType::ModelArray(target) => match self.cast_array(target, raw)? {
                Some(models) => AttributeValue::Models(models),
                None => AttributeValue::Null,
            },
        };
        Ok(value)
    }
}
