//! Schema types and structures

use crate::resolver::Resolver;
use crate::scalar::{EnumMapping, ScalarKind};

/// Reference from an attribute slot to the schema(s) it holds
#[derive(Debug, Clone)]
pub enum ModelRef {
    /// Always the named schema
    Fixed(String),
    /// Whatever the resolver picks from the raw input
    OneOf(Resolver),
}

impl ModelRef {
    pub fn fixed(name: impl Into<String>) -> Self {
        ModelRef::Fixed(name.into())
    }

    pub fn one_of(resolver: Resolver) -> Self {
        ModelRef::OneOf(resolver)
    }

    /// Human readable target, used in error messages
    pub fn describe(&self) -> String {
        match self {
            ModelRef::Fixed(name) => name.clone(),
            ModelRef::OneOf(_) => "a polymorphic model".to_string(),
        }
    }
}

/// Declared type of an attribute
#[derive(Debug, Clone)]
pub enum AttributeType {
    Scalar(ScalarKind),
    Enum(EnumMapping),
    Model(ModelRef),
    ModelArray(ModelRef),
}

impl AttributeType {
    pub fn is_nested(&self) -> bool {
        matches!(self, AttributeType::Model(_) | AttributeType::ModelArray(_))
    }
}

impl From<ScalarKind> for AttributeType {
    fn from(kind: ScalarKind) -> Self {
        AttributeType::Scalar(kind)
    }
}

impl From<EnumMapping> for AttributeType {
    fn from(mapping: EnumMapping) -> Self {
        AttributeType::Enum(mapping)
    }
}

/// A single declared attribute
#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub name: String,
    pub ty: AttributeType,
}

/// A named, ordered list of attribute declarations
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    attributes: Vec<AttributeDef>,
}

impl Schema {
    /// Create a schema with no attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Declare a scalar or enum attribute
    pub fn attribute(mut self, name: impl Into<String>, ty: impl Into<AttributeType>) -> Self {
        self.attributes.push(AttributeDef {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Declare a nested model attribute
    pub fn model(self, name: impl Into<String>, target: ModelRef) -> Self {
        self.attribute(name, AttributeType::Model(target))
    }

    /// Declare a nested model array attribute
    pub fn models(self, name: impl Into<String>, target: ModelRef) -> Self {
        self.attribute(name, AttributeType::ModelArray(target))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in order
    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    /// Find a declaration by name
    pub fn attribute_def(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.attribute_def(name).is_some()
    }

    /// First attribute name declared more than once, if any
    pub(crate) fn duplicate_attribute(&self) -> Option<&str> {
        self.attributes.iter().enumerate().find_map(|(i, a)| {
            self.attributes[..i]
                .iter()
                .any(|earlier| earlier.name == a.name)
                .then_some(a.name.as_str())
        })
    }
}
