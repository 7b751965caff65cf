//! Store Models
//!
//! Polymorphic attribute coercion and JSON serialization for schema-declared
//! models.
//!
//! ## Features
//!
//! - **Polymorphic Casting**: A [`Resolver`] picks the concrete schema from the raw input
//! - **Lossless Round-Trips**: Undeclared keys are kept, in order, as unknown attributes
//! - **Nested Models**: Single and array slots recurse, with `{"attributes": ...}` item wrappers
//! - **Serialization Policy**: Process-wide defaults with per-instance overrides
//!
//! ## Example
//!
//! ```ignore
//! let mut registry = SchemaRegistry::new();
//! registry.register(Schema::new("Circle").attribute("radius", ScalarKind::Float))?;
//! registry.register(Schema::new("Square").attribute("side", ScalarKind::Float))?;
//!
//! let shape = ModelRef::one_of(Resolver::by_key("type", [("circle", "Circle"), ("square", "Square")]));
//! let model = registry.cast(&shape, r#"{"type":"circle","radius":2}"#)?.unwrap();
//! assert_eq!(serialize(&model), r#"{"radius":2.0,"type":"circle"}"#);
//! ```

pub mod cast;
pub mod config;
pub mod error;
pub mod model;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod scalar;
pub mod schema;
pub mod serialize;
pub mod unknown;

pub use cast::CastInput;
pub use config::{PolicySettings, StoreModelConfig};
pub use error::{ModelError, Result};
pub use model::{AttributeValue, ModelInstance};
pub use policy::{policy, PolicyConfig};
pub use registry::SchemaRegistry;
pub use resolver::{Resolution, Resolver};
pub use scalar::{
    EnumMapping, EnumValue, ScalarCoercion, ScalarError, ScalarKind, ScalarValue, StandardCoercion,
};
pub use schema::{AttributeDef, AttributeType, ModelRef, Schema};
pub use serialize::{serialize, serialize_array, serialize_input, Serializer};
pub use unknown::UnknownAttributes;
