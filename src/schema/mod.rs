//! Attribute-type schema and subtype resolution.

mod registry;

pub use registry::{AttributeType, InMemorySchemaRegistry, SchemaRegistry};
