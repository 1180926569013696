//! Property IR definitions.
//!
//! A [`PropertySpec`] describes the shape of one field (or of a named alias):
//! what kind of value it holds, the constraints attached to it and an optional
//! default. Shapes are recursive through arrays, tuples, maps and unions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constraints::Constraints;

/// Scalar kinds of the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveKind {
    /// Parse a JSON-Schema `type` keyword value.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// Shape of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value", rename_all = "snake_case")]
pub enum Shape {
    /// Scalar value.
    Primitive(PrimitiveKind),

    /// Inline enumeration of literal values (`enum` on a property).
    Literal(Vec<Value>),

    /// Single fixed value (`const`), used as a union discriminator tag.
    Const(Value),

    /// Homogeneous sequence.
    Array(Box<PropertySpec>),

    /// Fixed-arity positional sequence (`prefixItems`).
    Tuple(Vec<PropertySpec>),

    /// String-keyed dictionary, with an optional value schema.
    Map(Option<Box<PropertySpec>>),

    /// Reference to a named definition.
    Reference(String),

    /// Inline union of alternatives (`oneOf` / `anyOf`), in IR order.
    Union {
        members: Vec<PropertySpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discriminator: Option<String>,
    },

    /// No recognizable type information.
    Any,
}

/// A property definition: shape plus constraints, default and documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// What the property holds
    pub shape: Shape,

    /// Validation bounds
    #[serde(default)]
    pub constraints: Constraints,

    /// Explicit default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Whether `null` is an accepted value (`type: [T, "null"]`)
    #[serde(default)]
    pub nullable: bool,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySpec {
    /// Create a property with the given shape and nothing else attached.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            constraints: Constraints::default(),
            default: None,
            nullable: false,
            description: None,
        }
    }

    /// Scalar property.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(Shape::Primitive(kind))
    }

    /// Reference to a named definition.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(Shape::Reference(name.into()))
    }

    /// Array of `item`.
    pub fn array(item: PropertySpec) -> Self {
        Self::new(Shape::Array(Box::new(item)))
    }

    /// Fixed literal.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::new(Shape::Const(value.into()))
    }

    /// Attach constraints.
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Attach a default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark as nullable.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Collect every definition name referenced anywhere inside this property,
    /// in first-occurrence order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.shape {
            Shape::Reference(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Shape::Array(item) => item.collect_references(out),
            Shape::Map(Some(value)) => value.collect_references(out),
            Shape::Tuple(items) | Shape::Union { members: items, .. } => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Shape::Primitive(_) | Shape::Literal(_) | Shape::Const(_) | Shape::Map(None) | Shape::Any => {}
        }
    }

    /// Whether the property's value is an object or array at the JSON level
    /// (directly, not through references).
    pub fn is_container(&self) -> bool {
        matches!(
            self.shape,
            Shape::Array(_) | Shape::Tuple(_) | Shape::Map(_)
        )
    }
}
