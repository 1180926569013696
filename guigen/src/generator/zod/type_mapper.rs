//! IR to Zod type mappings.
//!
//! This module handles mapping property shapes to their Zod equivalents.
//!
//! # Type Mappings
//!
//! | IR shape | Zod Schema |
//! |----------|------------|
//! | `string` | `z.string()` |
//! | `integer` | `z.number().int()` |
//! | `number` | `z.number()` |
//! | `boolean` | `z.boolean()` |
//! | inline `enum` | `z.enum([...])` |
//! | `const` | `z.literal(...)` |
//! | array | `z.array(T)` |
//! | tuple | `z.tuple([A, B])` |
//! | map | `z.record(z.string(), T)` |
//! | `$ref` | `{Name}Schema`, or `z.lazy(() => {Name}Schema)` when not yet declared |
//! | `oneOf` | `z.union([...])` / `z.discriminatedUnion("type", [...])` |
//! | any | `z.any()` |

use std::collections::HashSet;

use serde_json::Value;

use crate::ir::{Constraints, DefinitionKind, DefinitionTable, PrimitiveKind, PropertySpec, Shape};

/// Maps property specs to Zod schema strings.
///
/// `is_forward` decides whether a referenced name is declared after the
/// point of use and must be wrapped in `z.lazy`.
pub struct ZodTypeMapper<'a> {
    is_forward: &'a dyn Fn(&str) -> bool,
}

impl<'a> ZodTypeMapper<'a> {
    pub fn new(is_forward: &'a dyn Fn(&str) -> bool) -> Self {
        Self { is_forward }
    }

    /// Map a property to its Zod schema, with validations and the nullable
    /// modifier applied.
    pub fn map_type(&self, spec: &PropertySpec) -> String {
        let schema = self.map_shape(&spec.shape);
        let schema = self.apply_validations(schema, &spec.shape, &spec.constraints);
        self.apply_nullable(schema, spec)
    }

    fn map_shape(&self, shape: &Shape) -> String {
        match shape {
            Shape::Primitive(kind) => match kind {
                PrimitiveKind::String => "z.string()".to_string(),
                PrimitiveKind::Integer => "z.number().int()".to_string(),
                PrimitiveKind::Number => "z.number()".to_string(),
                PrimitiveKind::Boolean => "z.boolean()".to_string(),
            },
            Shape::Literal(values) => self.map_literals(values),
            Shape::Const(value) => map_literal(value),
            Shape::Array(item) => format!("z.array({})", self.map_type(item)),
            Shape::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|i| self.map_type(i)).collect();
                format!("z.tuple([{}])", items.join(", "))
            }
            Shape::Map(value) => {
                let value = value
                    .as_deref()
                    .map(|v| self.map_type(v))
                    .unwrap_or_else(|| "z.any()".to_string());
                format!("z.record(z.string(), {})", value)
            }
            Shape::Reference(name) => self.map_reference(name),
            Shape::Union {
                members,
                discriminator,
            } => self.map_union(members, discriminator.as_deref()),
            Shape::Any => "z.any()".to_string(),
        }
    }

    /// Map a reference to the schema constant of the named definition.
    pub fn map_reference(&self, name: &str) -> String {
        if (self.is_forward)(name) {
            format!("z.lazy(() => {}Schema)", name)
        } else {
            format!("{}Schema", name)
        }
    }

    fn map_literals(&self, values: &[Value]) -> String {
        let strings: Option<Vec<&str>> = values.iter().map(Value::as_str).collect();
        match strings {
            Some(strings) if !strings.is_empty() => {
                let variants: Vec<String> = strings
                    .iter()
                    .map(|s| format!("\"{}\"", escape_string(s)))
                    .collect();
                format!("z.enum([{}])", variants.join(", "))
            }
            _ => match values {
                [] => "z.never()".to_string(),
                [single] => map_literal(single),
                _ => {
                    let literals: Vec<String> = values.iter().map(map_literal).collect();
                    format!("z.union([{}])", literals.join(", "))
                }
            },
        }
    }

    /// Map an inline union. Tagged unions of named records use
    /// `z.discriminatedUnion`, which needs every member schema up front.
    fn map_union(&self, members: &[PropertySpec], discriminator: Option<&str>) -> String {
        if members.is_empty() {
            return "z.never()".to_string();
        }
        if members.len() == 1 {
            return self.map_type(&members[0]);
        }

        let schemas: Vec<String> = members.iter().map(|m| self.map_type(m)).collect();
        let eager_refs = members.iter().all(|m| match &m.shape {
            Shape::Reference(name) => !m.nullable && !(self.is_forward)(name),
            _ => false,
        });

        match discriminator {
            Some(field) if eager_refs => format!(
                "z.discriminatedUnion(\"{}\", [{}])",
                escape_string(field),
                schemas.join(", ")
            ),
            _ => format!("z.union([{}])", schemas.join(", ")),
        }
    }

    /// Apply constraint validations that fit the shape.
    fn apply_validations(&self, mut schema: String, shape: &Shape, c: &Constraints) -> String {
        match shape {
            Shape::Primitive(PrimitiveKind::String) => {
                if let Some(n) = c.min_length {
                    schema.push_str(&format!(".min({})", n));
                }
                if let Some(n) = c.max_length {
                    schema.push_str(&format!(".max({})", n));
                }
                if let Some(pattern) = &c.pattern {
                    schema.push_str(&format!(".regex(/{}/)", escape_regex(pattern)));
                }
            }
            Shape::Primitive(PrimitiveKind::Integer | PrimitiveKind::Number) => {
                if let Some(n) = &c.minimum {
                    schema.push_str(&format!(".min({})", n));
                }
                if let Some(n) = &c.maximum {
                    schema.push_str(&format!(".max({})", n));
                }
                if let Some(n) = &c.exclusive_minimum {
                    schema.push_str(&format!(".gt({})", n));
                }
                if let Some(n) = &c.exclusive_maximum {
                    schema.push_str(&format!(".lt({})", n));
                }
            }
            Shape::Array(_) => {
                if let Some(n) = c.min_items {
                    schema.push_str(&format!(".min({})", n));
                }
                if let Some(n) = c.max_items {
                    schema.push_str(&format!(".max({})", n));
                }
            }
            _ => {}
        }
        schema
    }

    /// Apply nullable modifier if needed.
    fn apply_nullable(&self, schema: String, spec: &PropertySpec) -> String {
        if spec.nullable && spec.shape != Shape::Any {
            format!("{}.nullable()", schema)
        } else {
            schema
        }
    }
}

/// Whether values of `spec` are records or lists once references are
/// resolved. Such optional fields accept `null` as well as absence.
pub fn is_object_or_array(spec: &PropertySpec, table: &DefinitionTable) -> bool {
    let mut visited = HashSet::new();
    shape_is_object_or_array(&spec.shape, table, &mut visited)
}

fn shape_is_object_or_array<'a>(
    shape: &'a Shape,
    table: &'a DefinitionTable,
    visited: &mut HashSet<&'a str>,
) -> bool {
    match shape {
        Shape::Array(_) | Shape::Tuple(_) | Shape::Map(_) => true,
        Shape::Union { members, .. } => members
            .iter()
            .any(|m| shape_is_object_or_array(&m.shape, table, visited)),
        Shape::Reference(name) => {
            if !visited.insert(name.as_str()) {
                return false;
            }
            match table.get(name).map(|d| &d.kind) {
                Some(DefinitionKind::Object(_) | DefinitionKind::Union(_)) => true,
                Some(DefinitionKind::Alias(alias)) => {
                    shape_is_object_or_array(&alias.spec.shape, table, visited)
                }
                Some(DefinitionKind::Enum(_)) | None => false,
            }
        }
        _ => false,
    }
}

/// `z.literal` for a scalar JSON value.
fn map_literal(value: &Value) -> String {
    match value {
        Value::Null => "z.null()".to_string(),
        Value::String(s) => format!("z.literal(\"{}\")", escape_string(s)),
        Value::Number(n) => format!("z.literal({})", n),
        Value::Bool(b) => format!("z.literal({})", b),
        Value::Array(_) | Value::Object(_) => "z.any()".to_string(),
    }
}

/// Escape a string for use in JavaScript/TypeScript.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Escape a regex pattern for use in a JavaScript regex literal.
pub fn escape_regex(pattern: &str) -> String {
    pattern.replace('/', "\\/")
}
