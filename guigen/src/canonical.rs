//! Canonical text form of schema instances.
//!
//! The generated Pydantic top-level type serializes with
//! `model_dump_json(indent=2, exclude_none=True)`. This module reproduces
//! that document from a JSON instance and the Definition Table, so the
//! contract can be checked without running the generated code:
//!
//! - object keys are reordered to declaration order, unknown keys dropped;
//! - an absent (or `null`) field with a default takes the default, and an
//!   optional `const` field takes its constant; other absent fields are
//!   omitted;
//! - `number` fields are floats, so `3` is written `3.0`; integral floats in
//!   `integer` fields are written as integers;
//! - union values are dispatched to a member by their discriminator tag,
//!   otherwise to the first member that accepts them.

use serde_json::{Map, Number, Value};

use crate::error::CanonicalError;
use crate::ir::{Definition, DefinitionKind, DefinitionTable, PrimitiveKind, PropertySpec, Shape};

/// Canonical text of a top-level instance (`{"metadata": ..., "root": ...}`).
pub fn to_canonical_text(table: &DefinitionTable, instance: &Value) -> Result<String, CanonicalError> {
    let canonical = canonicalize(table, instance)?;
    Ok(serde_json::to_string_pretty(&canonical)?)
}

/// Canonical form of a top-level instance.
pub fn canonicalize(table: &DefinitionTable, instance: &Value) -> Result<Value, CanonicalError> {
    let walker = Walker { table };
    let object = instance
        .as_object()
        .ok_or_else(|| mismatch("$", "an object with 'metadata' and 'root'"))?;

    let mut out = Map::new();
    for (field, type_name) in [
        ("metadata", table.root.metadata_type.as_str()),
        ("root", table.root.root_type.as_str()),
    ] {
        let path = format!("$.{}", field);
        let value = object
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| mismatch(&path, &format!("required field '{}'", field)))?;
        out.insert(field.to_string(), walker.definition(type_name, value, &path)?);
    }
    Ok(Value::Object(out))
}

/// Canonical form of `value` read as an instance of definition `name`.
pub fn canonicalize_as(table: &DefinitionTable, name: &str, value: &Value) -> Result<Value, CanonicalError> {
    Walker { table }.definition(name, value, "$")
}

fn mismatch(path: &str, expected: &str) -> CanonicalError {
    CanonicalError::Mismatch {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}

struct Walker<'a> {
    table: &'a DefinitionTable,
}

impl Walker<'_> {
    fn lookup(&self, name: &str) -> Result<&Definition, CanonicalError> {
        self.table
            .get(name)
            .ok_or_else(|| CanonicalError::UnknownDefinition(name.to_string()))
    }

    fn definition(&self, name: &str, value: &Value, path: &str) -> Result<Value, CanonicalError> {
        let definition = self.lookup(name)?;
        match &definition.kind {
            DefinitionKind::Enum(e) => match value.as_str() {
                Some(s) if e.values.iter().any(|v| v == s) => Ok(value.clone()),
                _ => Err(mismatch(path, &format!("a value of enum '{}'", name))),
            },
            DefinitionKind::Object(object) => {
                let fields = value
                    .as_object()
                    .ok_or_else(|| mismatch(path, &format!("an object of type '{}'", name)))?;

                let mut out = Map::new();
                for (field, spec) in &object.properties {
                    let field_path = format!("{}.{}", path, field);
                    let given = fields.get(field).filter(|v| !v.is_null());
                    match given.or_else(|| implied_value(spec, object.is_required(field))) {
                        Some(v) => {
                            out.insert(field.clone(), self.property(spec, v, &field_path)?);
                        }
                        None if object.is_required(field) => {
                            return Err(mismatch(&field_path, &format!("required field '{}'", field)));
                        }
                        None => {}
                    }
                }
                Ok(Value::Object(out))
            }
            DefinitionKind::Union(union) => {
                let members: Vec<&str> = union.members.iter().map(String::as_str).collect();
                self.union(name, &members, union.discriminator.as_deref(), value, path)
            }
            DefinitionKind::Alias(alias) => self.property(&alias.spec, value, path),
        }
    }

    /// Dispatch a union value: by tag when the value carries one, otherwise
    /// the first member that accepts it.
    fn union(
        &self,
        union: &str,
        members: &[&str],
        discriminator: Option<&str>,
        value: &Value,
        path: &str,
    ) -> Result<Value, CanonicalError> {
        if let Some(member) = discriminator.and_then(|tag| self.tagged_member(members, tag, value)) {
            return self.definition(member, value, path);
        }

        for member in members {
            if let Ok(canonical) = self.definition(member, value, path) {
                return Ok(canonical);
            }
        }
        Err(CanonicalError::NoMatchingMember {
            path: path.to_string(),
            union: union.to_string(),
        })
    }

    /// The member whose `tag` field is the constant found in `value`.
    fn tagged_member<'m>(&self, members: &[&'m str], tag: &str, value: &Value) -> Option<&'m str> {
        let actual = value.get(tag)?;
        members.iter().copied().find(|member| {
            self.table
                .get(member)
                .and_then(Definition::as_object)
                .and_then(|object| object.properties.get(tag))
                .is_some_and(|spec| matches!(&spec.shape, Shape::Const(c) if c == actual))
        })
    }

    fn property(&self, spec: &PropertySpec, value: &Value, path: &str) -> Result<Value, CanonicalError> {
        if value.is_null() {
            return if spec.nullable || spec.shape == Shape::Any {
                Ok(Value::Null)
            } else {
                Err(mismatch(path, "a non-null value"))
            };
        }

        match &spec.shape {
            Shape::Primitive(kind) => primitive(*kind, value, path),
            Shape::Literal(values) => {
                if values.contains(value) {
                    Ok(value.clone())
                } else {
                    Err(mismatch(path, &format!("one of {}", Value::Array(values.clone()))))
                }
            }
            Shape::Const(expected) => {
                if value == expected {
                    Ok(value.clone())
                } else {
                    Err(mismatch(path, &format!("the constant {}", expected)))
                }
            }
            Shape::Array(item) => {
                let items = value.as_array().ok_or_else(|| mismatch(path, "an array"))?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| self.property(item, v, &format!("{}[{}]", path, i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Shape::Tuple(elements) => {
                let items = value
                    .as_array()
                    .filter(|items| items.len() == elements.len())
                    .ok_or_else(|| mismatch(path, &format!("an array of {} items", elements.len())))?;
                items
                    .iter()
                    .zip(elements)
                    .enumerate()
                    .map(|(i, (v, element))| self.property(element, v, &format!("{}[{}]", path, i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Shape::Map(value_spec) => {
                let entries = value.as_object().ok_or_else(|| mismatch(path, "an object"))?;
                let mut out = Map::new();
                for (key, v) in entries {
                    if v.is_null() {
                        continue;
                    }
                    let canonical = match value_spec {
                        Some(value_spec) => self.property(value_spec, v, &format!("{}.{}", path, key))?,
                        None => v.clone(),
                    };
                    out.insert(key.clone(), canonical);
                }
                Ok(Value::Object(out))
            }
            Shape::Reference(name) => self.definition(name, value, path),
            Shape::Union {
                members,
                discriminator,
            } => self.inline_union(members, discriminator.as_deref(), value, path),
            Shape::Any => Ok(value.clone()),
        }
    }

    fn inline_union(
        &self,
        members: &[PropertySpec],
        discriminator: Option<&str>,
        value: &Value,
        path: &str,
    ) -> Result<Value, CanonicalError> {
        let references: Option<Vec<&str>> = members
            .iter()
            .map(|m| match &m.shape {
                Shape::Reference(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        if let (Some(references), Some(tag)) = (&references, discriminator) {
            if let Some(member) = self.tagged_member(references, tag, value) {
                return self.definition(member, value, path);
            }
        }

        for member in members {
            if let Ok(canonical) = self.property(member, value, path) {
                return Ok(canonical);
            }
        }
        Err(CanonicalError::NoMatchingMember {
            path: path.to_string(),
            union: "inline union".to_string(),
        })
    }
}

/// Value a model fills in for an omitted field: its default, or the constant
/// of an optional `const` field. A `null` default is the same as none.
fn implied_value(spec: &PropertySpec, required: bool) -> Option<&Value> {
    match (&spec.default, &spec.shape) {
        (Some(default), _) => Some(default).filter(|d| !d.is_null()),
        (None, Shape::Const(value)) if !required => Some(value),
        _ => None,
    }
}

fn primitive(kind: PrimitiveKind, value: &Value, path: &str) -> Result<Value, CanonicalError> {
    match (kind, value) {
        (PrimitiveKind::String, Value::String(_)) | (PrimitiveKind::Boolean, Value::Bool(_)) => {
            Ok(value.clone())
        }
        (PrimitiveKind::Number, Value::Number(n)) => {
            if n.is_f64() {
                return Ok(value.clone());
            }
            n.as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch(path, "a number"))
        }
        (PrimitiveKind::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                return Ok(value.clone());
            }
            // integral floats such as `3.0` read back as integers
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::Number(Number::from(f as i64)))
                }
                _ => Err(mismatch(path, "an integer")),
            }
        }
        (PrimitiveKind::String, _) => Err(mismatch(path, "a string")),
        (PrimitiveKind::Integer, _) => Err(mismatch(path, "an integer")),
        (PrimitiveKind::Number, _) => Err(mismatch(path, "a number")),
        (PrimitiveKind::Boolean, _) => Err(mismatch(path, "a boolean")),
    }
}
