//! Schema loader.
//!
//! Reads a JSON-Schema style IR document and builds a [`DefinitionTable`].
//! Definitions live under `$defs` (`definitions` is accepted as well); the
//! document's own `title`, `description`, `version` and its `metadata` /
//! `root` properties describe the top-level schema type.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::ir::{
    AliasDef, Constraints, Definition, DefinitionKind, DefinitionTable, EnumDef, ObjectDef,
    PrimitiveKind, PropertySpec, SchemaRoot, Shape, UnionDef,
};
use crate::naming::is_identifier;

const REF_PREFIXES: [&str; 2] = ["#/$defs/", "#/definitions/"];

/// Load an IR document from a file.
///
/// `fallback` supplies the top-level type description for whatever the
/// document does not state itself.
pub fn load_file(path: &Path, fallback: &SchemaRoot) -> Result<DefinitionTable, SchemaError> {
    let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_str(&text, fallback)
}

/// Load an IR document from a string.
pub fn load_str(text: &str, fallback: &SchemaRoot) -> Result<DefinitionTable, SchemaError> {
    let document: Value =
        serde_json::from_str(text).map_err(|source| SchemaError::Load { source })?;
    load_value(&document, fallback)
}

/// Build a Definition Table from an already parsed document.
pub fn load_value(document: &Value, fallback: &SchemaRoot) -> Result<DefinitionTable, SchemaError> {
    let document = document
        .as_object()
        .ok_or_else(|| SchemaError::format("document root must be an object"))?;

    let defs = document
        .get("$defs")
        .or_else(|| document.get("definitions"))
        .ok_or_else(|| SchemaError::format("missing '$defs' definitions container"))?
        .as_object()
        .ok_or_else(|| SchemaError::format("'$defs' must be an object"))?;

    let mut table = DefinitionTable::new(parse_root(document, fallback)?);
    for (name, value) in defs {
        let definition = parse_definition(name, value, defs)?;
        tracing::trace!(name = %name, "loaded definition");
        table.insert(definition);
    }

    tracing::debug!(
        definitions = table.len(),
        root = %table.root.name,
        "schema loaded"
    );
    Ok(table)
}

fn parse_root(document: &Map<String, Value>, fallback: &SchemaRoot) -> Result<SchemaRoot, SchemaError> {
    let mut root = fallback.clone();

    if let Some(title) = document.get("title").and_then(Value::as_str) {
        if is_identifier(title) {
            root.name = title.to_string();
        }
    }
    if let Some(description) = document.get("description").and_then(Value::as_str) {
        root.description = Some(description.to_string());
    }
    if let Some(version) = document.get("version").and_then(Value::as_str) {
        root.version = Some(version.to_string());
    }

    if let Some(properties) = document.get("properties").and_then(Value::as_object) {
        if let Some(target) = root_field_reference(properties, "metadata")? {
            root.metadata_type = target;
        }
        if let Some(target) = root_field_reference(properties, "root")? {
            root.root_type = target;
        }
    }

    Ok(root)
}

fn root_field_reference(
    properties: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, SchemaError> {
    match properties.get(field).and_then(|v| v.get("$ref")).and_then(Value::as_str) {
        Some(reference) => reference_name(reference, None).map(Some),
        None => Ok(None),
    }
}

/// Extract the definition name from a `$ref` pointer.
fn reference_name(reference: &str, definition: Option<&str>) -> Result<String, SchemaError> {
    REF_PREFIXES
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .map(str::to_string)
        .ok_or_else(|| {
            let message = format!("unsupported $ref '{}'", reference);
            match definition {
                Some(name) => SchemaError::in_definition(name, message),
                None => SchemaError::format(message),
            }
        })
}

fn parse_definition(
    name: &str,
    value: &Value,
    defs: &Map<String, Value>,
) -> Result<Definition, SchemaError> {
    let object = value
        .as_object()
        .ok_or_else(|| SchemaError::in_definition(name, "definition must be an object"))?;

    let kind = if let Some(values) = object.get("enum") {
        DefinitionKind::Enum(parse_enum(name, values)?)
    } else if let Some(members) = object.get("oneOf").or_else(|| object.get("anyOf")) {
        DefinitionKind::Union(parse_union(name, object, members, defs)?)
    } else if object.contains_key("properties")
        || (type_keyword(object) == Some("object")
            && !matches!(object.get("additionalProperties"), Some(Value::Object(_))))
    {
        DefinitionKind::Object(parse_object(name, object)?)
    } else {
        DefinitionKind::Alias(AliasDef::new(parse_property(name, value)?))
    };

    let mut definition = Definition::new(name, kind);
    if let Some(description) = object.get("description").and_then(Value::as_str) {
        definition = definition.with_description(description);
    }
    Ok(definition)
}

fn parse_enum(name: &str, values: &Value) -> Result<EnumDef, SchemaError> {
    let values = values
        .as_array()
        .ok_or_else(|| SchemaError::in_definition(name, "'enum' must be an array"))?;

    values
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                SchemaError::in_definition(name, format!("enum value {} is not a string", v))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|values| EnumDef { values })
}

fn parse_union(
    name: &str,
    object: &Map<String, Value>,
    members: &Value,
    defs: &Map<String, Value>,
) -> Result<UnionDef, SchemaError> {
    let members = members
        .as_array()
        .ok_or_else(|| SchemaError::in_definition(name, "'oneOf' must be an array"))?;

    let members = members
        .iter()
        .map(|member| {
            member
                .get("$ref")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    SchemaError::in_definition(name, "union members must be $ref pointers")
                })
                .and_then(|reference| reference_name(reference, Some(name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let discriminator =
        explicit_discriminator(object).or_else(|| infer_discriminator(&members, defs));

    Ok(UnionDef {
        members,
        discriminator,
    })
}

/// `discriminator: "type"` or OpenAPI-style `discriminator: { propertyName: "type" }`.
fn explicit_discriminator(object: &Map<String, Value>) -> Option<String> {
    match object.get("discriminator")? {
        Value::String(field) => Some(field.clone()),
        Value::Object(d) => d.get("propertyName").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// A field that every member declares as a required `const` is the tag.
fn infer_discriminator(members: &[String], defs: &Map<String, Value>) -> Option<String> {
    let first = defs.get(members.first()?)?;
    let candidates = first.get("properties")?.as_object()?.keys();

    candidates
        .filter(|field| {
            members.iter().all(|member| {
                defs.get(member).is_some_and(|def| {
                    let is_const = def
                        .get("properties")
                        .and_then(|p| p.get(field.as_str()))
                        .is_some_and(|p| p.get("const").is_some());
                    let is_required = def
                        .get("required")
                        .and_then(Value::as_array)
                        .is_some_and(|r| r.iter().any(|n| n.as_str() == Some(field.as_str())));
                    is_const && is_required
                })
            })
        })
        .cloned()
        .next()
}

fn parse_object(name: &str, object: &Map<String, Value>) -> Result<ObjectDef, SchemaError> {
    let mut def = ObjectDef::new();

    if let Some(properties) = object.get("properties") {
        let properties = properties
            .as_object()
            .ok_or_else(|| SchemaError::in_definition(name, "'properties' must be an object"))?;
        for (field, value) in properties {
            def.properties
                .insert(field.clone(), parse_property(name, value)?);
        }
    }

    if let Some(required) = object.get("required") {
        let required = required
            .as_array()
            .ok_or_else(|| SchemaError::in_definition(name, "'required' must be an array"))?;
        for field in required {
            let field = field.as_str().ok_or_else(|| {
                SchemaError::in_definition(name, "'required' entries must be strings")
            })?;
            def.required.insert(field.to_string());
        }
    }

    def.strict = object.get("additionalProperties") == Some(&Value::Bool(false));
    Ok(def)
}

fn type_keyword(object: &Map<String, Value>) -> Option<&str> {
    match object.get("type")? {
        Value::String(t) => Some(t),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    }
}

fn type_is_nullable(object: &Map<String, Value>) -> bool {
    match object.get("type") {
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("null")),
        _ => false,
    }
}

/// Parse a property schema. `owner` names the definition it belongs to and is
/// used for error context only.
fn parse_property(owner: &str, value: &Value) -> Result<PropertySpec, SchemaError> {
    let object = match value {
        Value::Object(object) => object,
        Value::Bool(true) => return Ok(PropertySpec::new(Shape::Any)),
        _ => return Err(SchemaError::in_definition(owner, "property schema must be an object")),
    };

    let mut nullable = type_is_nullable(object);

    let shape = if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
        Shape::Reference(reference_name(reference, Some(owner))?)
    } else if let Some(constant) = object.get("const") {
        Shape::Const(constant.clone())
    } else if let Some(members) = object.get("oneOf").or_else(|| object.get("anyOf")) {
        let members = members
            .as_array()
            .ok_or_else(|| SchemaError::in_definition(owner, "'oneOf' must be an array"))?;
        let mut parsed = Vec::with_capacity(members.len());
        for member in members {
            if member.get("type").and_then(Value::as_str) == Some("null") {
                nullable = true;
            } else {
                parsed.push(parse_property(owner, member)?);
            }
        }
        if parsed.len() == 1 && explicit_discriminator(object).is_none() {
            // `anyOf: [T, null]` is just a nullable T
            let mut single = parsed.remove(0);
            single.nullable = true;
            return Ok(with_annotations(owner, single, object));
        }
        Shape::Union {
            members: parsed,
            discriminator: explicit_discriminator(object),
        }
    } else if let Some(values) = object.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| SchemaError::in_definition(owner, "'enum' must be an array"))?;
        Shape::Literal(values.iter().filter(|v| !v.is_null()).cloned().collect())
    } else {
        match type_keyword(object) {
            Some("array") => parse_array(owner, object)?,
            Some("object") => match object.get("additionalProperties") {
                Some(values @ Value::Object(_)) => {
                    Shape::Map(Some(Box::new(parse_property(owner, values)?)))
                }
                _ => Shape::Map(None),
            },
            Some("null") => {
                nullable = true;
                Shape::Any
            }
            Some(keyword) => Shape::Primitive(PrimitiveKind::from_keyword(keyword).ok_or_else(
                || SchemaError::in_definition(owner, format!("unsupported type '{}'", keyword)),
            )?),
            None => Shape::Any,
        }
    };

    let spec = PropertySpec::new(shape).with_nullable(nullable);
    Ok(with_annotations(owner, spec, object))
}

fn parse_array(owner: &str, object: &Map<String, Value>) -> Result<Shape, SchemaError> {
    let tuple_items = object.get("prefixItems").or_else(|| match object.get("items") {
        items @ Some(Value::Array(_)) => items,
        _ => None,
    });

    if let Some(items) = tuple_items.and_then(Value::as_array) {
        let items = items
            .iter()
            .map(|item| parse_property(owner, item))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Shape::Tuple(items));
    }

    let item = match object.get("items") {
        Some(item) => parse_property(owner, item)?,
        None => PropertySpec::new(Shape::Any),
    };
    Ok(Shape::Array(Box::new(item)))
}

/// Attach constraints, default and description.
fn with_annotations(owner: &str, mut spec: PropertySpec, object: &Map<String, Value>) -> PropertySpec {
    spec.constraints = parse_constraints(object);
    if let Some(default) = object.get("default") {
        spec.default = Some(default.clone());
    }
    if let Some(description) = object.get("description").and_then(Value::as_str) {
        spec.description = Some(description.to_string());
    }
    if !spec.constraints.is_empty() {
        tracing::trace!(owner = %owner, constraints = ?spec.constraints, "parsed constraints");
    }
    spec
}

fn parse_constraints(object: &Map<String, Value>) -> Constraints {
    let count = |key: &str| object.get(key).and_then(Value::as_u64);
    let number = |key: &str| match object.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    };

    Constraints {
        min_length: count("minLength"),
        max_length: count("maxLength"),
        minimum: number("minimum"),
        maximum: number("maximum"),
        exclusive_minimum: number("exclusiveMinimum"),
        exclusive_maximum: number("exclusiveMaximum"),
        pattern: object.get("pattern").and_then(Value::as_str).map(str::to_string),
        min_items: count("minItems"),
        max_items: count("maxItems"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn load(document: Value) -> Result<DefinitionTable, SchemaError> {
        load_value(&document, &SchemaRoot::default())
    }

    // ========================================================================
    // Document structure
    // ========================================================================

    #[test]
    fn test_invalid_json_is_load_error() {
        let err = load_str("{ not json", &SchemaRoot::default()).unwrap_err();
        assert!(matches!(err, SchemaError::Load { .. }));
    }

    #[test]
    fn test_missing_defs_is_format_error() {
        let err = load(json!({ "title": "UISchema" })).unwrap_err();
        assert!(matches!(err, SchemaError::Format { definition: None, .. }));
    }

    #[test]
    fn test_definitions_fallback_container() {
        let table = load(json!({
            "definitions": { "Size": { "enum": ["sm", "md"] } }
        }))
        .unwrap();
        assert!(table.is_enum("Size"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_file(Path::new("/nonexistent/schema.json"), &SchemaRoot::default())
            .unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }

    #[test]
    fn test_root_from_document() {
        let table = load(json!({
            "title": "PageSchema",
            "version": "2.1.0",
            "properties": {
                "metadata": { "$ref": "#/$defs/PageMeta" },
                "root": { "$ref": "#/$defs/Node" }
            },
            "$defs": {}
        }))
        .unwrap();
        assert_eq!(table.root.name, "PageSchema");
        assert_eq!(table.root.version.as_deref(), Some("2.1.0"));
        assert_eq!(table.root.metadata_type, "PageMeta");
        assert_eq!(table.root.root_type, "Node");
    }

    #[test]
    fn test_non_identifier_title_keeps_fallback() {
        let table = load(json!({ "title": "DGUI Schema", "$defs": {} })).unwrap();
        assert_eq!(table.root.name, "UISchema");

        let table = load(json!({ "title": "None", "$defs": {} })).unwrap();
        assert_eq!(table.root.name, "UISchema");
    }

    // ========================================================================
    // Definitions
    // ========================================================================

    #[test]
    fn test_enum_with_non_string_value_is_rejected() {
        let err = load(json!({ "$defs": { "Bad": { "enum": ["a", 1] } } })).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Format { definition: Some(ref d), .. } if d == "Bad"
        ));
    }

    #[test]
    fn test_object_definition() {
        let table = load(json!({
            "$defs": {
                "ButtonProps": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string", "minLength": 1 },
                        "size": { "$ref": "#/$defs/ButtonSize", "default": "md" },
                        "disabled": { "type": "boolean" }
                    },
                    "required": ["label"],
                    "additionalProperties": false
                }
            }
        }))
        .unwrap();

        let object = table.get("ButtonProps").unwrap().as_object().unwrap();
        let fields: Vec<_> = object.properties.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["label", "size", "disabled"]);
        assert!(object.is_required("label"));
        assert!(object.strict);
        assert_eq!(object.properties["label"].constraints.min_length, Some(1));
        assert_eq!(
            object.properties["size"].shape,
            Shape::Reference("ButtonSize".into())
        );
        assert_eq!(object.properties["size"].default, Some(json!("md")));
    }

    #[test]
    fn test_union_infers_discriminator() {
        let table = load(json!({
            "$defs": {
                "Action": { "oneOf": [
                    { "$ref": "#/$defs/Navigate" },
                    { "$ref": "#/$defs/Custom" }
                ] },
                "Navigate": {
                    "type": "object",
                    "properties": { "type": { "const": "navigate" }, "to": { "type": "string" } },
                    "required": ["type", "to"]
                },
                "Custom": {
                    "type": "object",
                    "properties": { "type": { "const": "custom" } },
                    "required": ["type"]
                }
            }
        }))
        .unwrap();

        let union = table.get("Action").unwrap().as_union().unwrap();
        assert_eq!(union.members, vec!["Navigate", "Custom"]);
        assert_eq!(union.discriminator.as_deref(), Some("type"));
    }

    #[test]
    fn test_union_member_must_be_reference() {
        let err = load(json!({
            "$defs": { "U": { "oneOf": [ { "type": "string" } ] } }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Format { .. }));
    }

    #[test]
    fn test_unsupported_ref_prefix() {
        let err = load(json!({
            "$defs": { "A": { "type": "object", "properties": {
                "b": { "$ref": "other.json#/B" }
            } } }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unsupported $ref"));
    }

    #[test]
    fn test_alias_of_tuple_array() {
        let table = load(json!({
            "$defs": {
                "EventBindings": {
                    "type": "array",
                    "items": {
                        "type": "array",
                        "prefixItems": [
                            { "$ref": "#/$defs/EventType" },
                            { "$ref": "#/$defs/EventAction" }
                        ]
                    }
                }
            }
        }))
        .unwrap();

        let def = table.get("EventBindings").unwrap();
        let DefinitionKind::Alias(alias) = &def.kind else {
            panic!("expected alias, got {:?}", def.kind);
        };
        let Shape::Array(item) = &alias.spec.shape else {
            panic!("expected array");
        };
        assert!(matches!(&item.shape, Shape::Tuple(items) if items.len() == 2));
    }

    // ========================================================================
    // Properties
    // ========================================================================

    fn property(schema: Value) -> PropertySpec {
        parse_property("Test", &schema).unwrap()
    }

    #[test]
    fn test_property_shapes() {
        assert_eq!(
            property(json!({ "type": "integer" })).shape,
            Shape::Primitive(PrimitiveKind::Integer)
        );
        assert_eq!(
            property(json!({ "type": "string", "enum": ["a", "b"] })).shape,
            Shape::Literal(vec![json!("a"), json!("b")])
        );
        assert_eq!(property(json!({ "const": "card" })).shape, Shape::Const(json!("card")));
        assert_eq!(property(json!({})).shape, Shape::Any);
        assert_eq!(property(json!({ "type": "object" })).shape, Shape::Map(None));
        assert!(matches!(
            property(json!({ "type": "array" })).shape,
            Shape::Array(ref item) if item.shape == Shape::Any
        ));
    }

    #[test]
    fn test_nullable_forms() {
        let spec = property(json!({ "type": ["string", "null"] }));
        assert!(spec.nullable);
        assert_eq!(spec.shape, Shape::Primitive(PrimitiveKind::String));

        let spec = property(json!({ "anyOf": [ { "$ref": "#/$defs/A" }, { "type": "null" } ] }));
        assert!(spec.nullable);
        assert_eq!(spec.shape, Shape::Reference("A".into()));
    }

    #[test]
    fn test_constraints() {
        let spec = property(json!({
            "type": "number", "minimum": 0, "maximum": 1.5, "exclusiveMinimum": -1
        }));
        assert_eq!(spec.constraints.minimum, Some(0.into()));
        assert_eq!(spec.constraints.maximum.as_ref().and_then(|n| n.as_f64()), Some(1.5));
        assert_eq!(spec.constraints.exclusive_minimum, Some((-1).into()));

        let spec = property(json!({
            "type": "array", "items": { "type": "string" }, "minItems": 1, "maxItems": 4
        }));
        assert_eq!(spec.constraints.min_items, Some(1));
        assert_eq!(spec.constraints.max_items, Some(4));
    }

    #[test]
    fn test_inline_union_keeps_member_order() {
        let spec = property(json!({
            "oneOf": [ { "type": "string" }, { "$ref": "#/$defs/B" }, { "type": "integer" } ],
            "discriminator": { "propertyName": "kind" }
        }));
        let Shape::Union { members, discriminator } = spec.shape else {
            panic!("expected union");
        };
        assert_eq!(members.len(), 3);
        assert_eq!(members[1].shape, Shape::Reference("B".into()));
        assert_eq!(discriminator.as_deref(), Some("kind"));
    }
}
