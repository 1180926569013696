//! IR to Python type mappings.
//!
//! Property shapes are first mapped to a small [`PyType`] tree, then
//! rendered. Rendering records every `typing` / `pydantic` construct it
//! writes, so the module header can import exactly what is used.
//!
//! # Type Mappings
//!
//! | IR shape | Python type |
//! |----------|-------------|
//! | `string` / `integer` / `number` / `boolean` | `str` / `int` / `float` / `bool` |
//! | inline `enum` | `Literal["a", "b"]` |
//! | `const` | `Literal["a"]` |
//! | array | `List[T]` |
//! | tuple (`prefixItems`) | `Tuple[A, B]` |
//! | map | `Dict[str, T]` |
//! | `$ref` | `Name`, or `"Name"` when not yet declared |
//! | `oneOf` | `Union[A, B]` |
//! | `oneOf` + discriminator | `Annotated[Union[A, B], Field(discriminator="type")]` |
//! | nullable | `Optional[T]` |

use serde_json::Value;

use crate::generator::traits::Imports;
use crate::ir::{PrimitiveKind, PropertySpec, Shape};

/// A Python type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PyType {
    /// `str`, `int`, `float`, `bool`
    Builtin(&'static str),
    Any,
    List(Box<PyType>),
    /// `Dict[str, T]`
    Dict(Box<PyType>),
    Tuple(Vec<PyType>),
    Literal(Vec<Value>),
    /// Name of an already declared type
    Named(String),
    /// Quoted forward reference
    Forward(String),
    Optional(Box<PyType>),
    Union(Vec<PyType>),
    /// Tagged union dispatched on `field`
    Discriminated { members: Vec<PyType>, field: String },
}

impl PyType {
    /// Wrap in `Optional[...]` unless the type already admits `None`.
    pub fn optional(self) -> PyType {
        match self {
            PyType::Optional(_) | PyType::Any => self,
            other => PyType::Optional(Box::new(other)),
        }
    }

    /// Render the type, recording the constructs it uses.
    pub fn render(&self, imports: &mut Imports) -> String {
        match self {
            PyType::Builtin(name) => (*name).to_string(),
            PyType::Any => {
                imports.add("typing", "Any");
                "Any".to_string()
            }
            PyType::List(item) => {
                imports.add("typing", "List");
                format!("List[{}]", item.render(imports))
            }
            PyType::Dict(value) => {
                imports.add("typing", "Dict");
                format!("Dict[str, {}]", value.render(imports))
            }
            PyType::Tuple(items) => {
                imports.add("typing", "Tuple");
                if items.is_empty() {
                    "Tuple[()]".to_string()
                } else {
                    format!("Tuple[{}]", render_list(items, imports))
                }
            }
            PyType::Literal(values) => {
                imports.add("typing", "Literal");
                let values: Vec<String> = values.iter().map(python_literal).collect();
                format!("Literal[{}]", values.join(", "))
            }
            PyType::Named(name) => name.clone(),
            PyType::Forward(name) => format!("\"{}\"", name),
            PyType::Optional(inner) => {
                imports.add("typing", "Optional");
                format!("Optional[{}]", inner.render(imports))
            }
            PyType::Union(members) => {
                imports.add("typing", "Union");
                format!("Union[{}]", render_list(members, imports))
            }
            PyType::Discriminated { members, field } => {
                imports.add("typing", "Annotated");
                imports.add("typing", "Union");
                imports.add("pydantic", "Field");
                format!(
                    "Annotated[Union[{}], Field(discriminator={})]",
                    render_list(members, imports),
                    python_string(field)
                )
            }
        }
    }
}

fn render_list(types: &[PyType], imports: &mut Imports) -> String {
    types
        .iter()
        .map(|t| t.render(imports))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Maps property specs to Python types.
///
/// `is_forward` decides whether a referenced name is not yet declared at the
/// point of use and must be quoted.
pub struct PydanticTypeMapper<'a> {
    is_forward: &'a dyn Fn(&str) -> bool,
}

impl<'a> PydanticTypeMapper<'a> {
    pub fn new(is_forward: &'a dyn Fn(&str) -> bool) -> Self {
        Self { is_forward }
    }

    /// Map a property to its Python type, including nullability.
    pub fn map_type(&self, spec: &PropertySpec) -> PyType {
        let ty = self.map_shape(&spec.shape);
        if spec.nullable {
            ty.optional()
        } else {
            ty
        }
    }

    fn map_shape(&self, shape: &Shape) -> PyType {
        match shape {
            Shape::Primitive(kind) => PyType::Builtin(match kind {
                PrimitiveKind::String => "str",
                PrimitiveKind::Integer => "int",
                PrimitiveKind::Number => "float",
                PrimitiveKind::Boolean => "bool",
            }),
            Shape::Literal(values) => PyType::Literal(values.clone()),
            Shape::Const(value) => PyType::Literal(vec![value.clone()]),
            Shape::Array(item) => PyType::List(Box::new(self.map_type(item))),
            Shape::Tuple(items) => PyType::Tuple(items.iter().map(|i| self.map_type(i)).collect()),
            Shape::Map(None) => PyType::Dict(Box::new(PyType::Any)),
            Shape::Map(Some(value)) => PyType::Dict(Box::new(self.map_type(value))),
            Shape::Reference(name) => self.map_reference(name),
            Shape::Union {
                members,
                discriminator,
            } => self.map_union(members, discriminator.as_deref()),
            Shape::Any => PyType::Any,
        }
    }

    fn map_reference(&self, name: &str) -> PyType {
        if (self.is_forward)(name) {
            PyType::Forward(name.to_string())
        } else {
            PyType::Named(name.to_string())
        }
    }

    /// Member order is kept exactly as given.
    fn map_union(&self, members: &[PropertySpec], discriminator: Option<&str>) -> PyType {
        let mut mapped: Vec<PyType> = members.iter().map(|m| self.map_type(m)).collect();
        if mapped.len() == 1 {
            return mapped.remove(0);
        }
        if mapped.is_empty() {
            return PyType::Any;
        }

        let all_named = mapped
            .iter()
            .all(|m| matches!(m, PyType::Named(_) | PyType::Forward(_)));
        match discriminator {
            Some(field) if all_named => PyType::Discriminated {
                members: mapped,
                field: field.to_string(),
            },
            _ => PyType::Union(mapped),
        }
    }
}

/// Render a JSON value as a Python literal.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => python_string(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", python_string(k), python_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Double-quoted Python string literal.
pub fn python_string(s: &str) -> String {
    format!("\"{}\"", escape_string(s))
}

/// Escape a string for use inside a double-quoted Python literal.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Regex pattern literal: a raw string when the pattern allows it.
pub fn python_pattern(pattern: &str) -> String {
    let trailing_backslashes = pattern.chars().rev().take_while(|c| *c == '\\').count();
    if pattern.contains('"') || pattern.contains('\n') || trailing_backslashes % 2 == 1 {
        python_string(pattern)
    } else {
        format!("r\"{}\"", pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn never_forward(_: &str) -> bool {
        false
    }

    fn render(spec: &PropertySpec) -> (String, Imports) {
        let mapper = PydanticTypeMapper::new(&never_forward);
        let mut imports = Imports::new();
        let rendered = mapper.map_type(spec).render(&mut imports);
        (rendered, imports)
    }

    // =========================================================================
    // Primitives and containers
    // =========================================================================

    #[test]
    fn test_map_primitives() {
        for (kind, expected) in [
            (PrimitiveKind::String, "str"),
            (PrimitiveKind::Integer, "int"),
            (PrimitiveKind::Number, "float"),
            (PrimitiveKind::Boolean, "bool"),
        ] {
            let (rendered, imports) = render(&PropertySpec::primitive(kind));
            assert_eq!(rendered, expected);
            assert!(imports.is_empty());
        }
    }

    #[test]
    fn test_map_inline_enum_is_literal() {
        let spec = PropertySpec::new(Shape::Literal(vec![json!("left"), json!("right")]));
        let (rendered, imports) = render(&spec);
        assert_eq!(rendered, "Literal[\"left\", \"right\"]");
        assert_eq!(imports.names("typing"), vec!["Literal"]);
    }

    #[test]
    fn test_map_containers() {
        let spec = PropertySpec::array(PropertySpec::new(Shape::Tuple(vec![
            PropertySpec::reference("EventType"),
            PropertySpec::reference("EventAction"),
        ])));
        let (rendered, imports) = render(&spec);
        assert_eq!(rendered, "List[Tuple[EventType, EventAction]]");
        assert_eq!(imports.names("typing"), vec!["List", "Tuple"]);

        let (rendered, imports) = render(&PropertySpec::new(Shape::Map(None)));
        assert_eq!(rendered, "Dict[str, Any]");
        assert_eq!(imports.names("typing"), vec!["Any", "Dict"]);
    }

    #[test]
    fn test_nullable_is_optional_once() {
        let spec = PropertySpec::primitive(PrimitiveKind::String).with_nullable(true);
        let mapper = PydanticTypeMapper::new(&never_forward);
        let ty = mapper.map_type(&spec).optional();
        assert_eq!(ty.render(&mut Imports::new()), "Optional[str]");
    }

    // =========================================================================
    // References and unions
    // =========================================================================

    #[test]
    fn test_forward_reference_is_quoted() {
        let is_forward = |name: &str| name == "UIComponent";
        let mapper = PydanticTypeMapper::new(&is_forward);
        let spec = PropertySpec::array(PropertySpec::reference("UIComponent"));
        assert_eq!(
            mapper.map_type(&spec).render(&mut Imports::new()),
            "List[\"UIComponent\"]"
        );
        let spec = PropertySpec::reference("CardProps");
        assert_eq!(mapper.map_type(&spec).render(&mut Imports::new()), "CardProps");
    }

    #[test]
    fn test_discriminated_union_keeps_order() {
        let spec = PropertySpec::new(Shape::Union {
            members: vec![
                PropertySpec::reference("SetStateAction"),
                PropertySpec::reference("NavigateAction"),
            ],
            discriminator: Some("type".into()),
        });
        let (rendered, imports) = render(&spec);
        assert_eq!(
            rendered,
            "Annotated[Union[SetStateAction, NavigateAction], Field(discriminator=\"type\")]"
        );
        assert_eq!(imports.names("typing"), vec!["Annotated", "Union"]);
        assert_eq!(imports.names("pydantic"), vec!["Field"]);
    }

    #[test]
    fn test_plain_union_of_scalars() {
        let spec = PropertySpec::new(Shape::Union {
            members: vec![
                PropertySpec::primitive(PrimitiveKind::String),
                PropertySpec::primitive(PrimitiveKind::Number),
            ],
            discriminator: Some("type".into()),
        });
        assert_eq!(render(&spec).0, "Union[str, float]");
    }

    // =========================================================================
    // Literals
    // =========================================================================

    #[test]
    fn test_python_literals() {
        assert_eq!(python_literal(&json!(null)), "None");
        assert_eq!(python_literal(&json!(true)), "True");
        assert_eq!(python_literal(&json!(1.5)), "1.5");
        assert_eq!(python_literal(&json!("say \"hi\"")), "\"say \\\"hi\\\"\"");
        assert_eq!(python_literal(&json!([1, "a"])), "[1, \"a\"]");
        assert_eq!(python_literal(&json!({"k": false})), "{\"k\": False}");
    }

    #[test]
    fn test_python_pattern() {
        assert_eq!(python_pattern(r"^#[0-9a-f]{6}$"), r#"r"^#[0-9a-f]{6}$""#);
        assert_eq!(python_pattern(r#"^"q"$"#), r#""^\"q\"$""#);
        assert_eq!(python_pattern(r"ends\"), r#""ends\\""#);
    }
}
