//! Identifier normalization.
//!
//! Enum literals and field names come from the IR verbatim; the generators
//! need valid identifiers for them.

use std::collections::HashMap;

use crate::error::GenerateError;

/// Python keywords that cannot be used as field names.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Member name for an enum literal: upper-cased, with `-` and every other
/// non-identifier character replaced by `_`.
///
/// Leading and trailing `_` are trimmed, since `Enum` reserves `_sunder_`
/// names; a leading digit then gets a `_` prefix.
///
/// ```
/// use guigen::naming::enum_member_name;
///
/// assert_eq!(enum_member_name("top-left"), "TOP_LEFT");
/// assert_eq!(enum_member_name("onClick"), "ONCLICK");
/// assert_eq!(enum_member_name("2xl"), "_2XL");
/// assert_eq!(enum_member_name("-x-"), "X");
/// ```
pub fn enum_member_name(value: &str) -> String {
    let upper: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    let mut name = upper.trim_matches('_').to_string();
    if name.is_empty() {
        name.push_str("EMPTY");
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Member names for every value of an enum, in value order.
///
/// Fails when two distinct values normalize to the same member name.
pub fn enum_members<'a>(
    enum_name: &str,
    values: &'a [String],
) -> Result<Vec<(String, &'a str)>, GenerateError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(values.len());
    let mut members = Vec::with_capacity(values.len());

    for value in values {
        let member = enum_member_name(value);
        if let Some(first) = seen.get(&member) {
            if *first == value.as_str() {
                // repeated literal, emitted once
                continue;
            }
            return Err(GenerateError::EnumEmission {
                enum_name: enum_name.to_string(),
                member,
                first: first.to_string(),
                second: value.clone(),
            });
        }
        seen.insert(member.clone(), value);
        members.push((member, value.as_str()));
    }

    Ok(members)
}

/// A field name as written in generated Python code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName {
    /// Attribute name
    pub ident: String,

    /// Original IR name when it differs from `ident`
    pub alias: Option<String>,
}

/// Python attribute name for an IR field.
///
/// Pydantic treats `_`-prefixed attributes as private, so leading `_` are
/// dropped and a name that would start with a digit becomes `field_<name>`.
pub fn python_field_name(name: &str) -> FieldName {
    let mapped: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    let mut ident = mapped.trim_start_matches('_').to_string();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert_str(0, "field_");
    }
    if PYTHON_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }

    let alias = (ident != name).then(|| name.to_string());
    FieldName { ident, alias }
}

/// Attribute names for every field of `type_name`, in field order.
///
/// Fails when two IR fields map to the same attribute.
pub fn python_field_names<'a, I>(type_name: &str, fields: I) -> Result<Vec<FieldName>, GenerateError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut names = Vec::new();

    for field in fields {
        let name = python_field_name(field);
        if let Some(first) = seen.insert(name.ident.clone(), field) {
            return Err(GenerateError::FieldNameCollision {
                type_name: type_name.to_string(),
                ident: name.ident,
                first: first.to_string(),
                second: field.to_string(),
            });
        }
        names.push(name);
    }

    Ok(names)
}

/// Whether `name` can be used as a type name in every target: an ASCII
/// identifier that is not a Python keyword.
pub fn is_identifier(name: &str) -> bool {
    is_ascii_identifier(name, &['_']) && !PYTHON_KEYWORDS.contains(&name)
}

/// Whether `name` can be used unquoted as a JavaScript object key.
pub fn is_js_identifier(name: &str) -> bool {
    is_ascii_identifier(name, &['_', '$'])
}

fn is_ascii_identifier(name: &str, extra: &[char]) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || extra.contains(&c))
        && chars.all(|c| c.is_ascii_alphanumeric() || extra.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hyphen_and_underscore_stay_distinct() {
        let values = values(&["top-left", "top_right"]);
        let members = enum_members("Position", &values).unwrap();
        assert_eq!(
            members,
            vec![
                ("TOP_LEFT".to_string(), "top-left"),
                ("TOP_RIGHT".to_string(), "top_right"),
            ]
        );
    }

    #[test]
    fn test_collision_is_an_error() {
        let values = values(&["top-left", "top_left"]);
        let err = enum_members("Position", &values).unwrap_err();
        match err {
            GenerateError::EnumEmission {
                enum_name,
                member,
                first,
                second,
            } => {
                assert_eq!(enum_name, "Position");
                assert_eq!(member, "TOP_LEFT");
                assert_eq!(first, "top-left");
                assert_eq!(second, "top_left");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_case_only_difference_collides() {
        let values = values(&["sm", "SM"]);
        assert!(enum_members("Size", &values).is_err());
    }

    #[test]
    fn test_repeated_literal_is_emitted_once() {
        let values = values(&["sm", "sm", "md"]);
        let members = enum_members("Size", &values).unwrap();
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_member_name_edge_cases() {
        assert_eq!(enum_member_name(""), "EMPTY");
        assert_eq!(enum_member_name("a.b c"), "A_B_C");
        assert_eq!(enum_member_name("h1"), "H1");
        assert_eq!(enum_member_name("-x-"), "X");
        assert_eq!(enum_member_name("_private"), "PRIVATE");
        assert_eq!(enum_member_name("--"), "EMPTY");
        assert_eq!(enum_member_name("-2xl"), "_2XL");
    }

    #[test]
    fn test_member_names_never_start_and_end_with_underscore() {
        for value in ["-x-", "_a_", "  b  ", "(c)", "_"] {
            let name = enum_member_name(value);
            assert!(!(name.starts_with('_') && name.ends_with('_')), "{value:?} -> {name}");
        }
    }

    #[test]
    fn test_trimmed_names_still_collide() {
        let values = values(&["x", "-x-"]);
        assert!(matches!(
            enum_members("Marker", &values),
            Err(GenerateError::EnumEmission { .. })
        ));
    }

    #[test]
    fn test_python_field_names() {
        assert_eq!(
            python_field_name("label"),
            FieldName { ident: "label".into(), alias: None }
        );
        assert_eq!(
            python_field_name("from"),
            FieldName { ident: "from_".into(), alias: Some("from".into()) }
        );
        assert_eq!(
            python_field_name("aria-label"),
            FieldName { ident: "aria_label".into(), alias: Some("aria-label".into()) }
        );
    }

    #[test]
    fn test_python_field_names_are_public() {
        assert_eq!(
            python_field_name("1st"),
            FieldName { ident: "field_1st".into(), alias: Some("1st".into()) }
        );
        assert_eq!(
            python_field_name("_id"),
            FieldName { ident: "id".into(), alias: Some("_id".into()) }
        );
        assert_eq!(
            python_field_name("$ref"),
            FieldName { ident: "ref".into(), alias: Some("$ref".into()) }
        );
        assert_eq!(python_field_name("").ident, "field_");
    }

    #[test]
    fn test_field_name_collision_is_an_error() {
        let err = python_field_names("ButtonProps", ["label", "aria-label", "aria_label"]).unwrap_err();
        match err {
            GenerateError::FieldNameCollision {
                type_name,
                ident,
                first,
                second,
            } => {
                assert_eq!(type_name, "ButtonProps");
                assert_eq!(ident, "aria_label");
                assert_eq!(first, "aria-label");
                assert_eq!(second, "aria_label");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let names = python_field_names("ButtonProps", ["label", "aria-label"]).unwrap();
        assert_eq!(names[1].ident, "aria_label");
    }

    #[test]
    fn test_type_identifiers() {
        assert!(is_identifier("UISchema"));
        assert!(is_identifier("_Internal"));
        assert!(!is_identifier("DGUI Schema"));
        assert!(!is_identifier("$Schema"));
        assert!(!is_identifier("2Schema"));
        assert!(!is_identifier("None"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_js_identifiers() {
        assert!(is_js_identifier("onClick"));
        assert!(is_js_identifier("$ref"));
        assert!(!is_js_identifier("aria-label"));
        assert!(!is_js_identifier("1st"));
    }
}
