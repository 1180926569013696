//! Definition IR.
//!
//! This module defines the named, top-level type definitions of a UI schema
//! document and the [`DefinitionTable`] that holds them in declaration order.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::property::PropertySpec;

/// A named type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Definition name (the key under `$defs`)
    pub name: String,

    /// Free-form description, rendered as a docstring / doc comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// What the definition declares
    pub kind: DefinitionKind,
}

impl Definition {
    /// Create a new definition with the given name and kind.
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Names of all definitions this definition references, deduplicated,
    /// in first-occurrence order.
    pub fn references(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        match &self.kind {
            DefinitionKind::Enum(_) => {}
            DefinitionKind::Object(object) => {
                for spec in object.properties.values() {
                    for name in spec.references() {
                        if !out.contains(&name) {
                            out.push(name);
                        }
                    }
                }
            }
            DefinitionKind::Union(union) => {
                for member in &union.members {
                    if !out.contains(&member.as_str()) {
                        out.push(member);
                    }
                }
            }
            DefinitionKind::Alias(alias) => out = alias.spec.references(),
        }
        out
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, DefinitionKind::Enum(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, DefinitionKind::Object(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, DefinitionKind::Union(_))
    }

    pub fn as_object(&self) -> Option<&ObjectDef> {
        match &self.kind {
            DefinitionKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDef> {
        match &self.kind {
            DefinitionKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionDef> {
        match &self.kind {
            DefinitionKind::Union(union) => Some(union),
            _ => None,
        }
    }
}

/// Kind of definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefinitionKind {
    /// Ordered string literals
    Enum(EnumDef),

    /// Record with named fields
    Object(ObjectDef),

    /// Union of named definitions
    Union(UnionDef),

    /// Any other named shape
    Alias(AliasDef),
}

/// Enum definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    /// Literal values in declaration order
    pub values: Vec<String>,
}

impl EnumDef {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Object (record) definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    /// Fields in declaration order
    pub properties: IndexMap<String, PropertySpec>,

    /// Names of required fields
    #[serde(default)]
    pub required: BTreeSet<String>,

    /// Reject unknown fields (`additionalProperties: false`)
    #[serde(default)]
    pub strict: bool,
}

impl ObjectDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn with_property(mut self, name: impl Into<String>, spec: PropertySpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }

    /// Append a required field.
    pub fn with_required(mut self, name: impl Into<String>, spec: PropertySpec) -> Self {
        let name = name.into();
        self.required.insert(name.clone());
        self.properties.insert(name, spec);
        self
    }

    /// Set strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.contains(field)
    }

    /// Required fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = (&String, &PropertySpec)> {
        self.properties
            .iter()
            .filter(|(name, _)| self.required.contains(name.as_str()))
    }
}

/// Union definition: a named `oneOf` over other definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnionDef {
    /// Member definition names, in IR order
    pub members: Vec<String>,

    /// Discriminator field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
}

impl UnionDef {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            discriminator: None,
        }
    }

    pub fn with_discriminator(mut self, field: impl Into<String>) -> Self {
        self.discriminator = Some(field.into());
        self
    }
}

/// Alias definition: a name bound to an arbitrary property shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDef {
    pub spec: PropertySpec,
}

impl AliasDef {
    pub fn new(spec: PropertySpec) -> Self {
        Self { spec }
    }
}

/// Description of the top-level schema type.
///
/// The top-level type is not a `$defs` entry; it is synthesized from the
/// document's own `title` and `properties`, and always exposes exactly two
/// fields: `metadata` and `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRoot {
    /// Generated name of the top-level type
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version marker written into the generated header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Definition referenced by the `metadata` field
    pub metadata_type: String,

    /// Definition referenced by the `root` field
    pub root_type: String,
}

impl Default for SchemaRoot {
    fn default() -> Self {
        Self {
            name: "UISchema".to_string(),
            description: None,
            version: None,
            metadata_type: "UIMetadata".to_string(),
            root_type: "UIComponent".to_string(),
        }
    }
}

/// Definition Table: every named definition of a document, in declaration
/// order, plus the top-level schema description.
///
/// Built once by the loader and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionTable {
    pub root: SchemaRoot,
    definitions: IndexMap<String, Definition>,
}

impl DefinitionTable {
    pub fn new(root: SchemaRoot) -> Self {
        Self {
            root,
            definitions: IndexMap::new(),
        }
    }

    /// Insert a definition, returning the previous one with the same name.
    pub fn insert(&mut self, definition: Definition) -> Option<Definition> {
        self.definitions.insert(definition.name.clone(), definition)
    }

    /// Builder-style insert.
    pub fn with(mut self, definition: Definition) -> Self {
        self.insert(definition);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Declaration index of a definition.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.definitions.get_index_of(name)
    }

    pub fn get_index(&self, index: usize) -> Option<&Definition> {
        self.definitions.get_index(index).map(|(_, def)| def)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Whether `name` is an enum definition.
    pub fn is_enum(&self, name: &str) -> bool {
        self.get(name).is_some_and(Definition::is_enum)
    }
}
