//! Error types for the generator library.
//!
//! Each pipeline phase has its own error enum. All of them are fatal: a run
//! either produces a complete source unit or fails with one of these.

use std::path::PathBuf;
use thiserror::Error;

/// Error while reading or interpreting the IR document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document could not be read.
    #[error("Failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON.
    #[error("Schema is not valid JSON: {source}")]
    Load {
        #[source]
        source: serde_json::Error,
    },

    /// The document is JSON but does not have the expected structure.
    #[error("Malformed schema{}: {message}", location(.definition))]
    Format {
        definition: Option<String>,
        message: String,
    },
}

impl SchemaError {
    /// Document-level format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            definition: None,
            message: message.into(),
        }
    }

    /// Format error inside a named definition.
    pub fn in_definition(definition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            definition: Some(definition.into()),
            message: message.into(),
        }
    }
}

fn location(definition: &Option<String>) -> String {
    match definition {
        Some(name) => format!(" in definition '{}'", name),
        None => String::new(),
    }
}

/// Error during declaration planning or emission.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A `$ref` points at a name absent from the Definition Table.
    #[error("Definition '{referenced_by}' references unknown definition '{name}'")]
    UnresolvedReference { name: String, referenced_by: String },

    /// Two enum literals normalize to the same member name.
    #[error(
        "Enum '{enum_name}': values '{first}' and '{second}' both normalize to member '{member}'"
    )]
    EnumEmission {
        enum_name: String,
        member: String,
        first: String,
        second: String,
    },

    /// Two fields of one record map to the same attribute name.
    #[error("Type '{type_name}': fields '{first}' and '{second}' both map to attribute '{ident}'")]
    FieldNameCollision {
        type_name: String,
        ident: String,
        first: String,
        second: String,
    },

    /// A cycle made only of unions / aliases, which no forward reference can break.
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Internal generation error.
    #[error("Generation error for '{type_name}': {message}")]
    Internal { type_name: String, message: String },
}

impl GenerateError {
    pub fn unresolved(name: impl Into<String>, referenced_by: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            name: name.into(),
            referenced_by: referenced_by.into(),
        }
    }

    pub fn internal(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// Error during the post-generation rewrite pass.
///
/// A missing idiom is never an error.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The generated file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A group produced an invalid matching pattern (for example an empty
    /// member list).
    #[error("Invalid rewrite group '{group}': {message}")]
    Pattern { group: String, message: String },
}

/// Error while producing the canonical text form of a schema instance.
#[derive(Debug, Error)]
pub enum CanonicalError {
    /// The instance names a definition that is not in the table.
    #[error("Unknown definition '{0}'")]
    UnknownDefinition(String),

    /// The value at `path` does not have the shape its definition requires.
    #[error("At {path}: expected {expected}")]
    Mismatch { path: String, expected: String },

    /// No union member accepts the value at `path`.
    #[error("At {path}: no member of '{union}' matches")]
    NoMatchingMember { path: String, union: String },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
