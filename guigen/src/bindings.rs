//! Binding record substitution.
//!
//! A named alias of the form "array of fixed-arity tuples" is often the wire
//! form of a list of binding records: `[[eventType, action], ...]` next to a
//! record `{ eventType, action }`. When a record exists whose required fields
//! match the tuple elements one for one, fields referencing the alias are
//! typed as a list of that record instead.

use crate::ir::{Definition, DefinitionKind, DefinitionTable, PropertySpec, Shape};

/// One rewritten field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSubstitution {
    /// Record that owns the field
    pub owner: String,
    pub field: String,
    /// Tuple-list alias the field referenced
    pub alias: String,
    /// Record the field now lists
    pub record: String,
}

/// Replace references to tuple-list aliases by lists of the matching record.
///
/// Returns the rewritten table and the substitutions made. Tables without a
/// matching alias / record pair are returned unchanged.
pub fn apply_binding_records(table: &DefinitionTable) -> (DefinitionTable, Vec<BindingSubstitution>) {
    let mut rewritten = table.clone();
    let mut substitutions = Vec::new();

    for definition in table.iter() {
        let Some(object) = definition.as_object() else {
            continue;
        };

        let mut updated = object.clone();
        for (field, spec) in object.properties.iter() {
            let Shape::Reference(alias) = &spec.shape else {
                continue;
            };
            let Some(record) = binding_record_for(table, alias) else {
                continue;
            };

            tracing::debug!(
                owner = %definition.name,
                field = %field,
                alias = %alias,
                record = %record,
                "typing tuple list as binding records"
            );

            let mut replacement = spec.clone();
            replacement.shape = Shape::Array(Box::new(PropertySpec::reference(record)));
            updated.properties.insert(field.clone(), replacement);

            substitutions.push(BindingSubstitution {
                owner: definition.name.clone(),
                field: field.clone(),
                alias: alias.clone(),
                record: record.to_string(),
            });
        }

        if updated != *object {
            let mut replaced = definition.clone();
            replaced.kind = DefinitionKind::Object(updated);
            rewritten.insert(replaced);
        }
    }

    (rewritten, substitutions)
}

/// The first record (declaration order) whose required fields match the
/// tuple elements of the alias `alias`, if `alias` is a list of tuples.
fn binding_record_for<'a>(table: &'a DefinitionTable, alias: &str) -> Option<&'a str> {
    let Definition {
        kind: DefinitionKind::Alias(alias_def),
        ..
    } = table.get(alias)?
    else {
        return None;
    };

    let Shape::Array(item) = &alias_def.spec.shape else {
        return None;
    };
    let Shape::Tuple(elements) = &item.shape else {
        return None;
    };

    table
        .iter()
        .find(|candidate| {
            candidate.as_object().is_some_and(|object| {
                let required: Vec<&PropertySpec> =
                    object.required_fields().map(|(_, spec)| spec).collect();
                required.len() == elements.len()
                    && required
                        .iter()
                        .zip(elements)
                        .all(|(field, element)| field.shape == element.shape)
            })
        })
        .map(|record| record.name.as_str())
}
