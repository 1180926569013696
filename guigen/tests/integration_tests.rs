//! Integration tests for guigen.
//!
//! These tests load the fixture document end to end and check the generated
//! Pydantic and Zod units, the rewriter and the canonical instance text.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;

use guigen::bindings::apply_binding_records;
use guigen::canonical::canonicalize;
use guigen::generator::{PydanticEmitter, ZodEmitter};
use guigen::ir::DefinitionKind;
use guigen::{
    generate, load_file, to_canonical_text, GeneratedUnit, GeneratorConfig, Rewriter, SchemaError,
    SchemaRoot, SectionOrder,
};

/// Get the path to test fixtures.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture() -> guigen::DefinitionTable {
    load_file(&fixtures_path().join("ui-schema.json"), &SchemaRoot::default()).unwrap()
}

fn pydantic_unit() -> GeneratedUnit {
    generate(&load_fixture(), &PydanticEmitter::new(), &GeneratorConfig::default()).unwrap()
}

fn zod_unit() -> GeneratedUnit {
    generate(&load_fixture(), &ZodEmitter::new(), &GeneratorConfig::default()).unwrap()
}

/// Byte offset of `needle` in `haystack`, panicking with context when absent.
fn offset(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("expected to find {needle:?} in generated output"))
}

// =============================================================================
// Loader Integration Tests
// =============================================================================

#[test]
fn test_fixture_loads_in_declaration_order() {
    let table = load_fixture();

    assert_eq!(table.len(), 20);
    assert_eq!(table.names().next(), Some("ButtonVariant"));
    assert_eq!(table.root.name, "UISchema");
    assert_eq!(table.root.version.as_deref(), Some("1.2.0"));
    assert_eq!(table.root.metadata_type, "UIMetadata");
    assert_eq!(table.root.root_type, "UIComponent");

    let action = table.get("EventAction").unwrap().as_union().unwrap();
    assert_eq!(action.discriminator.as_deref(), Some("type"));
    assert_eq!(
        action.members,
        vec![
            "NavigateAction",
            "SetStateAction",
            "SubmitFormAction",
            "ValidateAction",
            "CustomAction"
        ]
    );
    assert!(matches!(
        table.get("EventBindings").unwrap().kind,
        DefinitionKind::Alias(_)
    ));
}

#[test]
fn test_unreadable_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"$defs\": ").unwrap();

    let err = load_file(&path, &SchemaRoot::default()).unwrap_err();
    assert!(matches!(err, SchemaError::Load { .. }));

    let err = load_file(&dir.path().join("missing.json"), &SchemaRoot::default()).unwrap_err();
    assert!(matches!(err, SchemaError::Read { .. }));
}

// =============================================================================
// Pydantic Integration Tests
// =============================================================================

#[test]
fn test_pydantic_unit_dependencies_precede_dependents() {
    let unit = pydantic_unit();

    for item in &unit.plan.items {
        let position = unit.plan.position(&item.name).unwrap();
        for dependency in &item.dependencies {
            if item.is_forward(dependency) {
                continue;
            }
            assert!(
                unit.plan.position(dependency).unwrap() < position,
                "{} is emitted before its dependency {}",
                item.name,
                dependency
            );
        }
    }

    let content = &unit.content;
    assert!(offset(content, "class NavigateAction(BaseModel):") < offset(content, "EventAction = Union["));
    assert!(offset(content, "class CustomAction(BaseModel):") < offset(content, "EventAction = Union["));
    assert!(offset(content, "EventAction = Union[") < offset(content, "class EventBinding(BaseModel):"));
    assert!(offset(content, "class CardComponent(BaseModel):") < offset(content, "UIComponent = Union["));
    assert!(offset(content, "UIComponent = Union[") < offset(content, "class UISchema(BaseModel):"));
}

#[test]
fn test_pydantic_unit_header_and_trailer() {
    let content = pydantic_unit().content;

    assert!(content.starts_with("\"\"\"\nDeclarative UI tree rendered by the client runtime.\n"));
    assert!(content.contains("__version__ = \"1.2.0\"\n"));
    assert!(content.contains("from enum import Enum\n"));
    assert!(content.contains("from pydantic import "));
    assert!(!content.contains("RootModel"));
    assert!(!content.contains("ConfigDict"));

    let exports = &content[offset(&content, "__all__ = [")..];
    for name in ["ButtonVariant", "EventAction", "UIComponent", "UIMetadata", "UISchema"] {
        assert!(exports.contains(&format!("\"{}\",", name)), "{} not exported", name);
    }
    assert!(content.ends_with("]\n"));
}

#[test]
fn test_pydantic_fields() {
    let content = pydantic_unit().content;

    assert!(content.contains("    label: Annotated[str, Field(min_length=1, max_length=100)]\n"));
    assert!(content.contains("    variant: ButtonVariant = ButtonVariant.PRIMARY\n"));
    assert!(content.contains("    size: ButtonSize = ButtonSize.SM\n"));
    assert!(content.contains("    disabled: bool = False\n"));
    assert!(content.contains("    events: Optional[List[EventBinding]] = None\n"));
    assert!(content.contains("    TOP_LEFT = \"top-left\"\n"));
    assert!(content.contains("    TOP_RIGHT = \"top_right\"\n"));
}

#[test]
fn test_pydantic_recursive_component() {
    let unit = pydantic_unit();
    let content = &unit.content;

    assert!(content.contains("children: Optional[List[\"UIComponent\"]] = None"));
    assert!(content.contains("CardComponent.model_rebuild()"));
    assert!(offset(content, "CardComponent.model_rebuild()") > offset(content, "UIComponent = Union["));

    // every forward reference names something the unit declares
    let names: Vec<&str> = unit.names().collect();
    for item in unit.plan.forward_referencing() {
        for name in &item.forward_refs {
            assert!(names.contains(&name.as_str()), "{} is never declared", name);
        }
    }
}

#[test]
fn test_binding_records_can_be_disabled() {
    let config = GeneratorConfig::default().with_binding_records(false);
    let unit = generate(&load_fixture(), &PydanticEmitter::new(), &config).unwrap();

    assert!(unit.substitutions.is_empty());
    assert!(unit.content.contains("    events: Optional[EventBindings] = None\n"));
}

#[test]
fn test_binding_substitution_is_reported() {
    let unit = pydantic_unit();
    assert_eq!(unit.substitutions.len(), 1);
    let substitution = &unit.substitutions[0];
    assert_eq!(substitution.owner, "ButtonComponent");
    assert_eq!(substitution.field, "events");
    assert_eq!(substitution.alias, "EventBindings");
    assert_eq!(substitution.record, "EventBinding");
}

#[test]
fn test_custom_section_order() {
    let sections = SectionOrder::parse(&["enums", "props", "actions", "unions", "components", "schema"]).unwrap();
    let config = GeneratorConfig::default().with_sections(sections);
    let content = generate(&load_fixture(), &PydanticEmitter::new(), &config)
        .unwrap()
        .content;

    assert!(offset(&content, "# PROPS\n") < offset(&content, "# ACTIONS\n"));
}

#[test]
fn test_generation_is_deterministic() {
    assert_eq!(pydantic_unit().content, pydantic_unit().content);
    assert_eq!(zod_unit().content, zod_unit().content);
}

#[test]
fn test_generated_pydantic_survives_rewriter_unchanged() {
    let content = pydantic_unit().content;
    let (rewritten, report) = Rewriter::default().rewrite_source(&content).unwrap();

    assert_eq!(rewritten, content);
    assert!(report.groups_rewritten.is_empty());
    assert_eq!(report.directives_removed, 0);
}

// =============================================================================
// Zod Integration Tests
// =============================================================================

#[test]
fn test_zod_unit() {
    let content = zod_unit().content;

    assert!(content.starts_with("/**\n"));
    assert!(content.contains("import { z } from 'zod';\n"));
    assert!(content.contains("export const VERSION = \"1.2.0\";\n"));
    assert!(content.contains("export const ButtonVariantSchema = z.enum([\"primary\", \"secondary\", \"ghost\"])"));
    assert!(content.contains("export type UISchema = z.infer<typeof UISchemaSchema>;"));
    assert!(content.contains("export function serializeUISchema(schema: UISchema): string"));
    assert!(content.contains("z.lazy(() => UIComponentSchema)"));
    assert!(!content.contains("model_rebuild"));
    assert!(content.ends_with("};\n"));

    assert!(offset(&content, "export const EventActionSchema") < offset(&content, "export const EventBindingSchema"));
    assert!(offset(&content, "export const CardComponentSchema") < offset(&content, "export const UIComponentSchema"));
}

#[test]
fn test_zod_optional_containers_are_nullish() {
    let content = zod_unit().content;

    assert!(content.contains("events: z.array(EventBindingSchema).nullish()"));
    assert!(content.contains("author: z.string().optional()"));
}

// =============================================================================
// Output and Canonical Text
// =============================================================================

#[test]
fn test_unit_written_to_nested_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("generated/python/ui_schema.py");
    let content = pydantic_unit().content;

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, &content).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_instance_canonical_text() {
    let (table, _) = apply_binding_records(&load_fixture());
    let instance: Value =
        serde_json::from_str(&fs::read_to_string(fixtures_path().join("instance.json")).unwrap())
            .unwrap();

    let text = to_canonical_text(&table, &instance).unwrap();
    let reparsed: Value = serde_json::from_str(&text).unwrap();

    // nulls are dropped, absent fields without a default stay absent
    assert!(reparsed["metadata"].get("author").is_none());
    assert!(reparsed["root"]["props"].get("title").is_none());
    assert!(reparsed["root"]["children"][0]["props"].get("align").is_some());

    // absent defaulted fields are filled in, as the generated model does
    assert_eq!(reparsed["metadata"]["version"], "1.0.0");
    let button_props = &reparsed["root"]["children"][1]["props"];
    assert_eq!(button_props["size"], "lg");
    assert_eq!(button_props["variant"], "primary");
    assert_eq!(button_props["disabled"], false);
    assert_eq!(reparsed["root"]["children"][1]["events"][0]["action"]["replace"], false);

    // declaration order, not input order
    let keys: Vec<&String> = reparsed["root"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["id", "type", "props", "children"]);
    let first_binding: Vec<&String> = reparsed["root"]["children"][1]["events"][0]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(first_binding, vec!["eventType", "action"]);

    assert_eq!(canonicalize(&table, &reparsed).unwrap(), reparsed);
}
