//! Zod code emitter.
//!
//! This module implements the Zod schema code generator that transforms
//! the Definition Table into a TypeScript module of Zod schemas.
//!
//! # Features
//!
//! - Generates `z.enum()` for string enums
//! - Generates `z.object()` for records, `.strict()` when extra fields are rejected
//! - Generates `z.discriminatedUnion()` for tagged unions of records
//! - Generates `z.union()` otherwise
//! - Applies validation methods (`.min()`, `.max()`, `.regex()`, etc.)
//! - Supports `.optional()`, `.nullish()`, `.nullable()`, `.default()`, `.describe()`
//! - Generates type inference with `z.infer<typeof Schema>`

use crate::error::GenerateError;
use crate::generator::traits::{
    CodeGenerator, Declaration, EmitContext, GeneratorConfig, Imports, IndentStyle,
    EXPORT_GROUPS,
};
use crate::generator::zod::type_mapper::{escape_string, is_object_or_array, ZodTypeMapper};
use crate::ir::{
    AliasDef, Definition, DefinitionKind, DefinitionTable, EnumDef, ObjectDef, PropertySpec,
    SchemaRoot, UnionDef,
};
use crate::naming::is_js_identifier;
use crate::plan::{Plan, Section};

/// Width of the `=` rule in section banners.
const BANNER_WIDTH: usize = 76;

/// Zod schema code generator.
#[derive(Debug, Clone, Default)]
pub struct ZodEmitter;

impl ZodEmitter {
    /// Create a new ZodEmitter with default settings.
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // Enum Generation
    // =========================================================================

    /// Generate z.enum() for a string enum; repeated literals appear once.
    fn generate_enum(&self, e: &EnumDef) -> String {
        let mut seen = Vec::with_capacity(e.values.len());
        for value in &e.values {
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        let variants: Vec<String> = seen
            .iter()
            .map(|v| format!("\"{}\"", escape_string(v)))
            .collect();
        format!("z.enum([{}])", variants.join(", "))
    }

    // =========================================================================
    // Object Generation
    // =========================================================================

    fn generate_object(&self, object: &ObjectDef, ctx: &EmitContext<'_>) -> String {
        let indent = self.indent(ctx.config);
        let is_forward = |name: &str| ctx.is_forward(name);
        let mapper = ZodTypeMapper::new(&is_forward);

        let fields: Vec<String> = object
            .properties
            .iter()
            .map(|(name, spec)| {
                let key = if is_js_identifier(name) {
                    name.clone()
                } else {
                    format!("\"{}\"", escape_string(name))
                };
                let schema =
                    self.generate_field(spec, object.is_required(name), &mapper, ctx.table, ctx.config);
                format!("{}{}: {},", indent, key, schema)
            })
            .collect();

        let mut result = if fields.is_empty() {
            "z.object({})".to_string()
        } else {
            format!("z.object({{\n{}\n}})", fields.join("\n"))
        };

        if ctx.config.forbid_extra && object.strict {
            result.push_str(".strict()");
        }
        result
    }

    /// Generate the Zod schema for a field.
    fn generate_field(
        &self,
        spec: &PropertySpec,
        required: bool,
        mapper: &ZodTypeMapper<'_>,
        table: &DefinitionTable,
        config: &GeneratorConfig,
    ) -> String {
        let mut schema = mapper.map_type(spec);

        if let Some(default) = &spec.default {
            schema.push_str(&format!(".default({})", default));
        } else if !required {
            // records and lists may arrive as null from serializers that keep absent fields
            if is_object_or_array(spec, table) {
                schema.push_str(".nullish()");
            } else {
                schema.push_str(".optional()");
            }
        }

        if config.generate_docs {
            if let Some(desc) = &spec.description {
                schema.push_str(&format!(".describe(\"{}\")", escape_string(desc)));
            }
        }

        schema
    }

    // =========================================================================
    // Union and Alias Generation
    // =========================================================================

    /// `z.discriminatedUnion` needs plain object schemas that already exist;
    /// anything else falls back to `z.union`.
    fn generate_union(
        &self,
        definition: &Definition,
        u: &UnionDef,
        ctx: &EmitContext<'_>,
    ) -> Result<String, GenerateError> {
        if u.members.is_empty() {
            return Err(GenerateError::internal(&definition.name, "union has no members"));
        }

        let indent = self.indent(ctx.config);
        let is_forward = |name: &str| ctx.is_forward(name);
        let mapper = ZodTypeMapper::new(&is_forward);

        if let [only] = u.members.as_slice() {
            return Ok(mapper.map_reference(only));
        }

        let members: Vec<String> = u
            .members
            .iter()
            .map(|m| format!("{}{},", indent, mapper.map_reference(m)))
            .collect();
        let discriminable = u.members.iter().all(|m| {
            !ctx.is_forward(m)
                && !ctx.has_forward_refs(m)
                && ctx.table.get(m).is_some_and(Definition::is_object)
        });

        Ok(match &u.discriminator {
            Some(field) if discriminable => format!(
                "z.discriminatedUnion(\"{}\", [\n{}\n])",
                escape_string(field),
                members.join("\n")
            ),
            _ => format!("z.union([\n{}\n])", members.join("\n")),
        })
    }

    fn generate_alias(&self, alias: &AliasDef, ctx: &EmitContext<'_>) -> String {
        let is_forward = |name: &str| ctx.is_forward(name);
        ZodTypeMapper::new(&is_forward).map_type(&alias.spec)
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Whether the schema constant of `name` needs an explicit annotation:
    /// recursive schemas cannot be inferred by TypeScript.
    fn is_recursive(&self, name: &str, plan: &Plan) -> bool {
        plan.items
            .iter()
            .any(|item| (item.name == name && !item.forward_refs.is_empty()) || item.is_forward(name))
    }

    /// `export const` / `export type` pair with an optional JSDoc comment.
    fn export_block(&self, name: &str, schema: &str, description: Option<&str>, annotate: bool) -> String {
        let mut result = String::new();
        if let Some(desc) = description {
            result.push_str(&jsdoc(desc, ""));
            result.push('\n');
        }

        let annotation = if annotate { ": z.ZodTypeAny" } else { "" };
        result.push_str(&format!("export const {}Schema{} = {};\n", name, annotation, schema));
        result.push_str(&format!(
            "export type {} = z.infer<typeof {}Schema>;",
            name, name
        ));
        result
    }
}

/// JSDoc comment at `indent`; multi-line text becomes a block.
fn jsdoc(text: &str, indent: &str) -> String {
    let text = text.replace("*/", "*\\/");
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= 1 {
        return format!("{}/** {} */", indent, text);
    }

    let mut out = format!("{}/**", indent);
    for line in lines {
        out.push('\n');
        out.push_str(indent);
        if line.is_empty() {
            out.push_str(" *");
        } else {
            out.push_str(" * ");
            out.push_str(line);
        }
    }
    out.push('\n');
    out.push_str(indent);
    out.push_str(" */");
    out
}

// =============================================================================
// CodeGenerator Implementation
// =============================================================================

impl CodeGenerator for ZodEmitter {
    fn id(&self) -> &'static str {
        "zod"
    }

    fn name(&self) -> &'static str {
        "Zod Schema Generator"
    }

    fn file_extension(&self) -> &'static str {
        "ts"
    }

    fn default_indent(&self) -> IndentStyle {
        IndentStyle::Spaces2
    }

    fn block_separator(&self) -> &'static str {
        "\n\n"
    }

    fn generate(
        &self,
        definition: &Definition,
        ctx: &EmitContext<'_>,
    ) -> Result<Declaration, GenerateError> {
        let mut schema = match &definition.kind {
            DefinitionKind::Enum(e) => self.generate_enum(e),
            DefinitionKind::Object(o) => self.generate_object(o, ctx),
            DefinitionKind::Union(u) => self.generate_union(definition, u, ctx)?,
            DefinitionKind::Alias(a) => self.generate_alias(a, ctx),
        };

        let description = definition
            .description
            .as_deref()
            .filter(|_| ctx.config.generate_docs);
        if let Some(desc) = description {
            schema.push_str(&format!(".describe(\"{}\")", escape_string(desc)));
        }

        let code = self.export_block(
            &definition.name,
            &schema,
            description,
            self.is_recursive(&definition.name, ctx.plan),
        );

        tracing::trace!(definition = %definition.name, "rendered zod declaration");
        Ok(Declaration::planned(ctx.planned, code, Imports::new()))
    }

    fn generate_schema_type(
        &self,
        table: &DefinitionTable,
        _plan: &Plan,
        config: &GeneratorConfig,
    ) -> Result<Declaration, GenerateError> {
        let root = &table.root;
        let indent = self.indent(config);
        let description = root
            .description
            .as_deref()
            .unwrap_or("Complete UI schema definition");

        let schema = format!(
            "z.object({{\n{i}metadata: {}Schema,\n{i}root: {}Schema,\n}})",
            root.metadata_type,
            root.root_type,
            i = indent
        );
        let docs = config.generate_docs.then_some(description);
        let mut code = self.export_block(&root.name, &schema, docs, false);

        code.push_str("\n\n");
        if config.generate_docs {
            code.push_str("/** Serialize to JSON, omitting unset optional fields. */\n");
        }
        code.push_str(&format!(
            "export function serialize{name}(schema: {name}): string {{\n{i}return JSON.stringify(schema, (_key, value) => (value === null ? undefined : value), 2);\n}}",
            name = root.name,
            i = indent
        ));

        Ok(Declaration::new(root.name.as_str(), Section::Schema, code)
            .with_dependencies(vec![root.metadata_type.clone(), root.root_type.clone()]))
    }

    fn generate_forward_resolution(&self, _plan: &Plan, _config: &GeneratorConfig) -> Option<String> {
        // z.lazy defers every forward reference
        None
    }

    fn generate_preamble(
        &self,
        root: &SchemaRoot,
        _imports: &Imports,
        config: &GeneratorConfig,
    ) -> Result<String, GenerateError> {
        let mut header = String::new();
        if let Some(desc) = &root.description {
            header.push_str(desc);
            header.push_str("\n\n");
        }
        header.push_str("This file is auto-generated by guigen.\n");
        header.push_str("DO NOT EDIT MANUALLY - regenerate from the schema instead.");

        Ok(format!(
            "{}\n\nimport {{ z }} from 'zod';\n\nexport const VERSION = \"{}\";\n",
            jsdoc(&header, ""),
            escape_string(config.resolved_version(root))
        ))
    }

    /// Generate the `schemas` registry of every exported schema constant.
    fn generate_postamble(
        &self,
        declarations: &[Declaration],
        config: &GeneratorConfig,
    ) -> Result<String, GenerateError> {
        let indent = self.indent(config);
        let mut lines = Vec::new();

        for (group, heading) in EXPORT_GROUPS {
            let names: Vec<String> = declarations
                .iter()
                .filter(|d| d.export_group == group)
                .map(|d| format!("{}{}Schema,", indent, d.name))
                .collect();
            if names.is_empty() {
                continue;
            }
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("{}// {}", indent, heading));
            lines.extend(names);
        }

        let registry = if lines.is_empty() {
            "export const schemas = {};".to_string()
        } else {
            format!("export const schemas = {{\n{}\n}};", lines.join("\n"))
        };
        Ok(format!("{}\n\n{}", self.banner("SCHEMA REGISTRY"), registry))
    }

    fn banner(&self, title: &str) -> String {
        let rule = format!("// {}", "=".repeat(BANNER_WIDTH));
        format!("{}\n// {}\n{}", rule, title, rule)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
