//! Pydantic code emitter.
//!
//! This module implements the Pydantic v2 code generator that transforms the
//! Definition Table into a Python module.
//!
//! # Features
//!
//! - Generates `class X(str, Enum)` for string enums
//! - Generates `class X(BaseModel)` for records, with `Annotated[..., Field(...)]`
//!   carrying string / numeric / array constraints
//! - Generates plain `Union[...]` aliases for named unions
//! - Quotes references to types declared later and resolves them with
//!   `model_rebuild()` once every class exists
//! - Generates the top-level schema class with a `to_json` method

use serde_json::Value;

use crate::error::GenerateError;
use crate::generator::pydantic::type_mapper::{
    escape_string, python_literal, python_pattern, python_string, PyType, PydanticTypeMapper,
};
use crate::generator::traits::{
    CodeGenerator, Declaration, EmitContext, GeneratorConfig, Imports, IndentStyle,
    EXPORT_GROUPS,
};
use crate::ir::{
    AliasDef, Definition, DefinitionKind, DefinitionTable, EnumDef, ObjectDef,
    PropertySpec, SchemaRoot, Shape, UnionDef,
};
use crate::naming::{enum_member_name, enum_members, python_field_name, python_field_names, FieldName};
use crate::plan::{Plan, Section};

/// Width of the `=` rule in section banners.
const BANNER_WIDTH: usize = 76;

/// Order of import statements in the module header.
const IMPORT_MODULES: [&str; 3] = ["enum", "typing", "pydantic"];

/// Pydantic v2 code generator.
#[derive(Debug, Clone, Default)]
pub struct PydanticEmitter;

impl PydanticEmitter {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // Enum Generation
    // =========================================================================

    fn generate_enum(
        &self,
        definition: &Definition,
        e: &EnumDef,
        config: &GeneratorConfig,
        imports: &mut Imports,
    ) -> Result<String, GenerateError> {
        let indent = self.indent(config);
        imports.add("enum", "Enum");

        let mut blocks = Vec::new();
        if let Some(doc) = self.docstring(definition.description.as_deref(), indent, config) {
            blocks.push(doc);
        }

        let members: Vec<String> = enum_members(&definition.name, &e.values)?
            .into_iter()
            .map(|(member, value)| format!("{}{} = {}", indent, member, python_string(value)))
            .collect();
        if !members.is_empty() {
            blocks.push(members.join("\n"));
        }

        Ok(class_block(
            &format!("class {}(str, Enum):", definition.name),
            blocks,
            indent,
        ))
    }

    // =========================================================================
    // Record Generation
    // =========================================================================

    fn generate_object(
        &self,
        definition: &Definition,
        object: &ObjectDef,
        ctx: &EmitContext<'_>,
        imports: &mut Imports,
    ) -> Result<String, GenerateError> {
        let indent = self.indent(ctx.config);
        imports.add("pydantic", "BaseModel");

        let mut blocks = Vec::new();
        if let Some(doc) = self.docstring(definition.description.as_deref(), indent, ctx.config) {
            blocks.push(doc);
        }

        if ctx.config.forbid_extra && object.strict {
            imports.add("pydantic", "ConfigDict");
            blocks.push(format!("{}model_config = ConfigDict(extra=\"forbid\")", indent));
        }

        let is_forward = |name: &str| ctx.is_forward(name);
        let mapper = PydanticTypeMapper::new(&is_forward);
        let names = python_field_names(&definition.name, object.properties.keys().map(String::as_str))?;
        let fields: Vec<String> = object
            .properties
            .iter()
            .zip(&names)
            .map(|((name, spec), field_name)| {
                let line = self.generate_field(
                    field_name,
                    spec,
                    object.is_required(name),
                    &mapper,
                    ctx,
                    imports,
                );
                format!("{}{}", indent, line)
            })
            .collect();
        if !fields.is_empty() {
            blocks.push(fields.join("\n"));
        }

        Ok(class_block(&format!("class {}(BaseModel):", definition.name), blocks, indent))
    }

    /// Render one field line (without indentation).
    ///
    /// - constrained or aliased: `name: Annotated[T, Field(..., default=D)]`
    /// - optional without default: `name: Optional[T] = None`
    /// - with default: `name: T = D`
    /// - required: `name: T`
    fn generate_field(
        &self,
        field_name: &FieldName,
        spec: &PropertySpec,
        required: bool,
        mapper: &PydanticTypeMapper<'_>,
        ctx: &EmitContext<'_>,
        imports: &mut Imports,
    ) -> String {
        let ty = mapper.map_type(spec);

        let mut default = spec.default.as_ref().map(|d| self.render_default(d, spec, ctx.table));
        let mut args = Vec::new();
        if let Shape::Const(value) = &spec.shape {
            // a constant is its own default when the field may be omitted
            if !required && default.is_none() {
                default = Some(python_literal(value));
            }
        } else {
            args = constraint_args(spec);
        }
        if let Some(alias) = &field_name.alias {
            args.push(format!("alias={}", python_string(alias)));
        }

        if !args.is_empty() {
            imports.add("typing", "Annotated");
            imports.add("pydantic", "Field");
            let rendered = if required || default.is_some() {
                ty.render(imports)
            } else {
                ty.optional().render(imports)
            };
            match default {
                Some(d) => args.push(format!("default={}", d)),
                None if !required => args.push("default=None".to_string()),
                None => {}
            }
            return format!(
                "{}: Annotated[{}, Field({})]",
                field_name.ident,
                rendered,
                args.join(", ")
            );
        }

        match (required, default) {
            (_, Some(d)) => format!("{}: {} = {}", field_name.ident, ty.render(imports), d),
            (false, None) => format!("{}: {} = None", field_name.ident, ty.optional().render(imports)),
            (true, None) => format!("{}: {}", field_name.ident, ty.render(imports)),
        }
    }

    /// Default value literal; defaults of enum-typed fields name the member.
    fn render_default(&self, value: &Value, spec: &PropertySpec, table: &DefinitionTable) -> String {
        if let (Shape::Reference(target), Value::String(s)) = (&spec.shape, value) {
            let is_member = table
                .get(target)
                .and_then(Definition::as_enum)
                .is_some_and(|e| e.values.iter().any(|v| v == s));
            if is_member {
                return format!("{}.{}", target, enum_member_name(s));
            }
        }
        python_literal(value)
    }

    // =========================================================================
    // Union and Alias Generation
    // =========================================================================

    fn generate_union(
        &self,
        definition: &Definition,
        u: &UnionDef,
        ctx: &EmitContext<'_>,
        imports: &mut Imports,
    ) -> Result<String, GenerateError> {
        if u.members.is_empty() {
            return Err(GenerateError::internal(&definition.name, "union has no members"));
        }

        let indent = self.indent(ctx.config);
        let mut lines = Vec::new();
        if ctx.config.generate_docs {
            if let Some(desc) = &definition.description {
                lines.extend(desc.lines().map(comment_line));
            }
        }
        if let Some(field) = &u.discriminator {
            lines.push(format!("# Discriminated by \"{}\"", field));
        }

        let member = |name: &String| {
            if ctx.is_forward(name) {
                PyType::Forward(name.clone())
            } else {
                PyType::Named(name.clone())
            }
        };

        if let [only] = u.members.as_slice() {
            lines.push(format!("{} = {}", definition.name, member(only).render(imports)));
        } else {
            imports.add("typing", "Union");
            lines.push(format!("{} = Union[", definition.name));
            for name in &u.members {
                lines.push(format!("{}{},", indent, member(name).render(imports)));
            }
            lines.push("]".to_string());
        }

        Ok(lines.join("\n"))
    }

    fn generate_alias(
        &self,
        definition: &Definition,
        alias: &AliasDef,
        ctx: &EmitContext<'_>,
        imports: &mut Imports,
    ) -> String {
        let is_forward = |name: &str| ctx.is_forward(name);
        let mapper = PydanticTypeMapper::new(&is_forward);
        let ty = mapper.map_type(&alias.spec).render(imports);

        let args = constraint_args(&alias.spec);
        let value = if args.is_empty() {
            ty
        } else {
            imports.add("typing", "Annotated");
            imports.add("pydantic", "Field");
            format!("Annotated[{}, Field({})]", ty, args.join(", "))
        };

        let mut lines = Vec::new();
        if ctx.config.generate_docs {
            if let Some(desc) = &definition.description {
                lines.extend(desc.lines().map(comment_line));
            }
        }
        lines.push(format!("{} = {}", definition.name, value));
        lines.join("\n")
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    fn docstring(
        &self,
        description: Option<&str>,
        indent: &str,
        config: &GeneratorConfig,
    ) -> Option<String> {
        if !config.generate_docs {
            return None;
        }
        description.map(|desc| docstring(desc, indent))
    }
}

/// `header` followed by its indented body blocks, separated by blank lines.
fn class_block(header: &str, blocks: Vec<String>, indent: &str) -> String {
    if blocks.is_empty() {
        return format!("{}\n{}pass", header, indent);
    }
    format!("{}\n{}", header, blocks.join("\n\n"))
}

fn comment_line(line: &str) -> String {
    if line.is_empty() {
        "#".to_string()
    } else {
        format!("# {}", line)
    }
}

/// Triple-quoted docstring at `indent`.
fn docstring(text: &str, indent: &str) -> String {
    let mut escaped = text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    if escaped.ends_with('"') {
        escaped.pop();
        escaped.push_str("\\\"");
    }

    let lines: Vec<&str> = escaped.lines().collect();
    if lines.len() <= 1 {
        return format!("{}\"\"\"{}\"\"\"", indent, escaped);
    }

    let mut out = format!("{}\"\"\"", indent);
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out.push('\n');
    out.push_str(indent);
    out.push_str("\"\"\"");
    out
}

/// `Field(...)` keyword arguments for a property's constraints.
///
/// Item-count and string-length bounds share the `min_length` /
/// `max_length` keywords; the pair matching the property's shape is used,
/// the other only when the matching one is absent.
fn constraint_args(spec: &PropertySpec) -> Vec<String> {
    let c = &spec.constraints;
    let (min, max) = if matches!(spec.shape, Shape::Array(_) | Shape::Tuple(_)) {
        (c.min_items.or(c.min_length), c.max_items.or(c.max_length))
    } else {
        (c.min_length.or(c.min_items), c.max_length.or(c.max_items))
    };

    let mut args = Vec::new();
    if let Some(n) = min {
        args.push(format!("min_length={}", n));
    }
    if let Some(n) = max {
        args.push(format!("max_length={}", n));
    }
    if let Some(n) = &c.minimum {
        args.push(format!("ge={}", n));
    }
    if let Some(n) = &c.maximum {
        args.push(format!("le={}", n));
    }
    if let Some(n) = &c.exclusive_minimum {
        args.push(format!("gt={}", n));
    }
    if let Some(n) = &c.exclusive_maximum {
        args.push(format!("lt={}", n));
    }
    if let Some(pattern) = &c.pattern {
        args.push(format!("pattern={}", python_pattern(pattern)));
    }
    args
}

// =============================================================================
// CodeGenerator Implementation
// =============================================================================

impl CodeGenerator for PydanticEmitter {
    fn id(&self) -> &'static str {
        "pydantic"
    }

    fn name(&self) -> &'static str {
        "Pydantic Model Generator"
    }

    fn file_extension(&self) -> &'static str {
        "py"
    }

    fn default_indent(&self) -> IndentStyle {
        IndentStyle::Spaces4
    }

    fn block_separator(&self) -> &'static str {
        "\n\n\n"
    }

    fn generate(
        &self,
        definition: &Definition,
        ctx: &EmitContext<'_>,
    ) -> Result<Declaration, GenerateError> {
        let mut imports = Imports::new();
        let code = match &definition.kind {
            DefinitionKind::Enum(e) => self.generate_enum(definition, e, ctx.config, &mut imports)?,
            DefinitionKind::Object(o) => self.generate_object(definition, o, ctx, &mut imports)?,
            DefinitionKind::Union(u) => self.generate_union(definition, u, ctx, &mut imports)?,
            DefinitionKind::Alias(a) => self.generate_alias(definition, a, ctx, &mut imports),
        };

        tracing::trace!(definition = %definition.name, "rendered pydantic declaration");
        Ok(Declaration::planned(ctx.planned, code, imports))
    }

    fn generate_schema_type(
        &self,
        table: &DefinitionTable,
        _plan: &Plan,
        config: &GeneratorConfig,
    ) -> Result<Declaration, GenerateError> {
        let root = &table.root;
        let indent = self.indent(config);
        let mut imports = Imports::new();
        imports.add("pydantic", "BaseModel");

        let description = root
            .description
            .as_deref()
            .unwrap_or("Complete UI schema definition");

        // aliased field names must serialize under their schema names
        let uses_aliases = table.iter().filter_map(Definition::as_object).any(|o| {
            o.properties
                .keys()
                .any(|name| python_field_name(name).alias.is_some())
        });
        let dump_args = if uses_aliases {
            "indent=2, exclude_none=True, by_alias=True"
        } else {
            "indent=2, exclude_none=True"
        };

        let mut blocks = Vec::new();
        if config.generate_docs {
            blocks.push(docstring(description, indent));
        }
        blocks.push(format!(
            "{i}metadata: {}\n{i}root: {}",
            root.metadata_type,
            root.root_type,
            i = indent
        ));
        blocks.push(format!(
            "{i}def to_json(self) -> str:\n{i}{i}\"\"\"Serialize to JSON, omitting unset optional fields.\"\"\"\n{i}{i}return self.model_dump_json({})",
            dump_args,
            i = indent
        ));

        let code = class_block(&format!("class {}(BaseModel):", root.name), blocks, indent);
        Ok(Declaration::new(root.name.as_str(), Section::Schema, code)
            .with_imports(imports)
            .with_dependencies(vec![root.metadata_type.clone(), root.root_type.clone()]))
    }

    fn generate_forward_resolution(&self, plan: &Plan, _config: &GeneratorConfig) -> Option<String> {
        let calls: Vec<String> = plan
            .forward_referencing()
            .map(|item| format!("{}.model_rebuild()", item.name))
            .collect();
        (!calls.is_empty()).then(|| calls.join("\n"))
    }

    fn generate_preamble(
        &self,
        root: &SchemaRoot,
        imports: &Imports,
        config: &GeneratorConfig,
    ) -> Result<String, GenerateError> {
        let mut out = String::from("\"\"\"\n");
        if let Some(desc) = &root.description {
            out.push_str(&escape_docstring(desc));
            out.push_str("\n\n");
        }
        out.push_str("This file is auto-generated by guigen.\n");
        out.push_str("DO NOT EDIT MANUALLY - regenerate from the schema instead.\n");
        out.push_str("\"\"\"\n\n");
        out.push_str(&format!(
            "__version__ = \"{}\"\n",
            escape_string(config.resolved_version(root))
        ));

        let extra: Vec<&str> = imports
            .modules()
            .filter(|module| !IMPORT_MODULES.contains(module))
            .collect();
        let statements: Vec<String> = IMPORT_MODULES
            .iter()
            .copied()
            .chain(extra)
            .filter_map(|module| {
                let names = imports.names(module);
                (!names.is_empty()).then(|| format!("from {} import {}", module, names.join(", ")))
            })
            .collect();
        if !statements.is_empty() {
            out.push('\n');
            out.push_str(&statements.join("\n"));
            out.push('\n');
        }

        Ok(out)
    }

    fn generate_postamble(
        &self,
        declarations: &[Declaration],
        config: &GeneratorConfig,
    ) -> Result<String, GenerateError> {
        let indent = self.indent(config);
        let mut lines = Vec::new();

        for (group, heading) in EXPORT_GROUPS {
            let names: Vec<&str> = declarations
                .iter()
                .filter(|d| d.export_group == group)
                .map(|d| d.name.as_str())
                .collect();
            if names.is_empty() {
                continue;
            }
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("{}# {}", indent, heading));
            lines.extend(names.iter().map(|name| format!("{}\"{}\",", indent, name)));
        }

        let list = if lines.is_empty() {
            "__all__ = []".to_string()
        } else {
            format!("__all__ = [\n{}\n]", lines.join("\n"))
        };
        Ok(format!("{}\n\n{}", self.banner("PUBLIC API EXPORTS"), list))
    }

    fn banner(&self, title: &str) -> String {
        let rule = format!("# {}", "=".repeat(BANNER_WIDTH));
        format!("{}\n# {}\n{}", rule, title, rule)
    }
}

fn escape_docstring(text: &str) -> String {
    text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}
