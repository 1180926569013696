//! Unit assembly.
//!
//! Drives a [`CodeGenerator`] over the planned declarations and joins the
//! pieces into one source text:
//!
//! 1. module header (description, version marker, imports)
//! 2. declarations in plan order, with a banner whenever the section changes
//! 3. forward reference resolution, when the target needs it
//! 4. the top-level schema type
//! 5. the public export list
//!
//! Nothing is written here; the caller owns the single write.

use crate::bindings::{apply_binding_records, BindingSubstitution};
use crate::error::GenerateError;
use crate::generator::{CodeGenerator, Declaration, EmitContext, GeneratorConfig, Imports, LineEnding};
use crate::ir::DefinitionTable;
use crate::plan::{plan, Plan, Section};

/// A fully assembled generated unit.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    /// Complete source text, newline terminated.
    pub content: String,

    /// Rendered declarations in emission order, the schema type last.
    pub declarations: Vec<Declaration>,

    /// Tuple-list fields retyped as binding record lists.
    pub substitutions: Vec<BindingSubstitution>,

    /// The plan the unit was emitted from.
    pub plan: Plan,
}

impl GeneratedUnit {
    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().map(|d| d.name.as_str())
    }
}

/// Generate the complete unit for `table`.
pub fn generate(
    table: &DefinitionTable,
    generator: &dyn CodeGenerator,
    config: &GeneratorConfig,
) -> Result<GeneratedUnit, GenerateError> {
    let mut config = config.clone();
    if config.indent.is_none() {
        config.indent = Some(generator.default_indent());
    }

    let (table, substitutions) = if config.binding_records {
        apply_binding_records(table)
    } else {
        (table.clone(), Vec::new())
    };

    let plan = plan(&table, &config.sections)?;
    tracing::debug!(
        target_id = generator.id(),
        definitions = plan.items.len(),
        "planned declarations"
    );

    let mut declarations = Vec::with_capacity(plan.items.len() + 1);
    for planned in &plan.items {
        let definition = table.get(&planned.name).ok_or_else(|| {
            GenerateError::internal(&planned.name, "planned definition missing from table")
        })?;
        let ctx = EmitContext {
            table: &table,
            plan: &plan,
            planned,
            config: &config,
        };
        let declaration = generator.generate(definition, &ctx)?;
        tracing::debug!(
            name = %declaration.name,
            section = %declaration.section,
            forward_refs = declaration.forward_refs.len(),
            "emitted declaration"
        );
        declarations.push(declaration);
    }

    let schema_type = generator.generate_schema_type(&table, &plan, &config)?;

    let mut imports = Imports::new();
    for declaration in declarations.iter().chain(std::iter::once(&schema_type)) {
        imports.merge(&declaration.imports);
    }

    let mut blocks = vec![generator.generate_preamble(&table.root, &imports, &config)?];
    let mut current: Option<Section> = None;
    for declaration in &declarations {
        if current != Some(declaration.section) {
            blocks.push(generator.banner(declaration.section.title()));
            current = Some(declaration.section);
        }
        blocks.push(declaration.code.clone());
    }

    if let Some(resolution) = generator.generate_forward_resolution(&plan, &config) {
        blocks.push(generator.banner("FORWARD REFERENCE RESOLUTION"));
        blocks.push(resolution);
    }

    if current != Some(Section::Schema) {
        blocks.push(generator.banner(Section::Schema.title()));
    }
    blocks.push(schema_type.code.clone());
    declarations.push(schema_type);

    blocks.push(generator.generate_postamble(&declarations, &config)?);

    let content = join_blocks(&blocks, generator.block_separator(), config.line_ending);

    tracing::info!(
        target_id = generator.id(),
        declarations = declarations.len(),
        bytes = content.len(),
        "generation complete"
    );

    Ok(GeneratedUnit {
        content,
        declarations,
        substitutions,
        plan,
    })
}

/// Join blocks with `separator`, end with a single newline and apply the
/// configured line ending.
fn join_blocks(blocks: &[String], separator: &str, line_ending: LineEnding) -> String {
    let trimmed: Vec<&str> = blocks
        .iter()
        .map(|b| b.trim_end_matches('\n'))
        .filter(|b| !b.is_empty())
        .collect();
    let mut content = trimmed.join(separator);
    content.push('\n');

    match line_ending {
        LineEnding::Lf => content,
        LineEnding::CrLf => content.replace('\n', LineEnding::CrLf.as_str()),
    }
}
