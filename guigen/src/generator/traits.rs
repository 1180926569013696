//! Code generator trait definition.
//!
//! This module defines the `CodeGenerator` trait that every target backend
//! implements. The assembler drives a generator through the planned
//! declarations, then asks it for the prologue, the forward reference
//! resolution block, the top-level schema type and the export trailer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::ir::{Definition, DefinitionTable, SchemaRoot};
use crate::plan::{Plan, PlannedDefinition, Section, SectionOrder};

/// Version marker used when neither the configuration nor the document has one.
pub const DEFAULT_VERSION: &str = "0.1.0";

/// Trait for target code generators.
///
/// Implement this trait to add support for a new target language. Each
/// generator renders one declaration per planned definition; ordering,
/// section banners and file layout are handled by the assembler.
pub trait CodeGenerator: Send + Sync {
    /// Returns the unique identifier for this generator (e.g. "pydantic").
    fn id(&self) -> &'static str;

    /// Returns the human-readable name of this generator.
    fn name(&self) -> &'static str;

    /// Returns the file extension for generated files.
    fn file_extension(&self) -> &'static str;

    /// Default indentation when the configuration does not set one.
    fn default_indent(&self) -> IndentStyle;

    /// One indentation unit: the configured style, else [`Self::default_indent`].
    fn indent(&self, config: &GeneratorConfig) -> &'static str {
        config.indent.unwrap_or(self.default_indent()).as_str()
    }

    /// Text placed between two top-level blocks.
    fn block_separator(&self) -> &'static str;

    /// Render the declaration for one planned definition.
    fn generate(
        &self,
        definition: &Definition,
        ctx: &EmitContext<'_>,
    ) -> Result<Declaration, GenerateError>;

    /// Render the top-level schema type: `metadata` and `root` fields plus
    /// the serialize-to-text operation.
    fn generate_schema_type(
        &self,
        table: &DefinitionTable,
        plan: &Plan,
        config: &GeneratorConfig,
    ) -> Result<Declaration, GenerateError>;

    /// Statements that resolve forward references once every declaration
    /// exists. `None` when the target needs none.
    fn generate_forward_resolution(&self, plan: &Plan, config: &GeneratorConfig) -> Option<String>;

    /// Generate the module header: description, version marker and imports.
    fn generate_preamble(
        &self,
        root: &SchemaRoot,
        imports: &Imports,
        config: &GeneratorConfig,
    ) -> Result<String, GenerateError>;

    /// Generate the public export list, grouped by category.
    fn generate_postamble(
        &self,
        declarations: &[Declaration],
        config: &GeneratorConfig,
    ) -> Result<String, GenerateError>;

    /// Section banner comment.
    fn banner(&self, title: &str) -> String;
}

/// Context handed to [`CodeGenerator::generate`].
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub table: &'a DefinitionTable,
    pub plan: &'a Plan,
    /// The definition being rendered
    pub planned: &'a PlannedDefinition,
    pub config: &'a GeneratorConfig,
}

impl EmitContext<'_> {
    /// Whether a reference to `name` must use forward-reference syntax.
    pub fn is_forward(&self, name: &str) -> bool {
        self.planned.is_forward(name)
    }

    /// Whether the declaration of `name` itself carries forward references.
    pub fn has_forward_refs(&self, name: &str) -> bool {
        self.plan
            .get(name)
            .is_some_and(|item| !item.forward_refs.is_empty())
    }
}

/// Supported target languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Python, Pydantic v2 models
    #[default]
    Pydantic,

    /// TypeScript, Zod schemas
    Zod,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Pydantic => "pydantic",
            Target::Zod => "zod",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pydantic" | "python" => Ok(Target::Pydantic),
            "zod" | "typescript" => Ok(Target::Zod),
            other => Err(format!(
                "unknown target '{}' (expected 'pydantic' or 'zod')",
                other
            )),
        }
    }
}

/// Generator configuration options.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Version marker for the generated header; falls back to the
    /// document's `version`, then [`DEFAULT_VERSION`]
    pub version: Option<String>,

    /// Whether to render descriptions as docstrings / doc comments
    pub generate_docs: bool,

    /// Indentation style; `None` uses the generator's default
    pub indent: Option<IndentStyle>,

    /// Line ending style
    pub line_ending: LineEnding,

    /// Section emission order
    pub sections: SectionOrder,

    /// Emit the "reject unknown fields" directive on strict records
    pub forbid_extra: bool,

    /// Type tuple-list aliases as lists of the matching binding record
    pub binding_records: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            version: None,
            generate_docs: true,
            indent: None,
            line_ending: LineEnding::default(),
            sections: SectionOrder::default(),
            forbid_extra: false,
            binding_records: true,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_generate_docs(mut self, generate: bool) -> Self {
        self.generate_docs = generate;
        self
    }

    pub fn with_indent(mut self, indent: IndentStyle) -> Self {
        self.indent = Some(indent);
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_sections(mut self, sections: SectionOrder) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_forbid_extra(mut self, forbid: bool) -> Self {
        self.forbid_extra = forbid;
        self
    }

    pub fn with_binding_records(mut self, enabled: bool) -> Self {
        self.binding_records = enabled;
        self
    }

    /// Version marker for a document described by `root`.
    pub fn resolved_version<'a>(&'a self, root: &'a SchemaRoot) -> &'a str {
        self.version
            .as_deref()
            .or(root.version.as_deref())
            .unwrap_or(DEFAULT_VERSION)
    }
}

/// Indentation style for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndentStyle {
    /// Two spaces
    #[default]
    #[serde(rename = "2")]
    Spaces2,

    /// Four spaces
    #[serde(rename = "4")]
    Spaces4,

    /// Tabs
    #[serde(rename = "tab")]
    Tabs,
}

impl IndentStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentStyle::Spaces2 => "  ",
            IndentStyle::Spaces4 => "    ",
            IndentStyle::Tabs => "\t",
        }
    }
}

/// Line ending style for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,

    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Target constructs a declaration uses, grouped by the module that
/// provides them (`typing` → {`List`, `Optional`}, ...).
///
/// The header import list is the union of every declaration's imports, so
/// it names exactly what the generated unit uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Imports(BTreeMap<&'static str, BTreeSet<&'static str>>);

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: &'static str, name: &'static str) {
        self.0.entry(module).or_default().insert(name);
    }

    pub fn merge(&mut self, other: &Imports) {
        for (module, names) in &other.0 {
            self.0.entry(module).or_default().extend(names.iter().copied());
        }
    }

    /// Names imported from `module`, sorted.
    pub fn names(&self, module: &str) -> Vec<&'static str> {
        self.0
            .get(module)
            .map(|names| names.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.0.get(module).is_some_and(|names| names.contains(name))
    }

    pub fn modules(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

/// One rendered declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Definition the declaration was derived from
    pub name: String,

    /// Emission category
    pub section: Section,

    /// Export list category
    pub export_group: Section,

    /// Source text, without trailing newline
    pub code: String,

    /// Referenced definitions
    pub dependencies: Vec<String>,

    /// References emitted with forward-reference syntax
    pub forward_refs: BTreeSet<String>,

    /// Target constructs used by `code`
    pub imports: Imports,
}

impl Declaration {
    pub fn new(name: impl Into<String>, section: Section, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section,
            export_group: section,
            code: code.into(),
            dependencies: Vec::new(),
            forward_refs: BTreeSet::new(),
            imports: Imports::new(),
        }
    }

    /// Declaration for a planned definition, carrying its plan metadata.
    pub fn planned(planned: &PlannedDefinition, code: impl Into<String>, imports: Imports) -> Self {
        Self {
            name: planned.name.clone(),
            section: planned.section,
            export_group: planned.export_group,
            code: code.into(),
            dependencies: planned.dependencies.clone(),
            forward_refs: planned.forward_refs.clone(),
            imports,
        }
    }

    pub fn with_imports(mut self, imports: Imports) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = deps;
        self
    }
}

/// Public export categories, in trailer order, with their headings.
pub const EXPORT_GROUPS: [(Section, &str); 5] = [
    (Section::Enums, "Enums"),
    (Section::Actions, "Actions"),
    (Section::Props, "Props"),
    (Section::Components, "Components"),
    (Section::Schema, "Schema"),
];
