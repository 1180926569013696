//! # guigen
//!
//! Code generation from a JSON-Schema UI component IR.
//!
//! A UI schema document (`$defs` of enums, records and discriminated unions,
//! plus a top-level `metadata` / `root` pair) is loaded into a
//! [`DefinitionTable`](ir::DefinitionTable), planned into a dependency-safe
//! emission order and rendered by a target backend as one self-contained
//! source unit:
//!
//! - **Pydantic** v2 models for Python
//! - **Zod** schemas for TypeScript
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guigen::{generate, generator_for, load_file, GeneratorConfig, SchemaRoot, Target};
//!
//! let table = load_file("ui-schema.json".as_ref(), &SchemaRoot::default())?;
//! let generator = generator_for(Target::Pydantic);
//! let unit = generate(&table, generator.as_ref(), &GeneratorConfig::default())?;
//! std::fs::write("ui_schema.py", unit.content)?;
//! ```
//!
//! ## Modules
//!
//! - [`loader`] - schema document parsing into the IR
//! - [`ir`] - the Definition Table and property shapes
//! - [`plan`] - dependency graph, cycles and section ordering
//! - [`generator`] - the target backends
//! - [`assemble`] - header, declarations and trailer in one unit
//! - [`rewrite`] - repair pass for Pydantic files from external generators
//! - [`canonical`] - canonical text of schema instances

pub mod assemble;
pub mod bindings;
pub mod canonical;
pub mod error;
pub mod generator;
pub mod ir;
pub mod loader;
pub mod naming;
pub mod plan;
pub mod rewrite;

// Re-export main types for convenience
pub use assemble::{generate, GeneratedUnit};
pub use canonical::to_canonical_text;
pub use error::{CanonicalError, GenerateError, RewriteError, SchemaError};
pub use generator::{generator_for, CodeGenerator, GeneratorConfig, IndentStyle, LineEnding, Target};
pub use ir::{DefinitionTable, SchemaRoot};
pub use loader::{load_file, load_str};
pub use plan::{Section, SectionOrder};
pub use rewrite::{RewriteGroup, RewriteReport, Rewriter};
