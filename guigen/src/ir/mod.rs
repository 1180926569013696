//! Intermediate Representation (IR) module.
//!
//! This module defines the in-memory form of a UI schema document: the
//! Definition Table, its enum / object / union / alias definitions, and the
//! property shapes and constraints those definitions are built from. The IR
//! is target-agnostic and is consumed by every code generator backend.

pub mod constraints;
pub mod definition;
pub mod property;

pub use constraints::Constraints;
pub use definition::{
    AliasDef, Definition, DefinitionKind, DefinitionTable, EnumDef, ObjectDef, SchemaRoot,
    UnionDef,
};
pub use property::{PrimitiveKind, PropertySpec, Shape};
