//! Pydantic model generator.
//!
//! This module implements the Pydantic v2 code generator that transforms
//! the Definition Table into a Python module of enums, models and unions.
//!
//! # Components
//!
//! - [`PydanticEmitter`] - The main code generator implementing [`CodeGenerator`](crate::generator::CodeGenerator)
//! - [`PydanticTypeMapper`] - Maps property shapes to Python type expressions

pub mod emitter;
pub mod type_mapper;

pub use emitter::PydanticEmitter;
pub use type_mapper::{PyType, PydanticTypeMapper};
