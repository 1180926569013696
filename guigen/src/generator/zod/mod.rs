//! Zod schema generator.
//!
//! This module implements the Zod schema code generator that transforms
//! the Definition Table into TypeScript Zod schema code.
//!
//! # Components
//!
//! - [`ZodEmitter`] - The main code generator implementing [`CodeGenerator`](crate::generator::CodeGenerator)
//! - [`ZodTypeMapper`] - Maps property shapes to Zod schema strings

pub mod emitter;
pub mod type_mapper;

pub use emitter::ZodEmitter;
pub use type_mapper::ZodTypeMapper;
