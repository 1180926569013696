//! Code generator module.
//!
//! This module defines the code generator trait and the backends for each
//! supported target.

pub mod pydantic;
pub mod traits;
pub mod zod;

pub use pydantic::PydanticEmitter;
pub use traits::{
    CodeGenerator, Declaration, EmitContext, GeneratorConfig, Imports, IndentStyle, LineEnding,
    Target, DEFAULT_VERSION, EXPORT_GROUPS,
};
pub use zod::ZodEmitter;

/// The generator for `target`.
pub fn generator_for(target: Target) -> Box<dyn CodeGenerator> {
    match target {
        Target::Pydantic => Box::new(PydanticEmitter::new()),
        Target::Zod => Box::new(ZodEmitter::new()),
    }
}
