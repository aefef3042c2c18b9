//! Convenience re-exports for common borshgen usage.
//!
//! ```ignore
//! use borshgen::prelude::*;
//! ```

pub use borshgen_codegen::{Artifacts, CodegenError, Generator, generate_file};
pub use borshgen_core::{FieldEncoder, FormatError, FormatResult, scratch_pool};
pub use borshgen_parse::{
    BasicType, EncoderId, FieldPlan, GeneratorOptions, ParseError, PlanSet, RecordPlan,
    ResolveError, Shape, SourceSet, TypeNode, plan_file, plan_source_set,
};
