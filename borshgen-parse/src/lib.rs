//! # borshgen Parse
//!
//! Source scanning, type resolution and field planning for borshgen.
//!
//! This crate provides:
//! - Generator directive detection and the per-record options bundle
//! - Field metadata tag parsing
//! - The type resolver producing per-field resolved type chains
//! - The field planner producing per-field encoding plans and the digest
//!   field order
//!
//! The pipeline stages here feed `borshgen-codegen`, which turns record
//! plans into emitted artifacts.

pub mod error;
pub mod options;
pub mod plan;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod tags;

pub use error::{ParseError, ResolveError};
pub use options::GeneratorOptions;
pub use plan::{FieldPlan, PlanSet, RecordPlan, Shape, plan_source_set};
pub use registry::EncoderId;
pub use resolver::{BasicType, Resolver, TypeNode};
pub use source::{RecordDecl, SourceSet};
pub use tags::{FieldTag, TagMap, extract_field_tag};

use std::path::Path;

/// Loads an input file and plans every eligible record in it.
///
/// # Arguments
/// * `path` - Input `.rs` file
/// * `base` - Invocation-level options that record directives override
///
/// # Errors
/// Returns `ParseError` when the file cannot be read or parsed, contains no
/// eligible records, or a field cannot be resolved.
pub fn plan_file(path: &Path, base: &GeneratorOptions) -> Result<PlanSet, ParseError> {
    let set = SourceSet::load(path, base)?;
    plan_source_set(&set, base)
}
