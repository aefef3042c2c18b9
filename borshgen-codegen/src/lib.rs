//! # borshgen Codegen
//!
//! Codec artifact emission for borshgen.
//!
//! This crate provides:
//! - Per-record generation of the four codec operations (`binary_size`,
//!   `marshal_binary`, `unmarshal_binary`, `encode`) and the optional
//!   zero-copy view
//! - Artifact layout: per-file artifacts plus shared per-directory helper
//!   and custom-encoder artifacts, hash-suffixed and overwritten
//!   idempotently
//! - The whitespace trim pass applied to emitted sources

pub mod error;
pub mod generator;
pub mod rust;

pub use error::CodegenError;
pub use generator::{Artifacts, Generator, generate_file};

use std::path::Path;

use borshgen_parse::GeneratorOptions;

/// Generates the per-file artifact source for in-memory input, without
/// touching the filesystem. Intended for tests and tooling.
///
/// # Arguments
/// * `target_stem` - Module name of the input file
/// * `source` - Input file content
/// * `base` - Invocation-level options
/// * `hash` - Directory hash used for sibling module names
///
/// # Errors
/// Returns `CodegenError` if parsing, planning or emission fails.
pub fn generate_from_source(
    target_stem: &str,
    source: &str,
    base: &GeneratorOptions,
    hash: u64,
) -> Result<String, CodegenError> {
    let set = borshgen_parse::SourceSet::from_sources(target_stem, source, &[], base)?;
    let plans = borshgen_parse::plan_source_set(&set, base)?;
    let content = Generator::new(&plans, hash).generate()?;
    Ok(generator::trim(&content))
}

/// Generates all artifacts for an input file on disk.
///
/// # Errors
/// Returns `CodegenError` if reading, planning, emission or writing fails.
pub fn generate_from_file(
    path: &Path,
    base: &GeneratorOptions,
) -> Result<Artifacts, CodegenError> {
    generate_file(path, base)
}
