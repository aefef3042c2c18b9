//! # borshgen
//!
//! Source-level generator of compact deterministic binary codecs.
//!
//! borshgen scans Rust source files for record structs that opt in through
//! a `/// borshgen [options]` doc directive and emits, per record, four
//! operations:
//!
//! - `binary_size` — exact wire size without serializing
//! - `marshal_binary` — declaration-ordered, length-prefixed serializer
//! - `unmarshal_binary` — strict deserializer (short buffers, oversize
//!   lengths and trailing bytes are format errors)
//! - `encode` — deterministic digest stream over the tag-marked fields,
//!   sorted by wire name and independent of declaration order
//!
//! plus an optional zero-copy view type.
//!
//! ## Quick Start
//!
//! ```ignore
//! use borshgen::prelude::*;
//!
//! let options = GeneratorOptions::default();
//! let artifacts = generate_file(Path::new("src/events.rs"), &options)?;
//! println!("wrote {}", artifacts.record_file.display());
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Runtime helpers, format errors, custom-encoder contract
//! - [`parse`] - Directive/tag parsing, type resolution, field planning
//! - [`codegen`] - Artifact emission and output layout

pub mod prelude;

/// Runtime support and embedded shared artifacts.
pub mod core {
    pub use borshgen_core::*;
}

/// Source scanning, type resolution and field planning.
pub mod parse {
    pub use borshgen_parse::*;
}

/// Codec artifact emission.
pub mod codegen {
    pub use borshgen_codegen::*;
}

// Re-export commonly used items at the crate root
pub use borshgen_codegen::{Artifacts, CodegenError, generate_file, generate_from_source};
pub use borshgen_core::{FieldEncoder, FormatError, FormatResult};
pub use borshgen_parse::{
    GeneratorOptions, ParseError, PlanSet, RecordPlan, ResolveError, Shape, plan_file,
};
