//! # borshgen Core
//!
//! Runtime support for borshgen-generated codecs.
//!
//! This crate provides:
//! - The format-error type and bounds-checked read/write helpers generated
//!   code calls into
//! - The process-wide scratch-buffer pool used by pooled `marshal_binary`
//! - The custom-encoder contract and the built-in encoder set (byte-slice,
//!   raw-JSON, timestamp, UUID)
//! - The embedded sources of both shared per-directory artifacts
//!
//! The modules under [`runtime`] are compiled and tested here, and their
//! source text is exported as [`HELPERS_SRC`] and [`ENCODERS_SRC`] so the
//! emitter can write them next to generated code. Generated artifacts are
//! self-contained: they reference the emitted copies, never this crate.

pub mod runtime;

pub use runtime::encoders::{
    ByteSliceEncoder, FieldEncoder, RawJsonEncoder, TimestampEncoder, UuidEncoder,
    ENCODER_BYTES, ENCODER_JSON, ENCODER_TIMESTAMP, ENCODER_UUID,
};
pub use runtime::helpers::{FormatError, FormatResult, ScratchPool, scratch_pool};

/// Source text of the shared helper artifact, emitted once per output
/// directory as `borshgen_common_<hash>_gen.rs`.
pub const HELPERS_SRC: &str = include_str!("runtime/helpers.rs");

/// Source text of the shared custom-encoder artifact, emitted once per
/// output directory as `borshgen_encoders_<hash>_gen.rs`.
pub const ENCODERS_SRC: &str = include_str!("runtime/encoders.rs");
