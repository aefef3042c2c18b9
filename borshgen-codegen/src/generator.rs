//! Artifact orchestration.
//!
//! One artifact is written per input file, holding every eligible record's
//! operations. Two shared artifacts are written once per output directory:
//! the helper artifact (format error, cursor helpers, scratch pool, caps)
//! and the custom-encoder artifact, both rendered from the embedded
//! `borshgen-core` runtime sources with their module headers rewritten.
//! Artifact names carry a hash suffix derived from the directory base name
//! so outputs from different directories never collide.

use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

use tracing::info;
use twox_hash::XxHash64;

use borshgen_core::{ENCODERS_SRC, HELPERS_SRC};
use borshgen_parse::{GeneratorOptions, PlanSet, RecordPlan, plan_file};

use crate::error::CodegenError;
use crate::rust::{
    DigestGenerator, MarshalGenerator, SizeGenerator, UnmarshalGenerator, ViewGenerator,
};

/// Paths of everything one invocation wrote.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// Per-file codec artifact.
    pub record_file: PathBuf,
    /// Shared helper artifact for the directory.
    pub common_file: PathBuf,
    /// Shared custom-encoder artifact for the directory.
    pub encoders_file: PathBuf,
}

/// Generator for one planned input file.
pub struct Generator<'a> {
    plans: &'a PlanSet,
    hash: u64,
}

impl<'a> Generator<'a> {
    /// Creates a generator over a plan set.
    ///
    /// # Arguments
    /// * `plans` - Planned records of one input file
    /// * `hash` - Directory hash used in sibling artifact names
    #[must_use]
    pub fn new(plans: &'a PlanSet, hash: u64) -> Self {
        Self { plans, hash }
    }

    /// Generates the per-file artifact source (untrimmed).
    ///
    /// # Errors
    /// Returns `CodegenError` when a record cannot be emitted; no partial
    /// output for that record is produced.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let stem = &self.plans.target_stem;
        let common = common_module(self.hash);
        let encoders = encoders_module(self.hash);
        let own_module = artifact_module(stem, self.hash);

        let mut out = String::new();
        out.push_str("// Code generated by borshgen. DO NOT EDIT.\n");
        out.push_str("//\n");
        out.push_str(&format!(
            "// Declare this artifact and the shared artifacts as sibling modules\n\
             // of `{stem}`:\n"
        ));
        out.push_str(&format!("//     mod {common};\n"));
        out.push_str(&format!("//     mod {encoders};\n"));
        out.push_str(&format!("//     mod {own_module};\n"));
        out.push('\n');
        out.push_str("#![allow(dead_code, unused_imports, unused_variables, clippy::all)]\n");
        out.push('\n');
        out.push_str(&format!("use super::{common}::*;\n"));
        out.push_str(&format!("use super::{encoders}::*;\n"));
        out.push_str(&format!("use super::{stem}::*;\n"));
        for package in &self.plans.external_packages {
            out.push_str(&format!("use {package};\n"));
        }
        out.push('\n');

        for record in &self.plans.records {
            out.push_str(&self.generate_record(record)?);
            out.push('\n');
        }

        Ok(out)
    }

    fn generate_record(&self, record: &RecordPlan) -> Result<String, CodegenError> {
        // Every operation must emit before anything is kept: a failing
        // record yields a diagnostic, not partial output.
        let size = SizeGenerator::new(record).generate()?;
        let marshal = MarshalGenerator::new(record).generate()?;
        let unmarshal = UnmarshalGenerator::new(record).generate()?;
        let digest = DigestGenerator::new(record).generate()?;
        let view = if record.options.zero_copy {
            Some(ViewGenerator::new(record).generate()?)
        } else {
            None
        };

        let mut out = String::new();
        out.push_str(&format!("impl {} {{\n", record.name));
        out.push_str(&size);
        out.push('\n');
        out.push_str(&marshal);
        out.push('\n');
        out.push_str(&unmarshal);
        out.push('\n');
        out.push_str(&digest);
        out.push_str("}\n");
        if let Some(view) = view {
            out.push('\n');
            out.push_str(&view);
        }
        Ok(out)
    }
}

/// Hash suffix for a directory, derived from its base name.
#[must_use]
pub fn dir_hash(dir: &Path) -> u64 {
    let base = dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(base.as_bytes());
    hasher.finish() % 10_000_000_000
}

/// Module name of the shared helper artifact.
#[must_use]
pub fn common_module(hash: u64) -> String {
    format!("borshgen_common_{hash}_gen")
}

/// Module name of the shared custom-encoder artifact.
#[must_use]
pub fn encoders_module(hash: u64) -> String {
    format!("borshgen_encoders_{hash}_gen")
}

/// Module name of the per-file artifact.
#[must_use]
pub fn artifact_module(stem: &str, hash: u64) -> String {
    format!("{stem}_borshgen_{hash}_gen")
}

/// Renders the helper artifact: embedded source with the configured caps
/// baked into its constants and the in-tree test module dropped.
#[must_use]
pub fn render_helper_artifact(options: &GeneratorOptions) -> String {
    let mut out = String::from("// Code generated by borshgen. DO NOT EDIT.\n\n");
    for line in strip_tests(HELPERS_SRC).lines() {
        if line.starts_with("pub const MAX_STRING_LEN: usize =") {
            out.push_str(&format!(
                "pub const MAX_STRING_LEN: usize = {};\n",
                options.max_string_len
            ));
        } else if line.starts_with("pub const MAX_SLICE_LEN: usize =") {
            out.push_str(&format!(
                "pub const MAX_SLICE_LEN: usize = {};\n",
                options.max_slice_len
            ));
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Renders the custom-encoder artifact: embedded source with its helper
/// import rewritten to the directory's helper module.
#[must_use]
pub fn render_encoder_artifact(hash: u64) -> String {
    let common = common_module(hash);
    let mut out = String::from(
        "// Code generated by borshgen. DO NOT EDIT.\n\
         //\n\
         // Requires the `chrono`, `uuid` and `serde_json` crates in the host crate.\n\n",
    );
    out.push_str(
        &strip_tests(ENCODERS_SRC).replace("use super::helpers::", &format!("use super::{common}::")),
    );
    out
}

fn strip_tests(src: &str) -> String {
    match src.find("#[cfg(test)]") {
        Some(i) => src[..i].trim_end().to_string() + "\n",
        None => src.to_string(),
    }
}

/// Whitespace trim pass: drops blank lines unless the next line is a
/// comment.
#[must_use]
pub fn trim(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut cleaned = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            if lines
                .get(i + 1)
                .is_some_and(|next| next.trim_start().starts_with("//"))
            {
                cleaned.push(*line);
            }
        } else {
            cleaned.push(*line);
        }
    }
    let mut out = cleaned.join("\n");
    out.push('\n');
    out
}

/// Generates every artifact for one input file.
///
/// # Arguments
/// * `input` - Input `.rs` file
/// * `base` - Invocation-level options
///
/// # Errors
/// Returns `CodegenError::Parse(ParseError::NoEligibleRecords)` when the
/// file has nothing to generate (callers treat it as a warning), or any
/// other error for real failures.
pub fn generate_file(input: &Path, base: &GeneratorOptions) -> Result<Artifacts, CodegenError> {
    let plans = plan_file(input, base)?;
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let hash = dir_hash(dir);

    let common_file = dir.join(format!("{}.rs", common_module(hash)));
    fs::write(&common_file, render_helper_artifact(base))
        .map_err(|e| CodegenError::io(common_file.display().to_string(), e))?;

    let encoders_file = dir.join(format!("{}.rs", encoders_module(hash)));
    fs::write(&encoders_file, render_encoder_artifact(hash))
        .map_err(|e| CodegenError::io(encoders_file.display().to_string(), e))?;

    let content = Generator::new(&plans, hash).generate()?;
    let record_file = dir.join(format!("{}.rs", artifact_module(&plans.target_stem, hash)));
    fs::write(&record_file, trim(&content))
        .map_err(|e| CodegenError::io(record_file.display().to_string(), e))?;

    info!(
        input = %input.display(),
        artifact = %record_file.display(),
        records = plans.records.len(),
        "generated binary codec artifact"
    );
    for record in &plans.records {
        info!(
            record = %record.name,
            fields = record.fields.len(),
            digest_fields = record.digest_order.len(),
            pooling = record.options.use_pooling,
            zero_copy = record.options.zero_copy,
            "record emitted"
        );
    }

    Ok(Artifacts {
        record_file,
        common_file,
        encoders_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_hash_stable_and_bounded() {
        let a = dir_hash(Path::new("/tmp/project/models"));
        let b = dir_hash(Path::new("/elsewhere/models"));
        assert_eq!(a, b, "hash depends on the base name only");
        assert!(a < 10_000_000_000);
        assert_ne!(a, dir_hash(Path::new("/tmp/project/other")));
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(common_module(42), "borshgen_common_42_gen");
        assert_eq!(encoders_module(42), "borshgen_encoders_42_gen");
        assert_eq!(artifact_module("events", 42), "events_borshgen_42_gen");
    }

    #[test]
    fn test_trim_drops_blank_lines() {
        let src = "a\n\nb\n\n// comment\nc\n";
        assert_eq!(trim(src), "a\nb\n\n// comment\nc\n");
    }

    #[test]
    fn test_helper_artifact_constants_rewritten() {
        let options = GeneratorOptions {
            max_string_len: 1024,
            max_slice_len: 16,
            ..GeneratorOptions::default()
        };
        let rendered = render_helper_artifact(&options);
        assert!(rendered.starts_with("// Code generated by borshgen. DO NOT EDIT."));
        assert!(rendered.contains("pub const MAX_STRING_LEN: usize = 1024;"));
        assert!(rendered.contains("pub const MAX_SLICE_LEN: usize = 16;"));
        assert!(!rendered.contains("#[cfg(test)]"));
        assert!(rendered.contains("pub enum FormatError"));
        assert!(rendered.contains("pub fn scratch_pool()"));
    }

    #[test]
    fn test_encoder_artifact_header_rewritten() {
        let rendered = render_encoder_artifact(7);
        assert!(rendered.contains("use super::borshgen_common_7_gen::"));
        assert!(!rendered.contains("use super::helpers::"));
        assert!(!rendered.contains("#[cfg(test)]"));
        assert!(rendered.contains("pub trait FieldEncoder"));
        assert!(rendered.contains("ENCODER_UUID"));
    }
}
