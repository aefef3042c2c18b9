//! End-to-end generator tests: plan real source text, emit artifacts, and
//! check the emitted code's structure.

use borshgen_codegen::{generate_from_file, generate_from_source};
use borshgen_parse::GeneratorOptions;

const EVENT_SRC: &str = r#"
/// Application event.
/// borshgen
pub struct Event {
    /// bin:"id" enc:""
    pub id: i64,
    /// bin:"ts" enc:""
    pub ts: u64,
    /// bin:"data"
    pub data: Vec<u8>,
    /// bin:"flag" enc:""
    pub flag: bool,
    /// bin:"tags" enc:""
    pub tags: Vec<String>,
    /// bin:"opt_counter" enc:""
    pub opt_counter: Option<i32>,
}
"#;

const EVENT_SRC_REVERSED: &str = r#"
/// Application event, fields textually reversed.
/// borshgen
pub struct Event {
    /// bin:"opt_counter" enc:""
    pub opt_counter: Option<i32>,
    /// bin:"tags" enc:""
    pub tags: Vec<String>,
    /// bin:"flag" enc:""
    pub flag: bool,
    /// bin:"data"
    pub data: Vec<u8>,
    /// bin:"ts" enc:""
    pub ts: u64,
    /// bin:"id" enc:""
    pub id: i64,
}
"#;

fn generate(src: &str) -> String {
    generate_from_source("events", src, &GeneratorOptions::default(), 1234).expect("generate")
}

fn encode_body(artifact: &str) -> &str {
    let start = artifact.find("pub fn encode").expect("encode emitted");
    let end = artifact[start..].find("Ok(out)").expect("encode body ends") + start;
    &artifact[start..end]
}

#[test]
fn test_all_four_operations_emitted() {
    let artifact = generate(EVENT_SRC);
    assert!(artifact.contains("impl Event {"));
    assert!(artifact.contains("pub fn binary_size(&self) -> usize"));
    assert!(artifact.contains("pub fn marshal_binary(&self) -> Result<Vec<u8>, FormatError>"));
    assert!(artifact.contains("pub fn unmarshal_binary(&mut self, data: &[u8])"));
    assert!(artifact.contains("pub fn encode(&self) -> Result<Vec<u8>, FormatError>"));
}

#[test]
fn test_artifact_header_and_imports() {
    let artifact = generate(EVENT_SRC);
    assert!(artifact.starts_with("// Code generated by borshgen. DO NOT EDIT."));
    assert!(artifact.contains("use super::borshgen_common_1234_gen::*;"));
    assert!(artifact.contains("use super::borshgen_encoders_1234_gen::*;"));
    assert!(artifact.contains("use super::events::*;"));
}

#[test]
fn test_pooled_marshal_copies_out() {
    let artifact = generate(EVENT_SRC);
    assert!(artifact.contains("scratch_pool().acquire()"));
    assert!(artifact.contains("scratch.as_slice().to_vec()"));
    assert!(artifact.contains("scratch_pool().release(scratch)"));
}

#[test]
fn test_no_pool_directive_skips_pooling() {
    let src = EVENT_SRC.replace("/// borshgen", "/// borshgen -no-pool");
    let artifact = generate(&src);
    assert!(!artifact.contains("scratch_pool()"));
    assert!(artifact.contains("Vec::with_capacity(self.binary_size())"));
}

#[test]
fn test_unmarshal_guards_and_trailing_bytes() {
    let artifact = generate(EVENT_SRC);
    assert!(artifact.contains("ensure_consumed(offset, data.len())?;"));
    // Locals decode first, receiver assigned at the end.
    let assign = artifact.find("self.id = f_id;").expect("assignment");
    let consumed = artifact.find("ensure_consumed").expect("guard");
    assert!(consumed < assign);
}

#[test]
fn test_digest_skips_untagged_and_sorts_by_wire_name() {
    let artifact = generate(EVENT_SRC);
    let body = encode_body(&artifact);
    assert!(!body.contains("self.data"), "data has no digest tag");
    let order: Vec<usize> = ["// flag (flag)", "// id (id)", "// opt_counter (opt_counter)", "// tags (tags)", "// ts (ts)"]
        .iter()
        .map(|needle| body.find(needle).expect("digest field present"))
        .collect();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted, "digest fields emitted in wire-name order");
}

#[test]
fn test_digest_has_no_length_prefixes() {
    let artifact = generate(EVENT_SRC);
    let body = encode_body(&artifact);
    assert!(!body.contains("put_count"));
    assert!(!body.contains("put_bytes"));
}

#[test]
fn test_field_reordering_changes_marshal_but_not_encode() {
    let a = generate(EVENT_SRC);
    let b = generate(EVENT_SRC_REVERSED);
    assert_eq!(encode_body(&a), encode_body(&b));
    assert_ne!(a, b, "wire order follows declaration order");
}

#[test]
fn test_pointer_presence_byte() {
    let artifact = generate(EVENT_SRC);
    assert!(artifact.contains("put_u8(buf, 1);"));
    assert!(artifact.contains("None => put_u8(buf, 0),"));
}

#[test]
fn test_zero_copy_view_emitted_on_request() {
    let plain = generate(EVENT_SRC);
    assert!(!plain.contains("EventView"));

    let src = EVENT_SRC.replace("/// borshgen", "/// borshgen -zero-copy");
    let with_view = generate(&src);
    assert!(with_view.contains("pub struct EventView<'a>"));
    assert!(with_view.contains("fn field_offset"));
    assert!(with_view.contains("pub fn to_struct"));
    // Safe mode copies strings out.
    assert!(!with_view.contains("from_utf8_unchecked"));
}

#[test]
fn test_unsafe_view_aliases_strings() {
    let src = r#"
/// borshgen -zero-copy -unsafe
pub struct Named {
    /// bin:"name"
    pub name: String,
}
"#;
    let artifact = generate(src);
    assert!(artifact.contains("from_utf8_unchecked"));
    assert!(artifact.contains("Result<&'a str, FormatError>"));
}

#[test]
fn test_custom_encoder_field() {
    let src = r#"
/// borshgen
pub struct Stamped {
    /// bin:"when" enc:""
    pub when: chrono::DateTime<chrono::Utc>,
    /// bin:"id,uuid"
    pub id: uuid::Uuid,
}
"#;
    let artifact = generate(src);
    assert!(artifact.contains("ENCODER_TIMESTAMP.marshal_binary"));
    assert!(artifact.contains("ENCODER_UUID.marshal_binary"));
    assert!(artifact.contains("downcast::<chrono::DateTime<chrono::Utc>>()"));
}

#[test]
fn test_nested_slice_of_slices() {
    let src = r#"
/// borshgen
pub struct Grid {
    /// bin:"rows"
    pub rows: Vec<Vec<String>>,
}
"#;
    let artifact = generate(src);
    // Both levels carry their own count prefix.
    let first = artifact.find("put_count(buf, (self.rows).len()").expect("outer count");
    let second = artifact[first + 1..]
        .find("put_count(buf, ((*v")
        .expect("inner count");
    assert!(second > 0);
}

#[test]
fn test_fixed_array_has_no_prefix() {
    let src = r#"
/// borshgen
pub struct Keyed {
    /// bin:"key"
    pub key: [u8; 32],
}
"#;
    let artifact = generate(src);
    assert!(artifact.contains("buf.extend_from_slice(&(self.key));"));
    assert!(artifact.contains("size += 32;"));
    assert!(!artifact.contains("put_count"));
}

#[test]
fn test_ignored_field_never_appears() {
    let src = r#"
/// borshgen
pub struct R {
    /// bin:"-"
    pub secret: String,
    /// bin:"kept"
    pub kept: u32,
}
"#;
    let artifact = generate(src);
    assert!(!artifact.contains("secret"));
    assert!(artifact.contains("self.kept"));
}

#[test]
fn test_generate_on_disk_writes_three_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("events.rs");
    std::fs::write(&input, EVENT_SRC).expect("write input");

    let artifacts =
        generate_from_file(&input, &GeneratorOptions::default()).expect("generate");
    assert!(artifacts.record_file.exists());
    assert!(artifacts.common_file.exists());
    assert!(artifacts.encoders_file.exists());

    let record_name = artifacts.record_file.file_name().unwrap().to_string_lossy();
    assert!(record_name.starts_with("events_borshgen_"));
    assert!(record_name.ends_with("_gen.rs"));

    // Overwrite is idempotent.
    let first = std::fs::read_to_string(&artifacts.record_file).expect("read");
    let again = generate_from_file(&input, &GeneratorOptions::default()).expect("regenerate");
    let second = std::fs::read_to_string(&again.record_file).expect("read");
    assert_eq!(first, second);
}

#[test]
fn test_no_eligible_records_is_warning_kind() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("plain.rs");
    std::fs::write(&input, "pub struct Plain { pub x: u8 }").expect("write input");

    let err = generate_from_file(&input, &GeneratorOptions::default()).expect_err("no records");
    assert!(err.is_no_records());
}
