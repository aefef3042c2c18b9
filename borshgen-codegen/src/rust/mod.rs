//! Rust artifact generation modules.

pub mod digest;
pub mod marshal;
pub mod size;
pub mod unmarshal;
pub mod view;

pub use digest::DigestGenerator;
pub use marshal::MarshalGenerator;
pub use size::SizeGenerator;
pub use unmarshal::UnmarshalGenerator;
pub use view::ViewGenerator;

use borshgen_parse::{BasicType, EncoderId, TypeNode};

/// Appends one indented line (4-space units).
pub(crate) fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str("    ");
    }
    out.push_str(text);
    out.push('\n');
}

/// Whether a node is a pure alias wrapper that every emitter descends
/// through.
pub(crate) fn is_alias(node: &TypeNode) -> bool {
    node.basic.is_none()
        && !node.is_slice
        && !node.is_fixed_array
        && !node.is_pointer
        && !node.is_struct
        && !node.is_imported
        && node.custom_encoder.is_none()
        && node.element.is_some()
}

/// Integer cast target for fixed-width basics, `None` for the rest.
pub(crate) fn int_cast(basic: BasicType) -> Option<&'static str> {
    match basic {
        BasicType::U8 | BasicType::I8 => Some("u8"),
        BasicType::U16 | BasicType::I16 => Some("u16"),
        BasicType::U32 | BasicType::I32 => Some("u32"),
        BasicType::U64 | BasicType::I64 => Some("u64"),
        _ => None,
    }
}

/// Helper-call suffix for the basic's fixed-width reader/writer.
pub(crate) fn width_fn(basic: BasicType) -> &'static str {
    match basic {
        BasicType::U8 | BasicType::I8 => "u8",
        BasicType::U16 | BasicType::I16 => "u16",
        BasicType::U32 | BasicType::I32 => "u32",
        BasicType::U64 | BasicType::I64 => "u64",
        BasicType::F32 => "f32",
        BasicType::F64 => "f64",
        BasicType::Bool => "bool",
        BasicType::Str | BasicType::Bytes => unreachable!("length-prefixed basic"),
    }
}

/// Wire-write statement for a basic value. `expr` must be a place
/// expression.
pub(crate) fn basic_put(basic: BasicType, expr: &str) -> String {
    match basic {
        BasicType::Str => format!("put_bytes(buf, ({expr}).as_bytes());"),
        BasicType::Bytes => format!("put_bytes(buf, &({expr}));"),
        BasicType::Bool => format!("put_bool(buf, {expr});"),
        BasicType::F32 => format!("put_f32(buf, {expr});"),
        BasicType::F64 => format!("put_f64(buf, {expr});"),
        _ => {
            let cast = int_cast(basic).expect("integer basic");
            format!("put_{}(buf, ({expr}) as {cast});", width_fn(basic))
        }
    }
}

/// Digest-write statement for a basic value: same byte form, no length
/// prefix on the variable-length kinds.
pub(crate) fn basic_digest(basic: BasicType, expr: &str) -> String {
    match basic {
        BasicType::Str => format!("buf.extend_from_slice(({expr}).as_bytes());"),
        BasicType::Bytes => format!("buf.extend_from_slice(&({expr}));"),
        _ => basic_put(basic, expr),
    }
}

/// Per-value wire cost of a basic, or `None` for length-prefixed kinds.
pub(crate) fn basic_fixed_size(basic: BasicType) -> Option<usize> {
    basic.fixed_size()
}

/// Emits statements reading a basic into `let {var}: {ty} = ...;`,
/// advancing `offset`.
pub(crate) fn basic_get(
    out: &mut String,
    depth: usize,
    basic: BasicType,
    var: &str,
    ty: &str,
    field: &str,
    counter: &mut usize,
) {
    *counter += 1;
    let n = *counter;
    match basic {
        BasicType::Str => {
            line(
                out,
                depth,
                &format!("let (raw{n}, next{n}) = get_string(data, offset, \"{field}\")?;"),
            );
            line(out, depth, &format!("offset = next{n};"));
            line(out, depth, &format!("let {var}: {ty} = raw{n};"));
        }
        BasicType::Bytes => {
            line(
                out,
                depth,
                &format!("let (raw{n}, next{n}) = get_bytes(data, offset, \"{field}\")?;"),
            );
            line(out, depth, &format!("offset = next{n};"));
            line(out, depth, &format!("let {var}: {ty} = raw{n}.to_vec();"));
        }
        BasicType::Bool | BasicType::F32 | BasicType::F64 => {
            line(
                out,
                depth,
                &format!(
                    "let (raw{n}, next{n}) = get_{}(data, offset, \"{field}\")?;",
                    width_fn(basic)
                ),
            );
            line(out, depth, &format!("offset = next{n};"));
            line(out, depth, &format!("let {var}: {ty} = raw{n};"));
        }
        _ => {
            let prim = basic.rust_name();
            line(
                out,
                depth,
                &format!(
                    "let (raw{n}, next{n}) = get_{}(data, offset, \"{field}\")?;",
                    width_fn(basic)
                ),
            );
            line(out, depth, &format!("offset = next{n};"));
            line(out, depth, &format!("let {var}: {ty} = raw{n} as {prim};"));
        }
    }
}

/// Static wire size of a chain when every component is fixed width, used to
/// collapse loops over fixed-size elements.
pub(crate) fn static_size(node: &TypeNode) -> Option<usize> {
    if is_alias(node) {
        return static_size(node.element.as_deref()?);
    }
    if let Some(basic) = node.basic {
        return basic_fixed_size(basic);
    }
    if node.is_fixed_array {
        let len = node.fixed_array_len?;
        let elem = static_size(node.element.as_deref()?)?;
        return Some(len * elem);
    }
    None
}

/// The concrete type a custom encoder yields and expects.
pub(crate) fn encoder_type(id: EncoderId) -> &'static str {
    id.rust_type()
}

/// Whether the chain bottoms out in a `u8` element (fixed byte arrays get
/// block copies instead of loops).
pub(crate) fn is_u8_elem(node: &TypeNode) -> bool {
    matches!(node.basic, Some(BasicType::U8))
}
