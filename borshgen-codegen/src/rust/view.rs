//! Zero-copy view emission.
//!
//! When a record's options request it, an additional `<Record>View` type is
//! emitted: a wrapper over the source byte slice with per-field accessors.
//! Offsets are computed lazily by walking the declaration-order wire format;
//! nothing allocates. In safe mode string accessors copy the payload out;
//! in unsafe mode they alias the buffer.

use borshgen_parse::{BasicType, FieldPlan, RecordPlan, TypeNode};

use crate::error::CodegenError;

use super::{basic_fixed_size, is_alias, line, static_size};

/// Generator for the zero-copy view of one record.
pub struct ViewGenerator<'a> {
    record: &'a RecordPlan,
}

impl<'a> ViewGenerator<'a> {
    /// Creates a new view generator.
    #[must_use]
    pub fn new(record: &'a RecordPlan) -> Self {
        Self { record }
    }

    /// Generates the view struct and its impl block.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` on a shape the planner should
    /// have refused.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let name = &self.record.name;
        let mut out = String::new();

        line(
            &mut out,
            0,
            &format!("/// Zero-copy view over a marshaled `{name}` buffer."),
        );
        line(&mut out, 0, "///");
        line(
            &mut out,
            0,
            "/// Valid only while the underlying buffer is not mutated. Field",
        );
        line(
            &mut out,
            0,
            "/// offsets are recomputed lazily on each access.",
        );
        line(&mut out, 0, &format!("pub struct {name}View<'a> {{"));
        line(&mut out, 1, "data: &'a [u8],");
        line(&mut out, 0, "}");
        out.push('\n');
        line(&mut out, 0, &format!("impl<'a> {name}View<'a> {{"));
        line(&mut out, 1, "/// Wraps a wire buffer without copying.");
        line(&mut out, 1, "#[must_use]");
        line(&mut out, 1, "pub fn new(data: &'a [u8]) -> Self {");
        line(&mut out, 2, "Self { data }");
        line(&mut out, 1, "}");
        out.push('\n');

        self.generate_field_offset(&mut out)?;

        for field in &self.record.fields {
            if !field.can_zero_copy {
                continue;
            }
            let Some(basic) = field.chain.basic else {
                continue;
            };
            out.push('\n');
            self.generate_accessor(&mut out, field, basic);
        }

        out.push('\n');
        line(&mut out, 1, "/// Copies the view out into an owned record.");
        line(
            &mut out,
            1,
            &format!("pub fn to_struct(&self) -> Result<{name}, FormatError> {{"),
        );
        line(&mut out, 2, &format!("let mut out = <{name}>::default();"));
        line(&mut out, 2, "out.unmarshal_binary(self.data)?;");
        line(&mut out, 2, "Ok(out)");
        line(&mut out, 1, "}");
        line(&mut out, 0, "}");
        Ok(out)
    }

    fn generate_field_offset(&self, out: &mut String) -> Result<(), CodegenError> {
        let mut counter = 0usize;
        line(
            out,
            1,
            "fn field_offset(&self, field: &'static str) -> Result<usize, FormatError> {",
        );
        line(out, 2, "let data = self.data;");
        line(out, 2, "let mut offset = 0usize;");
        for field in &self.record.fields {
            line(
                out,
                2,
                &format!("if field == \"{}\" {{", field.name),
            );
            line(out, 3, "return Ok(offset);");
            line(out, 2, "}");
            self.emit_skip(out, 2, &field.chain, field, &mut counter)?;
        }
        line(out, 2, "Ok(offset)");
        line(out, 1, "}");
        Ok(())
    }

    fn generate_accessor(&self, out: &mut String, field: &FieldPlan, basic: BasicType) {
        let name = &field.name;
        let wire = &field.wire_name;
        match basic {
            BasicType::Str => {
                if self.record.options.safe_mode {
                    line(
                        out,
                        1,
                        &format!("/// `{name}` copied out of the wire buffer."),
                    );
                    line(
                        out,
                        1,
                        &format!("pub fn {name}(&self) -> Result<String, FormatError> {{"),
                    );
                    line(out, 2, &format!("let offset = self.field_offset(\"{name}\")?;"));
                    line(
                        out,
                        2,
                        &format!("let (raw, _) = get_bytes(self.data, offset, \"{wire}\")?;"),
                    );
                    line(
                        out,
                        2,
                        &format!(
                            "let s = std::str::from_utf8(raw).map_err(|_| \
                             FormatError::InvalidUtf8 {{ field: \"{wire}\" }})?;"
                        ),
                    );
                    line(out, 2, "Ok(s.to_owned())");
                    line(out, 1, "}");
                } else {
                    line(
                        out,
                        1,
                        &format!("/// `{name}` aliasing the wire buffer directly."),
                    );
                    line(out, 1, "///");
                    line(
                        out,
                        1,
                        "/// The payload is assumed to be the UTF-8 bytes `marshal_binary` wrote.",
                    );
                    line(
                        out,
                        1,
                        &format!("pub fn {name}(&self) -> Result<&'a str, FormatError> {{"),
                    );
                    line(out, 2, &format!("let offset = self.field_offset(\"{name}\")?;"));
                    line(
                        out,
                        2,
                        &format!("let (raw, _) = get_bytes(self.data, offset, \"{wire}\")?;"),
                    );
                    line(
                        out,
                        2,
                        "Ok(unsafe { std::str::from_utf8_unchecked(raw) })",
                    );
                    line(out, 1, "}");
                }
            }
            BasicType::Bytes => {
                line(out, 1, &format!("/// `{name}` aliasing the wire buffer."));
                line(
                    out,
                    1,
                    &format!("pub fn {name}(&self) -> Result<&'a [u8], FormatError> {{"),
                );
                line(out, 2, &format!("let offset = self.field_offset(\"{name}\")?;"));
                line(
                    out,
                    2,
                    &format!("let (raw, _) = get_bytes(self.data, offset, \"{wire}\")?;"),
                );
                line(out, 2, "Ok(raw)");
                line(out, 1, "}");
            }
            _ => {
                let ret = basic.rust_name();
                let reader = super::width_fn(basic);
                line(out, 1, &format!("/// `{name}` parsed from the wire buffer."));
                line(
                    out,
                    1,
                    &format!("pub fn {name}(&self) -> Result<{ret}, FormatError> {{"),
                );
                line(out, 2, &format!("let offset = self.field_offset(\"{name}\")?;"));
                line(
                    out,
                    2,
                    &format!("let (raw, _) = get_{reader}(self.data, offset, \"{wire}\")?;"),
                );
                match basic {
                    BasicType::Bool | BasicType::F32 | BasicType::F64 => {
                        line(out, 2, "Ok(raw)");
                    }
                    _ => line(out, 2, &format!("Ok(raw as {ret})")),
                }
                line(out, 1, "}");
            }
        }
    }

    fn emit_skip(
        &self,
        out: &mut String,
        depth: usize,
        node: &TypeNode,
        field: &FieldPlan,
        counter: &mut usize,
    ) -> Result<(), CodegenError> {
        if is_alias(node) {
            let elem = node.element.as_deref().expect("alias has element");
            return self.emit_skip(out, depth, elem, field, counter);
        }

        if node.custom_encoder.is_some() {
            *counter += 1;
            let n = *counter;
            line(
                out,
                depth,
                &format!(
                    "let (_, next{n}) = get_bytes(data, offset, \"{}\")?;",
                    field.wire_name
                ),
            );
            line(out, depth, &format!("offset = next{n};"));
            return Ok(());
        }

        if let Some(basic) = node.basic {
            match basic_fixed_size(basic) {
                Some(w) => line(out, depth, &format!("offset += {w};")),
                None => {
                    *counter += 1;
                    let n = *counter;
                    line(
                        out,
                        depth,
                        &format!(
                            "let (_, next{n}) = get_bytes(data, offset, \"{}\")?;",
                            field.wire_name
                        ),
                    );
                    line(out, depth, &format!("offset = next{n};"));
                }
            }
            return Ok(());
        }

        if node.is_struct {
            *counter += 1;
            let n = *counter;
            line(
                out,
                depth,
                &format!(
                    "let (_, next{n}) = get_bytes(data, offset, \"{}\")?;",
                    field.wire_name
                ),
            );
            line(out, depth, &format!("offset = next{n};"));
            return Ok(());
        }

        if node.is_pointer {
            *counter += 1;
            let n = *counter;
            let inner = node.element.as_deref().expect("pointer has element");
            line(
                out,
                depth,
                &format!(
                    "let (tag{n}, next{n}) = get_u8(data, offset, \"{}\")?;",
                    field.wire_name
                ),
            );
            line(out, depth, &format!("offset = next{n};"));
            line(out, depth, &format!("if tag{n} != 0 {{"));
            self.emit_skip(out, depth + 1, inner, field, counter)?;
            line(out, depth, "}");
            return Ok(());
        }

        if node.is_slice {
            *counter += 1;
            let n = *counter;
            let elem = node.element.as_deref().expect("slice has element");
            line(
                out,
                depth,
                &format!(
                    "let (count{n}, next{n}) = get_count(data, offset, \"{}\")?;",
                    field.wire_name
                ),
            );
            line(out, depth, &format!("offset = next{n};"));
            if let Some(w) = static_size(elem) {
                line(out, depth, &format!("offset += count{n} * {w};"));
            } else {
                line(out, depth, &format!("for _ in 0..count{n} {{"));
                self.emit_skip(out, depth + 1, elem, field, counter)?;
                line(out, depth, "}");
            }
            return Ok(());
        }

        if node.is_fixed_array {
            let elem = node.element.as_deref().expect("array has element");
            if let Some(total) = static_size(node) {
                line(out, depth, &format!("offset += {total};"));
            } else {
                let len = node.fixed_array_len.unwrap_or_default();
                line(out, depth, &format!("for _ in 0..{len} {{"));
                self.emit_skip(out, depth + 1, elem, field, counter)?;
                line(out, depth, "}");
            }
            return Ok(());
        }

        Err(CodegenError::generation(
            &self.record.name,
            format!("unexpected shape while skipping field '{}'", field.name),
        ))
    }
}
