//! `marshal_binary` emission.
//!
//! Serialization is declaration-ordered and length-prefix heavy; the actual
//! writing lives in a private `write_binary` so the pooled and unpooled
//! entry points share it. Under pooling the visible result is always a
//! fresh copy of the scratch buffer, never a pool reference.

use borshgen_parse::{FieldPlan, RecordPlan, Shape, TypeNode};

use crate::error::CodegenError;

use super::{basic_put, is_alias, is_u8_elem, line};

/// Generator for the serializer of one record.
pub struct MarshalGenerator<'a> {
    record: &'a RecordPlan,
}

impl<'a> MarshalGenerator<'a> {
    /// Creates a new marshal generator.
    #[must_use]
    pub fn new(record: &'a RecordPlan) -> Self {
        Self { record }
    }

    /// Generates `marshal_binary` and its `write_binary` worker.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` on a shape the planner should
    /// have refused.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let mut out = String::new();

        line(
            &mut out,
            1,
            "/// Serializes the record to its wire form, fields in declaration order.",
        );
        line(
            &mut out,
            1,
            "pub fn marshal_binary(&self) -> Result<Vec<u8>, FormatError> {",
        );
        if self.record.options.use_pooling {
            line(&mut out, 2, "let mut scratch = scratch_pool().acquire();");
            line(&mut out, 2, "scratch.reserve(self.binary_size());");
            line(
                &mut out,
                2,
                "let result = self.write_binary(&mut scratch);",
            );
            line(
                &mut out,
                2,
                "let out = result.map(|()| scratch.as_slice().to_vec());",
            );
            line(&mut out, 2, "scratch_pool().release(scratch);");
            line(&mut out, 2, "out");
        } else {
            line(
                &mut out,
                2,
                "let mut buf = Vec::with_capacity(self.binary_size());",
            );
            line(&mut out, 2, "self.write_binary(&mut buf)?;");
            line(&mut out, 2, "Ok(buf)");
        }
        line(&mut out, 1, "}");
        out.push('\n');

        line(
            &mut out,
            1,
            "fn write_binary(&self, buf: &mut Vec<u8>) -> Result<(), FormatError> {",
        );
        let mut counter = 0usize;
        for field in &self.record.fields {
            line(
                &mut out,
                2,
                &format!("// {} ({})", field.name, field.wire_name),
            );
            if field.shape == Shape::CustomField {
                let enc = field
                    .custom_field_encoder
                    .ok_or_else(|| {
                        CodegenError::generation(&self.record.name, "custom field without encoder")
                    })?
                    .static_name();
                self.custom_write(
                    &mut out,
                    2,
                    enc,
                    &format!("self.{}", field.name),
                    &mut counter,
                );
            } else {
                self.emit_node(
                    &mut out,
                    2,
                    &field.chain,
                    &format!("self.{}", field.name),
                    field,
                    &mut counter,
                )?;
            }
        }
        line(&mut out, 2, "Ok(())");
        line(&mut out, 1, "}");
        Ok(out)
    }

    fn custom_write(
        &self,
        out: &mut String,
        depth: usize,
        encoder: &str,
        expr: &str,
        counter: &mut usize,
    ) {
        *counter += 1;
        let n = *counter;
        line(
            out,
            depth,
            &format!("let payload{n} = {encoder}.marshal_binary(&({expr}), self)?;"),
        );
        line(out, depth, &format!("put_bytes(buf, &payload{n});"));
    }

    fn emit_node(
        &self,
        out: &mut String,
        depth: usize,
        node: &TypeNode,
        expr: &str,
        field: &FieldPlan,
        counter: &mut usize,
    ) -> Result<(), CodegenError> {
        if is_alias(node) {
            let elem = node.element.as_deref().expect("alias has element");
            return self.emit_node(out, depth, elem, expr, field, counter);
        }

        if let Some(id) = node.custom_encoder {
            self.custom_write(out, depth, id.static_name(), expr, counter);
            return Ok(());
        }

        if let Some(basic) = node.basic {
            line(out, depth, &basic_put(basic, expr));
            return Ok(());
        }

        if node.is_struct {
            *counter += 1;
            let n = *counter;
            line(
                out,
                depth,
                &format!("let inner{n} = ({expr}).marshal_binary()?;"),
            );
            line(out, depth, &format!("put_bytes(buf, &inner{n});"));
            return Ok(());
        }

        if node.is_pointer {
            *counter += 1;
            let n = *counter;
            let inner = node.element.as_deref().expect("pointer has element");
            line(out, depth, &format!("match &({expr}) {{"));
            line(out, depth + 1, &format!("Some(v{n}) => {{"));
            line(out, depth + 2, "put_u8(buf, 1);");
            let deref = if inner.boxed {
                format!("(**v{n})")
            } else {
                format!("(*v{n})")
            };
            self.emit_node(out, depth + 2, inner, &deref, field, counter)?;
            line(out, depth + 1, "}");
            line(out, depth + 1, "None => put_u8(buf, 0),");
            line(out, depth, "}");
            return Ok(());
        }

        if node.is_slice {
            *counter += 1;
            let n = *counter;
            let elem = node.element.as_deref().expect("slice has element");
            line(out, depth, &format!("put_count(buf, ({expr}).len());"));
            line(out, depth, &format!("for v{n} in &({expr}) {{"));
            let deref = if elem.boxed {
                format!("(**v{n})")
            } else {
                format!("(*v{n})")
            };
            self.emit_node(out, depth + 1, elem, &deref, field, counter)?;
            line(out, depth, "}");
            return Ok(());
        }

        if node.is_fixed_array {
            let elem = node.element.as_deref().expect("array has element");
            if is_u8_elem(elem) {
                line(out, depth, &format!("buf.extend_from_slice(&({expr}));"));
                return Ok(());
            }
            *counter += 1;
            let n = *counter;
            line(out, depth, &format!("for v{n} in &({expr}) {{"));
            self.emit_node(out, depth + 1, elem, &format!("(*v{n})"), field, counter)?;
            line(out, depth, "}");
            return Ok(());
        }

        Err(CodegenError::generation(
            &self.record.name,
            format!("unexpected shape while writing field '{}'", field.name),
        ))
    }
}
