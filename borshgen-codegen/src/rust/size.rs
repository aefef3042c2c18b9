//! `binary_size` emission.
//!
//! The generated routine walks fields in declaration order and accumulates
//! per-shape contributions; its result must exactly equal the length of a
//! subsequent `marshal_binary`.

use borshgen_parse::{FieldPlan, RecordPlan, Shape, TypeNode};

use crate::error::CodegenError;

use super::{basic_fixed_size, is_alias, is_u8_elem, line, static_size};

/// Generator for the size predictor of one record.
pub struct SizeGenerator<'a> {
    record: &'a RecordPlan,
}

impl<'a> SizeGenerator<'a> {
    /// Creates a new size generator.
    #[must_use]
    pub fn new(record: &'a RecordPlan) -> Self {
        Self { record }
    }

    /// Generates the `binary_size` method.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` on a shape the planner should
    /// have refused; the whole record is aborted.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let mut out = String::new();
        let mut counter = 0usize;

        line(
            &mut out,
            1,
            "/// Exact byte count a subsequent `marshal_binary` will produce.",
        );
        line(&mut out, 1, "#[must_use]");
        line(&mut out, 1, "pub fn binary_size(&self) -> usize {");
        line(&mut out, 2, "let mut size = 0usize;");

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
                self.custom_contribution(&mut out, 2, enc, &format!("self.{}", field.name), field);
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

        line(&mut out, 2, "size");
        line(&mut out, 1, "}");
        Ok(out)
    }

    fn custom_contribution(
        &self,
        out: &mut String,
        depth: usize,
        encoder: &str,
        expr: &str,
        field: &FieldPlan,
    ) {
        line(
            out,
            depth,
            &format!("size += 2 + match {encoder}.binary_size(&({expr}), self) {{"),
        );
        line(out, depth + 1, "Ok(n) => n,");
        line(
            out,
            depth + 1,
            &format!(
                "Err(e) => panic!(\"binary size for {}: {{e}}\"),",
                field.name
            ),
        );
        line(out, depth, "};");
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
            self.custom_contribution(out, depth, id.static_name(), expr, field);
            return Ok(());
        }

        if let Some(basic) = node.basic {
            match basic_fixed_size(basic) {
                Some(w) => line(out, depth, &format!("size += {w};")),
                None => line(out, depth, &format!("size += 2 + ({expr}).len();")),
            }
            return Ok(());
        }

        if node.is_struct {
            line(out, depth, &format!("size += 2 + ({expr}).binary_size();"));
            return Ok(());
        }

        if node.is_pointer {
            *counter += 1;
            let n = *counter;
            let inner = node.element.as_deref().expect("pointer has element");
            line(out, depth, "size += 1;");
            line(out, depth, &format!("if let Some(v{n}) = &({expr}) {{"));
            let deref = if inner.boxed {
                format!("(**v{n})")
            } else {
                format!("(*v{n})")
            };
            self.emit_node(out, depth + 1, inner, &deref, field, counter)?;
            line(out, depth, "}");
            return Ok(());
        }

        if node.is_slice {
            let elem = node.element.as_deref().expect("slice has element");
            line(out, depth, "size += 2;");
            if let Some(w) = static_size(elem) {
                line(out, depth, &format!("size += ({expr}).len() * {w};"));
            } else {
                *counter += 1;
                let n = *counter;
                line(out, depth, &format!("for v{n} in &({expr}) {{"));
                let deref = if elem.boxed {
                    format!("(**v{n})")
                } else {
                    format!("(*v{n})")
                };
                self.emit_node(out, depth + 1, elem, &deref, field, counter)?;
                line(out, depth, "}");
            }
            return Ok(());
        }

        if node.is_fixed_array {
            let elem = node.element.as_deref().expect("array has element");
            if let Some(total) = static_size(node) {
                line(out, depth, &format!("size += {total};"));
            } else if is_u8_elem(elem) {
                let len = node.fixed_array_len.unwrap_or_default();
                line(out, depth, &format!("size += {len};"));
            } else {
                *counter += 1;
                let n = *counter;
                line(out, depth, &format!("for v{n} in &({expr}) {{"));
                self.emit_node(out, depth + 1, elem, &format!("(*v{n})"), field, counter)?;
                line(out, depth, "}");
            }
            return Ok(());
        }

        Err(CodegenError::generation(
            &self.record.name,
            format!("unexpected shape while sizing field '{}'", field.name),
        ))
    }
}
