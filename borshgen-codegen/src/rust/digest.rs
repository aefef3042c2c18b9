//! `encode` (digest) emission.
//!
//! The digest stream covers only digest-relevant fields, sorted by wire
//! name, and drops every length prefix: variable-length basics are raw
//! payloads, slices are bare element runs, null pointers vanish entirely.
//! The byte forms themselves match `marshal_binary`, so two values that
//! agree on the digest-relevant fields produce identical streams.

use borshgen_parse::{FieldPlan, RecordPlan, Shape, TypeNode};

use crate::error::CodegenError;

use super::{basic_digest, is_alias, is_u8_elem, line};

/// Generator for the digest encoder of one record.
pub struct DigestGenerator<'a> {
    record: &'a RecordPlan,
}

impl<'a> DigestGenerator<'a> {
    /// Creates a new digest generator.
    #[must_use]
    pub fn new(record: &'a RecordPlan) -> Self {
        Self { record }
    }

    /// Generates the `encode` method.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` on a shape the planner should
    /// have refused.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let mut out = String::new();
        let mut counter = 0usize;

        line(
            &mut out,
            1,
            "/// Deterministic digest stream over the signing-relevant fields,",
        );
        line(&mut out, 1, "/// in wire-tag order.");
        line(
            &mut out,
            1,
            "pub fn encode(&self) -> Result<Vec<u8>, FormatError> {",
        );
        line(&mut out, 2, "let mut out = Vec::new();");
        line(&mut out, 2, "let buf = &mut out;");

        let digest_fields: Vec<&FieldPlan> = self.record.digest_fields().collect();
        for field in digest_fields {
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
                line(
                    &mut out,
                    2,
                    &format!(
                        "buf.extend_from_slice(&{enc}.encode(&(self.{}), self)?);",
                        field.name
                    ),
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

        line(&mut out, 2, "Ok(out)");
        line(&mut out, 1, "}");
        Ok(out)
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
            line(
                out,
                depth,
                &format!(
                    "buf.extend_from_slice(&{}.encode(&({expr}), self)?);",
                    id.static_name()
                ),
            );
            return Ok(());
        }

        if let Some(basic) = node.basic {
            line(out, depth, &basic_digest(basic, expr));
            return Ok(());
        }

        if node.is_struct {
            line(
                out,
                depth,
                &format!("buf.extend_from_slice(&({expr}).marshal_binary()?);"),
            );
            return Ok(());
        }

        if node.is_pointer {
            // Null pointers are skipped entirely; no presence byte.
            *counter += 1;
            let n = *counter;
            let inner = node.element.as_deref().expect("pointer has element");
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
            *counter += 1;
            let n = *counter;
            let elem = node.element.as_deref().expect("slice has element");
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
            format!("unexpected shape while digesting field '{}'", field.name),
        ))
    }
}
