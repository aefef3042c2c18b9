//! `unmarshal_binary` emission.
//!
//! Decoding reads fields in declaration order from an offset cursor, guards
//! every read, and must consume the supplied bytes exactly. All fields
//! decode into locals first; the receiver is assigned only after the whole
//! buffer validated, so a format error leaves it untouched.

use borshgen_parse::{FieldPlan, RecordPlan, Shape, TypeNode};

use crate::error::CodegenError;

use super::{basic_get, encoder_type, is_alias, is_u8_elem, line};

/// Generator for the deserializer of one record.
pub struct UnmarshalGenerator<'a> {
    record: &'a RecordPlan,
}

impl<'a> UnmarshalGenerator<'a> {
    /// Creates a new unmarshal generator.
    #[must_use]
    pub fn new(record: &'a RecordPlan) -> Self {
        Self { record }
    }

    /// Generates the `unmarshal_binary` method.
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
            "/// Decodes the record from `data`, which must hold exactly one value.",
        );
        line(&mut out, 1, "///");
        line(
            &mut out,
            1,
            "/// On any format error the receiver is left untouched.",
        );
        line(
            &mut out,
            1,
            "pub fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), FormatError> {",
        );
        line(&mut out, 2, "let mut offset = 0usize;");

        for field in &self.record.fields {
            line(
                &mut out,
                2,
                &format!("// {} ({})", field.name, field.wire_name),
            );
            let var = format!("f_{}", field.name);
            if field.shape == Shape::CustomField {
                let id = field.custom_field_encoder.ok_or_else(|| {
                    CodegenError::generation(&self.record.name, "custom field without encoder")
                })?;
                self.custom_read(
                    &mut out,
                    2,
                    id.static_name(),
                    encoder_type(id),
                    &var,
                    &field.wire_name,
                    &mut counter,
                );
            } else {
                self.emit_node(&mut out, 2, &field.chain, &var, field, &mut counter)?;
            }
        }

        line(&mut out, 2, "ensure_consumed(offset, data.len())?;");
        for field in &self.record.fields {
            line(
                &mut out,
                2,
                &format!("self.{} = f_{};", field.name, field.name),
            );
        }
        line(&mut out, 2, "Ok(())");
        line(&mut out, 1, "}");
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn custom_read(
        &self,
        out: &mut String,
        depth: usize,
        encoder: &str,
        concrete: &str,
        var: &str,
        field: &str,
        counter: &mut usize,
    ) {
        *counter += 1;
        let n = *counter;
        line(
            out,
            depth,
            &format!("let (payload{n}, next{n}) = get_bytes(data, offset, \"{field}\")?;"),
        );
        line(out, depth, &format!("offset = next{n};"));
        line(
            out,
            depth,
            &format!("let any{n} = {encoder}.unmarshal_binary(payload{n})?;"),
        );
        line(
            out,
            depth,
            &format!(
                "let {var}: {concrete} = *any{n}.downcast::<{concrete}>().map_err(|_| \
                 FormatError::TypeMismatch {{ field: \"{field}\", expected: \"{concrete}\" }})?;"
            ),
        );
    }

    fn emit_node(
        &self,
        out: &mut String,
        depth: usize,
        node: &TypeNode,
        var: &str,
        field: &FieldPlan,
        counter: &mut usize,
    ) -> Result<(), CodegenError> {
        if is_alias(node) {
            *counter += 1;
            let n = *counter;
            let elem = node.element.as_deref().expect("alias has element");
            let tmp = format!("a{n}");
            self.emit_node(out, depth, elem, &tmp, field, counter)?;
            line(
                out,
                depth,
                &format!("let {var}: {} = {tmp};", node.rust_ty),
            );
            return Ok(());
        }

        if let Some(id) = node.custom_encoder {
            self.custom_read(
                out,
                depth,
                id.static_name(),
                encoder_type(id),
                var,
                &field.wire_name,
                counter,
            );
            return Ok(());
        }

        if let Some(basic) = node.basic {
            basic_get(
                out,
                depth,
                basic,
                var,
                &node.rust_ty,
                &field.wire_name,
                counter,
            );
            return Ok(());
        }

        if node.is_struct {
            *counter += 1;
            let n = *counter;
            line(
                out,
                depth,
                &format!(
                    "let (payload{n}, next{n}) = get_bytes(data, offset, \"{}\")?;",
                    field.wire_name
                ),
            );
            line(out, depth, &format!("offset = next{n};"));
            line(
                out,
                depth,
                &format!("let mut tmp{n} = <{}>::default();", node.rust_ty),
            );
            line(
                out,
                depth,
                &format!("tmp{n}.unmarshal_binary(payload{n})?;"),
            );
            line(
                out,
                depth,
                &format!("let {var}: {} = tmp{n};", node.rust_ty),
            );
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
            line(
                out,
                depth,
                &format!("let {var}: {} = if tag{n} != 0 {{", node.rust_ty),
            );
            let inner_var = format!("inner{n}");
            self.emit_node(out, depth + 1, inner, &inner_var, field, counter)?;
            if inner.boxed {
                line(out, depth + 1, &format!("Some(Box::new({inner_var}))"));
            } else {
                line(out, depth + 1, &format!("Some({inner_var})"));
            }
            line(out, depth, "} else {");
            line(out, depth + 1, "None");
            line(out, depth, "};");
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
            line(
                out,
                depth,
                &format!(
                    "let mut items{n}: {} = Vec::with_capacity(count{n});",
                    node.rust_ty
                ),
            );
            line(out, depth, &format!("for _ in 0..count{n} {{"));
            let item = format!("item{n}");
            self.emit_node(out, depth + 1, elem, &item, field, counter)?;
            if elem.boxed {
                line(out, depth + 1, &format!("items{n}.push(Box::new({item}));"));
            } else {
                line(out, depth + 1, &format!("items{n}.push({item});"));
            }
            line(out, depth, "}");
            line(
                out,
                depth,
                &format!("let {var}: {} = items{n};", node.rust_ty),
            );
            return Ok(());
        }

        if node.is_fixed_array {
            *counter += 1;
            let n = *counter;
            let elem = node.element.as_deref().expect("array has element");
            let len = node.fixed_array_len.unwrap_or_default();
            if is_u8_elem(elem) {
                line(
                    out,
                    depth,
                    &format!(
                        "let (raw{n}, next{n}) = get_fixed(data, offset, {len}, \"{}\")?;",
                        field.wire_name
                    ),
                );
                line(out, depth, &format!("offset = next{n};"));
                line(out, depth, &format!("let mut arr{n} = [0u8; {len}];"));
                line(out, depth, &format!("arr{n}.copy_from_slice(raw{n});"));
                line(
                    out,
                    depth,
                    &format!("let {var}: {} = arr{n};", node.rust_ty),
                );
                return Ok(());
            }
            line(
                out,
                depth,
                &format!(
                    "let mut items{n}: Vec<{}> = Vec::with_capacity({len});",
                    elem.rust_ty
                ),
            );
            line(out, depth, &format!("for _ in 0..{len} {{"));
            let item = format!("item{n}");
            self.emit_node(out, depth + 1, elem, &item, field, counter)?;
            line(out, depth + 1, &format!("items{n}.push({item});"));
            line(out, depth, "}");
            line(
                out,
                depth,
                &format!(
                    "let {var}: {ty} = match <{ty}>::try_from(items{n}) {{",
                    ty = node.rust_ty
                ),
            );
            line(out, depth + 1, &format!("Ok(arr{n}) => arr{n},"));
            line(out, depth + 1, "Err(_) => unreachable!(),");
            line(out, depth, "};");
            return Ok(());
        }

        Err(CodegenError::generation(
            &self.record.name,
            format!("unexpected shape while reading field '{}'", field.name),
        ))
    }
}
