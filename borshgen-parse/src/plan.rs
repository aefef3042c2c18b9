//! Field planning.
//!
//! On top of resolved chains the planner decides, per field: wire name,
//! digest relevance, coarse encoding shape, promoted custom encoders and
//! zero-copy eligibility. It also fixes the digest field order — the single
//! source of truth for `encode` output — while the serializer keeps
//! declaration order.

use tracing::debug;

use crate::error::{ParseError, ResolveError};
use crate::options::GeneratorOptions;
use crate::registry::EncoderId;
use crate::resolver::{Resolver, TypeNode};
use crate::source::{RecordDecl, SourceSet};
use crate::tags::{TagMap, extract_field_tag};

/// Coarse encoding shape driving emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Fixed-width or length-prefixed primitive.
    Basic,
    /// Nested record with generated operations.
    Struct,
    /// Dynamic slice.
    Slice,
    /// Nullable value.
    Pointer,
    /// Nullable slice.
    PointerSlice,
    /// Fixed-length array.
    FixedArray,
    /// Registry-matched imported type.
    CustomElement,
    /// Whole field routed through a hinted encoder.
    CustomField,
}

/// Encoding plan for one included field.
#[derive(Debug, Clone)]
pub struct FieldPlan {
    /// Field name in the source record.
    pub name: String,
    /// Emitted binary tag; digest sort key.
    pub wire_name: String,
    /// Participates in the digest stream.
    pub digest: bool,
    /// Coarse shape classification.
    pub shape: Shape,
    /// Encoder promoted from the field tag hint.
    pub custom_field_encoder: Option<EncoderId>,
    /// Head type is on the zero-copy allow-list.
    pub can_zero_copy: bool,
    /// Resolved chain head.
    pub chain: TypeNode,
}

/// Plan for one record.
#[derive(Debug, Clone)]
pub struct RecordPlan {
    /// Record name.
    pub name: String,
    /// Options bundle from the record's directive.
    pub options: GeneratorOptions,
    /// Included fields, declaration order.
    pub fields: Vec<FieldPlan>,
    /// Indices into `fields` sorted lexicographically by wire name; the
    /// digest emission order.
    pub digest_order: Vec<usize>,
}

impl RecordPlan {
    /// Digest-relevant fields in digest order.
    pub fn digest_fields(&self) -> impl Iterator<Item = &FieldPlan> {
        self.digest_order.iter().map(|&i| &self.fields[i])
    }
}

/// Output of planning a whole input file.
#[derive(Debug)]
pub struct PlanSet {
    /// Module name of the input file.
    pub target_stem: String,
    /// Record plans, input order.
    pub records: Vec<RecordPlan>,
    /// Imported paths the artifact must `use`, sorted.
    pub external_packages: Vec<String>,
}

/// Plans every eligible record of a source set.
///
/// # Errors
/// Returns `ParseError::NoEligibleRecords` when the file has no directive
/// records, or a resolution error when a field cannot be planned.
pub fn plan_source_set(set: &SourceSet, base: &GeneratorOptions) -> Result<PlanSet, ParseError> {
    if set.records().is_empty() {
        return Err(ParseError::NoEligibleRecords);
    }

    let resolver = Resolver::new(set, base);
    let mut records = Vec::new();
    for record in set.records() {
        records.push(plan_record(record, &resolver)?);
    }

    Ok(PlanSet {
        target_stem: set.target_stem.clone(),
        records,
        external_packages: resolver.external_packages(),
    })
}

fn plan_record(record: &RecordDecl, resolver: &Resolver<'_>) -> Result<RecordPlan, ParseError> {
    let options = &record.options;
    let mut fields = Vec::new();

    for raw in &record.fields {
        let tags = TagMap::parse(&raw.doc_lines);
        let tag = extract_field_tag(&tags, options);
        if tag.ignore {
            debug!(record = %record.name, field = %raw.name, "field ignored by tag");
            continue;
        }

        let wire_name = tag
            .wire_name
            .clone()
            .unwrap_or_else(|| raw.name.to_lowercase());

        let chain = resolver.resolve_field(&record.name, &raw.name, &raw.ty)?;

        let promoted = tag.encoder_hint.as_deref().and_then(EncoderId::from_hint);
        if tag.encoder_hint.is_some() && promoted.is_none() {
            debug!(
                record = %record.name,
                field = %raw.name,
                hint = tag.encoder_hint.as_deref().unwrap_or_default(),
                "tag hint names no registered encoder, ignoring"
            );
        }

        check_encoders(&record.name, &raw.name, &chain, promoted, options)?;

        let shape = classify(&chain, promoted);
        let can_zero_copy = chain.is_basic();

        fields.push(FieldPlan {
            name: raw.name.clone(),
            wire_name,
            digest: tag.digest,
            shape,
            custom_field_encoder: promoted,
            can_zero_copy,
            chain,
        });
    }

    let mut digest_order: Vec<usize> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.digest)
        .map(|(i, _)| i)
        .collect();
    digest_order.sort_by(|&a, &b| fields[a].wire_name.cmp(&fields[b].wire_name));

    Ok(RecordPlan {
        name: record.name.clone(),
        options: options.clone(),
        fields,
        digest_order,
    })
}

/// Every imported node must end up behind an encoder, either from the
/// registry or promoted from the tag hint.
fn check_encoders(
    record: &str,
    field: &str,
    chain: &TypeNode,
    promoted: Option<EncoderId>,
    options: &GeneratorOptions,
) -> Result<(), ResolveError> {
    if promoted.is_some() {
        return Ok(());
    }
    let mut node = Some(chain);
    while let Some(n) = node {
        if n.is_imported && n.custom_encoder.is_none() {
            return Err(ResolveError::missing_encoder(
                record,
                field,
                n.full_type_name.as_deref().unwrap_or(&n.type_name),
                &options.primary_tag,
            ));
        }
        node = n.element.as_deref();
    }
    Ok(())
}

fn classify(chain: &TypeNode, promoted: Option<EncoderId>) -> Shape {
    if promoted.is_some() {
        return Shape::CustomField;
    }
    let head = chain.shaped();
    if head.custom_encoder.is_some() {
        return Shape::CustomElement;
    }
    if head.is_pointer {
        let inner = head.element.as_deref().map(TypeNode::shaped);
        if inner.is_some_and(|n| n.is_slice) {
            return Shape::PointerSlice;
        }
        return Shape::Pointer;
    }
    if head.is_slice {
        return Shape::Slice;
    }
    if head.is_fixed_array {
        return Shape::FixedArray;
    }
    if head.is_struct {
        return Shape::Struct;
    }
    Shape::Basic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSet;

    fn plan(target: &str) -> PlanSet {
        let set = SourceSet::from_sources("model", target, &[], &GeneratorOptions::default())
            .expect("source set");
        plan_source_set(&set, &GeneratorOptions::default()).expect("plan")
    }

    const EVENT: &str = r#"
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

    #[test]
    fn test_event_shapes() {
        let plans = plan(EVENT);
        let record = &plans.records[0];
        let shapes: Vec<Shape> = record.fields.iter().map(|f| f.shape).collect();
        assert_eq!(
            shapes,
            [
                Shape::Basic,
                Shape::Basic,
                Shape::Basic,
                Shape::Basic,
                Shape::Slice,
                Shape::Pointer,
            ]
        );
    }

    #[test]
    fn test_digest_order_is_wire_name_lexicographic() {
        let plans = plan(EVENT);
        let record = &plans.records[0];
        let order: Vec<&str> = record.digest_fields().map(|f| f.wire_name.as_str()).collect();
        assert_eq!(order, ["flag", "id", "opt_counter", "tags", "ts"]);
    }

    #[test]
    fn test_non_digest_excluded() {
        let plans = plan(EVENT);
        let record = &plans.records[0];
        assert!(record.digest_fields().all(|f| f.wire_name != "data"));
    }

    #[test]
    fn test_digest_order_independent_of_declaration_order() {
        let reversed = r#"
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
        let a: Vec<String> = plan(EVENT).records[0]
            .digest_fields()
            .map(|f| f.wire_name.clone())
            .collect();
        let b: Vec<String> = plan(reversed).records[0]
            .digest_fields()
            .map(|f| f.wire_name.clone())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_wire_name_is_lowercased() {
        let plans = plan(
            r#"
            /// borshgen
            pub struct R {
                pub counter: u8,
            }
            "#,
        );
        assert_eq!(plans.records[0].fields[0].wire_name, "counter");
    }

    #[test]
    fn test_ignored_field_absent_from_plan() {
        let plans = plan(
            r#"
            /// borshgen
            pub struct R {
                /// bin:"-"
                pub hidden: u64,
                pub shown: u8,
            }
            "#,
        );
        let names: Vec<&str> = plans.records[0]
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["shown"]);
    }

    #[test]
    fn test_hint_promotes_custom_field() {
        let plans = plan(
            r#"
            /// borshgen
            pub struct R {
                /// bin:"blob,bytes"
                pub blob: Vec<u8>,
            }
            "#,
        );
        let field = &plans.records[0].fields[0];
        assert_eq!(field.shape, Shape::CustomField);
        assert_eq!(field.custom_field_encoder, Some(EncoderId::Bytes));
    }

    #[test]
    fn test_registry_custom_element() {
        let plans = plan(
            r#"
            /// borshgen
            pub struct R {
                /// bin:"when" enc:""
                pub when: chrono::DateTime<chrono::Utc>,
            }
            "#,
        );
        let field = &plans.records[0].fields[0];
        assert_eq!(field.shape, Shape::CustomElement);
    }

    #[test]
    fn test_pointer_slice_shape() {
        let plans = plan(
            r#"
            /// borshgen
            pub struct R {
                pub maybe: Option<Vec<u32>>,
            }
            "#,
        );
        assert_eq!(plans.records[0].fields[0].shape, Shape::PointerSlice);
    }

    #[test]
    fn test_zero_copy_allow_list() {
        let plans = plan(
            r#"
            pub type Count = u32;
            /// borshgen
            pub struct R {
                pub a: String,
                pub b: Vec<u8>,
                pub c: u64,
                pub d: bool,
                pub e: Vec<String>,
                pub f: Count,
            }
            "#,
        );
        let zc: Vec<bool> = plans.records[0]
            .fields
            .iter()
            .map(|f| f.can_zero_copy)
            .collect();
        assert_eq!(zc, [true, true, true, true, false, false]);
    }

    #[test]
    fn test_no_eligible_records() {
        let set = SourceSet::from_sources(
            "model",
            "pub struct Plain { pub x: u8 }",
            &[],
            &GeneratorOptions::default(),
        )
        .expect("set");
        let err = plan_source_set(&set, &GeneratorOptions::default()).expect_err("no records");
        assert!(matches!(err, ParseError::NoEligibleRecords));
    }

    #[test]
    fn test_imported_without_encoder_fails() {
        let set = SourceSet::from_sources(
            "model",
            r#"
            use widgets::Widget;
            /// borshgen
            pub struct R {
                pub w: Widget,
            }
            "#,
            &[],
            &GeneratorOptions::default(),
        )
        .expect("set");
        let err = plan_source_set(&set, &GeneratorOptions::default()).expect_err("err");
        assert!(err.to_string().contains("custom encoder"));
    }

    #[test]
    fn test_external_package_recorded_with_hint() {
        let plans = plan(
            r#"
            use widgets::Widget;
            /// borshgen
            pub struct R {
                /// bin:"w,json"
                pub w: Widget,
            }
            "#,
        );
        // Hinted encoder keeps planning alive and the import is recorded.
        assert_eq!(plans.external_packages, ["widgets::Widget"]);
    }
}
