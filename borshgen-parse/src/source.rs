//! Input source loading.
//!
//! The resolution universe for an input file is its directory: every `.rs`
//! sibling (minus generated artifacts and test files) is parsed so that
//! aliases and records referenced across files resolve. When a sibling
//! cannot be parsed the loader degrades to whatever it could read and lets
//! resolution surface per-field diagnostics.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::options::{GeneratorOptions, parse_directive};
use crate::tags::TagMap;

/// A field as declared in the source, before resolution.
#[derive(Debug, Clone)]
pub struct RawField {
    /// Field name.
    pub name: String,
    /// Declared type expression.
    pub ty: syn::Type,
    /// Doc lines carrying the metadata tag string.
    pub doc_lines: Vec<String>,
}

/// A record that opted in for generation.
#[derive(Debug, Clone)]
pub struct RecordDecl {
    /// Record name.
    pub name: String,
    /// Options bundle from the directive.
    pub options: GeneratorOptions,
    /// Fields in declaration order.
    pub fields: Vec<RawField>,
}

impl RecordDecl {
    /// Parses a field's tag map out of its doc lines.
    #[must_use]
    pub fn field_tags(field: &RawField) -> TagMap {
        TagMap::parse(&field.doc_lines)
    }
}

/// A named type declaration visible to the resolver.
#[derive(Debug, Clone)]
pub enum TypeDecl {
    /// A struct declaration (record or plain).
    Struct,
    /// A `type Name = T;` alias with its target expression.
    Alias(syn::Type),
}

/// Parsed view of the input file plus its resolution universe.
#[derive(Debug)]
pub struct SourceSet {
    /// File stem of the input file (its module name).
    pub target_stem: String,
    /// True when sibling files could not all be loaded.
    pub degraded: bool,
    records: Vec<RecordDecl>,
    types: HashMap<String, TypeDecl>,
    uses: HashMap<String, String>,
    record_names: BTreeSet<String>,
}

impl SourceSet {
    /// Loads the input file and its directory siblings.
    ///
    /// # Arguments
    /// * `path` - Input `.rs` file
    /// * `base` - Invocation-level options that record directives override
    ///
    /// # Errors
    /// Returns `ParseError` when the input file itself cannot be read or
    /// parsed. Sibling failures only degrade the universe.
    pub fn load(path: &Path, base: &GeneratorOptions) -> Result<Self, ParseError> {
        let display = path.display().to_string();
        let target_src =
            fs::read_to_string(path).map_err(|e| ParseError::io(display.clone(), e))?;
        let target_stem = file_stem(path);

        let mut siblings = Vec::new();
        let mut degraded = false;
        if let Some(dir) = path.parent() {
            match fs::read_dir(dir) {
                Ok(entries) => {
                    let mut paths: Vec<_> = entries
                        .flatten()
                        .map(|e| e.path())
                        .filter(|p| is_sibling_source(p) && p != path)
                        .collect();
                    paths.sort();
                    for sibling in paths {
                        match fs::read_to_string(&sibling) {
                            Ok(src) => siblings.push((file_stem(&sibling), src)),
                            Err(e) => {
                                warn!(path = %sibling.display(), error = %e, "skipping unreadable sibling");
                                degraded = true;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "cannot list directory, single-file parse");
                    degraded = true;
                }
            }
        }

        let sibling_refs: Vec<(&str, &str)> = siblings
            .iter()
            .map(|(stem, src)| (stem.as_str(), src.as_str()))
            .collect();
        let mut set = Self::from_sources(&target_stem, &target_src, &sibling_refs, base)?;
        set.degraded |= degraded;
        Ok(set)
    }

    /// Builds a source set from in-memory sources. The target must parse;
    /// siblings that fail to parse are skipped and mark the set degraded.
    pub fn from_sources(
        target_stem: &str,
        target_src: &str,
        siblings: &[(&str, &str)],
        base: &GeneratorOptions,
    ) -> Result<Self, ParseError> {
        let target_ast = syn::parse_file(target_src)
            .map_err(|e| ParseError::syntax(format!("{target_stem}.rs"), e.to_string()))?;

        let mut set = Self {
            target_stem: target_stem.to_string(),
            degraded: false,
            records: Vec::new(),
            types: HashMap::new(),
            uses: HashMap::new(),
            record_names: BTreeSet::new(),
        };

        set.index_items(&target_ast, base, true)?;
        for (stem, src) in siblings {
            match syn::parse_file(src) {
                Ok(ast) => set.index_items(&ast, base, false)?,
                Err(e) => {
                    warn!(file = %stem, error = %e, "sibling failed to parse, degrading");
                    set.degraded = true;
                }
            }
        }

        debug!(
            records = set.records.len(),
            types = set.types.len(),
            "source set indexed"
        );
        Ok(set)
    }

    fn index_items(
        &mut self,
        ast: &syn::File,
        base: &GeneratorOptions,
        is_target: bool,
    ) -> Result<(), ParseError> {
        for item in &ast.items {
            match item {
                syn::Item::Struct(s) => {
                    let name = s.ident.to_string();
                    self.types.entry(name.clone()).or_insert(TypeDecl::Struct);

                    let docs = doc_lines(&s.attrs);
                    if let Some(options) = parse_directive(&docs, base) {
                        self.record_names.insert(name.clone());
                        if is_target {
                            self.records.push(record_from_struct(s, options)?);
                        }
                    }
                }
                syn::Item::Type(t) => {
                    self.types
                        .entry(t.ident.to_string())
                        .or_insert_with(|| TypeDecl::Alias((*t.ty).clone()));
                }
                syn::Item::Use(u) => collect_uses(&u.tree, String::new(), &mut self.uses),
                _ => {}
            }
        }
        Ok(())
    }

    /// Records to generate, input order preserved.
    #[must_use]
    pub fn records(&self) -> &[RecordDecl] {
        &self.records
    }

    /// Looks up a named type declaration.
    #[must_use]
    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// Whether the name is a record generated in this run.
    #[must_use]
    pub fn is_record(&self, name: &str) -> bool {
        self.record_names.contains(name)
    }

    /// Full path a bare name was imported under, if any.
    #[must_use]
    pub fn use_path(&self, name: &str) -> Option<&str> {
        self.uses.get(name).map(String::as_str)
    }
}

fn record_from_struct(
    s: &syn::ItemStruct,
    options: GeneratorOptions,
) -> Result<RecordDecl, ParseError> {
    let name = s.ident.to_string();
    let syn::Fields::Named(named) = &s.fields else {
        return Err(ParseError::UnnamedFields { record: name });
    };

    let mut fields = Vec::new();
    for field in &named.named {
        let field_name = field
            .ident
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        fields.push(RawField {
            name: field_name,
            ty: field.ty.clone(),
            doc_lines: doc_lines(&field.attrs),
        });
    }

    Ok(RecordDecl {
        name,
        options,
        fields,
    })
}

/// Extracts `///` doc comment lines from an attribute list.
#[must_use]
pub fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta
            && let syn::Expr::Lit(lit) = &nv.value
            && let syn::Lit::Str(s) = &lit.lit
        {
            lines.push(s.value().trim().to_string());
        }
    }
    lines
}

fn collect_uses(tree: &syn::UseTree, prefix: String, out: &mut HashMap<String, String>) {
    match tree {
        syn::UseTree::Path(p) => {
            let next = if prefix.is_empty() {
                p.ident.to_string()
            } else {
                format!("{prefix}::{}", p.ident)
            };
            collect_uses(&p.tree, next, out);
        }
        syn::UseTree::Name(n) => {
            let full = if prefix.is_empty() {
                n.ident.to_string()
            } else {
                format!("{prefix}::{}", n.ident)
            };
            out.insert(n.ident.to_string(), full);
        }
        syn::UseTree::Rename(r) => {
            let full = if prefix.is_empty() {
                r.ident.to_string()
            } else {
                format!("{prefix}::{}", r.ident)
            };
            out.insert(r.rename.to_string(), full);
        }
        syn::UseTree::Group(g) => {
            for item in &g.items {
                collect_uses(item, prefix.clone(), out);
            }
        }
        syn::UseTree::Glob(_) => {}
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether a path is a sibling source worth indexing: a `.rs` file that is
/// neither a generated artifact nor a test file.
#[must_use]
pub fn is_sibling_source(path: &Path) -> bool {
    if path.extension().is_none_or(|e| e != "rs") {
        return false;
    }
    let stem = file_stem(path);
    !stem.ends_with("_gen") && !stem.ends_with("test") && !stem.ends_with("tests")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = r#"
        use other_crate::Widget;

        /// Application event.
        /// borshgen -encode-tag=enc
        pub struct Event {
            /// bin:"id" enc:""
            pub id: i64,
            /// bin:"-"
            pub skipped: u32,
            pub plain: bool,
        }

        /// Not opted in.
        pub struct Plain {
            pub x: u8,
        }

        pub type PeerId = String;
    "#;

    const SIBLING: &str = r#"
        /// borshgen
        pub struct Nested {
            /// bin:"v"
            pub v: u16,
        }

        pub type Count = u32;
    "#;

    fn load() -> SourceSet {
        SourceSet::from_sources(
            "events",
            TARGET,
            &[("nested", SIBLING)],
            &GeneratorOptions::default(),
        )
        .expect("source set")
    }

    #[test]
    fn test_records_target_only_in_order() {
        let set = load();
        let names: Vec<_> = set.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Event"]);
    }

    #[test]
    fn test_record_names_span_directory() {
        let set = load();
        assert!(set.is_record("Event"));
        assert!(set.is_record("Nested"), "sibling records count as generated");
        assert!(!set.is_record("Plain"));
    }

    #[test]
    fn test_aliases_indexed_across_files() {
        let set = load();
        assert!(matches!(set.type_decl("PeerId"), Some(TypeDecl::Alias(_))));
        assert!(matches!(set.type_decl("Count"), Some(TypeDecl::Alias(_))));
        assert!(matches!(set.type_decl("Plain"), Some(TypeDecl::Struct)));
    }

    #[test]
    fn test_use_map() {
        let set = load();
        assert_eq!(set.use_path("Widget"), Some("other_crate::Widget"));
        assert_eq!(set.use_path("Unknown"), None);
    }

    #[test]
    fn test_fields_carry_docs() {
        let set = load();
        let event = &set.records()[0];
        assert_eq!(event.fields.len(), 3);
        assert_eq!(event.fields[0].name, "id");
        let tags = RecordDecl::field_tags(&event.fields[0]);
        assert_eq!(tags.get("bin"), Some("id"));
        assert!(tags.contains("enc"));
    }

    #[test]
    fn test_bad_sibling_degrades() {
        let set = SourceSet::from_sources(
            "events",
            TARGET,
            &[("broken", "this is not rust")],
            &GeneratorOptions::default(),
        )
        .expect("target still parses");
        assert!(set.degraded);
    }

    #[test]
    fn test_bad_target_fails() {
        let err = SourceSet::from_sources("x", "fn {", &[], &GeneratorOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_tuple_record_rejected() {
        let src = r#"
            /// borshgen
            pub struct Pair(u8, u8);
        "#;
        let err = SourceSet::from_sources("p", src, &[], &GeneratorOptions::default())
            .expect_err("tuple records are rejected");
        assert!(matches!(err, ParseError::UnnamedFields { .. }));
    }

    #[test]
    fn test_sibling_filter() {
        assert!(is_sibling_source(Path::new("/x/model.rs")));
        assert!(!is_sibling_source(Path::new("/x/model_borshgen_12_gen.rs")));
        assert!(!is_sibling_source(Path::new("/x/model_test.rs")));
        assert!(!is_sibling_source(Path::new("/x/notes.md")));
    }
}
