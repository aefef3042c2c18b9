//! Type resolution.
//!
//! For every included field the resolver walks the declared type expression
//! down to its innermost basic component and produces a chain of type nodes.
//! Aliases are followed transitively across the directory's files; imported
//! qualified types consult the built-in encoder registry; a registry match
//! terminates the chain.

use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::error::ResolveError;
use crate::options::GeneratorOptions;
use crate::registry::{EncoderId, is_special_package};
use crate::source::{SourceSet, TypeDecl};

/// Fixed set of primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicType {
    /// UTF-8 string, u16-length-prefixed on the wire.
    Str,
    /// Raw byte payload (`Vec<u8>`), u16-length-prefixed.
    Bytes,
    /// One byte, zero or one.
    Bool,
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit, little endian.
    U16,
    /// Unsigned 32-bit, little endian.
    U32,
    /// Unsigned 64-bit, little endian.
    U64,
    /// Signed 8-bit.
    I8,
    /// Signed 16-bit, little endian.
    I16,
    /// Signed 32-bit, little endian.
    I32,
    /// Signed 64-bit, little endian.
    I64,
    /// IEEE-754 single, little-endian bit pattern.
    F32,
    /// IEEE-754 double, little-endian bit pattern.
    F64,
}

impl BasicType {
    /// Maps a bare type name to a basic kind. `Bytes` never matches here;
    /// it is produced structurally from `Vec<u8>`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::Str),
            "bool" => Some(Self::Bool),
            "u8" => Some(Self::U8),
            "u16" => Some(Self::U16),
            "u32" => Some(Self::U32),
            "u64" => Some(Self::U64),
            "i8" => Some(Self::I8),
            "i16" => Some(Self::I16),
            "i32" => Some(Self::I32),
            "i64" => Some(Self::I64),
            "f32" => Some(Self::F32),
            "f64" => Some(Self::F64),
            _ => None,
        }
    }

    /// Rust rendering of the basic type.
    #[must_use]
    pub fn rust_name(self) -> &'static str {
        match self {
            Self::Str => "String",
            Self::Bytes => "Vec<u8>",
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Wire width for fixed-size basics; `None` for the length-prefixed
    /// `Str`/`Bytes`.
    #[must_use]
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Str | Self::Bytes => None,
            Self::Bool | Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::F64 => Some(8),
        }
    }
}

/// One node of a resolved type chain.
#[derive(Debug, Clone)]
pub struct TypeNode {
    /// Local display name at this level (`Vec<String>`, `Option<i32>`,
    /// `[u8; 16]`, an alias name, a basic name).
    pub type_name: String,
    /// Concrete Rust type from this node down, used for generated locals.
    pub rust_ty: String,
    /// Primitive kind, when this node is basic.
    pub basic: Option<BasicType>,
    /// Dynamic slice container.
    pub is_slice: bool,
    /// Fixed array container.
    pub is_fixed_array: bool,
    /// Length of the fixed array.
    pub fixed_array_len: Option<usize>,
    /// Nullable indirection (`Option`).
    pub is_pointer: bool,
    /// Named record with its own generated operations.
    pub is_struct: bool,
    /// Declared outside the resolution universe.
    pub is_imported: bool,
    /// Fully qualified external name, when imported.
    pub full_type_name: Option<String>,
    /// Built-in encoder attached at resolution time; terminates the chain.
    pub custom_encoder: Option<EncoderId>,
    /// The element was reached through a `Box` and constructors must wrap.
    pub boxed: bool,
    /// Next node in the chain; `None` on the terminal node.
    pub element: Option<Box<TypeNode>>,
}

impl TypeNode {
    fn blank(type_name: String, rust_ty: String) -> Self {
        Self {
            type_name,
            rust_ty,
            basic: None,
            is_slice: false,
            is_fixed_array: false,
            fixed_array_len: None,
            is_pointer: false,
            is_struct: false,
            is_imported: false,
            full_type_name: None,
            custom_encoder: None,
            boxed: false,
            element: None,
        }
    }

    /// Whether this node is one of the fixed basic kinds.
    #[must_use]
    pub fn is_basic(&self) -> bool {
        self.basic.is_some()
    }

    /// The terminal node of the chain starting here.
    #[must_use]
    pub fn terminal(&self) -> &TypeNode {
        let mut node = self;
        while let Some(next) = node.element.as_deref() {
            node = next;
        }
        node
    }

    /// First node that carries a shape (skips alias wrappers).
    #[must_use]
    pub fn shaped(&self) -> &TypeNode {
        let mut node = self;
        while !node.is_basic()
            && !node.is_slice
            && !node.is_fixed_array
            && !node.is_pointer
            && !node.is_struct
            && !node.is_imported
            && node.custom_encoder.is_none()
        {
            match node.element.as_deref() {
                Some(next) => node = next,
                None => break,
            }
        }
        node
    }

    /// Number of nodes in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut n = 1;
        let mut node = self;
        while let Some(next) = node.element.as_deref() {
            n += 1;
            node = next;
        }
        n
    }

    /// Always false; chains are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Resolves field type expressions against a source set.
pub struct Resolver<'a> {
    set: &'a SourceSet,
    options: &'a GeneratorOptions,
    external_packages: Mutex<BTreeSet<String>>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over the given universe.
    #[must_use]
    pub fn new(set: &'a SourceSet, options: &'a GeneratorOptions) -> Self {
        Self {
            set,
            options,
            external_packages: Mutex::new(BTreeSet::new()),
        }
    }

    /// Resolves one field's declared type to a chain.
    ///
    /// # Errors
    /// Returns `ResolveError` for unknown names, refused shapes, alias
    /// cycles, or imported types with no registry entry and no hint path.
    pub fn resolve_field(
        &self,
        record: &str,
        field: &str,
        ty: &syn::Type,
    ) -> Result<TypeNode, ResolveError> {
        let mut nodes = Vec::new();
        let mut visited = Vec::new();
        self.resolve_expr(record, field, ty, false, &mut nodes, &mut visited)?;
        Ok(self.link(nodes))
    }

    /// External packages discovered so far, sorted.
    #[must_use]
    pub fn external_packages(&self) -> Vec<String> {
        self.external_packages.lock().iter().cloned().collect()
    }

    fn resolve_expr(
        &self,
        record: &str,
        field: &str,
        ty: &syn::Type,
        boxed: bool,
        nodes: &mut Vec<TypeNode>,
        visited: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        match ty {
            syn::Type::Path(tp) if tp.qself.is_none() => {
                self.resolve_path(record, field, ty, tp, boxed, nodes, visited)
            }
            syn::Type::Array(arr) => {
                let len = array_len(arr).ok_or_else(|| {
                    ResolveError::unsupported(record, field, "array length is not a literal")
                })?;
                let rust_ty = render_type(ty).ok_or_else(|| {
                    ResolveError::unsupported(record, field, "unrenderable array type")
                })?;
                let mut node = TypeNode::blank(rust_ty.clone(), rust_ty);
                node.is_fixed_array = true;
                node.fixed_array_len = Some(len);
                node.boxed = boxed;
                nodes.push(node);
                self.resolve_expr(record, field, &arr.elem, false, nodes, visited)
            }
            syn::Type::Reference(_) => Err(ResolveError::unsupported(
                record,
                field,
                "borrowed types; records own their data",
            )),
            syn::Type::Slice(_) => Err(ResolveError::unsupported(
                record,
                field,
                "unsized slice; use Vec",
            )),
            syn::Type::TraitObject(_) | syn::Type::ImplTrait(_) => Err(ResolveError::unsupported(
                record,
                field,
                "trait-object fields have no wire encoding",
            )),
            syn::Type::Tuple(_) => Err(ResolveError::unsupported(
                record,
                field,
                "tuple fields have no wire encoding",
            )),
            _ => Err(ResolveError::unsupported(
                record,
                field,
                "unrecognized type expression",
            )),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_path(
        &self,
        record: &str,
        field: &str,
        whole: &syn::Type,
        tp: &syn::TypePath,
        boxed: bool,
        nodes: &mut Vec<TypeNode>,
        visited: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        let segments = &tp.path.segments;

        if segments.len() > 1 {
            // External qualified reference (pkg::Type form).
            let bare: Vec<String> = segments.iter().map(|s| s.ident.to_string()).collect();
            let bare = bare.join("::");
            let display = render_type(whole)
                .ok_or_else(|| ResolveError::unsupported(record, field, "unrenderable path"))?;
            nodes.push(self.imported_node(&bare, display, boxed));
            return Ok(());
        }

        let seg = &segments[0];
        let name = seg.ident.to_string();

        match name.as_str() {
            "Option" => {
                let inner = generic_arg(seg).ok_or_else(|| {
                    ResolveError::unsupported(record, field, "Option without a type argument")
                })?;
                let rust_ty = render_type(whole)
                    .ok_or_else(|| ResolveError::unsupported(record, field, "unrenderable type"))?;
                let mut node = TypeNode::blank(rust_ty.clone(), rust_ty);
                node.is_pointer = true;
                node.boxed = boxed;
                nodes.push(node);
                return self.resolve_expr(record, field, inner, false, nodes, visited);
            }
            "Vec" => {
                let inner = generic_arg(seg).ok_or_else(|| {
                    ResolveError::unsupported(record, field, "Vec without a type argument")
                })?;
                if is_bare_u8(inner) {
                    let mut node = TypeNode::blank("Vec<u8>".to_string(), "Vec<u8>".to_string());
                    node.basic = Some(BasicType::Bytes);
                    node.boxed = boxed;
                    nodes.push(node);
                    return Ok(());
                }
                let rust_ty = render_type(whole)
                    .ok_or_else(|| ResolveError::unsupported(record, field, "unrenderable type"))?;
                let mut node = TypeNode::blank(rust_ty.clone(), rust_ty);
                node.is_slice = true;
                node.boxed = boxed;
                nodes.push(node);
                return self.resolve_expr(record, field, inner, false, nodes, visited);
            }
            "Box" => {
                let inner = generic_arg(seg).ok_or_else(|| {
                    ResolveError::unsupported(record, field, "Box without a type argument")
                })?;
                // Transparent on the wire; remember the wrapper for
                // constructor emission.
                return self.resolve_expr(record, field, inner, true, nodes, visited);
            }
            "HashMap" | "BTreeMap" => {
                return Err(ResolveError::unsupported(
                    record,
                    field,
                    "map fields have no wire encoding",
                ));
            }
            "usize" | "isize" => {
                return Err(ResolveError::unsupported(
                    record,
                    field,
                    "pointer-sized integers are not portable; use a fixed width",
                ));
            }
            _ => {}
        }

        if let Some(basic) = BasicType::from_name(&name) {
            let mut node =
                TypeNode::blank(basic.rust_name().to_string(), basic.rust_name().to_string());
            node.basic = Some(basic);
            node.boxed = boxed;
            nodes.push(node);
            return Ok(());
        }

        // Named type within the universe, or a `use`-imported name.
        if visited.contains(&name) {
            let mut path = visited.clone();
            path.push(name);
            return Err(ResolveError::CircularAlias {
                record: record.to_string(),
                field: field.to_string(),
                path: path.join(" -> "),
            });
        }

        match self.set.type_decl(&name) {
            Some(TypeDecl::Alias(target)) => {
                let mut node = TypeNode::blank(name.clone(), name.clone());
                node.boxed = boxed;
                nodes.push(node);
                visited.push(name);
                let target = target.clone();
                self.resolve_expr(record, field, &target, false, nodes, visited)
            }
            Some(TypeDecl::Struct) => {
                if self.set.is_record(&name) {
                    let mut node = TypeNode::blank(name.clone(), name.clone());
                    node.is_struct = true;
                    node.boxed = boxed;
                    nodes.push(node);
                    Ok(())
                } else {
                    // A plain struct with no directive has no generated
                    // operations to call into.
                    Err(ResolveError::missing_encoder(
                        record,
                        field,
                        &name,
                        &self.options.primary_tag,
                    ))
                }
            }
            None => {
                if let Some(full) = self.set.use_path(&name) {
                    let full = full.to_string();
                    let mut node = self.imported_node(&full, full.clone(), boxed);
                    // The field refers to the bare imported name.
                    node.rust_ty = render_type(whole).unwrap_or_else(|| name.clone());
                    node.type_name = node.rust_ty.clone();
                    nodes.push(node);
                    Ok(())
                } else if self.set.degraded {
                    Err(ResolveError::missing_encoder(
                        record,
                        field,
                        &name,
                        &self.options.primary_tag,
                    ))
                } else {
                    Err(ResolveError::unknown_type(record, field, &name))
                }
            }
        }
    }

    fn imported_node(&self, bare_path: &str, display: String, boxed: bool) -> TypeNode {
        let mut node = TypeNode::blank(display.clone(), display);
        node.is_imported = true;
        node.full_type_name = Some(bare_path.to_string());
        node.custom_encoder = EncoderId::for_type_path(bare_path);
        node.boxed = boxed;
        node
    }

    /// Chain post-processing: link successor nodes and record imported
    /// packages.
    fn link(&self, mut nodes: Vec<TypeNode>) -> TypeNode {
        debug_assert!(!nodes.is_empty());
        for node in &nodes {
            if node.is_imported
                && node.custom_encoder.is_none()
                && let Some(full) = &node.full_type_name
            {
                let package = full.split("::").next().unwrap_or_default();
                if !package.is_empty() && !is_special_package(package) {
                    self.external_packages.lock().insert(full.clone());
                }
            }
        }

        let mut chain = nodes.pop().expect("non-empty chain");
        while let Some(mut prev) = nodes.pop() {
            prev.element = Some(Box::new(chain));
            chain = prev;
        }
        chain
    }
}

fn generic_arg(seg: &syn::PathSegment) -> Option<&syn::Type> {
    if let syn::PathArguments::AngleBracketed(args) = &seg.arguments {
        for arg in &args.args {
            if let syn::GenericArgument::Type(t) = arg {
                return Some(t);
            }
        }
    }
    None
}

fn is_bare_u8(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Path(tp) if tp.qself.is_none() && tp.path.is_ident("u8"))
}

fn array_len(arr: &syn::TypeArray) -> Option<usize> {
    if let syn::Expr::Lit(lit) = &arr.len
        && let syn::Lit::Int(n) = &lit.lit
    {
        return n.base10_parse().ok();
    }
    None
}

/// Renders the supported type surface back to source text.
#[must_use]
pub fn render_type(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(tp) if tp.qself.is_none() => {
            let mut out = String::new();
            for (i, seg) in tp.path.segments.iter().enumerate() {
                if i > 0 {
                    out.push_str("::");
                }
                out.push_str(&seg.ident.to_string());
                match &seg.arguments {
                    syn::PathArguments::None => {}
                    syn::PathArguments::AngleBracketed(args) => {
                        out.push('<');
                        for (j, arg) in args.args.iter().enumerate() {
                            if j > 0 {
                                out.push_str(", ");
                            }
                            match arg {
                                syn::GenericArgument::Type(t) => out.push_str(&render_type(t)?),
                                _ => return None,
                            }
                        }
                        out.push('>');
                    }
                    syn::PathArguments::Parenthesized(_) => return None,
                }
            }
            Some(out)
        }
        syn::Type::Array(arr) => {
            let elem = render_type(&arr.elem)?;
            let len = array_len(arr)?;
            Some(format!("[{elem}; {len}]"))
        }
        _ => None,
    }
}
