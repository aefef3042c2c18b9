//! Error types for source scanning and type resolution.

use thiserror::Error;

/// Error type for input scanning operations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Input source is not parseable Rust.
    #[error("syntax error in {path}: {message}")]
    Syntax {
        /// Path that failed.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A record opted in but has no named fields.
    #[error("record '{record}' must have named fields")]
    UnnamedFields {
        /// Record name.
        record: String,
    },

    /// No record in the file carries a generator directive. Warning-level:
    /// a directory walk continues past it.
    #[error("no records found with a borshgen directive")]
    NoEligibleRecords,

    /// Type resolution failed for a field.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Error type for field type resolution and planning.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A referenced type name could not be found in the resolution universe.
    #[error("cannot resolve '{type_name}' for field '{record}.{field}'")]
    UnknownType {
        /// Record name.
        record: String,
        /// Field name.
        field: String,
        /// Unresolved type name.
        type_name: String,
    },

    /// No wire shape exists for the field; a custom encoder is required.
    #[error(
        "no encoder for field '{record}.{field}' of type '{type_name}'; \
         register a custom encoder via the field tag (e.g. `{tag}:\"name,bytes\"`)"
    )]
    MissingEncoder {
        /// Record name.
        record: String,
        /// Field name.
        field: String,
        /// Offending type name.
        type_name: String,
        /// Primary tag name, for the suggestion text.
        tag: String,
    },

    /// The type is outside the supported surface (maps, trait objects,
    /// references, unsized slices).
    #[error("unsupported type for field '{record}.{field}': {reason}")]
    Unsupported {
        /// Record name.
        record: String,
        /// Field name.
        field: String,
        /// Why the type is refused.
        reason: String,
    },

    /// Alias resolution revisited a named type without passing through a
    /// pointer.
    #[error("circular alias chain while resolving '{record}.{field}': {path}")]
    CircularAlias {
        /// Record name.
        record: String,
        /// Field name.
        field: String,
        /// Cycle path, arrow separated.
        path: String,
    },
}

impl ParseError {
    /// Creates an IO error for the given path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a syntax error for the given path.
    pub fn syntax(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl ResolveError {
    /// Creates an unknown-type error.
    pub fn unknown_type(
        record: impl Into<String>,
        field: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self::UnknownType {
            record: record.into(),
            field: field.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates a missing-encoder diagnostic.
    pub fn missing_encoder(
        record: impl Into<String>,
        field: impl Into<String>,
        type_name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self::MissingEncoder {
            record: record.into(),
            field: field.into(),
            type_name: type_name.into(),
            tag: tag.into(),
        }
    }

    /// Creates an unsupported-type error.
    pub fn unsupported(
        record: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Unsupported {
            record: record.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}
