//! Error types for code generation.

use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Input scanning or resolution error.
    #[error("parse error: {0}")]
    Parse(#[from] borshgen_parse::ParseError),

    /// IO error while writing artifacts.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Artifact path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Internal emission bug; the whole record is aborted.
    #[error("generation error for record '{record}': {message}")]
    Generation {
        /// Record being emitted.
        record: String,
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates an IO error for the given artifact path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a generation error for the given record.
    pub fn generation(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Whether this is the "no eligible records" warning, which a directory
    /// walk continues past.
    #[must_use]
    pub fn is_no_records(&self) -> bool {
        matches!(
            self,
            Self::Parse(borshgen_parse::ParseError::NoEligibleRecords)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display() {
        let err = CodegenError::generation("Event", "unexpected shape");
        let msg = err.to_string();
        assert!(msg.contains("Event"));
        assert!(msg.contains("unexpected shape"));
    }

    #[test]
    fn test_no_records_detection() {
        let err = CodegenError::Parse(borshgen_parse::ParseError::NoEligibleRecords);
        assert!(err.is_no_records());
        let err = CodegenError::generation("R", "x");
        assert!(!err.is_no_records());
    }
}
