//! Built-in custom-encoder registry.
//!
//! Maps external fully-qualified type names, and field-tag hints, to the
//! built-in encoder identities shipped in the emitted encoder artifact. A
//! registry match terminates a resolved type chain; later stages treat the
//! value as opaque.

/// Identity of a built-in custom encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderId {
    /// Byte-slice pass-through.
    Bytes,
    /// Raw JSON text.
    Json,
    /// Timestamp as u64 UTC seconds.
    Timestamp,
    /// UUID as 16 raw bytes.
    Uuid,
}

impl EncoderId {
    /// Stable identifier used in field-tag hints.
    #[must_use]
    pub fn ident(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::Json => "json",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
        }
    }

    /// Name of the encoder instance in the emitted encoder artifact.
    #[must_use]
    pub fn static_name(self) -> &'static str {
        match self {
            Self::Bytes => "ENCODER_BYTES",
            Self::Json => "ENCODER_JSON",
            Self::Timestamp => "ENCODER_TIMESTAMP",
            Self::Uuid => "ENCODER_UUID",
        }
    }

    /// Concrete Rust type the encoder handles.
    #[must_use]
    pub fn rust_type(self) -> &'static str {
        match self {
            Self::Bytes => "Vec<u8>",
            Self::Json => "serde_json::Value",
            Self::Timestamp => "chrono::DateTime<chrono::Utc>",
            Self::Uuid => "uuid::Uuid",
        }
    }

    /// Resolves a field-tag hint to an encoder identity.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint {
            "bytes" => Some(Self::Bytes),
            "json" => Some(Self::Json),
            "timestamp" => Some(Self::Timestamp),
            "uuid" => Some(Self::Uuid),
            _ => None,
        }
    }

    /// Looks up an imported type path (without generic arguments) in the
    /// registry.
    #[must_use]
    pub fn for_type_path(path: &str) -> Option<Self> {
        match path {
            "chrono::DateTime" => Some(Self::Timestamp),
            "uuid::Uuid" => Some(Self::Uuid),
            "serde_json::Value" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Packages always routed through the registry and never recorded as
/// external imports of the generated artifact.
#[must_use]
pub fn is_special_package(package: &str) -> bool {
    matches!(package, "chrono" | "uuid" | "serde_json")
}
