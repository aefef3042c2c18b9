//! Built-in custom field encoders.
//!
//! One copy of this module is emitted per output directory next to the
//! helper artifact. A custom encoder handles a field the wire format has no
//! native shape for; values cross the boundary dynamically typed and are
//! downcast on entry. Beyond the standard library, only `chrono`, `uuid`
//! and `serde_json` are used, and only because the field types they handle
//! already require those crates in the owning code.

use std::any::Any;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::helpers::{FormatError, FormatResult};

/// Contract for pluggable field codecs.
///
/// `field` is the field value, `owner` the record holding it; both are
/// dynamically typed. `encode` emits the digest byte form and must not
/// write a length prefix.
pub trait FieldEncoder {
    /// Serializes the field value to its wire payload (no length prefix;
    /// the caller prefixes it).
    fn marshal_binary(&self, field: &dyn Any, owner: &dyn Any) -> FormatResult<Vec<u8>>;

    /// Reconstructs the field value from its wire payload.
    fn unmarshal_binary(&self, data: &[u8]) -> FormatResult<Box<dyn Any>>;

    /// Exact byte count `marshal_binary` will produce for the value.
    fn binary_size(&self, field: &dyn Any, owner: &dyn Any) -> FormatResult<usize>;

    /// Deterministic digest byte form, with no length prefix.
    fn encode(&self, field: &dyn Any, owner: &dyn Any) -> FormatResult<Vec<u8>>;
}

fn downcast<'a, T: 'static>(field: &'a dyn Any, expected: &'static str) -> FormatResult<&'a T> {
    field.downcast_ref::<T>().ok_or(FormatError::TypeMismatch {
        field: "custom encoder input",
        expected,
    })
}

/// Pass-through codec for `Vec<u8>` fields.
pub struct ByteSliceEncoder;

impl FieldEncoder for ByteSliceEncoder {
    fn marshal_binary(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<Vec<u8>> {
        Ok(downcast::<Vec<u8>>(field, "Vec<u8>")?.clone())
    }

    fn unmarshal_binary(&self, data: &[u8]) -> FormatResult<Box<dyn Any>> {
        Ok(Box::new(data.to_vec()))
    }

    fn binary_size(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<usize> {
        Ok(downcast::<Vec<u8>>(field, "Vec<u8>")?.len())
    }

    fn encode(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<Vec<u8>> {
        Ok(downcast::<Vec<u8>>(field, "Vec<u8>")?.clone())
    }
}

/// Raw JSON codec for `serde_json::Value` fields.
///
/// The payload is the JSON text itself. `serde_json` renders object keys in
/// map order, so the same value always produces the same bytes.
pub struct RawJsonEncoder;

impl RawJsonEncoder {
    fn to_bytes(field: &dyn Any) -> FormatResult<Vec<u8>> {
        let value = downcast::<Value>(field, "serde_json::Value")?;
        serde_json::to_vec(value).map_err(|e| FormatError::Encoder {
            field: "raw JSON",
            message: e.to_string(),
        })
    }
}

impl FieldEncoder for RawJsonEncoder {
    fn marshal_binary(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<Vec<u8>> {
        Self::to_bytes(field)
    }

    fn unmarshal_binary(&self, data: &[u8]) -> FormatResult<Box<dyn Any>> {
        let value: Value = serde_json::from_slice(data).map_err(|e| FormatError::Encoder {
            field: "raw JSON",
            message: e.to_string(),
        })?;
        Ok(Box::new(value))
    }

    fn binary_size(&self, field: &dyn Any, owner: &dyn Any) -> FormatResult<usize> {
        self.marshal_binary(field, owner).map(|b| b.len())
    }

    fn encode(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<Vec<u8>> {
        Self::to_bytes(field)
    }
}

/// Timestamp codec: `chrono::DateTime<Utc>` as u64 UTC seconds, little
/// endian. Sub-second precision is not carried.
pub struct TimestampEncoder;

impl FieldEncoder for TimestampEncoder {
    fn marshal_binary(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<Vec<u8>> {
        let ts = downcast::<DateTime<Utc>>(field, "chrono::DateTime<Utc>")?;
        Ok((ts.timestamp() as u64).to_le_bytes().to_vec())
    }

    fn unmarshal_binary(&self, data: &[u8]) -> FormatResult<Box<dyn Any>> {
        if data.len() != 8 {
            return Err(FormatError::Short {
                field: "timestamp",
                required: 8,
                available: data.len(),
            });
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(data);
        let secs = u64::from_le_bytes(raw);
        let ts = Utc
            .timestamp_opt(secs as i64, 0)
            .single()
            .ok_or(FormatError::Encoder {
                field: "timestamp",
                message: format!("seconds value {secs} out of range"),
            })?;
        Ok(Box::new(ts))
    }

    fn binary_size(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<usize> {
        downcast::<DateTime<Utc>>(field, "chrono::DateTime<Utc>")?;
        Ok(8)
    }

    fn encode(&self, field: &dyn Any, owner: &dyn Any) -> FormatResult<Vec<u8>> {
        self.marshal_binary(field, owner)
    }
}

/// UUID codec: 16 raw bytes.
pub struct UuidEncoder;

impl FieldEncoder for UuidEncoder {
    fn marshal_binary(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<Vec<u8>> {
        let id = downcast::<Uuid>(field, "uuid::Uuid")?;
        Ok(id.as_bytes().to_vec())
    }

    fn unmarshal_binary(&self, data: &[u8]) -> FormatResult<Box<dyn Any>> {
        if data.len() != 16 {
            return Err(FormatError::Short {
                field: "uuid",
                required: 16,
                available: data.len(),
            });
        }
        let mut raw = [0u8; 16];
        raw.copy_from_slice(data);
        Ok(Box::new(Uuid::from_bytes(raw)))
    }

    fn binary_size(&self, field: &dyn Any, _owner: &dyn Any) -> FormatResult<usize> {
        downcast::<Uuid>(field, "uuid::Uuid")?;
        Ok(16)
    }

    fn encode(&self, field: &dyn Any, owner: &dyn Any) -> FormatResult<Vec<u8>> {
        self.marshal_binary(field, owner)
    }
}

/// Byte-slice pass-through instance referenced by generated code.
pub static ENCODER_BYTES: ByteSliceEncoder = ByteSliceEncoder;

/// Raw-JSON instance referenced by generated code.
pub static ENCODER_JSON: RawJsonEncoder = RawJsonEncoder;

/// Timestamp instance referenced by generated code.
pub static ENCODER_TIMESTAMP: TimestampEncoder = TimestampEncoder;

/// UUID instance referenced by generated code.
pub static ENCODER_UUID: UuidEncoder = UuidEncoder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_slice_roundtrip() {
        let owner = ();
        let field: Vec<u8> = vec![1, 2, 3];
        let bytes = ENCODER_BYTES.marshal_binary(&field, &owner).expect("marshal");
        assert_eq!(bytes, field);
        assert_eq!(ENCODER_BYTES.binary_size(&field, &owner).expect("size"), 3);

        let back = ENCODER_BYTES.unmarshal_binary(&bytes).expect("unmarshal");
        let back = back.downcast::<Vec<u8>>().expect("downcast");
        assert_eq!(*back, field);
    }

    #[test]
    fn test_byte_slice_type_mismatch() {
        let owner = ();
        let wrong = String::from("not bytes");
        let err = ENCODER_BYTES.marshal_binary(&wrong, &owner).unwrap_err();
        assert!(matches!(err, FormatError::TypeMismatch { .. }));
    }

    #[test]
    fn test_json_roundtrip_deterministic() {
        let owner = ();
        let value: Value = serde_json::from_str(r#"{"b":1,"a":[true,null]}"#).expect("json");
        let first = ENCODER_JSON.encode(&value, &owner).expect("encode");
        let second = ENCODER_JSON.encode(&value, &owner).expect("encode");
        assert_eq!(first, second);
        assert_eq!(
            ENCODER_JSON.binary_size(&value, &owner).expect("size"),
            first.len()
        );

        let back = ENCODER_JSON.unmarshal_binary(&first).expect("unmarshal");
        let back = back.downcast::<Value>().expect("downcast");
        assert_eq!(*back, value);
    }

    #[test]
    fn test_timestamp_roundtrip_seconds() {
        let owner = ();
        let ts = Utc.timestamp_opt(1_700_000_123, 0).single().expect("ts");
        let bytes = ENCODER_TIMESTAMP.marshal_binary(&ts, &owner).expect("marshal");
        assert_eq!(bytes.len(), 8);
        assert_eq!(ENCODER_TIMESTAMP.binary_size(&ts, &owner).expect("size"), 8);

        let back = ENCODER_TIMESTAMP.unmarshal_binary(&bytes).expect("unmarshal");
        let back = back.downcast::<DateTime<Utc>>().expect("downcast");
        assert_eq!(*back, ts);
    }

    #[test]
    fn test_timestamp_short_payload() {
        let err = ENCODER_TIMESTAMP.unmarshal_binary(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, FormatError::Short { required: 8, .. }));
    }

    #[test]
    fn test_uuid_roundtrip() {
        let owner = ();
        let id = Uuid::new_v4();
        let bytes = ENCODER_UUID.marshal_binary(&id, &owner).expect("marshal");
        assert_eq!(bytes.len(), 16);

        let back = ENCODER_UUID.unmarshal_binary(&bytes).expect("unmarshal");
        let back = back.downcast::<Uuid>().expect("downcast");
        assert_eq!(*back, id);
    }

    #[test]
    fn test_uuid_wrong_length() {
        let err = ENCODER_UUID.unmarshal_binary(&[0u8; 15]).unwrap_err();
        assert!(matches!(err, FormatError::Short { required: 16, .. }));
    }

    #[test]
    fn test_encode_equals_marshal_for_fixed_codecs() {
        let owner = ();
        let id = Uuid::from_u128(0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10);
        assert_eq!(
            ENCODER_UUID.encode(&id, &owner).expect("encode"),
            ENCODER_UUID.marshal_binary(&id, &owner).expect("marshal")
        );
    }
}
