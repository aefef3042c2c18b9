//! Shared support for borshgen generated codecs.
//!
//! One copy of this module is emitted per output directory; every generated
//! artifact in that directory reads and writes through it. Standard library
//! only: generated code must not pull dependencies into the crate it lands
//! in.

use std::fmt;
use std::sync::{Mutex, OnceLock};

/// Advisory cap on the byte length of strings and byte slices.
pub const MAX_STRING_LEN: usize = 65535;

/// Advisory cap on the element count of dynamic slices.
pub const MAX_SLICE_LEN: usize = 65535;

/// Initial capacity handed out by the scratch pool.
pub const SCRATCH_CAPACITY: usize = 4096;

/// Error raised by generated codecs on malformed input or rejected values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Buffer ended before a field could be read.
    Short {
        /// Field being read.
        field: &'static str,
        /// Bytes required to finish the read.
        required: usize,
        /// Bytes actually available.
        available: usize,
    },
    /// A length prefix exceeded the configured cap.
    Oversize {
        /// Field being read or written.
        field: &'static str,
        /// Length carried by the prefix.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Input had bytes left over after the last field.
    TrailingBytes {
        /// Bytes consumed by the decoder.
        consumed: usize,
        /// Total bytes supplied.
        total: usize,
    },
    /// A string payload was not valid UTF-8.
    InvalidUtf8 {
        /// Field being read.
        field: &'static str,
    },
    /// A dynamically typed value had an unexpected concrete type.
    TypeMismatch {
        /// Field crossing the encoder boundary.
        field: &'static str,
        /// Concrete type the codec expected.
        expected: &'static str,
    },
    /// A custom encoder rejected the value.
    Encoder {
        /// Field being encoded or decoded.
        field: &'static str,
        /// Encoder-supplied message.
        message: String,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short {
                field,
                required,
                available,
            } => write!(
                f,
                "buffer too short for {field}: required {required} bytes, available {available}"
            ),
            Self::Oversize { field, len, max } => {
                write!(f, "length {len} for {field} exceeds maximum {max}")
            }
            Self::TrailingBytes { consumed, total } => {
                write!(f, "trailing bytes: consumed {consumed} of {total}")
            }
            Self::InvalidUtf8 { field } => write!(f, "invalid UTF-8 in {field}"),
            Self::TypeMismatch { field, expected } => {
                write!(f, "type mismatch for {field}: expected {expected}")
            }
            Self::Encoder { field, message } => {
                write!(f, "custom encoder failed for {field}: {message}")
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// Result alias for generated codec operations.
pub type FormatResult<T> = Result<T, FormatError>;

#[inline]
fn need(data: &[u8], offset: usize, n: usize, field: &'static str) -> FormatResult<()> {
    if offset + n > data.len() {
        return Err(FormatError::Short {
            field,
            required: n,
            available: data.len().saturating_sub(offset),
        });
    }
    Ok(())
}

/// Reads one byte, returning the value and the advanced offset.
#[inline]
pub fn get_u8(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(u8, usize)> {
    need(data, offset, 1, field)?;
    Ok((data[offset], offset + 1))
}

/// Reads a little-endian u16.
#[inline]
pub fn get_u16(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(u16, usize)> {
    need(data, offset, 2, field)?;
    let v = u16::from_le_bytes([data[offset], data[offset + 1]]);
    Ok((v, offset + 2))
}

/// Reads a little-endian u32.
#[inline]
pub fn get_u32(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(u32, usize)> {
    need(data, offset, 4, field)?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[offset..offset + 4]);
    Ok((u32::from_le_bytes(raw), offset + 4))
}

/// Reads a little-endian u64.
#[inline]
pub fn get_u64(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(u64, usize)> {
    need(data, offset, 8, field)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[offset..offset + 8]);
    Ok((u64::from_le_bytes(raw), offset + 8))
}

/// Reads an IEEE-754 f32 from its little-endian bit pattern.
#[inline]
pub fn get_f32(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(f32, usize)> {
    let (bits, offset) = get_u32(data, offset, field)?;
    Ok((f32::from_bits(bits), offset))
}

/// Reads an IEEE-754 f64 from its little-endian bit pattern.
#[inline]
pub fn get_f64(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(f64, usize)> {
    let (bits, offset) = get_u64(data, offset, field)?;
    Ok((f64::from_bits(bits), offset))
}

/// Reads a one-byte bool (zero is false, anything else true).
#[inline]
pub fn get_bool(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(bool, usize)> {
    let (b, offset) = get_u8(data, offset, field)?;
    Ok((b != 0, offset))
}

/// Reads a u16-length-prefixed byte payload, enforcing [`MAX_STRING_LEN`].
#[inline]
pub fn get_bytes<'a>(
    data: &'a [u8],
    offset: usize,
    field: &'static str,
) -> FormatResult<(&'a [u8], usize)> {
    let (len, offset) = get_u16(data, offset, field)?;
    let len = len as usize;
    if len > MAX_STRING_LEN {
        return Err(FormatError::Oversize {
            field,
            len,
            max: MAX_STRING_LEN,
        });
    }
    need(data, offset, len, field)?;
    Ok((&data[offset..offset + len], offset + len))
}

/// Reads a u16-length-prefixed UTF-8 string payload.
#[inline]
pub fn get_string(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(String, usize)> {
    let (raw, offset) = get_bytes(data, offset, field)?;
    let s = std::str::from_utf8(raw).map_err(|_| FormatError::InvalidUtf8 { field })?;
    Ok((s.to_owned(), offset))
}

/// Reads a u16 element count, enforcing [`MAX_SLICE_LEN`].
#[inline]
pub fn get_count(data: &[u8], offset: usize, field: &'static str) -> FormatResult<(usize, usize)> {
    let (count, offset) = get_u16(data, offset, field)?;
    let count = count as usize;
    if count > MAX_SLICE_LEN {
        return Err(FormatError::Oversize {
            field,
            len: count,
            max: MAX_SLICE_LEN,
        });
    }
    Ok((count, offset))
}

/// Reads exactly `n` raw bytes (fixed arrays, registry payloads).
#[inline]
pub fn get_fixed<'a>(
    data: &'a [u8],
    offset: usize,
    n: usize,
    field: &'static str,
) -> FormatResult<(&'a [u8], usize)> {
    need(data, offset, n, field)?;
    Ok((&data[offset..offset + n], offset + n))
}

/// Fails with [`FormatError::TrailingBytes`] unless the whole input was
/// consumed.
#[inline]
pub fn ensure_consumed(consumed: usize, total: usize) -> FormatResult<()> {
    if consumed != total {
        return Err(FormatError::TrailingBytes { consumed, total });
    }
    Ok(())
}

/// Appends one byte.
#[inline]
pub fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

/// Appends a little-endian u16.
#[inline]
pub fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Appends a little-endian u32.
#[inline]
pub fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Appends a little-endian u64.
#[inline]
pub fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Appends an f32 as its little-endian bit pattern.
#[inline]
pub fn put_f32(buf: &mut Vec<u8>, v: f32) {
    put_u32(buf, v.to_bits());
}

/// Appends an f64 as its little-endian bit pattern.
#[inline]
pub fn put_f64(buf: &mut Vec<u8>, v: f64) {
    put_u64(buf, v.to_bits());
}

/// Appends a bool as one byte.
#[inline]
pub fn put_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(u8::from(v));
}

/// Appends a u16 length prefix followed by the payload.
///
/// The [`MAX_STRING_LEN`] cap is advisory and enforced on read only; the
/// write path performs no validation.
#[inline]
pub fn put_bytes(buf: &mut Vec<u8>, payload: &[u8]) {
    put_u16(buf, payload.len() as u16);
    buf.extend_from_slice(payload);
}

/// Appends a u16 element count.
///
/// The [`MAX_SLICE_LEN`] cap is advisory and enforced on read only; the
/// write path performs no validation.
#[inline]
pub fn put_count(buf: &mut Vec<u8>, count: usize) {
    put_u16(buf, count as u16);
}

/// Process-wide pool of scratch buffers for pooled `marshal_binary`.
///
/// Acquired buffers come back empty with capacity preserved. Callers must
/// release on every exit path and must never hand an acquired buffer to
/// outside code; `marshal_binary` copies out of the scratch before release.
pub struct ScratchPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl ScratchPool {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
        }
    }

    /// Takes a buffer out of the pool, or allocates a fresh one.
    ///
    /// The returned buffer has length zero.
    #[must_use]
    pub fn acquire(&self) -> Vec<u8> {
        let mut guard = self.buffers.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(SCRATCH_CAPACITY))
    }

    /// Returns a buffer to the pool, clearing its contents.
    pub fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut guard = self.buffers.lock().unwrap_or_else(|e| e.into_inner());
        guard.push(buf);
    }

    /// Number of idle buffers currently held.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.buffers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared pool instance used by pooled generated marshalers.
pub fn scratch_pool() -> &'static ScratchPool {
    static POOL: OnceLock<ScratchPool> = OnceLock::new();
    POOL.get_or_init(ScratchPool::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put_primitives() {
        let mut buf = Vec::new();
        put_u8(&mut buf, 0xAB);
        put_u16(&mut buf, 0x1234);
        put_u32(&mut buf, 0xDEADBEEF);
        put_u64(&mut buf, 0x0123_4567_89AB_CDEF);
        put_f32(&mut buf, 1.5);
        put_f64(&mut buf, -2.25);
        put_bool(&mut buf, true);

        let (v, off) = get_u8(&buf, 0, "a").expect("u8");
        assert_eq!(v, 0xAB);
        let (v, off) = get_u16(&buf, off, "b").expect("u16");
        assert_eq!(v, 0x1234);
        let (v, off) = get_u32(&buf, off, "c").expect("u32");
        assert_eq!(v, 0xDEADBEEF);
        let (v, off) = get_u64(&buf, off, "d").expect("u64");
        assert_eq!(v, 0x0123_4567_89AB_CDEF);
        let (v, off) = get_f32(&buf, off, "e").expect("f32");
        assert_eq!(v, 1.5);
        let (v, off) = get_f64(&buf, off, "f").expect("f64");
        assert_eq!(v, -2.25);
        let (v, off) = get_bool(&buf, off, "g").expect("bool");
        assert!(v);
        assert_eq!(off, buf.len());
        ensure_consumed(off, buf.len()).expect("consumed");
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = Vec::new();
        put_u16(&mut buf, 0x0102);
        assert_eq!(buf, [0x02, 0x01]);
    }

    #[test]
    fn test_get_bytes_roundtrip() {
        let mut buf = Vec::new();
        put_bytes(&mut buf, b"hi");
        assert_eq!(buf, [0x02, 0x00, b'h', b'i']);
        let (raw, off) = get_bytes(&buf, 0, "data").expect("get");
        assert_eq!(raw, b"hi");
        assert_eq!(off, 4);
    }

    #[test]
    fn test_empty_bytes_prefix_only() {
        let mut buf = Vec::new();
        put_bytes(&mut buf, b"");
        assert_eq!(buf, [0x00, 0x00]);
    }

    #[test]
    fn test_get_string() {
        let mut buf = Vec::new();
        put_bytes(&mut buf, "héllo".as_bytes());
        let (s, _) = get_string(&buf, 0, "name").expect("get");
        assert_eq!(s, "héllo");
    }

    #[test]
    fn test_get_string_invalid_utf8() {
        let buf = vec![0x02, 0x00, 0xFF, 0xFE];
        let err = get_string(&buf, 0, "name").unwrap_err();
        assert!(matches!(err, FormatError::InvalidUtf8 { field: "name" }));
    }

    #[test]
    fn test_short_buffer() {
        let buf = vec![0x01];
        let err = get_u32(&buf, 0, "x").unwrap_err();
        match err {
            FormatError::Short {
                field,
                required,
                available,
            } => {
                assert_eq!(field, "x");
                assert_eq!(required, 4);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bytes_payload_truncated() {
        // Prefix says 4 bytes, only 2 present.
        let buf = vec![0x04, 0x00, 0xAA, 0xBB];
        assert!(matches!(
            get_bytes(&buf, 0, "p").unwrap_err(),
            FormatError::Short { .. }
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let err = ensure_consumed(3, 5).unwrap_err();
        assert_eq!(
            err,
            FormatError::TrailingBytes {
                consumed: 3,
                total: 5
            }
        );
    }

    #[test]
    fn test_caps_are_read_side_only() {
        // The write path performs no validation; the caps bite on read.
        let mut buf = Vec::new();
        put_count(&mut buf, MAX_SLICE_LEN);
        assert_eq!(buf, (MAX_SLICE_LEN as u16).to_le_bytes());

        let payload = vec![0u8; MAX_STRING_LEN];
        buf.clear();
        put_bytes(&mut buf, &payload);
        assert_eq!(buf.len(), 2 + MAX_STRING_LEN);
        assert_eq!(&buf[..2], (MAX_STRING_LEN as u16).to_le_bytes());
    }

    #[test]
    fn test_error_display() {
        let err = FormatError::Short {
            field: "id",
            required: 8,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("id"));
        assert!(msg.contains("8"));
        assert!(msg.contains("3"));
    }

    #[test]
    fn test_scratch_pool_cycle() {
        let pool = ScratchPool::new();
        assert_eq!(pool.idle(), 0);

        let mut a = pool.acquire();
        assert!(a.is_empty());
        a.extend_from_slice(b"scribble");
        pool.release(a);
        assert_eq!(pool.idle(), 1);

        let b = pool.acquire();
        assert!(b.is_empty(), "released buffers must come back cleared");
        pool.release(b);
    }

    #[test]
    fn test_shared_pool_instance() {
        // Other tests may share the global pool; only assert the
        // acquire/release contract, not occupancy.
        let mut a = scratch_pool().acquire();
        assert!(a.is_empty());
        a.extend_from_slice(b"x");
        scratch_pool().release(a);
        let b = scratch_pool().acquire();
        assert!(b.is_empty());
        scratch_pool().release(b);
    }
}
