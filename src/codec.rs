//! Low-level wire helpers shared by the descriptor families.
//!
//! Integers and length prefixes are read and written at an explicit byte offset with a
//! configurable byte order. Reads that would run past the end of the buffer are lenient and
//! yield zero; writes that would run past the end fail with [`CodecError::BufferTooSmall`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endianness {
    Big,
    Little,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Type mismatch: {data_type} expects {expected}, got {found}")]
    TypeMismatch {
        data_type: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Unknown enum label: {0}")]
    UnknownEnumLabel(String),
    #[error("Unknown enum value: {0}")]
    UnknownEnumValue(u64),
    #[error("Unknown bit name: {0}")]
    UnknownBitName(String),
    #[error("{strukt}: {field} is an unexpected field")]
    UnexpectedField { strukt: String, field: String },
    #[error("Duplicate field: {0}")]
    DuplicateField(String),
    #[error("Too many values: {found} given for {expected} fields")]
    TooManyValues { expected: usize, found: usize },
    #[error("Invalid buffer size: expected {expected} bytes, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
    #[error("Length {len} exceeds maximum {max}")]
    TooLong { len: usize, max: usize },
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Fails unless `len` bytes starting at `offset` fit in a buffer of `available` bytes.
pub(crate) fn ensure_room(available: usize, offset: usize, len: usize) -> Result<(), CodecError> {
    let needed = offset.saturating_add(len);
    if needed > available {
        return Err(CodecError::BufferTooSmall { needed, available });
    }
    Ok(())
}

fn mask_for(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    }
}

/// Returns the `width` bytes at `offset`, or `None` when the buffer is too short.
fn window(buf: &[u8], offset: usize, width: usize) -> Option<&[u8]> {
    let end = offset.checked_add(width)?;
    buf.get(offset..end)
}

/// Read an unsigned integer of `width` bytes (0..=8). Short reads yield 0.
pub(crate) fn read_uint(buf: &[u8], offset: usize, width: usize, endianness: Endianness) -> u64 {
    if width == 0 {
        return 0;
    }
    match window(buf, offset, width) {
        Some(bytes) => match endianness {
            Endianness::Big => BigEndian::read_uint(bytes, width),
            Endianness::Little => LittleEndian::read_uint(bytes, width),
        },
        None => {
            debug!(offset, width, len = buf.len(), "short read, substituting zero");
            0
        }
    }
}

/// Read a sign-extended integer of `width` bytes (1..=8), little-endian. Short reads yield 0.
pub(crate) fn read_int(buf: &[u8], offset: usize, width: usize) -> i64 {
    if width == 0 {
        return 0;
    }
    match window(buf, offset, width) {
        Some(bytes) => LittleEndian::read_int(bytes, width),
        None => {
            debug!(offset, width, len = buf.len(), "short read, substituting zero");
            0
        }
    }
}

/// Write the low `width` bytes of `v`. Higher bits are truncated.
pub(crate) fn write_uint(
    buf: &mut [u8],
    offset: usize,
    width: usize,
    v: u64,
    endianness: Endianness,
) -> Result<(), CodecError> {
    if width == 0 {
        return Ok(());
    }
    ensure_room(buf.len(), offset, width)?;
    let out = &mut buf[offset..offset + width];
    let v = v & mask_for(width);
    match endianness {
        Endianness::Big => BigEndian::write_uint(out, v, width),
        Endianness::Little => LittleEndian::write_uint(out, v, width),
    }
    Ok(())
}

pub(crate) fn read_f32(buf: &[u8], offset: usize) -> f32 {
    window(buf, offset, 4).map(LittleEndian::read_f32).unwrap_or(0.0)
}

pub(crate) fn read_f64(buf: &[u8], offset: usize) -> f64 {
    window(buf, offset, 8).map(LittleEndian::read_f64).unwrap_or(0.0)
}

pub(crate) fn write_f32(buf: &mut [u8], offset: usize, v: f32) -> Result<(), CodecError> {
    ensure_room(buf.len(), offset, 4)?;
    LittleEndian::write_f32(&mut buf[offset..offset + 4], v);
    Ok(())
}

pub(crate) fn write_f64(buf: &mut [u8], offset: usize, v: f64) -> Result<(), CodecError> {
    ensure_room(buf.len(), offset, 8)?;
    LittleEndian::write_f64(&mut buf[offset..offset + 8], v);
    Ok(())
}

/// Largest payload length a little-endian prefix of `width` bytes can carry.
pub(crate) fn prefix_max(width: usize) -> usize {
    if width == 0 {
        usize::MAX
    } else {
        usize::try_from(mask_for(width)).unwrap_or(usize::MAX)
    }
}

/// Write a little-endian length prefix; `width` 0 writes nothing.
pub(crate) fn write_prefix(
    buf: &mut [u8],
    offset: usize,
    width: usize,
    len: usize,
) -> Result<(), CodecError> {
    let max = prefix_max(width);
    if len > max {
        return Err(CodecError::TooLong { len, max });
    }
    write_uint(buf, offset, width, len as u64, Endianness::Little)
}

/// Copy `len` bytes starting at `offset`, zero-filling whatever lies past the buffer end.
pub(crate) fn read_block(buf: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if offset < buf.len() {
        let avail = (buf.len() - offset).min(len);
        out[..avail].copy_from_slice(&buf[offset..offset + avail]);
    }
    out
}

pub(crate) fn write_block(buf: &mut [u8], offset: usize, bytes: &[u8]) -> Result<(), CodecError> {
    ensure_room(buf.len(), offset, bytes.len())?;
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/// Colon-separated lowercase hex, e.g. `00:1a:ff`.
pub(crate) fn format_hex_octets(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse `expected` octets from colon-separated (`0:1a:ff`) or contiguous (`001aff`) hex.
pub(crate) fn parse_hex_octets(s: &str, expected: usize) -> Result<Vec<u8>, CodecError> {
    let invalid = || CodecError::InvalidHex(s.to_string());
    let trimmed = s.trim();
    let octets: Vec<u8> = if trimmed.contains(':') {
        trimmed
            .split(':')
            .map(|part| {
                if part.is_empty() || part.len() > 2 {
                    return Err(invalid());
                }
                u8::from_str_radix(part, 16).map_err(|_| invalid())
            })
            .collect::<Result<_, _>>()?
    } else {
        if trimmed.len() % 2 != 0 || !trimmed.is_ascii() {
            return Err(invalid());
        }
        (0..trimmed.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&trimmed[i..i + 2], 16).map_err(|_| invalid()))
            .collect::<Result<_, _>>()?
    };
    if octets.len() != expected {
        return Err(invalid());
    }
    Ok(octets)
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
}

/// Text cleanup applied to every decoded string: cut at the first NUL, drop C0/C1 control
/// characters, trim surrounding whitespace. Invalid UTF-8 is replaced, never rejected.
pub(crate) fn clean_text(raw: &[u8]) -> String {
    let raw = match raw.iter().position(|&b| b == 0) {
        Some(nul) => &raw[..nul],
        None => raw,
    };
    let text: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .collect();
    text.trim().to_string()
}
