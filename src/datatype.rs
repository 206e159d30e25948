//! The [`DataType`] descriptor: a self-describing wire type.
//!
//! A descriptor knows its protocol id, its display name, its [`Length`] class, and how to
//! encode/decode a [`Value`] at a [`Position`] in a byte buffer. Family parameters (enum labels,
//! bit names, array element type, nested struct) are carried by the descriptor and exposed
//! through [`DataType::args`].
//!
//! ## Length classes
//!
//! | [`Length`] | Encode writes | Decode reports |
//! |------------|---------------|----------------|
//! | `Fixed(n)` | exactly `n` bytes | always `n` |
//! | `Variable { prefix }` | prefix + payload | prefix + payload actually declared |
//! | `Nibble` | half of one byte | 0 (the caller advances its [`Position`]) |
//!
//! A `Variable` prefix of 0 means "no count on the wire, runs to the end of the buffer".
//!
//! ## Nibble addressing
//!
//! Two adjacent nibble fields share one byte: the first occupies the LOW nibble (bits 0..3),
//! the second the HIGH nibble (bits 4..7). [`Position::advance`] implements this walk; a
//! byte-aligned field after a dangling low nibble starts at the next whole byte.

use crate::bitmap::{BitNames, Bitmap};
use crate::codec::{self, CodecError, Endianness};
use crate::structs::StructDef;
use crate::value::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Fixed(usize),
    /// `prefix` is the byte width of the leading little-endian count (0, 1 or 2).
    Variable { prefix: usize },
    Nibble,
}

impl Length {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Length::Fixed(_))
    }

    /// Fixed and non-zero: the only class that counts toward a struct's static size.
    pub fn is_positive_fixed(&self) -> bool {
        matches!(self, Length::Fixed(n) if *n > 0)
    }

    /// Numeric form used by the protocol tooling: `n`, `-prefix`, or `0.5`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Length::Fixed(n) => *n as f64,
            Length::Variable { prefix } => -(*prefix as f64),
            Length::Nibble => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nibble {
    /// Bits 0..3; a position at the low nibble is also the start of the byte.
    #[default]
    Low,
    /// Bits 4..7.
    High,
}

/// A byte offset plus the nibble selected within that byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub byte: usize,
    pub nibble: Nibble,
}

impl Position {
    pub fn new(byte: usize, nibble: Nibble) -> Self {
        Position { byte, nibble }
    }

    /// First whole byte at or after this position.
    pub fn aligned(self) -> usize {
        match self.nibble {
            Nibble::Low => self.byte,
            Nibble::High => self.byte + 1,
        }
    }

    /// Position after a field of class `length` that reported `len` bytes.
    pub fn advance(self, length: Length, len: usize) -> Position {
        match length {
            Length::Nibble => match self.nibble {
                Nibble::Low => Position::new(self.byte, Nibble::High),
                Nibble::High => Position::new(self.byte + 1, Nibble::Low),
            },
            _ => Position::from(self.aligned() + len),
        }
    }
}

impl From<usize> for Position {
    fn from(byte: usize) -> Self {
        Position::new(byte, Nibble::Low)
    }
}

/// Label-to-number mapping backing an enumeration descriptor. Order is kept: reverse lookup
/// returns the first label bound to a number.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMap {
    entries: Arc<[(String, u64)]>,
}

impl Default for EnumMap {
    fn default() -> Self {
        EnumMap {
            entries: Arc::from(Vec::new()),
        }
    }
}

impl EnumMap {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        EnumMap {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn value_of(&self, label: &str) -> Option<u64> {
        self.entries.iter().find(|(k, _)| k == label).map(|(_, v)| *v)
    }

    pub fn label_of(&self, value: u64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(k, _)| k.as_str())
    }

    pub fn contains_value(&self, value: u64) -> bool {
        self.entries.iter().any(|(_, v)| *v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, const N: usize> From<[(S, u64); N]> for EnumMap {
    fn from(entries: [(S, u64); N]) -> Self {
        EnumMap::new(entries)
    }
}

/// Family parameters of a descriptor.
#[derive(Debug, Clone, Copy)]
pub enum Args<'a> {
    Plain,
    EnumMap(&'a EnumMap),
    BitNames(&'a [String]),
    Element(&'a DataType),
    Struct(&'a StructDef),
}

/// A decoded value together with the number of bytes it occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: Value,
    pub len: usize,
}

/// Encode/decode logic for descriptors defined outside the built-in catalog.
pub trait CustomCodec: fmt::Debug + Send + Sync {
    /// Exact number of bytes [`CustomCodec::encode`] will write for `value`.
    fn encoded_len(&self, value: &Value) -> Result<usize, CodecError>;
    /// Write `value` at `at`; returns the number of bytes written.
    fn encode(&self, buf: &mut [u8], value: &Value, at: Position) -> Result<usize, CodecError>;
    /// Read a value at `at`. Must not panic on short buffers.
    fn decode(&self, buf: &[u8], at: Position) -> Decoded;
}

#[derive(Debug, Clone)]
pub(crate) enum Kind {
    NoData,
    Bool,
    Uint(usize),
    Int(usize),
    /// Raw big-endian block.
    Data(usize),
    Single,
    Double,
    /// Hardware address, byte-reversed for display.
    Eui(usize),
    Key128,
    /// Length-prefixed bytes; the payload is returned raw.
    Blob(usize),
    /// Length-prefixed UTF-8 text.
    Text(usize),
    FixedString(usize),
    Map(usize, BitNames),
    Enum(usize, EnumMap),
    Uint4,
    Enum4(EnumMap),
    Map4(BitNames),
    /// Homogeneous array with a count prefix of the given width (0 = unbounded).
    Array(usize, Box<DataType>),
    Struct(Arc<StructDef>),
    Custom(Arc<dyn CustomCodec>),
}

/// Raw data blocks up to this width decode to a number; wider blocks decode to bytes.
const DATA_NUMERIC_MAX: usize = 4;

#[derive(Debug, Clone)]
pub struct DataType {
    id: Option<u8>,
    short_name: Cow<'static, str>,
    length: Length,
    kind: Kind,
    default_value: Value,
}

impl DataType {
    pub(crate) fn build(
        id: Option<u8>,
        short_name: impl Into<Cow<'static, str>>,
        length: Length,
        kind: Kind,
    ) -> DataType {
        let mut dt = DataType {
            id,
            short_name: short_name.into(),
            length,
            kind,
            default_value: Value::Null,
        };
        let zeros = vec![0u8; dt.footprint()];
        dt.default_value = dt.decode(&zeros, 0);
        dt
    }

    /// Descriptor backed by user-supplied encode/decode logic. The default value is the decode of
    /// a zeroed buffer, as for the built-in types.
    pub fn custom(
        id: Option<u8>,
        short_name: impl Into<Cow<'static, str>>,
        length: Length,
        codec: impl CustomCodec + 'static,
    ) -> DataType {
        DataType::build(id, short_name, length, Kind::Custom(Arc::new(codec)))
    }

    /// Protocol-assigned id; `None` for helper types without one.
    pub fn id(&self) -> Option<u8> {
        self.id
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn length(&self) -> Length {
        self.length
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn args(&self) -> Args<'_> {
        match &self.kind {
            Kind::Map(_, names) | Kind::Map4(names) => Args::BitNames(names),
            Kind::Enum(_, map) | Kind::Enum4(map) => Args::EnumMap(map),
            Kind::Array(_, elem) => Args::Element(elem),
            Kind::Struct(def) => Args::Struct(def),
            _ => Args::Plain,
        }
    }

    /// Analog (numeric, orderable) vs discrete, by protocol id range. Types without an id count
    /// as analog.
    pub fn is_analog(&self) -> bool {
        match self.id {
            Some(id) => !matches!(id, 8..=16 | 24..=31 | 48..=49 | 65..=68 | 240..=241),
            None => true,
        }
    }

    /// Size of the zeroed buffer the default value is decoded from.
    fn footprint(&self) -> usize {
        if let Kind::Struct(def) = &self.kind {
            return def.size();
        }
        match self.length {
            Length::Fixed(n) => n,
            Length::Variable { prefix } => prefix,
            Length::Nibble => 1,
        }
    }

    fn mismatch(&self, expected: &'static str, found: &Value) -> CodecError {
        CodecError::TypeMismatch {
            data_type: self.short_name.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    /// Exact number of bytes [`DataType::encode`] writes for `value`; 0 for nibble fields.
    pub fn encoded_len(&self, value: &Value) -> Result<usize, CodecError> {
        match (&self.kind, self.length) {
            (Kind::Custom(c), Length::Variable { .. }) => c.encoded_len(value),
            (Kind::Struct(def), Length::Variable { .. }) => {
                let record = def.complete(value)?;
                def.encoded_len(&record)
            }
            (Kind::Blob(prefix), _) => {
                let len = self.blob_payload(value)?.len();
                check_prefix(*prefix, len)?;
                Ok(prefix + len)
            }
            (Kind::Text(prefix), _) => {
                let len = self.text_payload(value)?.len();
                check_prefix(*prefix, len)?;
                Ok(prefix + len)
            }
            (Kind::Array(prefix, elem), _) => {
                let items = value.as_array().ok_or_else(|| self.mismatch("array", value))?;
                check_prefix(*prefix, items.len())?;
                let mut pos = Position::from(*prefix);
                for item in items {
                    let n = elem.encoded_len(item)?;
                    pos = pos.advance(elem.length, n);
                }
                Ok(pos.aligned())
            }
            (_, Length::Fixed(n)) => Ok(n),
            (_, Length::Variable { prefix }) => Ok(prefix),
            (_, Length::Nibble) => Ok(0),
        }
    }

    /// Write `value` at `at`. Returns the number of bytes written (prefix included); nibble
    /// fields report 0.
    pub fn encode(
        &self,
        buf: &mut [u8],
        value: &Value,
        at: impl Into<Position>,
    ) -> Result<usize, CodecError> {
        let at = at.into();
        let result = self.encode_at(buf, value, at);
        if let Err(ref e) = result {
            debug!(data_type = %self.short_name, offset = at.byte, error = %e, "encode failed");
        }
        result
    }

    /// Encode into a freshly allocated buffer of exactly the encoded size.
    pub fn to_vec(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let len = match self.length {
            Length::Nibble => 1,
            _ => self.encoded_len(value)?,
        };
        let mut buf = vec![0u8; len];
        let written = self.encode(&mut buf, value, 0)?;
        if self.length != Length::Nibble {
            buf.truncate(written);
        }
        Ok(buf)
    }

    fn encode_at(&self, buf: &mut [u8], value: &Value, at: Position) -> Result<usize, CodecError> {
        let off = at.aligned();
        match &self.kind {
            Kind::NoData => Ok(0),
            Kind::Bool => {
                let b = match value {
                    Value::Bool(true) => 0x01,
                    Value::Bool(false) => 0x00,
                    Value::Null => 0xff,
                    other => return Err(self.mismatch("bool", other)),
                };
                codec::write_uint(buf, off, 1, b, Endianness::Little)?;
                Ok(1)
            }
            Kind::Uint(w) | Kind::Int(w) => {
                let v = self.integer(value)?;
                codec::write_uint(buf, off, *w, v, Endianness::Little)?;
                Ok(*w)
            }
            Kind::Data(w) => {
                match value {
                    Value::Bytes(b) => self.write_exact(buf, off, *w, b)?,
                    Value::Uint(_) | Value::Int(_) => {
                        codec::write_uint(buf, off, *w, self.integer(value)?, Endianness::Big)?
                    }
                    other => return Err(self.mismatch("number or bytes", other)),
                }
                Ok(*w)
            }
            Kind::Single => {
                let v = value.as_f64().ok_or_else(|| self.mismatch("number", value))?;
                codec::write_f32(buf, off, v as f32)?;
                Ok(4)
            }
            Kind::Double => {
                let v = value.as_f64().ok_or_else(|| self.mismatch("number", value))?;
                codec::write_f64(buf, off, v)?;
                Ok(8)
            }
            Kind::Eui(w) => {
                match value {
                    Value::String(s) => {
                        let mut octets = codec::parse_hex_octets(s, *w)?;
                        octets.reverse();
                        codec::write_block(buf, off, &octets)?;
                    }
                    Value::Bytes(b) => self.write_exact(buf, off, *w, b)?,
                    other => return Err(self.mismatch("hex string or bytes", other)),
                }
                Ok(*w)
            }
            Kind::Key128 => {
                match value {
                    Value::String(s) => {
                        let octets = codec::parse_hex_octets(s, 16)?;
                        codec::write_block(buf, off, &octets)?;
                    }
                    Value::Bytes(b) => self.write_exact(buf, off, 16, b)?,
                    other => return Err(self.mismatch("hex string or bytes", other)),
                }
                Ok(16)
            }
            Kind::Blob(prefix) => {
                let payload = self.blob_payload(value)?;
                codec::write_prefix(buf, off, *prefix, payload.len())?;
                codec::write_block(buf, off + prefix, payload)?;
                Ok(prefix + payload.len())
            }
            Kind::Text(prefix) => {
                let payload = self.text_payload(value)?;
                codec::write_prefix(buf, off, *prefix, payload.len())?;
                codec::write_block(buf, off + prefix, payload)?;
                Ok(prefix + payload.len())
            }
            Kind::FixedString(n) => {
                let s = value.as_str().ok_or_else(|| self.mismatch("string", value))?;
                let mut cut = s.len().min(*n);
                while !s.is_char_boundary(cut) {
                    cut -= 1;
                }
                let mut block = vec![0u8; *n];
                block[..cut].copy_from_slice(&s.as_bytes()[..cut]);
                codec::write_block(buf, off, &block)?;
                Ok(*n)
            }
            Kind::Map(w, names) => {
                let bitmap = self.bitmap(value, *w, names)?;
                bitmap.write_to(buf, off)
            }
            Kind::Enum(w, map) => {
                let v = self.enum_number(value, map)?;
                codec::write_uint(buf, off, *w, v, Endianness::Little)?;
                Ok(*w)
            }
            Kind::Uint4 => {
                let v = self.integer(value)?;
                write_nibble(buf, at, v as u8)?;
                Ok(0)
            }
            Kind::Enum4(map) => {
                let v = self.enum_number(value, map)?;
                write_nibble(buf, at, v as u8)?;
                Ok(0)
            }
            Kind::Map4(names) => {
                let bitmap = self.bitmap(value, 1, names)?;
                write_nibble(buf, at, bitmap.as_bytes()[0])?;
                Ok(0)
            }
            Kind::Array(prefix, elem) => {
                let items = value.as_array().ok_or_else(|| self.mismatch("array", value))?;
                codec::write_prefix(buf, off, *prefix, items.len())?;
                let mut pos = Position::from(off + prefix);
                for item in items {
                    let n = elem.encode(buf, item, pos)?;
                    pos = pos.advance(elem.length, n);
                }
                Ok(pos.aligned() - off)
            }
            Kind::Struct(def) => def.encode_into(buf, value, off),
            Kind::Custom(c) => c.encode(buf, value, at),
        }
    }

    /// Read the value at `at`. Never fails: short buffers yield zero/null/empty values.
    pub fn decode(&self, buf: &[u8], at: impl Into<Position>) -> Value {
        self.decode_with_len(buf, at).value
    }

    /// Read the value at `at` and report how many bytes it occupied. Fixed types always report
    /// their length, nibble types report 0.
    pub fn decode_with_len(&self, buf: &[u8], at: impl Into<Position>) -> Decoded {
        let at = at.into();
        let off = at.aligned();
        let fixed = |value: Value| Decoded {
            value,
            len: match self.length {
                Length::Fixed(n) => n,
                _ => 0,
            },
        };
        match &self.kind {
            Kind::NoData => fixed(Value::Null),
            Kind::Bool => fixed(match buf.get(off) {
                None => {
                    debug!(offset = off, len = buf.len(), "short read, substituting null");
                    Value::Null
                }
                Some(0xff) => Value::Null,
                Some(0x00) => Value::Bool(false),
                Some(_) => Value::Bool(true),
            }),
            Kind::Uint(w) => fixed(Value::Uint(codec::read_uint(buf, off, *w, Endianness::Little))),
            Kind::Int(w) => fixed(Value::Int(codec::read_int(buf, off, *w))),
            Kind::Data(w) if *w <= DATA_NUMERIC_MAX => {
                fixed(Value::Uint(codec::read_uint(buf, off, *w, Endianness::Big)))
            }
            Kind::Data(w) => fixed(Value::Bytes(codec::read_block(buf, off, *w))),
            Kind::Single => fixed(Value::Single(codec::read_f32(buf, off))),
            Kind::Double => fixed(Value::Double(codec::read_f64(buf, off))),
            Kind::Eui(w) => {
                let mut octets = codec::read_block(buf, off, *w);
                octets.reverse();
                fixed(Value::String(codec::format_hex_octets(&octets)))
            }
            Kind::Key128 => fixed(Value::String(codec::format_hex_octets(&codec::read_block(
                buf, off, 16,
            )))),
            Kind::Blob(prefix) => {
                let (payload, len) = prefixed_payload(buf, off, *prefix);
                Decoded {
                    value: Value::Bytes(payload.to_vec()),
                    len,
                }
            }
            Kind::Text(prefix) => {
                let (payload, len) = prefixed_payload(buf, off, *prefix);
                Decoded {
                    value: Value::String(codec::clean_text(payload)),
                    len,
                }
            }
            Kind::FixedString(n) => {
                fixed(Value::String(codec::clean_text(&codec::read_block(buf, off, *n))))
            }
            Kind::Map(w, names) => {
                fixed(Value::Bitmap(Bitmap::from_slice(buf, off, *w, names.clone())))
            }
            Kind::Enum(w, map) => {
                let v = codec::read_uint(buf, off, *w, Endianness::Little);
                fixed(label(map, v))
            }
            Kind::Uint4 => fixed(Value::Uint(read_nibble(buf, at) as u64)),
            Kind::Enum4(map) => fixed(label(map, read_nibble(buf, at) as u64)),
            Kind::Map4(names) => fixed(Value::Bitmap(Bitmap::from_bytes(
                vec![read_nibble(buf, at)],
                names.clone(),
            ))),
            Kind::Array(prefix, elem) => self.decode_array(buf, off, *prefix, elem),
            Kind::Struct(def) => {
                let (record, len) = def.decode_with_len(buf, off);
                Decoded {
                    value: Value::Struct(record),
                    len,
                }
            }
            Kind::Custom(c) => c.decode(buf, at),
        }
    }

    fn decode_array(&self, buf: &[u8], off: usize, prefix: usize, elem: &DataType) -> Decoded {
        let count = if prefix > 0 {
            Some(codec::read_uint(buf, off, prefix, Endianness::Little) as usize)
        } else {
            None
        };
        let mut items = Vec::new();
        let mut pos = Position::from(off + prefix);
        loop {
            if count.is_some_and(|c| items.len() >= c) || pos.byte >= buf.len() {
                break;
            }
            let d = elem.decode_with_len(buf, pos);
            if count.is_none() && d.len == 0 && elem.length != Length::Nibble {
                break;
            }
            pos = pos.advance(elem.length, d.len);
            items.push(d.value);
        }
        Decoded {
            value: Value::Array(items),
            len: pos.aligned() - off,
        }
    }

    fn integer(&self, value: &Value) -> Result<u64, CodecError> {
        match value {
            Value::Uint(v) => Ok(*v),
            Value::Int(v) => Ok(*v as u64),
            other => Err(self.mismatch("number", other)),
        }
    }

    fn enum_number(&self, value: &Value, map: &EnumMap) -> Result<u64, CodecError> {
        match value {
            Value::String(label) => map
                .value_of(label)
                .ok_or_else(|| CodecError::UnknownEnumLabel(label.clone())),
            Value::Uint(_) | Value::Int(_) => {
                let v = self.integer(value)?;
                if map.contains_value(v) {
                    Ok(v)
                } else {
                    Err(CodecError::UnknownEnumValue(v))
                }
            }
            // Null stands for any unlabelled wire value; the original number is not kept, so it
            // re-encodes as zero.
            Value::Null => Ok(0),
            other => Err(self.mismatch("enum label or number", other)),
        }
    }

    fn bitmap(&self, value: &Value, len: usize, names: &BitNames) -> Result<Bitmap, CodecError> {
        match value {
            Value::Uint(_) | Value::Int(_) => {
                Ok(Bitmap::new(len, names.clone()).with_mask(self.integer(value)?))
            }
            Value::Bitmap(b) => {
                let mut bytes = b.as_bytes().to_vec();
                bytes.resize(len, 0);
                Ok(Bitmap::from_bytes(bytes, names.clone()))
            }
            Value::Array(items) => {
                let set = items
                    .iter()
                    .map(|v| v.as_str().ok_or_else(|| self.mismatch("bit name", v)))
                    .collect::<Result<Vec<_>, _>>()?;
                Bitmap::new(len, names.clone()).with_bits(set)
            }
            other => Err(self.mismatch("bitmap, mask or bit names", other)),
        }
    }

    fn blob_payload<'v>(&self, value: &'v Value) -> Result<&'v [u8], CodecError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::String(s) => Ok(s.as_bytes()),
            other => Err(self.mismatch("bytes", other)),
        }
    }

    fn text_payload<'v>(&self, value: &'v Value) -> Result<&'v [u8], CodecError> {
        value
            .as_str()
            .map(str::as_bytes)
            .ok_or_else(|| self.mismatch("string", value))
    }

    fn write_exact(
        &self,
        buf: &mut [u8],
        off: usize,
        len: usize,
        bytes: &[u8],
    ) -> Result<(), CodecError> {
        if bytes.len() != len {
            return Err(CodecError::InvalidBufferSize {
                expected: len,
                actual: bytes.len(),
            });
        }
        codec::write_block(buf, off, bytes)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name)
    }
}

fn check_prefix(prefix: usize, len: usize) -> Result<(), CodecError> {
    let max = codec::prefix_max(prefix);
    if len > max {
        return Err(CodecError::TooLong { len, max });
    }
    Ok(())
}

fn label(map: &EnumMap, v: u64) -> Value {
    map.label_of(v)
        .map(|l| Value::String(l.to_string()))
        .unwrap_or(Value::Null)
}

/// Payload slice (clamped to the buffer) and the declared wire length (prefix + payload).
fn prefixed_payload(buf: &[u8], off: usize, prefix: usize) -> (&[u8], usize) {
    let start = (off + prefix).min(buf.len());
    if prefix == 0 {
        let rest = &buf[start..];
        return (rest, rest.len());
    }
    let declared = codec::read_uint(buf, off, prefix, Endianness::Little) as usize;
    let end = start.saturating_add(declared).min(buf.len());
    (&buf[start..end], prefix + declared)
}

fn read_nibble(buf: &[u8], at: Position) -> u8 {
    match buf.get(at.byte) {
        Some(b) => match at.nibble {
            Nibble::Low => b & 0x0f,
            Nibble::High => b >> 4,
        },
        None => 0,
    }
}

fn write_nibble(buf: &mut [u8], at: Position, v: u8) -> Result<(), CodecError> {
    codec::ensure_room(buf.len(), at.byte, 1)?;
    let b = &mut buf[at.byte];
    *b = match at.nibble {
        Nibble::Low => (*b & 0xf0) | (v & 0x0f),
        Nibble::High => (*b & 0x0f) | ((v & 0x0f) << 4),
    };
    Ok(())
}
