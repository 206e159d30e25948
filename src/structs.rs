//! Struct composition: an ordered list of named fields, each with its own [`DataType`], encoded
//! back to back.
//!
//! Encoding computes the exact size first and allocates once. Decoding walks the fields in order
//! and bounds every variable-length field so that the fixed-length fields after it still find
//! their bytes at the end of the buffer.

use crate::codec::CodecError;
use crate::datatype::{DataType, Kind, Length, Position};
use crate::value::{Record, Value};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct StructDef {
    name: String,
    fields: Vec<(String, DataType)>,
    size: usize,
    has_variable_size: bool,
    /// For field `i`: bytes taken by the fixed-length fields after it.
    fixed_tail: Vec<usize>,
}

impl StructDef {
    /// Define a struct. Field names must be unique.
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        let mut list: Vec<(String, DataType)> = Vec::new();
        for (field, dt) in fields {
            let field = field.into();
            if list.iter().any(|(n, _)| *n == field) {
                return Err(CodecError::DuplicateField(field));
            }
            list.push((field, dt));
        }

        // Nibble and zero-length fields count as variable, like length-prefixed ones.
        let has_variable_size = list.iter().any(|(_, dt)| !dt.length().is_positive_fixed());
        let size: usize = list.iter().map(|(_, dt)| fixed_len(dt)).sum();
        let mut fixed_tail = vec![0; list.len()];
        let mut acc = 0;
        for (i, (_, dt)) in list.iter().enumerate().rev() {
            fixed_tail[i] = acc;
            acc += fixed_len(dt);
        }

        Ok(StructDef {
            name: name.into(),
            fields: list,
            size,
            has_variable_size,
            fixed_tail,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, DataType)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&DataType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, dt)| dt)
    }

    /// Sum of the fixed field lengths; the full encoded size when every field is fixed.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn has_variable_size(&self) -> bool {
        self.has_variable_size
    }

    /// [`StructDef::size`], negated when the struct has variable-length fields.
    pub fn length(&self) -> i64 {
        let size = self.size as i64;
        if self.has_variable_size {
            -size
        } else {
            size
        }
    }

    /// Build a complete record from a partial one: every field appears in declaration order,
    /// missing fields take their type's default value.
    pub fn record<I, K, V>(&self, values: I) -> Result<Record, CodecError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let given: Record = values.into_iter().collect();
        self.check_fields(&given)?;
        Ok(self
            .fields
            .iter()
            .map(|(name, dt)| {
                let v = given.get(name).unwrap_or_else(|| dt.default_value()).clone();
                (name.clone(), v)
            })
            .collect())
    }

    /// Positional constructor: `values[i]` fills field `i`; fields past the end take defaults.
    pub fn record_from_args(&self, values: Vec<Value>) -> Result<Record, CodecError> {
        if values.len() > self.fields.len() {
            return Err(CodecError::TooManyValues {
                expected: self.fields.len(),
                found: values.len(),
            });
        }
        let mut values = values.into_iter();
        Ok(self
            .fields
            .iter()
            .map(|(name, dt)| {
                let v = values.next().unwrap_or_else(|| dt.default_value().clone());
                (name.clone(), v)
            })
            .collect())
    }

    fn check_fields(&self, record: &Record) -> Result<(), CodecError> {
        match record.names().find(|n| self.field(n).is_none()) {
            Some(unknown) => Err(CodecError::UnexpectedField {
                strukt: self.name.clone(),
                field: unknown.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Complete a struct-typed value (full or partial record, or null for all defaults).
    pub(crate) fn complete(&self, value: &Value) -> Result<Record, CodecError> {
        match value {
            Value::Struct(r) => self.record(r.clone()),
            Value::Null => self.record(Record::new()),
            other => Err(CodecError::TypeMismatch {
                data_type: self.name.clone(),
                expected: "struct",
                found: other.kind_name(),
            }),
        }
    }

    /// Exact encoded size of `record`. Missing fields count with their default value.
    pub fn encoded_len(&self, record: &Record) -> Result<usize, CodecError> {
        self.check_fields(record)?;
        let mut pos = Position::default();
        for (name, dt) in &self.fields {
            let v = record.get(name).unwrap_or_else(|| dt.default_value());
            pos = pos.advance(dt.length(), dt.encoded_len(v)?);
        }
        Ok(pos.aligned())
    }

    /// Encode into a buffer of exactly [`StructDef::encoded_len`] bytes.
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        let len = self.encoded_len(record)?;
        let mut buf = vec![0u8; len];
        self.write_fields(&mut buf, record, 0)?;
        Ok(buf)
    }

    /// Encode a full or partial record into `buf` at `offset`; returns the bytes written.
    pub fn encode_into(
        &self,
        buf: &mut [u8],
        value: &Value,
        offset: usize,
    ) -> Result<usize, CodecError> {
        let record = self.complete(value)?;
        self.write_fields(buf, &record, offset)
    }

    fn write_fields(
        &self,
        buf: &mut [u8],
        record: &Record,
        offset: usize,
    ) -> Result<usize, CodecError> {
        let mut pos = Position::from(offset);
        for (name, dt) in &self.fields {
            let v = record.get(name).unwrap_or_else(|| dt.default_value());
            let n = dt.encode(buf, v, pos)?;
            trace!(strukt = %self.name, field = %name, offset = pos.byte, len = n, "encoded field");
            pos = pos.advance(dt.length(), n);
        }
        Ok(pos.aligned() - offset)
    }

    pub fn decode(&self, buf: &[u8], offset: usize) -> Record {
        self.decode_with_len(buf, offset).0
    }

    /// Decode a record at `offset` and the number of bytes it spans.
    pub fn decode_with_len(&self, buf: &[u8], offset: usize) -> (Record, usize) {
        let mut record = Record::new();
        let mut pos = Position::from(offset);
        for (i, (name, dt)) in self.fields.iter().enumerate() {
            let view = if dt.length().is_positive_fixed() {
                buf
            } else {
                &buf[..buf.len().saturating_sub(self.fixed_tail[i])]
            };
            let d = dt.decode_with_len(view, pos);
            trace!(
                strukt = %self.name,
                field = %name,
                offset = pos.byte,
                len = d.len,
                "decoded field"
            );
            record.insert(name.as_str(), d.value);
            pos = pos.advance(dt.length(), d.len);
        }
        (record, pos.aligned() - offset)
    }

    /// Descriptor for using this struct as a field of another: fixed when every field is fixed,
    /// otherwise variable without a length prefix.
    pub fn into_data_type(self) -> DataType {
        let length = if self.has_variable_size {
            Length::Variable { prefix: 0 }
        } else {
            Length::Fixed(self.size)
        };
        let name = self.name.clone();
        DataType::build(None, name, length, Kind::Struct(Arc::new(self)))
    }
}

fn fixed_len(dt: &DataType) -> usize {
    match dt.length() {
        Length::Fixed(n) => n,
        _ => 0,
    }
}
