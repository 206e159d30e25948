//! Descriptor catalog: every wire type, by constructor function and by name.
//!
//! Plain types are functions returning a fresh [`DataType`]. Parametrized types (bitmaps,
//! enumerations, arrays, fixed strings) take their parameters directly; [`lookup`] exposes the
//! same set by short name, with parametrized types as [`Entry::Factory`].

use crate::bitmap::{bit_names, BitNames};
use crate::codec::CodecError;
use crate::datatype::{DataType, EnumMap, Kind, Length};

macro_rules! fixed_types {
    ($($fn_name:ident => ($id:expr, $name:literal, $len:literal, $kind:expr);)*) => {
        $(pub fn $fn_name() -> DataType {
            DataType::build($id, $name, Length::Fixed($len), $kind)
        })*
    };
}

macro_rules! map_types {
    ($($fn_name:ident => ($id:literal, $name:literal, $width:literal);)*) => {
        $(pub fn $fn_name<I, S>(names: I) -> DataType
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            map(Some($id), $name, $width, bit_names(names))
        })*
    };
}

fixed_types! {
    no_data => (Some(0), "noData", 0, Kind::NoData);
    data8 => (Some(8), "data8", 1, Kind::Data(1));
    data16 => (Some(9), "data16", 2, Kind::Data(2));
    data24 => (Some(10), "data24", 3, Kind::Data(3));
    data32 => (Some(11), "data32", 4, Kind::Data(4));
    data40 => (Some(12), "data40", 5, Kind::Data(5));
    data48 => (Some(13), "data48", 6, Kind::Data(6));
    data56 => (Some(14), "data56", 7, Kind::Data(7));
    data64 => (Some(15), "data64", 8, Kind::Data(8));
    boolean => (Some(16), "bool", 1, Kind::Bool);
    uint8 => (Some(32), "uint8", 1, Kind::Uint(1));
    uint16 => (Some(33), "uint16", 2, Kind::Uint(2));
    uint24 => (Some(34), "uint24", 3, Kind::Uint(3));
    uint32 => (Some(35), "uint32", 4, Kind::Uint(4));
    uint40 => (Some(36), "uint40", 5, Kind::Uint(5));
    uint48 => (Some(37), "uint48", 6, Kind::Uint(6));
    int8 => (Some(40), "int8", 1, Kind::Int(1));
    int16 => (Some(41), "int16", 2, Kind::Int(2));
    int24 => (Some(42), "int24", 3, Kind::Int(3));
    int32 => (Some(43), "int32", 4, Kind::Int(4));
    int40 => (Some(44), "int40", 5, Kind::Int(5));
    int48 => (Some(45), "int48", 6, Kind::Int(6));
    single => (Some(57), "single", 4, Kind::Single);
    double => (Some(58), "double", 8, Kind::Double);
    eui48 => (None, "EUI48", 6, Kind::Eui(6));
    eui64 => (Some(240), "EUI64", 8, Kind::Eui(8));
    key128 => (Some(241), "key128", 16, Kind::Key128);
}

map_types! {
    map8 => (24, "map8", 1);
    map16 => (25, "map16", 2);
    map24 => (26, "map24", 3);
    map32 => (27, "map32", 4);
    map40 => (28, "map40", 5);
    map48 => (29, "map48", 6);
    map56 => (30, "map56", 7);
    map64 => (31, "map64", 8);
}

fn map(id: Option<u8>, name: &'static str, width: usize, names: BitNames) -> DataType {
    DataType::build(id, name, Length::Fixed(width), Kind::Map(width, names))
}

fn prefixed(name: &'static str, id: Option<u8>, prefix: usize, kind: Kind) -> DataType {
    DataType::build(id, name, Length::Variable { prefix }, kind)
}

/// Octet string with a one-byte length prefix.
pub fn octstr() -> DataType {
    prefixed("octstr", Some(65), 1, Kind::Blob(1))
}

/// Character string with a one-byte length prefix.
pub fn string() -> DataType {
    prefixed("string", Some(66), 1, Kind::Text(1))
}

pub fn octstr16() -> DataType {
    prefixed("octstr16", Some(67), 2, Kind::Blob(2))
}

pub fn string16() -> DataType {
    prefixed("string16", Some(68), 2, Kind::Text(2))
}

/// Raw bytes running to the end of the buffer.
pub fn buffer() -> DataType {
    prefixed("buffer", None, 0, Kind::Blob(0))
}

pub fn buffer8() -> DataType {
    prefixed("buffer8", None, 1, Kind::Blob(1))
}

pub fn buffer16() -> DataType {
    prefixed("buffer16", None, 2, Kind::Blob(2))
}

/// One-byte enumeration. Wire values without a label decode to [`Value::Null`] and re-encode as
/// 0; see [`Value::Null`].
pub fn enum8(labels: impl Into<EnumMap>) -> DataType {
    DataType::build(Some(48), "enum8", Length::Fixed(1), Kind::Enum(1, labels.into()))
}

pub fn enum16(labels: impl Into<EnumMap>) -> DataType {
    DataType::build(Some(49), "enum16", Length::Fixed(2), Kind::Enum(2, labels.into()))
}

pub fn enum32(labels: impl Into<EnumMap>) -> DataType {
    DataType::build(None, "enum32", Length::Fixed(4), Kind::Enum(4, labels.into()))
}

pub fn uint4() -> DataType {
    DataType::build(None, "uint4", Length::Nibble, Kind::Uint4)
}

pub fn enum4(labels: impl Into<EnumMap>) -> DataType {
    DataType::build(None, "enum4", Length::Nibble, Kind::Enum4(labels.into()))
}

pub fn map4<I, S>(names: I) -> DataType
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    DataType::build(None, "map4", Length::Nibble, Kind::Map4(bit_names(names)))
}

/// Elements of `element` up to the end of the buffer, no count on the wire.
pub fn array0(element: DataType) -> DataType {
    prefixed("Array0", None, 0, Kind::Array(0, Box::new(element)))
}

/// Up to 255 elements of `element`, preceded by a one-byte count.
pub fn array8(element: DataType) -> DataType {
    prefixed("Array8", None, 1, Kind::Array(1, Box::new(element)))
}

/// UTF-8 text in exactly `len` bytes, zero-padded.
pub fn fixed_string(len: usize) -> DataType {
    DataType::build(None, "FixedString", Length::Fixed(len), Kind::FixedString(len))
}

/// Parameters accepted by a catalog factory.
#[derive(Debug, Clone)]
pub enum Params {
    Labels(EnumMap),
    BitNames(BitNames),
    Element(DataType),
    Length(usize),
}

impl Params {
    fn kind_name(&self) -> &'static str {
        match self {
            Params::Labels(_) => "labels",
            Params::BitNames(_) => "bit names",
            Params::Element(_) => "element type",
            Params::Length(_) => "length",
        }
    }

    fn mismatch(self, data_type: &str, expected: &'static str) -> CodecError {
        CodecError::TypeMismatch {
            data_type: data_type.to_string(),
            expected,
            found: self.kind_name(),
        }
    }

    fn into_labels(self, data_type: &str) -> Result<EnumMap, CodecError> {
        match self {
            Params::Labels(m) => Ok(m),
            other => Err(other.mismatch(data_type, "labels")),
        }
    }

    fn into_bit_names(self, data_type: &str) -> Result<BitNames, CodecError> {
        match self {
            Params::BitNames(n) => Ok(n),
            other => Err(other.mismatch(data_type, "bit names")),
        }
    }

    fn into_element(self, data_type: &str) -> Result<DataType, CodecError> {
        match self {
            Params::Element(e) => Ok(e),
            other => Err(other.mismatch(data_type, "element type")),
        }
    }

    fn into_length(self, data_type: &str) -> Result<usize, CodecError> {
        match self {
            Params::Length(n) => Ok(n),
            other => Err(other.mismatch(data_type, "length")),
        }
    }
}

pub type Factory = fn(Params) -> Result<DataType, CodecError>;

#[derive(Debug, Clone)]
pub enum Entry {
    Ready(DataType),
    Factory(Factory),
}

/// Every name [`lookup`] resolves.
pub const NAMES: &[&str] = &[
    "noData", "data8", "data16", "data24", "data32", "data40", "data48", "data56", "data64",
    "bool", "map8", "map16", "map24", "map32", "map40", "map48", "map56", "map64", "uint8",
    "uint16", "uint24", "uint32", "uint40", "uint48", "int8", "int16", "int24", "int32", "int40",
    "int48", "enum8", "enum16", "enum32", "single", "double", "octstr", "string", "octstr16",
    "string16", "EUI48", "EUI64", "key128", "buffer", "buffer8", "buffer16", "uint4", "enum4",
    "map4", "Array0", "Array8", "FixedString",
];

/// Resolve a catalog entry by its short name.
pub fn lookup(name: &str) -> Option<Entry> {
    let entry = match name {
        "noData" => Entry::Ready(no_data()),
        "data8" => Entry::Ready(data8()),
        "data16" => Entry::Ready(data16()),
        "data24" => Entry::Ready(data24()),
        "data32" => Entry::Ready(data32()),
        "data40" => Entry::Ready(data40()),
        "data48" => Entry::Ready(data48()),
        "data56" => Entry::Ready(data56()),
        "data64" => Entry::Ready(data64()),
        "bool" => Entry::Ready(boolean()),
        "map8" => Entry::Factory(|p| Ok(map(Some(24), "map8", 1, p.into_bit_names("map8")?))),
        "map16" => Entry::Factory(|p| Ok(map(Some(25), "map16", 2, p.into_bit_names("map16")?))),
        "map24" => Entry::Factory(|p| Ok(map(Some(26), "map24", 3, p.into_bit_names("map24")?))),
        "map32" => Entry::Factory(|p| Ok(map(Some(27), "map32", 4, p.into_bit_names("map32")?))),
        "map40" => Entry::Factory(|p| Ok(map(Some(28), "map40", 5, p.into_bit_names("map40")?))),
        "map48" => Entry::Factory(|p| Ok(map(Some(29), "map48", 6, p.into_bit_names("map48")?))),
        "map56" => Entry::Factory(|p| Ok(map(Some(30), "map56", 7, p.into_bit_names("map56")?))),
        "map64" => Entry::Factory(|p| Ok(map(Some(31), "map64", 8, p.into_bit_names("map64")?))),
        "uint8" => Entry::Ready(uint8()),
        "uint16" => Entry::Ready(uint16()),
        "uint24" => Entry::Ready(uint24()),
        "uint32" => Entry::Ready(uint32()),
        "uint40" => Entry::Ready(uint40()),
        "uint48" => Entry::Ready(uint48()),
        "int8" => Entry::Ready(int8()),
        "int16" => Entry::Ready(int16()),
        "int24" => Entry::Ready(int24()),
        "int32" => Entry::Ready(int32()),
        "int40" => Entry::Ready(int40()),
        "int48" => Entry::Ready(int48()),
        "enum8" => Entry::Factory(|p| Ok(enum8(p.into_labels("enum8")?))),
        "enum16" => Entry::Factory(|p| Ok(enum16(p.into_labels("enum16")?))),
        "enum32" => Entry::Factory(|p| Ok(enum32(p.into_labels("enum32")?))),
        "single" => Entry::Ready(single()),
        "double" => Entry::Ready(double()),
        "octstr" => Entry::Ready(octstr()),
        "string" => Entry::Ready(string()),
        "octstr16" => Entry::Ready(octstr16()),
        "string16" => Entry::Ready(string16()),
        "EUI48" => Entry::Ready(eui48()),
        "EUI64" => Entry::Ready(eui64()),
        "key128" => Entry::Ready(key128()),
        "buffer" => Entry::Ready(buffer()),
        "buffer8" => Entry::Ready(buffer8()),
        "buffer16" => Entry::Ready(buffer16()),
        "uint4" => Entry::Ready(uint4()),
        "enum4" => Entry::Factory(|p| Ok(enum4(p.into_labels("enum4")?))),
        "map4" => Entry::Factory(|p| {
            Ok(DataType::build(None, "map4", Length::Nibble, Kind::Map4(p.into_bit_names("map4")?)))
        }),
        "Array0" => Entry::Factory(|p| Ok(array0(p.into_element("Array0")?))),
        "Array8" => Entry::Factory(|p| Ok(array8(p.into_element("Array8")?))),
        "FixedString" => Entry::Factory(|p| Ok(fixed_string(p.into_length("FixedString")?))),
        _ => return None,
    };
    Some(entry)
}
