//! # zcl-types: ZCL-style wire data types
//!
//! Self-describing binary type descriptors plus a struct composition engine for encoding and
//! decoding device-protocol payloads.
//!
//! ## Building blocks
//!
//! - **DataType** ([`DataType`]): protocol id, short name, [`Length`] class, encode/decode at a
//!   [`Position`] (byte offset plus nibble selector), default value.
//! - **Catalog** ([`types`]): booleans, little-endian integers (8..48 bit), big-endian raw data
//!   blocks, floats, enumerations, bitmaps, length-prefixed strings and octet strings, hardware
//!   addresses, nibble types, homogeneous arrays, fixed-width strings; [`types::lookup`] by name.
//! - **Bitmap** ([`Bitmap`]): named bits over a fixed byte region, LSB first.
//! - **Struct** ([`StructDef`]): ordered named fields, exact-size encode, lenient decode.
//!
//! Decoding never fails: truncated input yields zero, null or empty values. Encoding reports
//! [`CodecError`] on type mismatches, unknown labels and undersized buffers.
//!
//! ## Example
//!
//! ```
//! use zcl_types::{types, EnumMap, StructDef, Value};
//!
//! let def = StructDef::new(
//!     "Report",
//!     [
//!         ("name", types::string()),
//!         ("level", types::uint16()),
//!         ("mode", types::enum8(EnumMap::from([("off", 0), ("on", 1)]))),
//!     ],
//! )
//! .unwrap();
//! let record = def
//!     .record([("name", Value::from("lamp")), ("level", Value::from(500u16))])
//!     .unwrap();
//! let bytes = def.encode(&record).unwrap();
//! assert_eq!(bytes, [0x04, b'l', b'a', b'm', b'p', 0xf4, 0x01, 0x00]);
//! assert_eq!(def.decode(&bytes, 0).get("mode"), Some(&Value::from("off")));
//! ```

pub mod bitmap;
pub mod codec;
pub mod datatype;
pub mod dump;
pub mod structs;
pub mod types;
pub mod value;

pub use bitmap::{bit_names, BitNames, Bitmap};
pub use codec::{CodecError, Endianness};
pub use datatype::{Args, CustomCodec, DataType, Decoded, EnumMap, Length, Nibble, Position};
pub use structs::StructDef;
pub use types::{lookup, Entry, Params};
pub use value::{Record, Value};
