//! Integration tests: struct definitions, record construction, exact-size encode, bounded and
//! lenient decode, nested structs, static encode into caller buffers.

use zcl_types::dump::record_to_dump;
use zcl_types::{types, CodecError, EnumMap, Length, Record, StructDef, Value};

fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("hex digit"))
        .collect()
}

fn mixed_fields() -> Vec<(&'static str, zcl_types::DataType)> {
    vec![
        ("field1", types::string()),
        ("field2", types::uint16()),
        ("field3", types::enum8(EnumMap::from([("opt1", 1), ("opt2", 2), ("opt3", 3)]))),
        ("field4", types::array8(types::uint16())),
        ("field5", types::map8(["bit1", "bit2", "bit3"])),
    ]
}

fn mixed_values() -> Vec<(&'static str, Value)> {
    vec![
        ("field1", Value::from("test")),
        ("field2", Value::from(500u16)),
        ("field3", Value::from("opt3")),
        ("field4", Value::Array((1u16..=4).map(Value::from).collect())),
        ("field5", Value::names(["bit2"])),
    ]
}

const MIXED_HEX: &str = "0474657374f4010304010002000300040002";

#[test]
fn test_mixed_struct_encodes_reference_bytes() {
    let def = StructDef::new("Mixed", mixed_fields()).expect("define");
    let record = def.record(mixed_values()).expect("record");
    let bytes = def.encode(&record).expect("encode");
    assert_eq!(bytes, hex(MIXED_HEX));
    assert_eq!(def.encoded_len(&record).expect("len"), bytes.len());
}

#[test]
fn test_mixed_struct_decodes_reference_bytes() {
    let def = StructDef::new("Mixed", mixed_fields()).expect("define");
    let bytes = hex(MIXED_HEX);
    let (record, len) = def.decode_with_len(&bytes, 0);
    assert_eq!(len, bytes.len());
    assert_eq!(record.get("field1"), Some(&Value::from("test")));
    assert_eq!(record.get("field2"), Some(&Value::Uint(500)));
    assert_eq!(record.get("field3"), Some(&Value::from("opt3")));
    assert_eq!(
        record.get("field4"),
        Some(&Value::Array((1u64..=4).map(Value::Uint).collect()))
    );
    let bits = record
        .get("field5")
        .and_then(Value::as_bitmap)
        .expect("bitmap field");
    assert_eq!(bits.bits(), vec!["bit2"]);
    assert_eq!(
        record.names().collect::<Vec<_>>(),
        vec!["field1", "field2", "field3", "field4", "field5"]
    );
}

#[test]
fn test_wider_bitmaps_and_data_blocks_append() {
    let mut fields = mixed_fields();
    fields.push((
        "field6",
        types::map16(["bit1", "bit2", "bit3", "bit4", "bit5", "bit6", "bit7", "bit8", "bit9"]),
    ));
    let def = StructDef::new("Mixed6", fields.clone()).expect("define");
    let mut values = mixed_values();
    values.push(("field6", Value::names(["bit2", "bit9"])));
    let record = def.record(values.clone()).expect("record");
    assert_eq!(def.encode(&record).expect("encode"), hex(&format!("{}0201", MIXED_HEX)));

    fields.push(("field7", types::data40()));
    let def = StructDef::new("Mixed7", fields).expect("define");
    values.push(("field7", Value::Bytes(vec![1; 5])));
    let record = def.record(values).expect("record");
    let bytes = def.encode(&record).expect("encode");
    assert_eq!(bytes, hex(&format!("{}02010101010101", MIXED_HEX)));

    let decoded = def.decode(&bytes, 0);
    assert_eq!(decoded.get("field7"), Some(&Value::Bytes(vec![1; 5])));
    let field6 = decoded.get("field6").and_then(Value::as_bitmap).expect("bitmap");
    assert_eq!(field6.bits(), vec!["bit2", "bit9"]);
}

fn fixed_struct() -> StructDef {
    StructDef::new(
        "StructOne",
        [
            ("on", types::boolean()),
            ("level", types::uint8()),
            ("transition", types::uint16()),
            ("raw", types::data8()),
        ],
    )
    .expect("define")
}

#[test]
fn test_fixed_struct_round_trip() {
    let def = fixed_struct();
    assert_eq!(def.size(), 5);
    assert!(!def.has_variable_size());
    assert_eq!(def.length(), 5);

    let record = def
        .record([
            ("on", Value::Bool(true)),
            ("level", Value::Uint(123)),
            ("transition", Value::Uint(30000)),
            ("raw", Value::Uint(8)),
        ])
        .expect("record");
    let bytes = def.encode(&record).expect("encode");
    assert_eq!(bytes, vec![0x01, 0x7b, 0x30, 0x75, 0x08]);

    let (decoded, len) = def.decode_with_len(&bytes, 0);
    assert_eq!(decoded, record);
    assert_eq!(len, def.size());
}

#[test]
fn test_record_fills_defaults_in_field_order() {
    let def = StructDef::new("Mixed", mixed_fields()).expect("define");
    let record = def.record([("field2", Value::Uint(7))]).expect("partial");
    assert_eq!(record.len(), 5);
    assert_eq!(record.names().next(), Some("field1"));
    assert_eq!(record.get("field1"), Some(&Value::from("")));
    assert_eq!(record.get("field2"), Some(&Value::Uint(7)));
    assert_eq!(record.get("field3"), Some(&Value::Null), "no label for zero");
    assert_eq!(record.get("field4"), Some(&Value::Array(Vec::new())));

    let bytes = def.encode(&record).expect("encode defaults");
    assert_eq!(bytes, vec![0x00, 0x07, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn test_record_rejects_unknown_fields() {
    let def = fixed_struct();
    let err = def.record([("dimmer", Value::Uint(1))]).unwrap_err();
    match err {
        CodecError::UnexpectedField { strukt, field } => {
            assert_eq!(strukt, "StructOne");
            assert_eq!(field, "dimmer");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err_text(&def), "StructOne: dimmer is an unexpected field");

    let mut stray = Record::new();
    stray.insert("dimmer", 1u8);
    assert!(def.encode(&stray).is_err(), "encode checks field names too");
}

fn err_text(def: &StructDef) -> String {
    match def.record([("dimmer", Value::Null)]) {
        Err(e) => e.to_string(),
        Ok(_) => String::new(),
    }
}

#[test]
fn test_positional_construction() {
    let def = fixed_struct();
    let record = def
        .record_from_args(vec![Value::Bool(false), Value::Uint(9)])
        .expect("positional");
    assert_eq!(record.get("level"), Some(&Value::Uint(9)));
    assert_eq!(record.get("transition"), Some(&Value::Uint(0)));

    let err = def.record_from_args(vec![Value::Null; 5]).unwrap_err();
    assert!(matches!(err, CodecError::TooManyValues { expected: 4, found: 5 }));
}

#[test]
fn test_truncated_input_decodes_leniently() {
    let def = StructDef::new("Short", [("a", types::uint8()), ("b", types::uint16())])
        .expect("define");
    let (record, len) = def.decode_with_len(&[0x05], 0);
    assert_eq!(record.get("a"), Some(&Value::Uint(5)));
    assert_eq!(record.get("b"), Some(&Value::Uint(0)));
    assert_eq!(len, 3);

    let empty = fixed_struct().decode(&[], 0);
    assert_eq!(empty.get("on"), Some(&Value::Null));
    assert_eq!(empty.len(), 4);
}

#[test]
fn test_unbounded_field_leaves_room_for_trailing_fixed_fields() {
    let def = StructDef::new(
        "Framed",
        [
            ("kind", types::uint8()),
            ("items", types::array0(types::uint8())),
            ("crc", types::uint16()),
        ],
    )
    .expect("define");
    let bytes = [0x01, 0x0a, 0x0b, 0x0c, 0xaa, 0xbb];
    let (record, len) = def.decode_with_len(&bytes, 0);
    assert_eq!(
        record.get("items"),
        Some(&Value::Array(vec![Value::Uint(10), Value::Uint(11), Value::Uint(12)]))
    );
    assert_eq!(record.get("crc"), Some(&Value::Uint(0xbbaa)));
    assert_eq!(len, bytes.len());
    assert_eq!(def.encode(&record).expect("re-encode"), bytes.to_vec());

    let blob = StructDef::new("Blob", [("data", types::buffer()), ("tail", types::uint8())])
        .expect("define");
    let record = blob.decode(&[1, 2, 3], 0);
    assert_eq!(record.get("data"), Some(&Value::Bytes(vec![1, 2])));
    assert_eq!(record.get("tail"), Some(&Value::Uint(3)));
}

#[test]
fn test_nested_fixed_struct() {
    let inner = StructDef::new("Point", [("x", types::uint8()), ("y", types::uint16())])
        .expect("define")
        .into_data_type();
    assert_eq!(inner.length(), Length::Fixed(3));
    assert_eq!(inner.id(), None);

    let outer = StructDef::new("Shape", [("origin", inner), ("name", types::string())])
        .expect("define");
    let partial: Record = [("x", Value::Uint(1))].into_iter().collect();
    let record = outer
        .record([("origin", Value::Struct(partial)), ("name", Value::from("hi"))])
        .expect("record");
    let bytes = outer.encode(&record).expect("encode");
    assert_eq!(bytes, vec![0x01, 0x00, 0x00, 0x02, b'h', b'i']);

    let decoded = outer.decode(&bytes, 0);
    let origin = decoded.get("origin").and_then(Value::as_record).expect("nested record");
    assert_eq!(origin.get("x"), Some(&Value::Uint(1)));
    assert_eq!(origin.get("y"), Some(&Value::Uint(0)), "missing nested field defaulted");
}

#[test]
fn test_nested_variable_struct_is_bounded() {
    let inner = StructDef::new("Label", [("s", types::string()), ("n", types::uint8())])
        .expect("define");
    assert_eq!(inner.length(), -1);
    let inner = inner.into_data_type();
    assert_eq!(inner.length(), Length::Variable { prefix: 0 });

    let outer = StructDef::new("Tagged", [("label", inner), ("crc", types::uint16())])
        .expect("define");
    let bytes = [0x02, b'a', b'b', 0x09, 0x34, 0x12];
    let (record, len) = outer.decode_with_len(&bytes, 0);
    let label = record.get("label").and_then(Value::as_record).expect("nested record");
    assert_eq!(label.get("s"), Some(&Value::from("ab")));
    assert_eq!(label.get("n"), Some(&Value::Uint(9)));
    assert_eq!(record.get("crc"), Some(&Value::Uint(0x1234)));
    assert_eq!(len, 6);
    assert_eq!(outer.encode(&record).expect("re-encode"), bytes.to_vec());
}

#[test]
fn test_encode_into_caller_buffer() {
    let def = fixed_struct();
    let mut buf = vec![0u8; 8];
    let partial: Record = [("level", Value::Uint(0x7b))].into_iter().collect();
    let written = def
        .encode_into(&mut buf, &Value::Struct(partial.clone()), 2)
        .expect("fits");
    assert_eq!(written, 5);
    assert_eq!(buf, vec![0, 0, 0x00, 0x7b, 0, 0, 0, 0]);

    let mut small = vec![0u8; 4];
    let err = def.encode_into(&mut small, &Value::Struct(partial), 0).unwrap_err();
    assert!(matches!(err, CodecError::BufferTooSmall { .. }));
}

#[test]
fn test_duplicate_fields_rejected() {
    let err = StructDef::new("Dup", [("a", types::uint8()), ("a", types::uint16())]).unwrap_err();
    assert!(matches!(err, CodecError::DuplicateField(ref f) if f == "a"));
}

#[test]
fn test_nibbles_then_byte_field() {
    let def = StructDef::new(
        "Flags",
        [
            ("mode", types::enum4(EnumMap::from([("idle", 0), ("run", 3)]))),
            ("count", types::uint8()),
        ],
    )
    .expect("define");
    assert_eq!(def.size(), 1, "nibble fields are not part of the fixed size");
    assert!(def.has_variable_size());
    let record = def
        .record([("mode", Value::from("run")), ("count", Value::Uint(0x12))])
        .expect("record");
    assert_eq!(def.encode(&record).expect("encode"), vec![0x03, 0x12]);
    assert_eq!(def.decode(&[0x03, 0x12], 0), record);
}

#[test]
fn test_record_dump() {
    let def = fixed_struct();
    let record = def.decode(&[0x01, 0x7b, 0x30, 0x75, 0x08], 0);
    assert_eq!(
        record_to_dump(&record, 0),
        "struct {\n  on: true\n  level: 123\n  transition: 30000\n  raw: 8\n}"
    );
}

#[test]
fn test_decode_at_base_offset() {
    let def = StructDef::new("Tagged", [("s", types::string()), ("n", types::uint16())])
        .expect("define");
    let bytes = [0xaa, 0xbb, 0x02, b'a', b'b', 0x34, 0x12];
    let (record, len) = def.decode_with_len(&bytes, 2);
    assert_eq!(len, 5);
    assert_eq!(record.get("s"), Some(&Value::from("ab")));
    assert_eq!(record.get("n"), Some(&Value::Uint(0x1234)));

    let mut out = [0xaa, 0xbb, 0, 0, 0, 0, 0];
    let written = def
        .encode_into(&mut out, &Value::Struct(record), 2)
        .expect("encode at offset");
    assert_eq!(written, 5);
    assert_eq!(out, bytes);
}

#[test]
fn test_array_of_variable_structs_before_fixed_field() {
    let item = StructDef::new("Item", [("s", types::string()), ("n", types::uint8())])
        .expect("item");
    let def = StructDef::new(
        "List",
        [("items", types::array8(item.into_data_type())), ("tail", types::uint8())],
    )
    .expect("define");
    let bytes = vec![0x02, 0x01, b'a', 0x05, 0x00, 0x06, 0x09];

    let (record, len) = def.decode_with_len(&bytes, 0);
    assert_eq!(len, 7);
    let first: Record = [("s", Value::from("a")), ("n", Value::Uint(5))].into_iter().collect();
    let second: Record = [("s", Value::from("")), ("n", Value::Uint(6))].into_iter().collect();
    assert_eq!(
        record.get("items"),
        Some(&Value::Array(vec![Value::Struct(first), Value::Struct(second)]))
    );
    assert_eq!(record.get("tail"), Some(&Value::Uint(9)));
    assert_eq!(def.encode(&record).expect("re-encode"), bytes);
}

#[test]
fn test_array_of_strings_before_fixed_field() {
    let def = StructDef::new(
        "Names",
        [("names", types::array8(types::string())), ("crc", types::uint16())],
    )
    .expect("define");
    let bytes = vec![0x02, 0x02, b'h', b'i', 0x01, b'x', 0xcd, 0xab];

    let (record, len) = def.decode_with_len(&bytes, 0);
    assert_eq!(len, bytes.len());
    assert_eq!(
        record.get("names"),
        Some(&Value::Array(vec![Value::from("hi"), Value::from("x")]))
    );
    assert_eq!(record.get("crc"), Some(&Value::Uint(0xabcd)));
    assert_eq!(def.encode(&record).expect("re-encode"), bytes);
}
