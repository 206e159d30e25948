//! Format decoded values for display (dump text, one-line summaries, descriptor overview).

use crate::datatype::{Args, DataType, Length};
use crate::structs::StructDef;
use crate::value::{Record, Value};

/// Raw scalar string; compound values fall back to their debug form.
pub fn format_scalar_raw(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(x) => format!("{}", x),
        Value::Uint(x) => format!("{}", x),
        Value::Int(x) => format!("{}", x),
        Value::Single(x) => format!("{}", x),
        Value::Double(x) => format!("{}", x),
        Value::String(s) => format!("{:?}", s),
        Value::Bitmap(b) => b.to_string(),
        _ => format!("{:?}", v),
    }
}

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

/// Format a value for display: one line for scalars, indented block for structs and arrays.
pub fn value_to_dump(v: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        Value::Bytes(b) => format!("{}hex({})", pad, hex_string(b)),
        Value::Struct(record) => record_to_dump(record, indent),
        Value::Array(items) => {
            if items.is_empty() {
                return format!("{}[]", pad);
            }
            let mut lines: Vec<String> = vec![format!("{}[", pad)];
            for (i, item) in items.iter().enumerate() {
                let sub = value_to_dump(item, indent + 1);
                lines.push(format!("{}  [{}] {}", pad, i, sub.trim_start()));
            }
            lines.push(format!("{}]", pad));
            lines.join("\n")
        }
        _ => format!("{}{}", pad, format_scalar_raw(v)),
    }
}

/// Fields in record order, one per line.
pub fn record_to_dump(record: &Record, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let mut lines: Vec<String> = vec![format!("{}struct {{", pad)];
    for (k, val) in record.iter() {
        let sub = value_to_dump(val, indent + 1);
        lines.push(format!("{}  {}: {}", pad, k, sub.trim_start()));
    }
    lines.push(format!("{}}}", pad));
    lines.join("\n")
}

/// First line of [`value_to_dump`].
pub fn value_summary_line(v: &Value) -> String {
    let full = value_to_dump(v, 0);
    full.lines().next().map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Short name, id and length class, e.g. `uint16 (id 33, 2 bytes)`.
pub fn data_type_summary(dt: &DataType) -> String {
    let id = match dt.id() {
        Some(id) => format!("id {}", id),
        None => "no id".to_string(),
    };
    let length = match dt.length() {
        Length::Fixed(1) => "1 byte".to_string(),
        Length::Fixed(n) => format!("{} bytes", n),
        Length::Variable { prefix: 0 } => "variable".to_string(),
        Length::Variable { prefix } => format!("{}-byte prefix", prefix),
        Length::Nibble => "nibble".to_string(),
    };
    let params = match dt.args() {
        Args::Plain => String::new(),
        Args::EnumMap(map) => format!(
            " {{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Args::BitNames(names) => format!(" <{}>", names.join(", ")),
        Args::Element(elem) => format!(" of {}", elem),
        Args::Struct(def) => format!(" struct {}", def.name()),
    };
    format!("{}{} ({}, {})", dt, params, id, length)
}

/// One line per field: name, then the field's descriptor summary.
pub fn struct_def_to_dump(def: &StructDef) -> String {
    let mut lines: Vec<String> = vec![format!("{} (length {}) {{", def.name(), def.length())];
    for (name, dt) in def.fields() {
        lines.push(format!("  {}: {}", name, data_type_summary(dt)));
    }
    lines.push("}".to_string());
    lines.join("\n")
}
