//! Struct decode fuzz target: feed arbitrary bytes to a struct covering every length class.
//! Decode must not panic; re-encoding the decoded record must not panic either.
//! Build with: cargo fuzz run struct_decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fn fuzz_struct() -> Option<zcl_types::StructDef> {
    use zcl_types::{types, EnumMap, StructDef};
    let inner = StructDef::new("Inner", [("s", types::string()), ("n", types::int24())]).ok()?;
    StructDef::new(
        "Fuzz",
        [
            ("flag", types::boolean()),
            ("lo", types::uint4()),
            ("hi", types::enum4(EnumMap::from([("a", 1), ("b", 2)]))),
            ("name", types::string16()),
            ("items", types::array8(types::map4(["x", "y"]))),
            ("inner", inner.into_data_type()),
            ("rest", types::array0(types::octstr())),
            ("eui", types::eui64()),
            ("tail", types::fixed_string(3)),
        ],
    )
    .ok()
}

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Some(def) = fuzz_struct() else {
        return;
    };
    let (record, _) = def.decode_with_len(data, 0);
    let _ = def.encode(&record);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run struct_decode_fuzz");
}
