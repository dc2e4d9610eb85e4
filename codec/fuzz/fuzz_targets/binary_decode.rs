#![no_main]

use libfuzzer_sys::fuzz_target;
use objwire_codec::{binary, value::Value};

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must decode or fail, never panic
    let Ok(value) = binary::from_bytes::<Value>(data) else {
        return;
    };

    // Whatever decoded must re-encode and decode to the same tree
    let encoded = binary::to_bytes(&value).expect("failed to re-encode a decoded value");
    let decoded: Value = binary::from_bytes(encoded).expect("failed to decode a re-encoded value");
    if !contains_nan(&value) {
        assert_eq!(value, decoded);
    }
});

fn contains_nan(value: &Value) -> bool {
    match value {
        Value::Float(f) => f.is_nan(),
        Value::Array(items) => items.iter().any(contains_nan),
        Value::Map(pairs) => pairs.iter().any(|(k, v)| contains_nan(k) || contains_nan(v)),
        _ => false,
    }
}
