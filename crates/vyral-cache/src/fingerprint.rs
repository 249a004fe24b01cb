//! Cache key fingerprints.
//!
//! A fingerprint is derived from `{operation}:{sub_operation}:{params}` where
//! `params` is serialized canonically (object keys sorted at every depth), so
//! two parameter bags that are equal as mappings always produce the same key.
//! The string is reduced with a 32-bit multiplicative string hash and
//! rendered in base 36. It is not collision resistant and is not meant to be.

use serde_json::{Map, Value};

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Compute the cache fingerprint for an operation and its parameters.
pub fn fingerprint(operation: &str, sub_operation: &str, params: &Map<String, Value>) -> String {
    let canonical = canonical_object(params);
    let key = format!("{}:{}:{}", operation, sub_operation, canonical);
    string_hash(&key)
}

/// Serialize a JSON value with sorted object keys and no whitespace.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => Value::String(s.clone()).to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => canonical_object(map),
    }
}

fn canonical_object(map: &Map<String, Value>) -> String {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let items: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// `h = h * 31 + c` over UTF-16 code units, wrapping at 32 bits.
fn string_hash(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    to_base36(u64::from(hash.unsigned_abs()))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
