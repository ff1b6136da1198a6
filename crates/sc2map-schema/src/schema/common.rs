//! Shared helpers used by the s2mh and s2mi labelers: field lookup,
//! version computation, and shape assertions against [`Value`] nodes.

use std::collections::BTreeMap;

use sc2map_core::Value;

use crate::errors::SchemaError;
use crate::labeled::LabeledValue;

/// A struct's version is the maximum integer field tag present in it.
/// Keys are decimal-encoded by construction (see `sc2map_core::decoder`),
/// so parsing never fails on well-formed decoder output; an empty struct
/// has version -1, which no version allow-list will ever contain.
pub fn version_of(map: &BTreeMap<String, Value>) -> i64 {
    map.keys().filter_map(|k| k.parse::<i64>().ok()).max().unwrap_or(-1)
}

pub fn get<'a>(
    map: &'a BTreeMap<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, SchemaError> {
    map.get(key).ok_or_else(|| SchemaError::MissingField {
        path: format!("{path}.{key}"),
    })
}

pub fn opt<'a>(map: &'a BTreeMap<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key)
}

pub fn expect_mapping<'a>(value: &'a Value, path: &str) -> Result<&'a BTreeMap<String, Value>, SchemaError> {
    value.as_mapping().ok_or_else(|| SchemaError::UnexpectedShape {
        path: path.to_string(),
        expected: "Mapping".into(),
    })
}

pub fn expect_sequence<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], SchemaError> {
    value.as_sequence().ok_or_else(|| SchemaError::UnexpectedShape {
        path: path.to_string(),
        expected: "Sequence".into(),
    })
}

pub fn expect_integer(value: &Value, path: &str) -> Result<i64, SchemaError> {
    value.as_integer().ok_or_else(|| SchemaError::UnexpectedShape {
        path: path.to_string(),
        expected: "Integer".into(),
    })
}

pub fn expect_bytes<'a>(value: &'a Value, path: &str) -> Result<&'a [u8], SchemaError> {
    value.as_bytes().ok_or_else(|| SchemaError::UnexpectedShape {
        path: path.to_string(),
        expected: "String (bytes)".into(),
    })
}

pub fn expect_arity(map: &BTreeMap<String, Value>, expected: usize, path: &str) -> Result<(), SchemaError> {
    if map.len() != expected {
        return Err(SchemaError::UnexpectedLen {
            path: path.to_string(),
            len: map.len(),
        });
    }
    Ok(())
}

pub fn expect_version_in(version: i64, allowed: &[i64], path: &str) -> Result<(), SchemaError> {
    if !allowed.contains(&version) {
        return Err(SchemaError::UnexpectedVersion {
            path: path.to_string(),
            version,
        });
    }
    Ok(())
}

pub fn expect_empty_array(value: &Value, path: &str) -> Result<(), SchemaError> {
    let seq = expect_sequence(value, path)?;
    if !seq.is_empty() {
        return Err(SchemaError::ExpectedEmptyArray {
            path: path.to_string(),
            len: seq.len(),
        });
    }
    Ok(())
}

pub fn bool_from_int(value: i64, path: &str) -> Result<bool, SchemaError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SchemaError::InvalidBool {
            path: path.to_string(),
            value: other,
        }),
    }
}

/// Trims trailing NUL bytes, as the wire format pads fixed-width ASCII
/// fields with `0x00`.
pub fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Decodes a byte string as UTF-8, substituting the replacement character
/// for any invalid sequences rather than failing the whole labeler over an
/// unreadable display string.
pub fn bytes_to_string_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// `type = bytes[0:4]`, `region = lowercase(trim_nul(bytes[4:8]))`,
/// `hash = lowercase hex of bytes[8:]`. Shared by the s2mh and s2mi
/// labelers.
pub fn depot_link(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let bytes = expect_bytes(value, path)?;
    if bytes.len() < 16 {
        return Err(SchemaError::UnexpectedShape {
            path: path.to_string(),
            expected: "DepotLink (>=16 bytes)".into(),
        });
    }
    let kind = bytes_to_string_lossy(&bytes[0..4]);
    let region = bytes_to_string_lossy(trim_nul(&bytes[4..8])).to_lowercase();
    let hash = hex::encode(&bytes[8..]);
    Ok(LabeledValue::map([
        ("type", LabeledValue::String(kind)),
        ("region", LabeledValue::String(region)),
        ("hash", LabeledValue::String(hash)),
    ]))
}

/// `{id: Int "0", version: Int "1"}`, arity 2. Shared by the s2mh and
/// s2mi labelers.
pub fn instance_header(value: &Value, path: &str) -> Result<LabeledValue, SchemaError> {
    let map = expect_mapping(value, path)?;
    expect_arity(map, 2, path)?;
    let id = expect_integer(get(map, "0", path)?, &format!("{path}.0"))?;
    let version = expect_integer(get(map, "1", path)?, &format!("{path}.1"))?;
    Ok(LabeledValue::map([
        ("id", LabeledValue::Integer(id)),
        ("version", LabeledValue::Integer(version)),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_of_empty_and_populated() {
        let empty: BTreeMap<String, Value> = BTreeMap::new();
        assert_eq!(version_of(&empty), -1);

        let mut map = BTreeMap::new();
        map.insert("0".to_string(), Value::Integer(1));
        map.insert("5".to_string(), Value::Integer(2));
        map.insert("2".to_string(), Value::Integer(3));
        assert_eq!(version_of(&map), 5);
    }

    #[test]
    fn test_trim_nul() {
        assert_eq!(trim_nul(b"abc\0\0"), b"abc");
        assert_eq!(trim_nul(b"\0\0\0"), b"");
        assert_eq!(trim_nul(b"abc"), b"abc");
    }
}
