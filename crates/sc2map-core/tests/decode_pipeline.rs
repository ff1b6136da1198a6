//! Integration coverage for the decoder against hand-built wire packets,
//! exercising only the crate's public surface.

use sc2map_core::varint::encode_varint;
use sc2map_core::{decode_unlabeled, DecodeError, Value};

const TAG_ARRAY: u8 = 0x00;
const TAG_STRUCT: u8 = 0x05;
const TAG_UINT32: u8 = 0x07;
const TAG_VARINT: u8 = 0x09;

fn varint_node(v: i64) -> Vec<u8> {
    let mut out = vec![TAG_VARINT];
    out.extend(encode_varint(v));
    out
}

fn struct_bytes(fields: &[(i64, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![TAG_STRUCT];
    out.extend(encode_varint(fields.len() as i64));
    for (tag, node) in fields {
        out.extend(encode_varint(*tag));
        out.extend(node);
    }
    out
}

#[test]
fn test_nested_struct_and_array_round_trip() {
    let inner = struct_bytes(&[(0, varint_node(10)), (1, varint_node(-3))]);

    let mut array_of_structs = vec![TAG_ARRAY];
    array_of_structs.extend(encode_varint(2));
    array_of_structs.extend(inner.clone());
    array_of_structs.extend(inner);

    let outer = struct_bytes(&[(4, array_of_structs)]);

    let value = decode_unlabeled(&outer).unwrap();
    let map = value.as_mapping().unwrap();
    let seq = map.get("4").unwrap().as_sequence().unwrap();
    assert_eq!(seq.len(), 2);
    for item in seq {
        let inner_map = item.as_mapping().unwrap();
        assert_eq!(inner_map.get("0").unwrap().as_integer(), Some(10));
        assert_eq!(inner_map.get("1").unwrap().as_integer(), Some(-3));
    }
}

#[test]
fn test_uint32_surfaces_as_four_byte_string_not_integer() {
    let mut bytes = vec![TAG_UINT32];
    bytes.extend(*b"TRIL");
    let value = decode_unlabeled(&bytes).unwrap();
    assert_eq!(value, Value::String(b"TRIL".to_vec()));
    assert!(value.as_integer().is_none());
}

#[test]
fn test_truncated_input_is_eof_error() {
    let bytes = [TAG_VARINT];
    assert_eq!(decode_unlabeled(&bytes), Err(DecodeError::Eof));
}
