//! The tagged-stream versioned decoder.
//!
//! Every node begins with a one-byte type tag. `decode_unlabeled` builds a
//! [`Value`] tree; `skip_instance` walks the same grammar without
//! allocating one, for callers that want to fast-forward past a
//! sub-structure they don't need. Both share one recursive walker
//! parameterized by a `Sink`, the same "describe vs execute" split the
//! bit-compiler in this codebase's ancestry uses for its own two-phase
//! fields.

use std::collections::BTreeMap;

use crate::bits::BitBuffer;
use crate::error::DecodeError;
use crate::value::Value;
use crate::varint::read_varint;

const TAG_ARRAY: u8 = 0x00;
const TAG_BIT_ARRAY: u8 = 0x01;
const TAG_BLOB: u8 = 0x02;
const TAG_CHOICE: u8 = 0x03;
const TAG_OPTIONAL: u8 = 0x04;
const TAG_STRUCT: u8 = 0x05;
const TAG_UINT8: u8 = 0x06;
const TAG_UINT32: u8 = 0x07;
const TAG_UINT64: u8 = 0x08;
const TAG_VARINT: u8 = 0x09;

/// Shared output-construction policy for the tagged-stream walker.
trait Sink {
    type Out;
    fn null() -> Self::Out;
    fn integer(v: i64) -> Self::Out;
    fn string(v: Vec<u8>) -> Self::Out;
    fn bit_array(bit_count: usize, bytes: Vec<u8>) -> Self::Out;
    fn sequence(v: Vec<Self::Out>) -> Self::Out;
    fn mapping(v: BTreeMap<String, Self::Out>) -> Self::Out;
}

/// Builds a full [`Value`] tree.
struct Build;

impl Sink for Build {
    type Out = Value;

    fn null() -> Value {
        Value::Null
    }
    fn integer(v: i64) -> Value {
        Value::Integer(v)
    }
    fn string(v: Vec<u8>) -> Value {
        Value::String(v)
    }
    fn bit_array(bit_count: usize, bytes: Vec<u8>) -> Value {
        Value::BitArray { bit_count, bytes }
    }
    fn sequence(v: Vec<Value>) -> Value {
        Value::Sequence(v)
    }
    fn mapping(v: BTreeMap<String, Value>) -> Value {
        Value::Mapping(v)
    }
}

/// Walks the grammar, consuming bits but discarding every payload.
struct Discard;

impl Sink for Discard {
    type Out = ();

    fn null() {}
    fn integer(_: i64) {}
    fn string(_: Vec<u8>) {}
    fn bit_array(_: usize, _: Vec<u8>) {}
    fn sequence(_: Vec<()>) {}
    fn mapping(_: BTreeMap<String, ()>) {}
}

fn decode_len(buf: &mut BitBuffer) -> Result<usize, DecodeError> {
    let n = read_varint(buf)?;
    usize::try_from(n).map_err(|_| {
        if n < 0 {
            DecodeError::NegativeLength(n)
        } else {
            DecodeError::LengthOverflow(n)
        }
    })
}

fn walk<S: Sink>(buf: &mut BitBuffer) -> Result<S::Out, DecodeError> {
    let tag = buf.read_u8()?;
    match tag {
        TAG_ARRAY => {
            let len = decode_len(buf)?;
            let mut items = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                items.push(walk::<S>(buf)?);
            }
            Ok(S::sequence(items))
        }
        TAG_BIT_ARRAY => {
            let bit_count = decode_len(buf)?;
            let byte_len = bit_count.div_ceil(8);
            let bytes = buf.read_aligned(byte_len)?.to_vec();
            Ok(S::bit_array(bit_count, bytes))
        }
        TAG_BLOB => {
            let len = decode_len(buf)?;
            let bytes = buf.read_aligned(len)?.to_vec();
            Ok(S::string(bytes))
        }
        TAG_CHOICE => {
            let _tag = read_varint(buf)?;
            walk::<S>(buf)
        }
        TAG_OPTIONAL => {
            let present = buf.read_u8()?;
            if present != 0 {
                walk::<S>(buf)
            } else {
                Ok(S::null())
            }
        }
        TAG_STRUCT => {
            let len = decode_len(buf)?;
            let mut map = BTreeMap::new();
            for _ in 0..len {
                let field_tag = read_varint(buf)?;
                let value = walk::<S>(buf)?;
                map.insert(field_tag.to_string(), value);
            }
            Ok(S::mapping(map))
        }
        TAG_UINT8 => {
            let byte = buf.read_aligned(1)?[0];
            Ok(S::integer(byte as i64))
        }
        TAG_UINT32 => {
            let bytes = buf.read_aligned(4)?;
            Ok(S::string(bytes.to_vec()))
        }
        TAG_UINT64 => {
            let bytes = buf.read_aligned(8)?;
            Ok(S::string(bytes.to_vec()))
        }
        TAG_VARINT => {
            let v = read_varint(buf)?;
            Ok(S::integer(v))
        }
        other => Err(DecodeError::UnknownTag(other)),
    }
}

/// Decodes a full byte buffer into a [`Value`] tree. Always big-endian, per
/// the format's fixed wire convention.
pub fn decode_unlabeled(bytes: &[u8]) -> Result<Value, DecodeError> {
    let mut buf = BitBuffer::new(bytes, true);
    walk::<Build>(&mut buf)
}

/// Walks one node's worth of the grammar without building a tree, advancing
/// `buf` exactly as far as [`decode_unlabeled`] would.
pub fn skip_instance(buf: &mut BitBuffer) -> Result<(), DecodeError> {
    walk::<Discard>(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::encode_varint;

    fn struct_bytes(fields: &[(i64, Vec<u8>)]) -> Vec<u8> {
        let mut out = vec![TAG_STRUCT];
        out.extend(encode_varint(fields.len() as i64));
        for (tag, node) in fields {
            out.extend(encode_varint(*tag));
            out.extend(node);
        }
        out
    }

    fn varint_node(v: i64) -> Vec<u8> {
        let mut out = vec![TAG_VARINT];
        out.extend(encode_varint(v));
        out
    }

    #[test]
    fn test_decode_struct_with_varint_fields() {
        let bytes = struct_bytes(&[(0, varint_node(5)), (2, varint_node(-7))]);
        let value = decode_unlabeled(&bytes).unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(map.get("0").unwrap().as_integer(), Some(5));
        assert_eq!(map.get("2").unwrap().as_integer(), Some(-7));
    }

    #[test]
    fn test_decode_array() {
        let mut bytes = vec![TAG_ARRAY];
        bytes.extend(encode_varint(2));
        bytes.extend(varint_node(1));
        bytes.extend(varint_node(2));
        let value = decode_unlabeled(&bytes).unwrap();
        let seq = value.as_sequence().unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0].as_integer(), Some(1));
        assert_eq!(seq[1].as_integer(), Some(2));
    }

    #[test]
    fn test_decode_optional_absent_and_present() {
        let absent = vec![TAG_OPTIONAL, 0];
        assert_eq!(decode_unlabeled(&absent).unwrap(), Value::Null);

        let mut present = vec![TAG_OPTIONAL, 1];
        present.extend(varint_node(9));
        assert_eq!(decode_unlabeled(&present).unwrap().as_integer(), Some(9));
    }

    #[test]
    fn test_decode_blob_and_uint32_as_string() {
        let mut blob = vec![TAG_BLOB];
        blob.extend(encode_varint(3));
        blob.extend([b'a', b'b', b'c']);
        assert_eq!(
            decode_unlabeled(&blob).unwrap().as_bytes(),
            Some(&b"abc"[..])
        );

        let mut u32_bytes = vec![TAG_UINT32];
        u32_bytes.extend([b'T', b'R', b'I', b'L']);
        assert_eq!(
            decode_unlabeled(&u32_bytes).unwrap().as_bytes(),
            Some(&b"TRIL"[..])
        );
    }

    #[test]
    fn test_decode_bit_array() {
        let mut bytes = vec![TAG_BIT_ARRAY];
        bytes.extend(encode_varint(10));
        bytes.extend([0xff, 0x03]);
        let value = decode_unlabeled(&bytes).unwrap();
        match value {
            Value::BitArray { bit_count, bytes } => {
                assert_eq!(bit_count, 10);
                assert_eq!(bytes, vec![0xff, 0x03]);
            }
            other => panic!("expected BitArray, got {other:?}"),
        }
    }

    #[test]
    fn test_choice_discards_tag() {
        let mut bytes = vec![TAG_CHOICE];
        bytes.extend(encode_varint(42));
        bytes.extend(varint_node(7));
        assert_eq!(decode_unlabeled(&bytes).unwrap().as_integer(), Some(7));
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let bytes = [0x0a];
        assert_eq!(decode_unlabeled(&bytes), Err(DecodeError::UnknownTag(0x0a)));
    }

    #[test]
    fn test_skip_matches_decode_offset() {
        let bytes = struct_bytes(&[
            (0, varint_node(1)),
            (1, {
                let mut blob = vec![TAG_BLOB];
                blob.extend(encode_varint(4));
                blob.extend([1, 2, 3, 4]);
                blob
            }),
        ]);

        let mut decode_buf = BitBuffer::new(&bytes, true);
        walk::<Build>(&mut decode_buf).unwrap();

        let mut skip_buf = BitBuffer::new(&bytes, true);
        skip_instance(&mut skip_buf).unwrap();

        assert_eq!(decode_buf.is_eof(), skip_buf.is_eof());
        assert!(decode_buf.is_eof());
    }
}
